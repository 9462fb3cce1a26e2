//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when building `Effect` values inside
//! reducers.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use storefront_core::async_effect;
///
/// async_effect! {
///     let session = backend.current_session().await.ok().flatten();
///     Some(SessionAction::SessionFetched { identity: session })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Stream` from any `futures::Stream` of actions
///
/// # Example
///
/// ```rust,ignore
/// use storefront_core::stream_effect;
///
/// stream_effect!(subscription.map(|change| SessionAction::AuthStateChanged { change }))
/// ```
#[macro_export]
macro_rules! stream_effect {
    ($stream:expr) => {
        $crate::effect::Effect::Stream(::std::boxed::Box::pin($stream))
    };
}

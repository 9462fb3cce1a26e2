//! Application state for Axum handlers.

use storefront_auth::catalog::PRODUCTS;
use storefront_auth::{DataBackend, IdentityBackend, SessionCoordinator};

/// Application state shared across all HTTP handlers.
///
/// Built once at startup. The coordinator is the single owner of the
/// session view; handlers only read it or forward requests through it.
pub struct AppState<B, D>
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    /// Session coordinator.
    pub session: SessionCoordinator<B>,
    /// Keyed record store for product reads.
    pub data: D,
    /// Collection products are read from.
    pub products_table: String,
}

impl<B, D> AppState<B, D>
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    /// Create state reading products from the default collection.
    #[must_use]
    pub fn new(session: SessionCoordinator<B>, data: D) -> Self {
        Self {
            session,
            data,
            products_table: PRODUCTS.to_string(),
        }
    }

    /// Read products from `table` instead.
    #[must_use]
    pub fn with_products_table(mut self, table: impl Into<String>) -> Self {
        self.products_table = table.into();
        self
    }
}

impl<B, D> Clone for AppState<B, D>
where
    B: IdentityBackend + Clone + 'static,
    D: DataBackend + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            data: self.data.clone(),
            products_table: self.products_table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_auth::SessionConfig;
    use storefront_auth::mocks::{MockDataBackend, MockIdentityBackend};

    #[test]
    fn test_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync>() {}
        assert_clone::<AppState<MockIdentityBackend, MockDataBackend>>();
    }

    #[tokio::test]
    async fn products_table_defaults_and_overrides() {
        let session = SessionCoordinator::new(MockIdentityBackend::new(), SessionConfig::default());
        let state = AppState::new(session, MockDataBackend::new());
        assert_eq!(state.products_table, "products");

        let state = state.with_products_table("items");
        assert_eq!(state.products_table, "items");
    }
}

//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ConsoleConfig;
use crate::gateway::GatewayClient;
use crate::idp::IdentityClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources: the configuration and the two outbound clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ConsoleConfig,
    gateway: GatewayClient,
    idp: IdentityClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ConsoleConfig) -> Self {
        let gateway = GatewayClient::new(&config.gateway_url);
        let idp = IdentityClient::new(&config.idp);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                idp,
            }),
        }
    }

    /// Get a reference to the console configuration.
    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    /// Get a reference to the gateway client.
    #[must_use]
    pub fn gateway(&self) -> &GatewayClient {
        &self.inner.gateway
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn idp(&self) -> &IdentityClient {
        &self.inner.idp
    }

    /// The OAuth callback URL registered with the identity provider.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.inner.config.base_url)
    }
}

//! Integration test harness for Meridian.
//!
//! Each test boots the storefront or admin app in-process on an ephemeral
//! port and drives it over HTTP with a cookie-keeping client that does not
//! follow redirects, so tests can assert on `Location` headers.
//!
//! ```bash
//! cargo test -p meridian-integration-tests
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use meridian_core::seed::SeedData;
use reqwest::{Client, Response, redirect};

/// A running app plus a client bound to it.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    /// Boot the storefront with no simulated payment delay.
    ///
    /// # Panics
    ///
    /// Panics if the seed data fails to load or the port cannot be bound.
    pub async fn storefront() -> Self {
        Self::storefront_with(meridian_storefront::config::StorefrontConfig::default()).await
    }

    /// Boot the storefront with `config`, forcing a zero payment delay.
    ///
    /// # Panics
    ///
    /// Panics if the seed data fails to load or the port cannot be bound.
    pub async fn storefront_with(config: meridian_storefront::config::StorefrontConfig) -> Self {
        Self::storefront_seeded(config, SeedData::load().expect("seed data should load")).await
    }

    /// Boot the storefront over a custom seed, forcing a zero payment delay.
    ///
    /// # Panics
    ///
    /// Panics if the port cannot be bound.
    pub async fn storefront_seeded(
        config: meridian_storefront::config::StorefrontConfig,
        seed: SeedData,
    ) -> Self {
        let config = meridian_storefront::config::StorefrontConfig {
            checkout_delay: Duration::ZERO,
            ..config
        };
        let state = meridian_storefront::state::AppState::new(config, seed);
        Self::serve(meridian_storefront::app(state)).await
    }

    /// Boot the admin panel.
    ///
    /// # Panics
    ///
    /// Panics if the seed data fails to load or the port cannot be bound.
    pub async fn admin() -> Self {
        let state = meridian_admin::state::AppState::from_seed(
            meridian_admin::config::AdminConfig::default(),
        )
        .expect("admin seed data should load");
        Self::serve(meridian_admin::app(state)).await
    }

    async fn serve(app: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("listener has an address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("test server crashed");
        });

        Self {
            addr,
            client: client(),
        }
    }

    /// A second visitor on the same server, with its own cookie jar.
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            addr: self.addr,
            client: client(),
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// GET `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// POST a form to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }
}

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("build HTTP client")
}

/// The `Location` header of a redirect response.
///
/// # Panics
///
/// Panics if the response carries no valid `Location`.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("response should redirect")
        .to_str()
        .expect("Location should be ASCII")
        .to_string()
}

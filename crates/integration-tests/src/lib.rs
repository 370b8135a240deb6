//! Integration tests for the marketplace.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - Signup, verification, login, session and logout
//! - `catalog_api` - Product listing, detail and categories
//!
//! Tests drive the storefront router in-process with
//! [`tower::ServiceExt::oneshot`]; each [`TestApp`] gets its own temporary
//! data directory.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use marketplace_core::{CategoryId, CurrencyCode, ProductId, SellerId, UserId};
use marketplace_storefront::catalog::ProductCatalog;
use marketplace_storefront::config::StorefrontConfig;
use marketplace_storefront::db::UserRepository;
use marketplace_storefront::models::Product;
use marketplace_storefront::services::rate_limit::RateLimitPolicies;
use marketplace_storefront::state::AppState;

/// A password that passes the strength rules.
pub const STRONG_PASSWORD: &str = "Str0ng!Pass";

/// The storefront router over a throwaway data directory.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    _data_dir: TempDir,
}

impl TestApp {
    /// An app over [`sample_catalog`] with default attempt budgets.
    pub fn new() -> Self {
        Self::with_rate_limits(RateLimitPolicies::default())
    }

    /// An app over [`sample_catalog`] with the given attempt budgets.
    pub fn with_rate_limits(rate_limits: RateLimitPolicies) -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig {
            data_dir: data_dir.path().to_path_buf(),
            rate_limits,
            ..StorefrontConfig::default()
        };

        let state = AppState::with_catalog(config, ProductCatalog::from_products(sample_catalog()));
        let router = marketplace_storefront::app(state.clone());

        Self {
            state,
            router,
            _data_dir: data_dir,
        }
    }

    /// Send a request through the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Send a prebuilt request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), cookie).await
    }

    /// Sign up, mark the email verified directly in the store, log in, and
    /// return the session cookie pair.
    pub async fn signed_in(&self, email: &str, username: &str) -> String {
        let signup = self
            .post("/api/auth/signup", signup_body(email, username), None)
            .await;
        assert_eq!(signup.status, StatusCode::CREATED, "{}", signup.body);

        let user_id: UserId = serde_json::from_value(signup.body["userId"].clone()).unwrap();
        UserRepository::new(self.state.store())
            .verify_email(user_id)
            .await
            .unwrap()
            .unwrap();

        let login = self
            .post(
                "/api/auth/login",
                serde_json::json!({ "email": email, "password": STRONG_PASSWORD }),
                None,
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);

        login.cookie_pair().unwrap()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The first `Set-Cookie` header, if any.
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    /// The `name=value` pair of the first `Set-Cookie` header, ready to send
    /// back in a `Cookie` header.
    pub fn cookie_pair(&self) -> Option<String> {
        self.set_cookie()
            .and_then(|c| c.split(';').next())
            .map(str::to_owned)
    }

    /// The `field` of the first entry in an `{"errors": [...]}` body.
    pub fn first_error_field(&self) -> Option<&str> {
        self.body["errors"][0]["field"].as_str()
    }
}

/// Build a product for catalog fixtures.
pub fn product(id: &str, name: &str, price: i64, category: &str, is_active: bool) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        description: format!("{name} for everyday use"),
        price,
        currency: CurrencyCode::USD,
        image_url: String::new(),
        category_id: CategoryId::new(category),
        seller_id: SellerId::new("seller-fixture"),
        stock: 10,
        is_active,
        created_at: now,
        updated_at: now,
    }
}

/// A small fixed catalog: four active products and one inactive one.
pub fn sample_catalog() -> Vec<Product> {
    vec![
        product("prod-watch", "Smart Watch", 19_999, "cat-electronics", true),
        product("prod-shirt", "Cotton T-Shirt", 2_499, "cat-clothing", true),
        product("prod-phones", "Wireless Headphones", 8_999, "cat-electronics", true),
        product("prod-novel", "Mystery Novel", 1_599, "cat-books", true),
        product("prod-retired", "Retired Gadget", 4_999, "cat-electronics", false),
    ]
}

/// A valid signup body for `email` / `username`.
pub fn signup_body(email: &str, username: &str) -> Value {
    serde_json::json!({
        "email": email,
        "password": STRONG_PASSWORD,
        "confirmPassword": STRONG_PASSWORD,
        "name": "Test User",
        "username": username,
    })
}

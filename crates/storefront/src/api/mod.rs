//! Client side of the shoe store REST API.
//!
//! # Architecture
//!
//! - The API is the source of truth for users, shoes, carts and orders
//! - Every call goes through the [`ShoeStoreApi`] trait so handlers can be
//!   tested against a mock
//! - [`ShoeStoreClient`] is the `reqwest` implementation used in production
//! - [`ProductCache`] keeps recently seen shoes for joining onto orders
//!
//! The API authenticates with a cookie it sets on `POST /login`. That cookie is
//! captured as [`ApiCredentials`], kept in the visitor's session, and replayed
//! on every request made on the visitor's behalf.

mod cache;
mod client;
pub mod types;

use core::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ys_shoe_core::{CartLineId, OrderId, ShoeId, UserId};

pub use cache::ProductCache;
pub use client::ShoeStoreClient;
pub use types::*;

/// Marker the API puts in error messages when a quantity exceeds stock.
const INSUFFICIENT_STOCK: &str = "not enough stock";

/// Errors that can occur when talking to the shoe store API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body was not the JSON we expected.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An endpoint path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Build an error from a non-success response body.
    ///
    /// JSON bodies contribute their `error` or `message` field; anything else
    /// is used verbatim when it is short enough to show.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        Self::Api {
            status: status.as_u16(),
            message: extract_message(body),
        }
    }

    /// The message the API gave, if it gave one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }

    /// The API's message, or `fallback` when there is none.
    #[must_use]
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message().unwrap_or(fallback)
    }

    /// Whether the API refused a quantity because stock ran out.
    #[must_use]
    pub fn is_insufficient_stock(&self) -> bool {
        self.message()
            .is_some_and(|m| m.to_ascii_lowercase().contains(INSUFFICIENT_STOCK))
    }

    /// Whether the record the call addressed does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Api { status: 404, .. })
    }
}

/// Pull a human readable message out of an error body.
fn extract_message(body: &str) -> String {
    let body = body.trim();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(serde_json::Value::String(message)) = map.get(key) {
                return message.trim().to_string();
            }
        }
        return String::new();
    }
    // HTML error pages and stack traces are not worth showing
    if body.starts_with('<') || body.len() > 200 {
        return String::new();
    }
    body.to_string()
}

// =============================================================================
// Credentials
// =============================================================================

/// The cookie pairs the API set at login.
///
/// Debug output is redacted; the value is a bearer credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiCredentials(String);

impl ApiCredentials {
    /// Collect the `name=value` pairs from `Set-Cookie` header values.
    ///
    /// Attributes such as `Path` and `HttpOnly` are dropped. Returns `None`
    /// when no header carried a cookie.
    pub fn from_set_cookie<'a>(headers: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let pairs: Vec<&str> = headers
            .into_iter()
            .filter_map(|header| header.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('=') && !pair.starts_with('='))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(Self(pairs.join("; ")))
        }
    }

    /// Value for an outgoing `Cookie` header.
    #[must_use]
    pub fn cookie_header(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiCredentials([REDACTED])")
    }
}

/// Who an API call is made for.
#[derive(Debug, Clone, Default)]
pub struct ApiSession {
    credentials: Option<ApiCredentials>,
}

impl ApiSession {
    /// A call made without API credentials.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { credentials: None }
    }

    /// A call made with whatever credentials the visitor holds.
    #[must_use]
    pub const fn new(credentials: Option<ApiCredentials>) -> Self {
        Self { credentials }
    }

    /// Credentials to replay, if any.
    #[must_use]
    pub const fn credentials(&self) -> Option<&ApiCredentials> {
        self.credentials.as_ref()
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: LoginResponse,
    pub credentials: Option<ApiCredentials>,
}

// =============================================================================
// ShoeStoreApi
// =============================================================================

/// Operations the storefront performs against the shoe store API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShoeStoreApi: Send + Sync {
    /// `POST /login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, ApiError>;

    /// `POST /customers`
    async fn register(&self, registration: &Registration) -> Result<(), ApiError>;

    /// `GET /shoes`
    async fn list_shoes(&self, session: &ApiSession) -> Result<Vec<Shoe>, ApiError>;

    /// `GET /shoes/{id}`
    async fn get_shoe(&self, session: &ApiSession, id: ShoeId) -> Result<Shoe, ApiError>;

    /// `DELETE /shoes/{id}`
    async fn delete_shoe(&self, session: &ApiSession, id: ShoeId) -> Result<(), ApiError>;

    /// `GET /cart/{customer_id}`
    async fn list_cart(
        &self,
        session: &ApiSession,
        customer: UserId,
    ) -> Result<Vec<CartLine>, ApiError>;

    /// `POST /cart`
    async fn add_to_cart(&self, session: &ApiSession, line: &NewCartLine) -> Result<(), ApiError>;

    /// `PUT /cart/{id}`
    async fn update_cart_line(
        &self,
        session: &ApiSession,
        id: CartLineId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// `DELETE /cart/{id}`
    async fn delete_cart_line(&self, session: &ApiSession, id: CartLineId)
    -> Result<(), ApiError>;

    /// `POST /orders`, returning the new order's id when the API reports it.
    async fn create_order(
        &self,
        session: &ApiSession,
        order: &NewOrder,
    ) -> Result<Option<OrderId>, ApiError>;

    /// `GET /orders`
    async fn list_orders(&self, session: &ApiSession) -> Result<Vec<Order>, ApiError>;

    /// `GET /orders/customer/{customer_id}`
    async fn list_customer_orders(
        &self,
        session: &ApiSession,
        customer: UserId,
    ) -> Result<Vec<Order>, ApiError>;

    /// `DELETE /orders/{id}`
    async fn delete_order(&self, session: &ApiSession, id: OrderId) -> Result<(), ApiError>;

    /// `GET /users`
    async fn list_users(&self, session: &ApiSession) -> Result<Vec<User>, ApiError>;

    /// `DELETE /users/{id}`
    async fn delete_user(&self, session: &ApiSession, id: UserId) -> Result<(), ApiError>;

    /// `POST /feedback`
    async fn submit_feedback(
        &self,
        session: &ApiSession,
        feedback: &NewFeedback,
    ) -> Result<(), ApiError>;

    /// Check that the API answers at all.
    async fn ping(&self) -> Result<(), ApiError>;
}

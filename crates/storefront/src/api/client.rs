//! `reqwest` implementation of [`ShoeStoreApi`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use ys_shoe_core::{CartLineId, OrderId, ShoeId, UserId};

use super::{
    ApiCredentials, ApiError, ApiSession, CartLine, LoginOutcome, LoginRequest, LoginResponse,
    NewCartLine, NewFeedback, NewOrder, Order, QuantityUpdate, Registration, ShoeStoreApi, Shoe,
    User,
};
use crate::config::ShoeApiConfig;

/// How much of an unexpected body is written to the logs.
const LOGGED_BODY_CHARS: usize = 500;

/// HTTP client for the shoe store REST API.
#[derive(Clone)]
pub struct ShoeStoreClient {
    inner: Arc<ShoeStoreClientInner>,
}

struct ShoeStoreClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ShoeStoreClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ShoeApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShoeStoreClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Start a request to `path`, replaying the session's credentials.
    fn request(
        &self,
        method: Method,
        path: &str,
        session: &ApiSession,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let mut builder = self.inner.client.request(method, url);
        if let Some(credentials) = session.credentials() {
            builder = builder.header(COOKIE, credentials.cookie_header());
        }
        Ok(builder)
    }

    /// Send a request and turn non-success statuses into [`ApiError::Api`].
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(
            status = %status,
            body = %truncate(&body),
            "Shoe store API returned non-success status"
        );
        Err(ApiError::from_response(status, &body))
    }

    /// Read a success body as JSON.
    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        parse(&text)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, session: &ApiSession) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path, session)?).await?;
        Self::json(response).await
    }

    async fn delete(&self, path: &str, session: &ApiSession) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, path, session)?)
            .await?;
        Ok(())
    }
}

fn parse<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %truncate(text),
            "Failed to parse shoe store API response"
        );
        ApiError::Parse(e.to_string())
    })
}

/// First characters of a body, for log lines.
fn truncate(body: &str) -> String {
    body.chars().take(LOGGED_BODY_CHARS).collect()
}

/// Find the new record's id in a create response such as `{"ID": 7}` or
/// `{"message": "...", "id": 7}`.
fn created_id(body: &str) -> Option<OrderId> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    ["ID", "id", "orderId", "order_id"]
        .iter()
        .find_map(|key| object.get(*key))
        .and_then(|id| match id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .map(OrderId::new)
}

#[async_trait]
impl ShoeStoreApi for ShoeStoreClient {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, ApiError> {
        let builder = self
            .request(Method::POST, "login", &ApiSession::anonymous())?
            .json(request);
        let response = self.send(builder).await?;

        let credentials = ApiCredentials::from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );
        let user: LoginResponse = Self::json(response).await?;
        debug!(user_id = %user.id, admin = user.admin, "Login accepted");

        Ok(LoginOutcome { user, credentials })
    }

    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let builder = self
            .request(Method::POST, "customers", &ApiSession::anonymous())?
            .json(registration);
        self.send(builder).await?;
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn list_shoes(&self, session: &ApiSession) -> Result<Vec<Shoe>, ApiError> {
        self.get("shoes", session).await
    }

    #[instrument(skip(self, session), fields(shoe_id = %id))]
    async fn get_shoe(&self, session: &ApiSession, id: ShoeId) -> Result<Shoe, ApiError> {
        let builder = self.request(Method::GET, &format!("shoes/{id}"), session)?;
        let response = match self.send(builder).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Err(ApiError::NotFound(format!("shoe {id}"))),
            Err(e) => return Err(e),
        };

        // A missing shoe comes back as `null` or an empty body on some routes
        let text = response.text().await?;
        let shoe: Option<Shoe> = if text.trim().is_empty() {
            None
        } else {
            parse(&text)?
        };
        shoe.ok_or_else(|| ApiError::NotFound(format!("shoe {id}")))
    }

    #[instrument(skip(self, session), fields(shoe_id = %id))]
    async fn delete_shoe(&self, session: &ApiSession, id: ShoeId) -> Result<(), ApiError> {
        self.delete(&format!("shoes/{id}"), session).await
    }

    #[instrument(skip(self, session), fields(customer_id = %customer))]
    async fn list_cart(
        &self,
        session: &ApiSession,
        customer: UserId,
    ) -> Result<Vec<CartLine>, ApiError> {
        self.get(&format!("cart/{customer}"), session).await
    }

    #[instrument(skip(self, session), fields(shoe_id = %line.shoe_id))]
    async fn add_to_cart(&self, session: &ApiSession, line: &NewCartLine) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, "cart", session)?.json(line);
        self.send(builder).await?;
        Ok(())
    }

    #[instrument(skip(self, session), fields(line_id = %id))]
    async fn update_cart_line(
        &self,
        session: &ApiSession,
        id: CartLineId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("cart/{id}"), session)?
            .json(&QuantityUpdate { quantity });
        self.send(builder).await?;
        Ok(())
    }

    #[instrument(skip(self, session), fields(line_id = %id))]
    async fn delete_cart_line(
        &self,
        session: &ApiSession,
        id: CartLineId,
    ) -> Result<(), ApiError> {
        self.delete(&format!("cart/{id}"), session).await
    }

    #[instrument(skip(self, session), fields(shoe_id = %order.shoe_id))]
    async fn create_order(
        &self,
        session: &ApiSession,
        order: &NewOrder,
    ) -> Result<Option<OrderId>, ApiError> {
        let builder = self.request(Method::POST, "orders", session)?.json(order);
        let response = self.send(builder).await?;
        let body = response.text().await?;
        Ok(created_id(&body))
    }

    #[instrument(skip(self, session))]
    async fn list_orders(&self, session: &ApiSession) -> Result<Vec<Order>, ApiError> {
        self.get("orders", session).await
    }

    #[instrument(skip(self, session), fields(customer_id = %customer))]
    async fn list_customer_orders(
        &self,
        session: &ApiSession,
        customer: UserId,
    ) -> Result<Vec<Order>, ApiError> {
        self.get(&format!("orders/customer/{customer}"), session)
            .await
    }

    #[instrument(skip(self, session), fields(order_id = %id))]
    async fn delete_order(&self, session: &ApiSession, id: OrderId) -> Result<(), ApiError> {
        self.delete(&format!("orders/{id}"), session).await
    }

    #[instrument(skip(self, session))]
    async fn list_users(&self, session: &ApiSession) -> Result<Vec<User>, ApiError> {
        self.get("users", session).await
    }

    #[instrument(skip(self, session), fields(user_id = %id))]
    async fn delete_user(&self, session: &ApiSession, id: UserId) -> Result<(), ApiError> {
        self.delete(&format!("users/{id}"), session).await
    }

    #[instrument(skip(self, session, feedback), fields(rating = %feedback.rating))]
    async fn submit_feedback(
        &self,
        session: &ApiSession,
        feedback: &NewFeedback,
    ) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, "feedback", session)?.json(feedback);
        self.send(builder).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), ApiError> {
        // Any HTTP answer means the API process is up
        self.inner
            .client
            .get(self.inner.base_url.clone())
            .send()
            .await?;
        Ok(())
    }
}

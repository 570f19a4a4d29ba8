//! Cart route handlers.
//!
//! The cart lives in the shoe store API. Every change is a form post that
//! redirects back to `/cart`, so the page is always rendered from a fresh
//! fetch rather than patched in place.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use ys_shoe_core::{CartLineId, Price};

use crate::api::{ApiSession, CartLine};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth, clear_cart_shadow, set_flash};
use crate::models::{Flash, Identity, ViewState};
use crate::services::checkout::checkout as run_checkout;
use crate::state::AppState;

const NOT_ENOUGH_STOCK: &str =
    "Sorry, there is not enough stock available for the requested quantity.";
const UPDATE_FAILED: &str = "Failed to update quantity. Please try again.";

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: CartLineId,
    pub name: String,
    pub brand: String,
    pub size: String,
    pub color: String,
    pub price: Price,
    pub quantity: u32,
    pub line_total: Price,
    /// Quantity the `-` control submits; `None` disables it.
    pub decrement_to: Option<u32>,
    /// Quantity the `+` control submits; `None` disables it.
    pub increment_to: Option<u32>,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let bounds = line.bounds();
        Self {
            id: line.id,
            name: line.name.clone(),
            brand: line.brand.clone(),
            size: line.size.clone(),
            color: line.color.clone(),
            price: line.price,
            quantity: line.quantity,
            line_total: line.line_total(),
            decrement_to: bounds.decremented(),
            increment_to: bounds.incremented(),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Price,
}

impl CartView {
    #[must_use]
    pub fn new(lines: &[CartLine]) -> Self {
        Self {
            lines: lines.iter().map(CartLineView::from).collect(),
            total: lines.iter().map(CartLine::line_total).sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub cart: ViewState<CartView>,
}

/// Shown after a successful checkout; forwards to `/orders` after two seconds.
#[derive(Template, WebTemplate)]
#[template(path = "cart/checkout_success.html")]
pub struct CheckoutSuccessTemplate {
    pub page: PageContext,
}

/// Quantity form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: u32,
}

async fn fetch_lines(state: &AppState, identity: &Identity) -> Result<Vec<CartLine>, ()> {
    state
        .api()
        .list_cart(&identity.api_session(), identity.user_id)
        .await
        .map_err(|e| tracing::warn!(error = %e, "Failed to fetch cart items"))
}

/// Display the cart.
#[instrument(skip(state, page, identity), fields(user_id = %identity.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    page: PageContext,
) -> impl IntoResponse {
    let cart = ViewState::from_result(
        fetch_lines(&state, &identity).await,
        "Failed to fetch cart items",
    )
    .map(|lines| CartView::new(&lines));

    CartTemplate { page, cart }
}

/// Set a cart line's quantity.
///
/// The requested quantity is checked against the line's current stock before
/// the API is asked to change it.
#[instrument(skip(state, session, identity, form), fields(user_id = %identity.user_id))]
pub async fn update_quantity(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(identity): RequireAuth,
    Path(line_id): Path<CartLineId>,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect, AppError> {
    let api_session = identity.api_session();

    let line = fetch_lines(&state, &identity)
        .await
        .ok()
        .and_then(|lines| lines.into_iter().find(|line| line.id == line_id));
    let Some(line) = line else {
        set_flash(&session, Flash::error(UPDATE_FAILED)).await?;
        return Ok(Redirect::to("/cart"));
    };

    if !line.bounds().permits(form.quantity) {
        tracing::debug!(
            quantity = form.quantity,
            stock = line.stock,
            "Quantity outside line bounds"
        );
        let message = if form.quantity > line.stock {
            NOT_ENOUGH_STOCK
        } else {
            UPDATE_FAILED
        };
        set_flash(&session, Flash::error(message)).await?;
        return Ok(Redirect::to("/cart"));
    }

    if let Err(e) = update_line(&state, &api_session, line_id, form.quantity).await {
        let message = if e.is_insufficient_stock() {
            NOT_ENOUGH_STOCK
        } else {
            UPDATE_FAILED
        };
        set_flash(&session, Flash::error(message)).await?;
    }

    Ok(Redirect::to("/cart"))
}

async fn update_line(
    state: &AppState,
    session: &ApiSession,
    line_id: CartLineId,
    quantity: u32,
) -> Result<(), crate::api::ApiError> {
    state
        .api()
        .update_cart_line(session, line_id, quantity)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to update cart quantity"))
}

/// Remove a cart line.
#[instrument(skip(state, session, identity), fields(user_id = %identity.user_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(identity): RequireAuth,
    Path(line_id): Path<CartLineId>,
) -> Result<Redirect, AppError> {
    if let Err(e) = state
        .api()
        .delete_cart_line(&identity.api_session(), line_id)
        .await
    {
        tracing::warn!(error = %e, "Failed to remove cart line");
        set_flash(&session, Flash::error("Failed to remove item")).await?;
    }

    Ok(Redirect::to("/cart"))
}

/// Turn every cart line into an order.
///
/// The cart is fetched fresh so the lines converted are the ones the API
/// holds, not whatever the page showed.
#[instrument(skip(state, session, identity), fields(user_id = %identity.user_id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(identity): RequireAuth,
) -> Result<Response, AppError> {
    let api_session = identity.api_session();

    let Ok(lines) = fetch_lines(&state, &identity).await else {
        set_flash(&session, Flash::error("Failed to fetch cart items")).await?;
        return Ok(Redirect::to("/cart").into_response());
    };

    if lines.is_empty() {
        set_flash(&session, Flash::notice("Your cart is empty")).await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    let report = run_checkout(state.api(), &api_session, identity.user_id, &lines).await;

    if let Some(failure) = report.failure {
        if failure.needs_attention() {
            tracing::error!(
                converted = report.converted.len(),
                "Checkout left an order and a cart line for the same shoe"
            );
        }
        let page = PageContext::load(&session).await?;
        return Ok(CartTemplate {
            page,
            cart: ViewState::Failed(failure.message().to_string()),
        }
        .into_response());
    }

    clear_cart_shadow(&session).await?;
    let orders = report.converted.len().to_string();
    add_breadcrumb("checkout", "Checkout complete", Some(&[("orders", orders.as_str())]));

    let page = PageContext::load(&session).await?;
    Ok(CheckoutSuccessTemplate { page }.into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use mockall::Sequence;
    use mockall::predicate::{always, eq};

    use super::*;
    use crate::api::{ApiError, MockShoeStoreApi};
    use crate::routes::test_support::{TestApp, body_text};
    use ys_shoe_core::{OrderId, ShoeId, UserId};

    fn line(id: i64, quantity: u32, stock: u32, price: &str) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            customer_id: Some(UserId::new(42)),
            shoe_id: ShoeId::new(id + 100),
            quantity,
            name: format!("Shoe {id}"),
            brand: "Bata".to_string(),
            size: "42".to_string(),
            color: "Black".to_string(),
            price: Price::parse_lenient(price),
            stock,
        }
    }

    #[tokio::test]
    async fn test_remove_refetches_cart_and_total() {
        let mut api = MockShoeStoreApi::new();
        let mut seq = Sequence::new();

        api.expect_list_cart()
            .with(always(), eq(UserId::new(42)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![line(1, 1, 5, "20"), line(2, 3, 5, "10.50")]));
        api.expect_delete_cart_line()
            .with(always(), eq(CartLineId::new(1)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        api.expect_list_cart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![line(2, 3, 5, "10.50")]));

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let body = body_text(app.get("/cart", Some(&cookie)).await).await;
        assert!(body.contains("Total: $51.50"));

        let response = app.post("/cart/1/remove", "", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/cart");

        let body = body_text(app.get("/cart", Some(&cookie)).await).await;
        assert!(!body.contains("Shoe 1"));
        assert!(body.contains("Shoe 2"));
        assert!(body.contains("Total: $31.50"));
    }

    #[tokio::test]
    async fn test_quantity_controls_respect_bounds() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_cart()
            .returning(|_, _| Ok(vec![line(1, 1, 1, "20")]));

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let body = body_text(app.get("/cart", Some(&cookie)).await).await;
        assert!(body.contains(r#"aria-label="Decrease quantity" disabled"#));
        assert!(body.contains(r#"aria-label="Increase quantity" disabled"#));
    }

    #[tokio::test]
    async fn test_quantity_above_stock_makes_no_update_call() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_cart()
            .returning(|_, _| Ok(vec![line(1, 2, 2, "20")]));
        api.expect_update_cart_line().never();

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let response = app
            .post("/cart/1/quantity", "quantity=3", Some(&cookie))
            .await;
        assert_eq!(response.headers()["location"], "/cart");

        let body = body_text(app.get("/cart", Some(&cookie)).await).await;
        assert!(body.contains(NOT_ENOUGH_STOCK));
    }

    #[tokio::test]
    async fn test_update_stock_error_from_api() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_cart()
            .returning(|_, _| Ok(vec![line(1, 1, 5, "20")]));
        api.expect_update_cart_line()
            .with(always(), eq(CartLineId::new(1)), eq(2))
            .times(1)
            .returning(|_, _, _| {
                Err(ApiError::Api {
                    status: 400,
                    message: "Not enough stock available".to_string(),
                })
            });

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        app.post("/cart/1/quantity", "quantity=2", Some(&cookie))
            .await;
        let body = body_text(app.get("/cart", Some(&cookie)).await).await;
        assert!(body.contains(NOT_ENOUGH_STOCK));
    }

    #[tokio::test]
    async fn test_checkout_success_page() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_cart()
            .returning(|_, _| Ok(vec![line(1, 2, 5, "20")]));
        api.expect_create_order()
            .times(1)
            .returning(|_, _| Ok(Some(OrderId::new(9))));
        api.expect_delete_cart_line()
            .times(1)
            .returning(|_, _| Ok(()));

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let response = app.post("/cart/checkout", "", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("Order placed successfully! Redirecting to orders..."));
        assert!(body.contains(r#"content="2;url=/orders""#));
    }

    #[tokio::test]
    async fn test_checkout_failure_renders_error() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_cart()
            .returning(|_, _| Ok(vec![line(1, 2, 5, "20"), line(2, 1, 5, "20")]));
        api.expect_create_order()
            .times(1)
            .returning(|_, _| Err(ApiError::Parse("boom".to_string())));
        api.expect_delete_cart_line().never();

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let body = body_text(app.post("/cart/checkout", "", Some(&cookie)).await).await;
        assert!(body.contains("Error: Failed to create order"));
    }

    #[tokio::test]
    async fn test_empty_cart_message() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_cart().returning(|_, _| Ok(vec![]));

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let body = body_text(app.get("/cart", Some(&cookie)).await).await;
        assert!(body.contains("Your cart is empty"));
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_flashes_notice() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_cart().times(2).returning(|_, _| Ok(vec![]));
        api.expect_create_order().never();
        api.expect_delete_cart_line().never();

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let response = app.post("/cart/checkout", "", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/cart");

        let body = body_text(app.get("/cart", Some(&cookie)).await).await;
        assert!(body.contains(r#"<div class="flash flash-notice" role="status">Your cart is empty</div>"#));
    }
}

//! Order history route handlers.
//!
//! Orders only reference a shoe id. Display fields are joined on through the
//! shared [`ProductCache`](crate::api::ProductCache); a shoe the catalog no
//! longer has renders with placeholders.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use ys_shoe_core::{OrderId, Price, ShoeId};

use crate::api::{Order, Shoe};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth, set_flash};
use crate::models::{Flash, ViewState};
use crate::state::AppState;

const UNKNOWN_SHOE: &str = "Unknown Shoe";
const NOT_AVAILABLE: &str = "N/A";

/// Order display data for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: OrderId,
    pub name: String,
    pub brand: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub total: Price,
}

impl OrderView {
    fn new(order: &Order, shoe: Option<&Shoe>) -> Self {
        let field = |value: Option<&String>, fallback: &str| {
            value
                .filter(|value| !value.is_empty())
                .map_or_else(|| fallback.to_string(), Clone::clone)
        };
        let unit_price = shoe.map_or(Price::ZERO, |shoe| shoe.price);

        Self {
            id: order.id,
            name: field(shoe.map(|s| &s.name), UNKNOWN_SHOE),
            brand: field(shoe.map(|s| &s.brand), NOT_AVAILABLE),
            size: field(shoe.map(|s| &s.size), NOT_AVAILABLE),
            color: field(shoe.map(|s| &s.color), NOT_AVAILABLE),
            quantity: order.quantity,
            unit_price,
            total: unit_price.times(order.quantity),
        }
    }
}

fn join(orders: &[Order], shoes: &HashMap<ShoeId, Shoe>) -> Vec<OrderView> {
    orders
        .iter()
        .map(|order| OrderView::new(order, shoes.get(&order.shoe_id)))
        .collect()
}

/// Orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: ViewState<Vec<OrderView>>,
}

impl OrdersTemplate {
    fn heading(&self) -> &'static str {
        if self.page.flags.admin {
            "All Orders"
        } else {
            "My Orders"
        }
    }
}

/// Display the visitor's orders, or every order for admins.
#[instrument(skip(state, page, identity), fields(user_id = %identity.user_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    page: PageContext,
) -> impl IntoResponse {
    let session = identity.api_session();

    let result = if identity.admin {
        state.api().list_orders(&session).await
    } else {
        state
            .api()
            .list_customer_orders(&session, identity.user_id)
            .await
    };

    let orders = match result {
        Ok(orders) => {
            let ids: Vec<ShoeId> = orders.iter().map(|o| o.shoe_id).collect();
            let shoes = state
                .products()
                .lookup_many(state.api(), &session, &ids)
                .await;
            ViewState::Loaded(join(&orders, &shoes))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch orders");
            ViewState::Failed("Failed to fetch orders".to_string())
        }
    };

    OrdersTemplate { page, orders }
}

/// Delete an order. Only admins may; anyone else is sent back without a call.
#[instrument(skip(state, session, identity), fields(user_id = %identity.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(identity): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Redirect, AppError> {
    if !identity.admin {
        tracing::warn!(order_id = %id, "Non-admin attempted order delete");
        return Ok(Redirect::to("/orders"));
    }

    match state.api().delete_order(&identity.api_session(), id).await {
        Ok(()) => tracing::info!(order_id = %id, "Order deleted"),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to delete order");
            set_flash(&session, Flash::error("Failed to delete order")).await?;
        }
    }

    Ok(Redirect::to("/orders"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::http::StatusCode;
    use mockall::predicate::{always, eq};

    use super::*;
    use crate::api::{ApiError, MockShoeStoreApi};
    use crate::routes::test_support::{TestApp, body_text, shoe};
    use ys_shoe_core::UserId;

    fn order(id: i64, shoe_id: i64, quantity: u32) -> Order {
        Order {
            id: OrderId::new(id),
            customer_id: UserId::new(42),
            shoe_id: ShoeId::new(shoe_id),
            quantity,
        }
    }

    #[test]
    fn test_join_uses_placeholders_for_missing_shoes() {
        let mut shoes = HashMap::new();
        shoes.insert(ShoeId::new(3), shoe(3, "Runner"));

        let views = join(&[order(1, 3, 2), order(2, 9, 4)], &shoes);

        assert_eq!(views[0].name, "Runner");
        assert_eq!(views[0].total.to_string(), "99.98");

        assert_eq!(views[1].name, UNKNOWN_SHOE);
        assert_eq!(views[1].brand, NOT_AVAILABLE);
        assert_eq!(views[1].unit_price, Price::ZERO);
        assert_eq!(views[1].total.to_string(), "0.00");
    }

    #[tokio::test]
    async fn test_customer_sees_own_orders() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_customer_orders()
            .with(always(), eq(UserId::new(42)))
            .times(1)
            .returning(|_, _| Ok(vec![order(7, 3, 1)]));
        api.expect_list_orders().never();
        api.expect_list_shoes()
            .times(1)
            .returning(|_| Ok(vec![shoe(3, "Runner")]));

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let body = body_text(app.get("/orders", Some(&cookie)).await).await;
        assert!(body.contains("My Orders"));
        assert!(body.contains("Order #7"));
        assert!(body.contains("Runner"));
        assert!(!body.contains("Delete Order"));
    }

    #[tokio::test]
    async fn test_orders_sharing_shoes_fetch_catalog_once() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_customer_orders()
            .returning(|_, _| Ok(vec![order(7, 3, 1), order(8, 3, 2), order(9, 5, 1)]));
        api.expect_list_shoes()
            .times(1)
            .returning(|_| Ok(vec![shoe(3, "Runner"), shoe(5, "Loafer")]));

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let response = app.get("/orders", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Order #8"));
        assert!(body.contains("Loafer"));
        assert!(body.contains("$99.98"));
    }

    #[tokio::test]
    async fn test_admin_sees_all_orders() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_orders().times(1).returning(|_| Ok(vec![]));
        api.expect_list_customer_orders().never();

        let app = TestApp::new(api);
        let cookie = app.login_as(1, true).await;

        let body = body_text(app.get("/orders", Some(&cookie)).await).await;
        assert!(body.contains("All Orders"));
        assert!(body.contains("No orders found"));
    }

    #[tokio::test]
    async fn test_fetch_failure_renders_error() {
        let mut api = MockShoeStoreApi::new();
        api.expect_list_customer_orders()
            .returning(|_, _| Err(ApiError::Parse("bad".to_string())));

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let body = body_text(app.get("/orders", Some(&cookie)).await).await;
        assert!(body.contains("Error: Failed to fetch orders"));
    }

    #[tokio::test]
    async fn test_non_admin_delete_makes_no_call() {
        let mut api = MockShoeStoreApi::new();
        api.expect_delete_order().never();

        let app = TestApp::new(api);
        let cookie = app.login_as(42, false).await;

        let response = app.post("/orders/7/delete", "", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/orders");
    }

    #[tokio::test]
    async fn test_admin_delete_calls_api() {
        let mut api = MockShoeStoreApi::new();
        api.expect_delete_order()
            .with(always(), eq(OrderId::new(7)))
            .times(1)
            .returning(|_, _| Ok(()));

        let app = TestApp::new(api);
        let cookie = app.login_as(1, true).await;

        let response = app.post("/orders/7/delete", "", Some(&cookie)).await;
        assert_eq!(response.headers()["location"], "/orders");
    }
}

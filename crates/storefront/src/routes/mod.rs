//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (shoe store API reachable)
//!
//! # Auth
//! GET  /login                   - Login page
//! POST /login                   - Login action (rate limited)
//! GET  /register                - Register page
//! POST /register                - Register action (rate limited)
//! POST /logout                  - Logout action
//!
//! # Catalog
//! GET  /shoes                   - Shoe grid
//! POST /shoes/{id}/cart         - Add one unit from the grid
//! GET  /shoes/{id}              - Shoe detail
//! POST /shoes/{id}/add          - Add one unit from the detail page
//!
//! # Cart (requires auth)
//! GET  /cart                    - Cart page
//! POST /cart/{line}/quantity    - Set a line's quantity
//! POST /cart/{line}/remove      - Remove a line
//! POST /cart/checkout           - Turn every line into an order
//!
//! # Orders (requires auth)
//! GET  /orders                  - Own orders, or all orders for admins
//! POST /orders/{id}/delete      - Delete an order (admin)
//!
//! # Admin (requires admin)
//! GET  /admin?tab=              - Users, shoes or orders table
//! POST /admin/users/{id}/delete
//! POST /admin/shoes/{id}/delete
//! POST /admin/orders/{id}/delete
//!
//! # Feedback (requires auth)
//! GET  /feedback                - Feedback form
//! POST /feedback                - Submit feedback
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod feedback;
pub mod home;
pub mod orders;
pub mod shoes;

#[cfg(test)]
pub mod test_support;

use axum::{
    Router,
    extract::State,
    handler::Handler,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions_moka_store::MokaStore;

use crate::middleware::{
    auth_rate_limiter, create_session_layer, create_session_store, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Only the form submissions are rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).post(auth::login.layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).post(auth::register.layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the catalog routes router.
pub fn shoe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shoes::index))
        .route("/{id}", get(shoes::show))
        .route("/{id}/cart", post(shoes::add_from_list))
        .route("/{id}/add", post(shoes::add_from_detail))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/{line_id}/quantity", post(cart::update_quantity))
        .route("/{line_id}/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}/delete", post(orders::delete))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/users/{id}/delete", post(admin::delete_user))
        .route("/shoes/{id}/delete", post(admin::delete_shoe))
        .route("/orders/{id}/delete", post(admin::delete_order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(auth_routes())
        .nest("/shoes", shoe_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
        .route("/feedback", get(feedback::show).post(feedback::submit))
}

/// Build the complete application with a fresh session store.
pub fn app(state: AppState) -> Router {
    let store = create_session_store(state.config());
    app_with_store(state, store)
}

/// Build the complete application over `store`.
pub fn app_with_store(state: AppState, store: MokaStore) -> Router {
    let session_layer = create_session_layer(store, state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the shoe store API does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.api().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Shoe store API unreachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::test_support::TestApp;
    use crate::api::{ApiError, MockShoeStoreApi};

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new(MockShoeStoreApi::new());
        let response = app.get("/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_api() {
        let mut api = MockShoeStoreApi::new();
        api.expect_ping()
            .returning(|| Err(ApiError::Parse("connection refused".to_string())));

        let app = TestApp::new(api);
        let response = app.get("/health/ready", None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_guarded_pages_redirect_anonymous_visitors() {
        let app = TestApp::new(MockShoeStoreApi::new());

        for (path, location) in [
            ("/cart", "/login"),
            ("/orders", "/login"),
            ("/feedback", "/login"),
            ("/admin", "/"),
        ] {
            let response = app.get(path, None).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(response.headers()["location"], location, "{path}");
        }
    }
}

//! Catalog route handlers.
//!
//! The listing and the detail page each have their own "Add to Cart" action
//! with slightly different behavior: the listing keeps the visitor on the grid
//! and updates the navbar count, the detail page confirms with a message and
//! remembers itself as the post-login destination.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use ys_shoe_core::ShoeId;

use crate::api::{ApiError, ApiSession, NewCartLine, Shoe};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, record_cart_add, set_flash, set_pending_target};
use crate::models::{Flash, PendingTarget, ViewState};
use crate::state::AppState;

const OUT_OF_STOCK: &str =
    "Sorry, this item is currently out of stock or not available in the requested quantity.";

/// Catalog grid template.
#[derive(Template, WebTemplate)]
#[template(path = "shoes/index.html")]
pub struct ShoesIndexTemplate {
    pub page: PageContext,
    pub shoes: ViewState<Vec<Shoe>>,
}

/// Shoe detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shoes/show.html")]
pub struct ShoeShowTemplate {
    pub page: PageContext,
    pub shoe: ViewState<Shoe>,
}

/// Display the catalog.
#[instrument(skip(state, page, identity))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    page: PageContext,
) -> impl IntoResponse {
    let session = identity
        .as_ref()
        .map_or_else(ApiSession::anonymous, |identity| identity.api_session());

    let shoes = match state.api().list_shoes(&session).await {
        Ok(shoes) => {
            state.products().prime(&shoes).await;
            ViewState::Loaded(shoes)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch shoes");
            ViewState::Failed("Failed to fetch shoes".to_string())
        }
    };

    ShoesIndexTemplate { page, shoes }
}

/// Add one unit of a shoe to the cart from the catalog grid.
///
/// Anonymous visitors are sent to `/login` without any API call.
#[instrument(skip(state, session, identity))]
pub async fn add_from_list(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(identity): OptionalAuth,
    Path(id): Path<ShoeId>,
) -> Result<Redirect, AppError> {
    let Some(identity) = identity else {
        return Ok(Redirect::to("/login"));
    };

    let line = NewCartLine::single(identity.user_id, id);
    match state.api().add_to_cart(&identity.api_session(), &line).await {
        Ok(()) => {
            record_cart_add(&session, id).await?;
            add_breadcrumb("cart", "Added shoe to cart", Some(&[("shoe_id", &id.to_string())]));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add to cart from catalog");
            let message = add_error_message(&e, "Failed to add item to cart");
            set_flash(&session, Flash::error(message)).await?;
        }
    }

    Ok(Redirect::to("/shoes"))
}

/// Display one shoe.
#[instrument(skip(state, page, identity))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    page: PageContext,
    Path(id): Path<ShoeId>,
) -> impl IntoResponse {
    let session = identity
        .as_ref()
        .map_or_else(ApiSession::anonymous, |identity| identity.api_session());

    let shoe = match state.api().get_shoe(&session, id).await {
        Ok(shoe) => ViewState::Loaded(shoe),
        Err(e) if e.is_not_found() => ViewState::Failed("Shoe not found".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch shoe details");
            ViewState::Failed("Failed to fetch shoe details".to_string())
        }
    };

    ShoeShowTemplate { page, shoe }
}

/// Add one unit of a shoe to the cart from its detail page.
///
/// Anonymous visitors are sent to `/login` and brought back here afterwards.
#[instrument(skip(state, session, identity))]
pub async fn add_from_detail(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(identity): OptionalAuth,
    Path(id): Path<ShoeId>,
) -> Result<Redirect, AppError> {
    let detail = format!("/shoes/{id}");

    let Some(identity) = identity else {
        if let Some(target) = PendingTarget::parse(&detail) {
            set_pending_target(&session, target).await?;
        }
        return Ok(Redirect::to("/login"));
    };

    let line = NewCartLine::single(identity.user_id, id);
    let flash = match state.api().add_to_cart(&identity.api_session(), &line).await {
        Ok(()) => Flash::success("Cart added successfully"),
        Err(e) if e.is_insufficient_stock() => Flash::error(OUT_OF_STOCK),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add to cart from detail page");
            Flash::error(add_error_message(&e, "Failed to add to cart"))
        }
    };
    set_flash(&session, flash).await?;

    Ok(Redirect::to(&detail))
}

/// The API's explanation of a failed add, or `fallback`.
fn add_error_message(error: &ApiError, fallback: &str) -> String {
    error.message_or(fallback).to_string()
}

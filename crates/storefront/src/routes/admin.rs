//! Admin panel route handlers.
//!
//! One page with three tabs. Only the selected tab's collection is fetched,
//! and each delete sends the admin back to the tab it came from.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use ys_shoe_core::{OrderId, ShoeId, UserId};

use crate::api::{ApiError, ApiSession, Order, Shoe, User};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin, set_flash};
use crate::models::{Flash, ViewState};
use crate::state::AppState;

/// The collection an admin is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdminTab {
    #[default]
    Users,
    Shoes,
    Orders,
}

impl AdminTab {
    pub const ALL: [Self; 3] = [Self::Users, Self::Shoes, Self::Orders];

    /// Read a `tab` query value; anything unrecognized shows users.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("shoes") => Self::Shoes,
            Some("orders") => Self::Orders,
            _ => Self::Users,
        }
    }

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Shoes => "shoes",
            Self::Orders => "orders",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Shoes => "Shoes",
            Self::Orders => "Orders",
        }
    }

    fn href(self) -> String {
        format!("/admin?tab={}", self.slug())
    }
}

/// `?tab=` query parameter.
#[derive(Debug, Deserialize)]
pub struct TabQuery {
    pub tab: Option<String>,
}

/// A users table row.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub user: User,
    /// The row is the admin looking at the page; its delete control is inert.
    pub is_self: bool,
}

/// The fetched collection for the selected tab.
#[derive(Debug, Clone)]
pub enum AdminData {
    Users(Vec<UserRow>),
    Shoes(Vec<Shoe>),
    Orders(Vec<Order>),
}

/// Admin panel template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminTemplate {
    pub page: PageContext,
    pub tab: AdminTab,
    pub data: ViewState<AdminData>,
}

impl AdminTemplate {
    fn users(&self) -> Option<&[UserRow]> {
        match self.data.loaded() {
            Some(AdminData::Users(rows)) => Some(rows),
            _ => None,
        }
    }

    fn shoes(&self) -> Option<&[Shoe]> {
        match self.data.loaded() {
            Some(AdminData::Shoes(shoes)) => Some(shoes),
            _ => None,
        }
    }

    fn orders(&self) -> Option<&[Order]> {
        match self.data.loaded() {
            Some(AdminData::Orders(orders)) => Some(orders),
            _ => None,
        }
    }
}

async fn fetch_tab(
    state: &AppState,
    session: &ApiSession,
    tab: AdminTab,
    admin_id: UserId,
) -> ViewState<AdminData> {
    let api = state.api();
    let result = match tab {
        AdminTab::Users => api.list_users(session).await.map(|users| {
            AdminData::Users(
                users
                    .into_iter()
                    .map(|user| UserRow {
                        is_self: user.id == admin_id,
                        user,
                    })
                    .collect(),
            )
        }),
        AdminTab::Shoes => api.list_shoes(session).await.map(AdminData::Shoes),
        AdminTab::Orders => api.list_orders(session).await.map(AdminData::Orders),
    };

    match result {
        Ok(data) => ViewState::Loaded(data),
        Err(e) => {
            tracing::warn!(error = %e, tab = tab.slug(), "Failed to fetch admin data");
            ViewState::Failed(format!("Failed to fetch {}", tab.slug()))
        }
    }
}

/// Display the admin panel.
#[instrument(skip(state, page, identity, query), fields(user_id = %identity.user_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(identity): RequireAdmin,
    page: PageContext,
    Query(query): Query<TabQuery>,
) -> impl IntoResponse {
    let tab = AdminTab::parse(query.tab.as_deref());
    let data = fetch_tab(&state, &identity.api_session(), tab, identity.user_id).await;

    AdminTemplate { page, tab, data }
}

/// Flash the API's explanation of a failed delete, or `fallback`.
async fn flash_delete_error(
    session: &Session,
    error: &ApiError,
    fallback: &str,
) -> Result<(), AppError> {
    tracing::warn!(error = %error, "{fallback}");
    set_flash(session, Flash::error(error.message_or(fallback))).await?;
    Ok(())
}

/// Delete a user. Deleting yourself is refused without an API call.
#[instrument(skip(state, session, identity), fields(user_id = %identity.user_id))]
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Redirect, AppError> {
    if id == identity.user_id {
        set_flash(&session, Flash::error("You cannot delete your own account")).await?;
        return Ok(Redirect::to(&AdminTab::Users.href()));
    }

    match state.api().delete_user(&identity.api_session(), id).await {
        Ok(()) => {
            let deleted = id.to_string();
            add_breadcrumb("admin", "Deleted user", Some(&[("user_id", deleted.as_str())]));
        }
        Err(e) => flash_delete_error(&session, &e, "Failed to delete user").await?,
    }

    Ok(Redirect::to(&AdminTab::Users.href()))
}

/// Delete a shoe and drop it from the product cache.
#[instrument(skip(state, session, identity), fields(user_id = %identity.user_id))]
pub async fn delete_shoe(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<ShoeId>,
) -> Result<Redirect, AppError> {
    match state.api().delete_shoe(&identity.api_session(), id).await {
        Ok(()) => {
            state.products().invalidate(id).await;
            let deleted = id.to_string();
            add_breadcrumb("admin", "Deleted shoe", Some(&[("shoe_id", deleted.as_str())]));
        }
        Err(e) => flash_delete_error(&session, &e, "Failed to delete shoe").await?,
    }

    Ok(Redirect::to(&AdminTab::Shoes.href()))
}

/// Delete an order.
#[instrument(skip(state, session, identity), fields(user_id = %identity.user_id))]
pub async fn delete_order(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Redirect, AppError> {
    match state.api().delete_order(&identity.api_session(), id).await {
        Ok(()) => {
            let deleted = id.to_string();
            add_breadcrumb("admin", "Deleted order", Some(&[("order_id", deleted.as_str())]));
        }
        Err(e) => flash_delete_error(&session, &e, "Failed to delete order").await?,
    }

    Ok(Redirect::to(&AdminTab::Orders.href()))
}

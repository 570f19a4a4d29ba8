//! Per-page layout context.
//!
//! Every full page renders the navbar and the flash banner, which need the
//! session flags, the cart shadow count and the pending flash. Extracting a
//! [`PageContext`] takes (and so consumes) the flash.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::session::{cart_shadow, take_flash};
use crate::models::{Flash, Identity, SessionFlags, session_keys};

/// Layout data shared by every rendered page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub flags: SessionFlags,
    pub cart_count: u32,
    pub flash: Option<Flash>,
}

impl PageContext {
    /// Build the context from a session, consuming its flash.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(session: &Session) -> Result<Self, AppError> {
        let identity = session.get::<Identity>(session_keys::IDENTITY).await?;
        let flags = SessionFlags::from_identity(identity.as_ref());
        let cart_count = if flags.logged_in {
            cart_shadow(session).await?.item_count()
        } else {
            0
        };

        Ok(Self {
            flags,
            cart_count,
            flash: take_flash(session).await?,
        })
    }

    /// Whether the navbar shows a cart count badge.
    #[must_use]
    pub const fn has_cart_badge(&self) -> bool {
        self.cart_count > 0
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;
        Self::load(session).await
    }
}

//! Session middleware configuration and session-stored state helpers.
//!
//! Sessions live in process memory: the storefront keeps nothing durable of
//! its own, and a restart simply logs everyone out. The store is a moka cache
//! bounded by `SESSION_STORE_CAPACITY`; each record is evicted once its expiry
//! date passes, and the least recently used go first when the bound is hit.

use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_moka_store::MokaStore;

use crate::config::StorefrontConfig;
use crate::models::{CartShadow, Flash, PendingTarget, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ys_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Create the bounded in-memory session store.
#[must_use]
pub fn create_session_store(config: &StorefrontConfig) -> MokaStore {
    MokaStore::new(Some(config.session_capacity))
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer(
    store: MokaStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<MokaStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

// =============================================================================
// Flash
// =============================================================================

/// Queue a message for the next rendered page, replacing any pending one.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(session: &Session, flash: Flash) -> SessionResult<()> {
    session.insert(session_keys::FLASH, flash).await
}

/// Take the pending message; it is shown once.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn take_flash(session: &Session) -> SessionResult<Option<Flash>> {
    session.remove::<Flash>(session_keys::FLASH).await
}

// =============================================================================
// Pending navigation target
// =============================================================================

/// Remember where to send the visitor after they log in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_pending_target(session: &Session, target: PendingTarget) -> SessionResult<()> {
    session.insert(session_keys::PENDING_TARGET, target).await
}

/// Take the remembered target, clearing it.
///
/// A stored value that fails validation is dropped rather than returned.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn take_pending_target(session: &Session) -> SessionResult<Option<PendingTarget>> {
    match session
        .remove::<PendingTarget>(session_keys::PENDING_TARGET)
        .await
    {
        Ok(target) => Ok(target),
        Err(tower_sessions::session::Error::SerdeJson(e)) => {
            tracing::warn!(error = %e, "Discarding unreadable pending target");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// Cart shadow
// =============================================================================

/// The cart shadow, empty if none has been stored.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn cart_shadow(session: &Session) -> SessionResult<CartShadow> {
    Ok(session
        .get::<CartShadow>(session_keys::CART_SHADOW)
        .await?
        .unwrap_or_default())
}

/// Record one more unit of a shoe in the cart shadow.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn record_cart_add(session: &Session, shoe_id: ys_shoe_core::ShoeId) -> SessionResult<()> {
    let mut shadow = cart_shadow(session).await?;
    shadow.add(shoe_id);
    session.insert(session_keys::CART_SHADOW, shadow).await
}

/// Forget the cart shadow (after checkout or logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_cart_shadow(session: &Session) -> SessionResult<()> {
    session
        .remove::<CartShadow>(session_keys::CART_SHADOW)
        .await?;
    Ok(())
}

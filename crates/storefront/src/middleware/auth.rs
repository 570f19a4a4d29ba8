//! Authentication extractors and identity helpers.
//!
//! The identity written at login is the only thing that makes a visitor
//! "logged in"; the API credentials inside it are what make API calls work.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{Identity, session_keys};

/// Error returned when a guarded page is requested without the right identity.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in; send to the login page.
    RedirectToLogin,
    /// Logged in without admin rights; send home.
    RedirectHome,
    /// The session layer is missing or the store failed.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::SessionUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Read the identity from the request's session.
async fn identity_from_parts(parts: &Parts) -> Result<Option<Identity>, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::SessionUnavailable)?;

    session
        .get::<Identity>(session_keys::IDENTITY)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read identity from session");
            AuthRejection::SessionUnavailable
        })
}

/// Extractor that requires a logged-in user.
///
/// Visitors without an identity are redirected to `/login`.
///
/// # Example
///
/// ```rust,ignore
/// async fn cart(RequireAuth(identity): RequireAuth) -> impl IntoResponse {
///     format!("Cart for user {}", identity.user_id)
/// }
/// ```
pub struct RequireAuth(pub Identity);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)
            .await?
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that requires an administrator.
///
/// Anyone else, logged in or not, is redirected to `/`.
pub struct RequireAdmin(pub Identity);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match identity_from_parts(parts).await? {
            Some(identity) if identity.admin => Ok(Self(identity)),
            _ => Err(AuthRejection::RedirectHome),
        }
    }
}

/// Extractor that optionally gets the logged-in user.
pub struct OptionalAuth(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts).await.map(Self)
    }
}

/// Store the identity after a successful login.
///
/// The session id is rotated first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_identity(
    session: &Session,
    identity: &Identity,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::IDENTITY, identity).await?;
    set_sentry_user(&identity.user_id);
    Ok(())
}

/// Forget everything the session holds (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn clear_identity(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await?;
    clear_sentry_user();
    Ok(())
}

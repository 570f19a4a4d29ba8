//! Authentication route handlers.
//!
//! Login and registration are delegated to the shoe store API. A successful
//! login stores an [`Identity`] (user id, admin flag and the API's cookie) in
//! the visitor's session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use ys_shoe_core::Email;

use crate::api::{ApiError, LoginRequest, Registration};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{PageContext, clear_identity, set_identity, take_pending_target};
use crate::models::Identity;
use crate::state::AppState;

/// Expires the `token` cookie older clients of the API left on this origin.
const EXPIRE_TOKEN_COOKIE: &str = "token=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
    pub error: Option<String>,
}

/// Registration success page template.
///
/// Sends the browser on to `/login` after two seconds.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_success.html")]
pub struct RegisterSuccessTemplate {
    pub page: PageContext,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip_all)]
pub async fn login_page(page: PageContext) -> impl IntoResponse {
    LoginTemplate {
        page,
        email: String::new(),
        error: None,
    }
}

/// Handle login form submission.
///
/// Lands admins on `/admin`, everyone else on the page they were sent to
/// login from, or on `/`.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(LoginTemplate {
            page,
            email: form.email,
            error: Some("Please enter a valid email address".to_string()),
        }
        .into_response());
    };

    let request = LoginRequest {
        email,
        password: form.password,
    };

    let outcome = match state.api().login(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return Ok(LoginTemplate {
                page,
                email: request.email.into_inner(),
                error: Some(login_error_message(&e).to_string()),
            }
            .into_response());
        }
    };

    let identity = Identity {
        user_id: outcome.user.id,
        admin: outcome.user.admin,
        credentials: outcome.credentials,
    };
    // The pending target is read even for admins so it never outlives a login
    let pending = take_pending_target(&session).await?;
    set_identity(&session, &identity).await?;
    add_breadcrumb("auth", "Logged in", None);

    let destination = if identity.admin {
        "/admin".to_string()
    } else {
        pending.map_or_else(|| "/".to_string(), String::from)
    };

    tracing::info!(user_id = %identity.user_id, admin = identity.admin, "User logged in");
    Ok(Redirect::to(&destination).into_response())
}

/// Message for a failed login: the API's own, or a generic one.
fn login_error_message(error: &ApiError) -> &str {
    match error {
        ApiError::Http(_) => "An error occurred during login",
        _ => error.message_or("Login failed"),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip_all)]
pub async fn register_page(page: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        page,
        name: String::new(),
        email: String::new(),
        error: None,
    }
}

/// Handle registration form submission.
///
/// The new account is not logged in; the success page forwards to `/login`.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    page: PageContext,
    Form(form): Form<RegisterForm>,
) -> Response {
    let name = form.name.trim().to_string();
    let failed = |page, error: &str| {
        RegisterTemplate {
            page,
            name: form.name.clone(),
            email: form.email.clone(),
            error: Some(error.to_string()),
        }
        .into_response()
    };

    if name.is_empty() {
        return failed(page, "Please enter your name");
    }
    let Ok(email) = Email::parse(&form.email) else {
        return failed(page, "Please enter a valid email address");
    };

    let registration = Registration {
        name,
        email,
        password: form.password.clone(),
    };

    match state.api().register(&registration).await {
        Ok(()) => {
            tracing::info!(email = %registration.email, "Customer registered");
            RegisterSuccessTemplate { page }.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            failed(page, "Registration failed")
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// Destroys the session (identity, cart shadow, pending target and flash)
/// and expires the session cookie along with the legacy `token` cookie.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<impl IntoResponse, AppError> {
    clear_identity(&session).await?;
    Ok((
        AppendHeaders([(SET_COOKIE, EXPIRE_TOKEN_COOKIE)]),
        Redirect::to("/"),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::api::{LoginOutcome, LoginResponse, MockShoeStoreApi};
    use crate::routes::test_support::{TestApp, body_text};
    use ys_shoe_core::UserId;

    fn customer_login() -> LoginOutcome {
        LoginOutcome {
            user: LoginResponse {
                id: UserId::new(42),
                admin: false,
            },
            credentials: None,
        }
    }

    #[test]
    fn test_login_error_message_prefers_api_text() {
        let err = ApiError::Api {
            status: 401,
            message: "Invalid email or password".to_string(),
        };
        assert_eq!(login_error_message(&err), "Invalid email or password");

        let err = ApiError::Api {
            status: 401,
            message: String::new(),
        };
        assert_eq!(login_error_message(&err), "Login failed");
    }

    #[tokio::test]
    async fn test_login_lands_customer_home() {
        let mut api = MockShoeStoreApi::new();
        api.expect_login()
            .withf(|request| request.email.as_str() == "sami@ysshoestore.eg")
            .times(1)
            .returning(|_| Ok(customer_login()));

        let app = TestApp::new(api);
        let response = app
            .post("/login", "email=sami%40ysshoestore.eg&password=pw", None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/");
        assert!(TestApp::session_cookie(&response).is_some());
    }

    #[tokio::test]
    async fn test_login_failure_shows_api_message() {
        let mut api = MockShoeStoreApi::new();
        api.expect_login().returning(|_| {
            Err(ApiError::Api {
                status: 401,
                message: "Invalid email or password".to_string(),
            })
        });

        let app = TestApp::new(api);
        let response = app
            .post("/login", "email=sami%40ysshoestore.eg&password=nope", None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("Invalid email or password"));
        assert!(body.contains("sami@ysshoestore.eg"));
    }

    #[tokio::test]
    async fn test_invalid_email_makes_no_call() {
        let mut api = MockShoeStoreApi::new();
        api.expect_login().never();

        let app = TestApp::new(api);
        let body = body_text(app.post("/login", "email=sami&password=pw", None).await).await;
        assert!(body.contains("Please enter a valid email address"));
    }

    #[tokio::test]
    async fn test_register_success_forwards_to_login() {
        let mut api = MockShoeStoreApi::new();
        api.expect_register()
            .withf(|registration| {
                registration.name == "Sami" && registration.email.as_str() == "sami@ysshoestore.eg"
            })
            .times(1)
            .returning(|_| Ok(()));

        let app = TestApp::new(api);
        let body = body_text(
            app.post(
                "/register",
                "name=Sami&email=sami%40ysshoestore.eg&password=pw",
                None,
            )
            .await,
        )
        .await;
        assert!(body.contains("Registration successful! Redirecting to login..."));
        assert!(body.contains(r#"content="2;url=/login""#));
    }

    #[tokio::test]
    async fn test_register_failure_keeps_form() {
        let mut api = MockShoeStoreApi::new();
        api.expect_register().returning(|_| {
            Err(ApiError::Api {
                status: 409,
                message: "Email already registered".to_string(),
            })
        });

        let app = TestApp::new(api);
        let body = body_text(
            app.post(
                "/register",
                "name=Sami&email=sami%40ysshoestore.eg&password=pw",
                None,
            )
            .await,
        )
        .await;
        assert!(body.contains("Registration failed"));
        assert!(body.contains(r#"value="Sami""#));
    }

    #[tokio::test]
    async fn test_logout_forgets_identity() {
        let app = TestApp::new(MockShoeStoreApi::new());
        let cookie = app.login_as(42, false).await;

        let response = app.post("/logout", "", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/");
        assert!(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .any(|value| value.to_str().unwrap().starts_with("token=;"))
        );

        let response = app.get("/cart", Some(&cookie)).await;
        assert_eq!(response.headers()["location"], "/login");
    }
}

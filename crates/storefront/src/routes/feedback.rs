//! Feedback form route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use ys_shoe_core::{Rating, UserId};

use crate::api::NewFeedback;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, RequireAuth, set_flash};
use crate::models::Flash;
use crate::state::AppState;

const SELECT_RATING: &str = "Please select a rating";

/// Feedback form data.
///
/// `rating` is kept as text so a missing or garbled value reaches validation
/// instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct FeedbackForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

impl FeedbackForm {
    /// Selected star count; zero when nothing usable was sent.
    fn stars(&self) -> u8 {
        self.rating.trim().parse().unwrap_or(0)
    }

    /// Check the form in the order the shopper sees the fields.
    fn validate(&self, customer_id: UserId) -> Result<NewFeedback, &'static str> {
        let stars = self.stars();
        if stars == 0 {
            return Err(SELECT_RATING);
        }
        if self.comment.trim().is_empty() {
            return Err("Please provide feedback");
        }
        let rating = Rating::new(stars).map_err(|_| SELECT_RATING)?;

        Ok(NewFeedback {
            customer_id,
            rating,
            comment: self.comment.clone(),
        })
    }
}

/// Feedback page template.
#[derive(Template, WebTemplate)]
#[template(path = "feedback/show.html")]
pub struct FeedbackTemplate {
    pub page: PageContext,
    pub rating: u8,
    pub comment: String,
    pub error: Option<String>,
}

impl FeedbackTemplate {
    fn blank(page: PageContext) -> Self {
        Self {
            page,
            rating: 0,
            comment: String::new(),
            error: None,
        }
    }
}

/// Display the feedback form.
#[instrument(skip_all)]
pub async fn show(RequireAuth(_identity): RequireAuth, page: PageContext) -> impl IntoResponse {
    FeedbackTemplate::blank(page)
}

/// Handle feedback form submission.
///
/// Nothing is sent to the API until the form passes validation.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(identity): OptionalAuth,
    page: PageContext,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    let Some(identity) = identity else {
        set_flash(&session, Flash::error("Please login to submit feedback")).await?;
        return Ok(Redirect::to("/login").into_response());
    };

    let rejected = |page, error: &str| FeedbackTemplate {
        page,
        rating: form.stars(),
        comment: form.comment.clone(),
        error: Some(error.to_string()),
    };

    let feedback = match form.validate(identity.user_id) {
        Ok(feedback) => feedback,
        Err(message) => return Ok(rejected(page, message).into_response()),
    };

    match state
        .api()
        .submit_feedback(&identity.api_session(), &feedback)
        .await
    {
        Ok(()) => {
            add_breadcrumb("feedback", "Submitted feedback", None);
            tracing::info!(user_id = %identity.user_id, rating = %feedback.rating, "Feedback submitted");
            set_flash(&session, Flash::success("Thank you for your feedback!")).await?;
            Ok(Redirect::to("/feedback").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to submit feedback");
            Ok(rejected(page, e.message_or("Failed to submit feedback")).into_response())
        }
    }
}

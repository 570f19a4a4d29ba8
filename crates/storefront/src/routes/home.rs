//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;
use crate::middleware::PageContext;

/// A line of the business hours block.
pub struct OpeningHours {
    pub days: &'static str,
    pub hours: &'static str,
}

/// Store contact details shown on the home page.
pub struct StoreInfo {
    pub address: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub hours: [OpeningHours; 2],
}

pub const STORE_INFO: StoreInfo = StoreInfo {
    address: "45 El-Tahrir Street, Cairo, Egypt",
    phone: "+20 2 2345-6789",
    email: "contact@ysshoestore.eg",
    hours: [
        OpeningHours {
            days: "Thursday - Saturday",
            hours: "10:00 AM - 10:00 PM",
        },
        OpeningHours {
            days: "Sunday - Wednesday",
            hours: "2:00 PM - 10:00 PM",
        },
    ],
};

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub store: &'static StoreInfo,
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(page: PageContext) -> impl IntoResponse {
    HomeTemplate {
        page,
        store: &STORE_INFO,
    }
}

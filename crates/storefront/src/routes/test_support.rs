//! Router harness for handler tests.
//!
//! Builds the full application around a [`MockShoeStoreApi`] and drives it
//! with `oneshot` requests. Sessions are carried between requests by passing
//! the `ys_session` cookie back in explicitly.

#![allow(clippy::unwrap_used)]

use std::net::Ipv4Addr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{
        Request,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    response::Response,
};
use tower::ServiceExt;
use tower_sessions::Session;
use tower_sessions_moka_store::MokaStore;
use url::Url;

use ys_shoe_core::{Price, ShoeId, UserId};

use crate::api::{MockShoeStoreApi, Shoe};
use crate::config::{ShoeApiConfig, StorefrontConfig};
use crate::middleware::session::{SESSION_COOKIE_NAME, create_session_store};
use crate::models::{Identity, session_keys};
use crate::state::AppState;

pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        api: ShoeApiConfig::new(Url::parse("http://localhost:5555/").unwrap()),
        session_capacity: 1_000,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The application under test plus the session store behind it.
pub struct TestApp {
    router: Router,
    store: MokaStore,
}

impl TestApp {
    pub fn new(api: MockShoeStoreApi) -> Self {
        let state = AppState::with_api(test_config(), Arc::new(api));
        let store = create_session_store(state.config());
        Self {
            router: super::app_with_store(state, store.clone()),
            store,
        }
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::get(path);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    /// POST a urlencoded form body.
    pub async fn post(&self, path: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::post(path).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Store a logged-in identity directly and return its session cookie.
    pub async fn login_as(&self, user_id: i64, admin: bool) -> String {
        let session = Session::new(None, Arc::new(self.store.clone()), None);
        let identity = Identity {
            user_id: UserId::new(user_id),
            admin,
            credentials: None,
        };
        session
            .insert(session_keys::IDENTITY, identity)
            .await
            .unwrap();
        session.save().await.unwrap();
        format!("{SESSION_COOKIE_NAME}={}", session.id().unwrap())
    }

    /// The `name=value` pair of the session cookie a response set.
    pub fn session_cookie(response: &Response) -> Option<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
            .and_then(|value| value.split(';').next())
            .map(String::from)
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn shoe(id: i64, name: &str) -> Shoe {
    Shoe {
        id: ShoeId::new(id),
        name: name.to_string(),
        brand: "Bata".to_string(),
        size: "42".to_string(),
        color: "Black".to_string(),
        price: Price::parse_lenient("49.99"),
        stock: 5,
        description: format!("{name} in black leather"),
    }
}

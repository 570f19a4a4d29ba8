//! Session-related types.
//!
//! Everything the storefront remembers about a browser between requests lives
//! in its `tower-sessions` session under the keys in [`keys`].

use serde::{Deserialize, Serialize};

use ys_shoe_core::{ShoeId, UserId};

use crate::api::{ApiCredentials, ApiSession};

/// Session-stored identity of the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// User id as issued by the API.
    pub user_id: UserId,
    /// Whether the API reported the user as an administrator.
    pub admin: bool,
    /// Cookie the API set at login.
    pub credentials: Option<ApiCredentials>,
}

impl Identity {
    /// Context for API calls made on this user's behalf.
    #[must_use]
    pub fn api_session(&self) -> ApiSession {
        ApiSession::new(self.credentials.clone())
    }

    /// Flags derived from this identity.
    #[must_use]
    pub const fn flags(&self) -> SessionFlags {
        SessionFlags {
            logged_in: true,
            admin: self.admin,
            user_id: Some(self.user_id),
        }
    }
}

/// What the navigation and guarded pages need to know about the visitor.
///
/// A visitor without an [`Identity`] has the default flags: logged out, not
/// an admin, no user id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFlags {
    pub logged_in: bool,
    pub admin: bool,
    pub user_id: Option<UserId>,
}

impl SessionFlags {
    /// Flags for an optional identity.
    #[must_use]
    pub fn from_identity(identity: Option<&Identity>) -> Self {
        identity.map(Identity::flags).unwrap_or_default()
    }
}

/// One entry of the cart shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowLine {
    pub shoe_id: ShoeId,
    pub quantity: u32,
}

/// Local record of items added from the catalog during this session.
///
/// The API's cart is authoritative; the shadow only feeds the navbar badge
/// and is cleared on checkout and logout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartShadow {
    lines: Vec<ShadowLine>,
}

impl CartShadow {
    /// Record one more unit of `shoe_id`.
    pub fn add(&mut self, shoe_id: ShoeId) {
        match self.lines.iter_mut().find(|line| line.shoe_id == shoe_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(ShadowLine {
                shoe_id,
                quantity: 1,
            }),
        }
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |total, line| total.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn lines(&self) -> &[ShadowLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A page to return to after logging in.
///
/// Only same-site absolute paths are accepted so the login form cannot be used
/// as an open redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PendingTarget(String);

impl PendingTarget {
    /// Accept `path` if it is a local path such as `/shoes/3`.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let local = path.starts_with('/')
            && !path.starts_with("//")
            && !path.contains('\\')
            && !path.chars().any(char::is_control);
        local.then(|| Self(path.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PendingTarget {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(value)
    }
}

impl From<PendingTarget> for String {
    fn from(target: PendingTarget) -> Self {
        target.0
    }
}

/// Severity of a [`Flash`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Error,
    Success,
    Notice,
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Notice,
            message: message.into(),
        }
    }

    /// CSS class for the message banner.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Error => "flash flash-error",
            FlashKind::Success => "flash flash-success",
            FlashKind::Notice => "flash flash-notice",
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for the logged-in user's [`Identity`](super::Identity).
    pub const IDENTITY: &str = "identity";

    /// Key for the [`CartShadow`](super::CartShadow).
    pub const CART_SHADOW: &str = "cart_shadow";

    /// Key for the [`PendingTarget`](super::PendingTarget).
    pub const PENDING_TARGET: &str = "pending_target";

    /// Key for the single-slot [`Flash`](super::Flash).
    pub const FLASH: &str = "flash";
}

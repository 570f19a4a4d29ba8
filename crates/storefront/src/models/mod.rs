//! Domain models for the storefront.

pub mod session;
pub mod view;

pub use session::{
    CartShadow, Flash, FlashKind, Identity, PendingTarget, SessionFlags, ShadowLine,
    keys as session_keys,
};
pub use view::ViewState;

//! Core types for the shoe store.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod quantity;
pub mod rating;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use quantity::LineQuantity;
pub use rating::{Rating, RatingError};

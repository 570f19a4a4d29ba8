//! Business logic services for storefront.
//!
//! # Services
//!
//! - `checkout` - Convert cart lines into orders, compensating on partial failure

pub mod checkout;

pub use checkout::{CheckoutFailure, CheckoutReport, Compensation, ConvertedLine, checkout};

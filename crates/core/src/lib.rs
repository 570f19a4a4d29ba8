//! YS Shoe Store Core - Shared types library.
//!
//! This crate provides the types shared by the storefront binary and its
//! tests. It contains only types and pure rules - no I/O, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, ratings and cart
//!   quantities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

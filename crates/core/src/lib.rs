//! Headless Demo Core - Shared types library.
//!
//! This crate provides common types used by the storefront and its tests.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Anything
//! that talks to the commerce service lives in the storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Token bundles, string IDs, prices, and cart status

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Domain services built on the commerce client.

pub mod catalog;

//! HTTP route handlers.

pub mod auth;
pub mod categories;
pub mod health;
pub mod instances;
pub mod links;
pub mod questions;
pub mod seo;

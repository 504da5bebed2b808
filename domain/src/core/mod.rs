//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] / [`error::ValidationError`]: domain-level errors
//! - [`facts::Facts`]: the flat fact map used by context, tools and observations
//! - [`json`]: extraction of JSON objects embedded in oracle text
//! - [`string`]: small string helpers

pub mod error;
pub mod facts;
pub mod json;
pub mod string;

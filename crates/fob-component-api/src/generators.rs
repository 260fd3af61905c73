//! Output renderers.

#[cfg(feature = "json")]
pub mod json;

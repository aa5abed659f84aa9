#[cfg(feature = "axum")]
pub mod axum;

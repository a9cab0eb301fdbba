//! HTTP inbound adapter exposing REST endpoints.

pub mod articles;
pub mod cors;
pub mod error;
pub mod health;
pub mod identity;
pub mod schemas;
pub mod spa;
pub mod state;

pub use error::ApiResult;

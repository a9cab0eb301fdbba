//! Identity Toolkit outbound adapter.
//!
//! Thin HTTP implementation of the `TokenVerifier` port against the
//! `accounts:lookup` endpoint.

mod dto;
mod http_verifier;

pub use http_verifier::{DEFAULT_LOOKUP_URL, IdentityToolkitVerifier};

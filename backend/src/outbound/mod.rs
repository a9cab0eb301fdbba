//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **mongo**: document store connection and the article repository
//! - **identity_toolkit**: HTTP token verification
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod identity_toolkit;
pub mod mongo;

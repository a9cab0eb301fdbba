//! Domain primitives, aggregates, ports, and services.
//!
//! Purpose: keep article semantics independent of HTTP and the document
//! store. Inbound adapters call the driving ports in [`ports`]; outbound
//! adapters implement the driven ports.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Article / ArticleName / Comment: the article aggregate.
//! - Identity / VerifiedUser / UserId / IdToken: per-request caller identity.
//! - ArticleService: implementation of the article driving ports.

pub mod article;
pub mod article_service;
pub mod error;
pub mod identity;
pub mod ports;
pub mod trace_id;

pub use self::article::{Article, ArticleName, ArticleValidationError, Comment};
pub use self::article_service::ArticleService;
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::identity::{
    AccessMode, IdToken, Identity, IdentityValidationError, UserId, VerifiedUser,
};
pub use self::trace_id::TraceId;

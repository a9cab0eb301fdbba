//! Article aggregate.
//!
//! Articles are looked up by a human-readable `name` slug. The aggregate
//! keeps the fields this service mutates (`upvotes`, `upvoteIds`,
//! `comments`) typed and passes every other stored field through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Validation errors returned by [`ArticleName::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleValidationError {
    EmptyName,
}

impl fmt::Display for ArticleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "article name must not be empty"),
        }
    }
}

impl std::error::Error for ArticleValidationError {}

/// Unique slug identifying an article.
///
/// # Examples
/// ```
/// use blog_backend::domain::ArticleName;
///
/// let name = ArticleName::new("learn-react").expect("valid name");
/// assert_eq!(name.as_ref(), "learn-react");
/// assert!(ArticleName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArticleName(String);

impl ArticleName {
    /// Validate and construct an [`ArticleName`].
    pub fn new(name: impl Into<String>) -> Result<Self, ArticleValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ArticleValidationError::EmptyName);
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for ArticleName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ArticleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ArticleName> for String {
    fn from(value: ArticleName) -> Self {
        value.0
    }
}

impl TryFrom<String> for ArticleName {
    type Error = ArticleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Reader comment attached to an article.
///
/// Both fields are stored exactly as submitted, whatever their JSON type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub posted_by: Option<Value>,
    pub text: Option<Value>,
}

impl Comment {
    pub fn new(posted_by: Option<Value>, text: Option<Value>) -> Self {
        Self { posted_by, text }
    }

    /// Comment text when it was submitted as a string.
    pub fn text_str(&self) -> Option<&str> {
        self.text.as_ref().and_then(Value::as_str)
    }

    /// Author when recorded as a string.
    pub fn posted_by_str(&self) -> Option<&str> {
        self.posted_by.as_ref().and_then(Value::as_str)
    }
}

/// Stored article.
///
/// `upvote_ids` is an ordered list used as a membership set: each voter
/// identifier appears at most once when upvotes are recorded through
/// [`crate::domain::ports::ArticleRepository::record_upvote`].
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Store identifier rendered as a hex string.
    pub id: Option<String>,
    pub name: ArticleName,
    pub upvotes: i64,
    pub upvote_ids: Vec<String>,
    pub comments: Vec<Comment>,
    /// Opaque content fields (title, body, ...) passed through unchanged.
    pub content: Map<String, Value>,
}

impl Article {
    /// Create an article with no votes, comments, or content.
    pub fn new(name: ArticleName) -> Self {
        Self {
            id: None,
            name,
            upvotes: 0,
            upvote_ids: Vec::new(),
            comments: Vec::new(),
            content: Map::new(),
        }
    }

    /// Whether `uid` is already listed as a voter.
    pub fn has_upvoted(&self, uid: &str) -> bool {
        self.upvote_ids.iter().any(|id| id == uid)
    }
}

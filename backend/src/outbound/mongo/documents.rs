//! Mapping between stored article documents and the domain aggregate.
//!
//! Only the fields this service mutates are typed. Every other key is
//! converted to relaxed extended JSON and carried in `Article::content`.

use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value};

use crate::domain::ports::ArticleRepositoryError;
use crate::domain::{Article, ArticleName, Comment};

pub(super) const ID: &str = "_id";
pub(super) const NAME: &str = "name";
pub(super) const UPVOTES: &str = "upvotes";
pub(super) const UPVOTE_IDS: &str = "upvoteIds";
pub(super) const COMMENTS: &str = "comments";
pub(super) const POSTED_BY: &str = "postedBy";
pub(super) const TEXT: &str = "text";

/// Keys never copied into the pass-through content map. `canUpvote` is a
/// per-requester decoration and must not leak from a stored document.
const RESERVED: [&str; 6] = [ID, NAME, UPVOTES, UPVOTE_IDS, COMMENTS, "canUpvote"];

fn decode_error(field: &str, detail: impl std::fmt::Display) -> ArticleRepositoryError {
    ArticleRepositoryError::decode(format!("{field}: {detail}"))
}

/// Convert a stored document into an [`Article`].
pub(super) fn article_from_document(document: Document) -> Result<Article, ArticleRepositoryError> {
    let mut id = None;
    let mut name = None;
    let mut upvotes = 0;
    let mut upvote_ids = Vec::new();
    let mut comments = Vec::new();
    let mut content = Map::new();

    for (key, value) in document {
        match key.as_str() {
            ID => id = Some(render_id(value)),
            NAME => match value {
                Bson::String(raw) => {
                    name = Some(ArticleName::new(raw).map_err(|err| decode_error(NAME, err))?);
                }
                other => return Err(decode_error(NAME, format!("expected string, got {other}"))),
            },
            UPVOTES => upvotes = decode_upvotes(value)?,
            UPVOTE_IDS => upvote_ids = decode_upvote_ids(value)?,
            COMMENTS => comments = decode_comments(value)?,
            reserved if RESERVED.contains(&reserved) => {}
            _ => {
                content.insert(key, value.into_relaxed_extjson());
            }
        }
    }

    let name = name.ok_or_else(|| decode_error(NAME, "missing"))?;
    Ok(Article {
        id,
        name,
        upvotes,
        upvote_ids,
        comments,
        content,
    })
}

/// Encode a comment for `$push`. Absent fields are stored as `null`.
pub(super) fn comment_document(comment: &Comment) -> Result<Document, ArticleRepositoryError> {
    let mut document = Document::new();
    document.insert(POSTED_BY, encode_field(POSTED_BY, comment.posted_by.as_ref())?);
    document.insert(TEXT, encode_field(TEXT, comment.text.as_ref())?);
    Ok(document)
}

fn encode_field(key: &str, value: Option<&Value>) -> Result<Bson, ArticleRepositoryError> {
    match value {
        None => Ok(Bson::Null),
        Some(value) => Bson::try_from(value.clone()).map_err(|err| {
            ArticleRepositoryError::query(format!("{key}: cannot encode value: {err}"))
        }),
    }
}

fn render_id(value: Bson) -> String {
    match value {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(raw) => raw,
        other => match other.into_relaxed_extjson() {
            Value::String(raw) => raw,
            json => json.to_string(),
        },
    }
}

fn decode_upvotes(value: Bson) -> Result<i64, ArticleRepositoryError> {
    match value {
        Bson::Null | Bson::Undefined => Ok(0),
        Bson::Int32(count) => Ok(i64::from(count)),
        Bson::Int64(count) => Ok(count),
        // Clients writing plain JS numbers store whole doubles.
        Bson::Double(count) => whole_double_to_i64(count)
            .ok_or_else(|| decode_error(UPVOTES, format!("expected integer, got {count}"))),
        other => Err(decode_error(UPVOTES, format!("expected integer, got {other}"))),
    }
}

/// Exact conversion of a whole double within `i64` range.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "range and fraction are checked before the cast"
)]
fn whole_double_to_i64(value: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, hence the strict upper bound.
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (in_range && value.fract() == 0.0).then(|| value as i64)
}

fn decode_upvote_ids(value: Bson) -> Result<Vec<String>, ArticleRepositoryError> {
    match value {
        Bson::Null | Bson::Undefined => Ok(Vec::new()),
        Bson::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Bson::String(raw) => Ok(raw),
                other => Err(decode_error(
                    UPVOTE_IDS,
                    format!("expected string entries, got {other}"),
                )),
            })
            .collect(),
        other => Err(decode_error(UPVOTE_IDS, format!("expected array, got {other}"))),
    }
}

fn decode_comments(value: Bson) -> Result<Vec<Comment>, ArticleRepositoryError> {
    match value {
        Bson::Null | Bson::Undefined => Ok(Vec::new()),
        Bson::Array(items) => items.into_iter().map(decode_comment).collect(),
        other => Err(decode_error(COMMENTS, format!("expected array, got {other}"))),
    }
}

fn decode_comment(value: Bson) -> Result<Comment, ArticleRepositoryError> {
    let Bson::Document(mut fields) = value else {
        return Err(decode_error(COMMENTS, "expected comment documents"));
    };
    let posted_by = take_optional_field(&mut fields, POSTED_BY);
    let text = take_optional_field(&mut fields, TEXT);
    Ok(Comment::new(posted_by, text))
}

fn take_optional_field(fields: &mut Document, key: &str) -> Option<Value> {
    match fields.remove(key) {
        None | Some(Bson::Null | Bson::Undefined) => None,
        Some(other) => Some(other.into_relaxed_extjson()),
    }
}

use serde::{Deserialize, Deserializer, Serialize};

/// A persisted book.
///
/// `summary` travels as UTF-8 text over HTTP and is stored as its UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Database-assigned identifier, immutable after creation
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Free-form summary; empty when none was stored
    pub summary: String,
}

/// Request body for create and update. Update replaces all three fields.
///
/// Absent and `null` fields decode as `""`; the columns' own constraints are
/// the only validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInput {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl BookInput {
    pub fn into_book(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            summary: self.summary,
        }
    }
}

/// The five book operations, used as span names and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOperation {
    GetAll,
    GetById,
    Create,
    Update,
    Delete,
}

impl BookOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            BookOperation::GetAll => "get_all",
            BookOperation::GetById => "get_by_id",
            BookOperation::Create => "create",
            BookOperation::Update => "update",
            BookOperation::Delete => "delete",
        }
    }
}

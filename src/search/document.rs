//! Search document structures and schema

use crate::models::{Comment, CommentThread};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tantivy::schema::*;
use tantivy::TantivyDocument;

/// Discriminator for the two content kinds surfaced by the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentKind {
    Thread,
    Comment,
}

/// A thread or comment as it is indexed for full-text search.
///
/// The index is only ever used as a thread-id oracle: title and body are
/// indexed but not stored, and presentation always goes back to the primary
/// store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentDocument {
    /// Content kind
    pub kind: ContentKind,

    /// Document id (thread id or comment id)
    pub id: String,

    /// Parent thread id; set for comments only
    pub thread_id: Option<String>,

    /// Title; empty for comments
    pub title: String,

    /// Body text
    pub body: String,

    /// Course scope
    pub course_id: String,

    /// Commentable scope
    pub commentable_id: String,

    /// Group scope, if the content is cohort-restricted
    pub group_id: Option<i64>,

    /// Last update timestamp, used for recency-capped queries
    pub updated_at: DateTime<Utc>,
}

impl From<&CommentThread> for ContentDocument {
    fn from(thread: &CommentThread) -> Self {
        Self {
            kind: ContentKind::Thread,
            id: thread.id.to_string(),
            thread_id: None,
            title: thread.title.clone(),
            body: thread.body.clone(),
            course_id: thread.course_id.clone(),
            commentable_id: thread.commentable_id.clone(),
            group_id: thread.group_id,
            updated_at: thread.updated_at,
        }
    }
}

impl From<&Comment> for ContentDocument {
    fn from(comment: &Comment) -> Self {
        Self {
            kind: ContentKind::Comment,
            id: comment.id.to_string(),
            thread_id: Some(comment.comment_thread_id.to_string()),
            title: String::new(),
            body: comment.body.clone(),
            course_id: comment.course_id.clone(),
            commentable_id: comment.commentable_id.clone(),
            group_id: comment.group_id,
            updated_at: comment.updated_at,
        }
    }
}

impl ContentDocument {
    /// Convert to a tantivy document
    pub fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        if let Ok(field) = schema.get_field("id") {
            doc.add_text(field, &self.id);
        }

        if let Ok(field) = schema.get_field("kind") {
            doc.add_text(field, self.kind.to_string());
        }

        if let Some(ref thread_id) = self.thread_id {
            if let Ok(field) = schema.get_field("thread_id") {
                doc.add_text(field, thread_id);
            }
        }

        if !self.title.is_empty() {
            if let Ok(field) = schema.get_field("title") {
                doc.add_text(field, &self.title);
            }
        }

        if let Ok(field) = schema.get_field("body") {
            doc.add_text(field, &self.body);
        }

        if let Ok(field) = schema.get_field("course_id") {
            doc.add_text(field, &self.course_id);
        }

        if let Ok(field) = schema.get_field("commentable_id") {
            doc.add_text(field, &self.commentable_id);
        }

        if let Some(group_id) = self.group_id {
            if let Ok(field) = schema.get_field("group_id") {
                doc.add_i64(field, group_id);
            }
        }

        if let Ok(field) = schema.get_field("has_group") {
            doc.add_bool(field, self.group_id.is_some());
        }

        if let Ok(field) = schema.get_field("updated_at") {
            doc.add_date(
                field,
                tantivy::DateTime::from_timestamp_secs(self.updated_at.timestamp()),
            );
        }

        doc
    }

    /// Get document id
    pub fn document_id(&self) -> &str {
        &self.id
    }
}

/// Build the search schema for forum content.
///
/// `has_group` mirrors `group_id.is_some()`: tantivy has no negated
/// existence predicate that composes inside a filter conjunction, so group
/// absence is queried as a term on this field.
pub fn build_content_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // Identity - stored so results can be reduced to thread ids
    schema_builder.add_text_field("id", STRING | STORED);
    schema_builder.add_text_field("kind", STRING | STORED);
    schema_builder.add_text_field("thread_id", STRING | STORED);

    // Full-text fields; index-only, presentation reads the primary store
    schema_builder.add_text_field("title", TEXT);
    schema_builder.add_text_field("body", TEXT);

    // Structured filter fields
    schema_builder.add_text_field("course_id", STRING);
    schema_builder.add_text_field("commentable_id", STRING);
    schema_builder.add_i64_field("group_id", INDEXED);
    schema_builder.add_bool_field("has_group", INDEXED);

    // Recency for the capped query
    schema_builder.add_date_field("updated_at", INDEXED | FAST);

    schema_builder.build()
}

use crate::models::CommentThread;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A comment on a discussion thread.
///
/// Course, commentable and group scope are denormalized from the parent
/// thread at creation time so that comment documents can be filtered in the
/// search index without a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: Uuid,

    /// Parent thread identifier
    pub comment_thread_id: Uuid,

    /// Course scope, copied from the parent thread
    pub course_id: String,

    /// Commentable scope, copied from the parent thread
    pub commentable_id: String,

    /// Group scope, copied from the parent thread
    pub group_id: Option<i64>,

    /// Comment body
    pub body: String,

    /// Author external id
    pub author_id: String,

    /// Whether the author chose to post anonymously
    pub anonymous: bool,

    /// Net vote points
    pub vote_count: i64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment under the given thread
    pub fn new(thread: &CommentThread, body: String, author_id: String) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            comment_thread_id: thread.id,
            course_id: thread.course_id.clone(),
            commentable_id: thread.commentable_id.clone(),
            group_id: thread.group_id,
            body,
            author_id,
            anonymous: false,
            vote_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

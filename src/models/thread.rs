use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// Represents a discussion thread in the forum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CommentThread {
    /// Unique identifier
    pub id: Uuid,

    /// Course the thread belongs to
    #[validate(length(min = 1, max = 255))]
    pub course_id: String,

    /// The commentable (discussion topic) the thread is attached to
    #[validate(length(min = 1, max = 255))]
    pub commentable_id: String,

    /// Cohort group restriction, if any. Ungrouped threads are visible to
    /// everyone unless a query explicitly excludes grouped content.
    pub group_id: Option<i64>,

    /// Thread type
    pub thread_type: ThreadType,

    /// Thread title
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    /// Thread body
    pub body: String,

    /// Author external id
    pub author_id: String,

    /// Whether the author chose to post anonymously
    pub anonymous: bool,

    /// Number of comments in the thread
    pub comment_count: i64,

    /// Net vote points
    pub vote_count: i64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Timestamp of the most recent activity (post or comment)
    pub last_activity_at: DateTime<Utc>,
}

impl CommentThread {
    /// Create a new thread
    pub fn new(
        course_id: String,
        commentable_id: String,
        title: String,
        body: String,
        author_id: String,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            course_id,
            commentable_id,
            group_id: None,
            thread_type: ThreadType::Discussion,
            title,
            body,
            author_id,
            anonymous: false,
            comment_count: 0,
            vote_count: 0,
            created_at: now,
            updated_at: now,
            last_activity_at: now,
        }
    }

    /// Restrict the thread to a cohort group
    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Record activity on the thread (a new or edited comment)
    pub fn touch_activity(&mut self) {
        let now = Utc::now();
        self.updated_at = now;
        self.last_activity_at = now;
    }
}

/// Thread type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThreadType {
    #[default]
    Discussion,
    Question,
}

/// Recognized sort keys for thread listings.
///
/// Every key orders descending: newest, most active, most voted, or most
/// commented threads first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortKey {
    /// Creation date
    #[default]
    Date,
    /// Last activity
    Activity,
    /// Vote points
    Votes,
    /// Comment count
    Comments,
}

pub mod factory;
pub mod sled_store;
pub mod store;

pub use factory::{create_in_memory_store, create_store};
pub use sled_store::SledStore;
pub use store::InMemoryStore;

use crate::error::Result;
use crate::models::{Comment, CommentThread, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Trait for the primary store holding canonical forum records
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Save a thread
    async fn save_thread(&self, thread: &CommentThread) -> Result<()>;

    /// Get a thread by id
    async fn get_thread(&self, id: &Uuid) -> Result<Option<CommentThread>>;

    /// Delete a thread
    async fn delete_thread(&self, id: &Uuid) -> Result<()>;

    /// Membership fetch: all thread records whose id is in `ids`.
    ///
    /// No ordering guarantee; ids with no record are silently absent from
    /// the result.
    async fn find_threads_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CommentThread>>;

    /// Threads with recent activity in a course, most recent first
    async fn recent_active_threads(
        &self,
        query: &RecentActivityQuery,
    ) -> Result<Vec<CommentThread>>;

    /// Save a comment
    async fn save_comment(&self, comment: &Comment) -> Result<()>;

    /// Get a comment by id
    async fn get_comment(&self, id: &Uuid) -> Result<Option<Comment>>;

    /// Threads and comments authored by a user in a course, newest-updated
    /// first, skipping anonymous content
    async fn contents_by_author(
        &self,
        author_id: &str,
        course_id: &str,
    ) -> Result<Vec<AuthoredContent>>;

    /// Save a user record
    async fn save_user(&self, user: &User) -> Result<()>;

    /// Get a user record by external id
    async fn get_user(&self, external_id: &str) -> Result<Option<User>>;
}

/// Query for the recently-active-threads read model
#[derive(Debug, Clone)]
pub struct RecentActivityQuery {
    /// Course scope
    pub course_id: String,

    /// Optional commentable scope
    pub commentable_id: Option<String>,

    /// Only threads with activity at or after this instant
    pub since: DateTime<Utc>,

    /// Maximum number of threads returned
    pub limit: usize,
}

/// Projection of one piece of authored content onto the thread it lives in.
///
/// Threads contribute their own id, comments their parent's, mirroring the
/// reduction rule of the search pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredContent {
    /// The thread the content belongs to
    pub thread_id: Uuid,

    /// When the content was last updated
    pub updated_at: DateTime<Utc>,
}

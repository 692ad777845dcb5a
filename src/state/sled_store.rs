use crate::error::{AppError, Result};
use crate::models::{Comment, CommentThread, User};
use crate::state::{AuthoredContent, RecentActivityQuery, ThreadStore};
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Persistent store using the sled embedded database
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    threads_tree: sled::Tree,
    comments_tree: sled::Tree,
    users_tree: sled::Tree,
}

impl SledStore {
    /// Create a new sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)
            .map_err(|e| AppError::Database(format!("Failed to open sled database: {}", e)))?;

        let threads_tree = db
            .open_tree("threads")
            .map_err(|e| AppError::Database(format!("Failed to open threads tree: {}", e)))?;

        let comments_tree = db
            .open_tree("comments")
            .map_err(|e| AppError::Database(format!("Failed to open comments tree: {}", e)))?;

        let users_tree = db
            .open_tree("users")
            .map_err(|e| AppError::Database(format!("Failed to open users tree: {}", e)))?;

        tracing::info!("Initialized sled store at {:?}", path_ref);

        Ok(Self {
            db: Arc::new(db),
            threads_tree,
            comments_tree,
            users_tree,
        })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize record: {}", e)))
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes)
            .map_err(|e| AppError::Serialization(format!("Failed to deserialize record: {}", e)))
    }

    fn uuid_key(id: &Uuid) -> Vec<u8> {
        id.as_bytes().to_vec()
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| AppError::Database(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ThreadStore for SledStore {
    async fn save_thread(&self, thread: &CommentThread) -> Result<()> {
        let key = Self::uuid_key(&thread.id);
        let value = Self::serialize(thread)?;

        self.threads_tree
            .insert(key, value)
            .map_err(|e| AppError::Database(format!("Failed to save thread: {}", e)))?;

        self.threads_tree
            .flush()
            .map_err(|e| AppError::Database(format!("Failed to flush threads tree: {}", e)))?;

        tracing::debug!(thread_id = %thread.id, "Thread saved to sled");
        Ok(())
    }

    async fn get_thread(&self, id: &Uuid) -> Result<Option<CommentThread>> {
        match self.threads_tree.get(Self::uuid_key(id)) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!("Failed to get thread: {}", e))),
        }
    }

    async fn delete_thread(&self, id: &Uuid) -> Result<()> {
        let removed = self
            .threads_tree
            .remove(Self::uuid_key(id))
            .map_err(|e| AppError::Database(format!("Failed to delete thread: {}", e)))?;

        if removed.is_none() {
            return Err(AppError::NotFound(format!("Thread {} not found", id)));
        }

        self.threads_tree
            .flush()
            .map_err(|e| AppError::Database(format!("Failed to flush threads tree: {}", e)))?;

        tracing::debug!(thread_id = %id, "Thread deleted from sled");
        Ok(())
    }

    async fn find_threads_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CommentThread>> {
        let mut threads = Vec::new();

        for id in ids {
            match self.threads_tree.get(Self::uuid_key(id)) {
                Ok(Some(bytes)) => threads.push(Self::deserialize(&bytes)?),
                Ok(None) => continue,
                Err(e) => {
                    return Err(AppError::Database(format!("Failed to fetch thread: {}", e)))
                }
            }
        }

        Ok(threads)
    }

    async fn recent_active_threads(
        &self,
        query: &RecentActivityQuery,
    ) -> Result<Vec<CommentThread>> {
        let mut threads: Vec<CommentThread> = Vec::new();

        for result in self.threads_tree.iter() {
            let (_, value) = result
                .map_err(|e| AppError::Database(format!("Failed to iterate threads: {}", e)))?;

            let thread: CommentThread = Self::deserialize(&value)?;

            let course_match = thread.course_id == query.course_id;
            let commentable_match = query
                .commentable_id
                .as_ref()
                .map_or(true, |c| &thread.commentable_id == c);
            let activity_match = thread.last_activity_at >= query.since;

            if course_match && commentable_match && activity_match {
                threads.push(thread);
            }
        }

        threads.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        threads.truncate(query.limit);

        Ok(threads)
    }

    async fn save_comment(&self, comment: &Comment) -> Result<()> {
        let key = Self::uuid_key(&comment.id);
        let value = Self::serialize(comment)?;

        self.comments_tree
            .insert(key, value)
            .map_err(|e| AppError::Database(format!("Failed to save comment: {}", e)))?;

        self.comments_tree
            .flush()
            .map_err(|e| AppError::Database(format!("Failed to flush comments tree: {}", e)))?;

        tracing::debug!(comment_id = %comment.id, "Comment saved to sled");
        Ok(())
    }

    async fn get_comment(&self, id: &Uuid) -> Result<Option<Comment>> {
        match self.comments_tree.get(Self::uuid_key(id)) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!("Failed to get comment: {}", e))),
        }
    }

    async fn contents_by_author(
        &self,
        author_id: &str,
        course_id: &str,
    ) -> Result<Vec<AuthoredContent>> {
        let mut contents: Vec<AuthoredContent> = Vec::new();

        for result in self.threads_tree.iter() {
            let (_, value) = result
                .map_err(|e| AppError::Database(format!("Failed to iterate threads: {}", e)))?;
            let thread: CommentThread = Self::deserialize(&value)?;

            if thread.author_id == author_id && thread.course_id == course_id && !thread.anonymous
            {
                contents.push(AuthoredContent {
                    thread_id: thread.id,
                    updated_at: thread.updated_at,
                });
            }
        }

        for result in self.comments_tree.iter() {
            let (_, value) = result
                .map_err(|e| AppError::Database(format!("Failed to iterate comments: {}", e)))?;
            let comment: Comment = Self::deserialize(&value)?;

            if comment.author_id == author_id
                && comment.course_id == course_id
                && !comment.anonymous
            {
                contents.push(AuthoredContent {
                    thread_id: comment.comment_thread_id,
                    updated_at: comment.updated_at,
                });
            }
        }

        contents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(contents)
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        let value = Self::serialize(user)?;

        self.users_tree
            .insert(user.external_id.as_bytes(), value)
            .map_err(|e| AppError::Database(format!("Failed to save user: {}", e)))?;

        self.users_tree
            .flush()
            .map_err(|e| AppError::Database(format!("Failed to flush users tree: {}", e)))?;

        tracing::debug!(user_id = %user.external_id, "User saved to sled");
        Ok(())
    }

    async fn get_user(&self, external_id: &str) -> Result<Option<User>> {
        match self.users_tree.get(external_id.as_bytes()) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!("Failed to get user: {}", e))),
        }
    }
}

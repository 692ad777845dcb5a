use crate::error::{AppError, Result};
use crate::models::{Comment, CommentThread, User};
use crate::state::{AuthoredContent, RecentActivityQuery, ThreadStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory store (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    threads: Arc<DashMap<Uuid, CommentThread>>,
    comments: Arc<DashMap<Uuid, Comment>>,
    users: Arc<DashMap<String, User>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            threads: Arc::new(DashMap::new()),
            comments: Arc::new(DashMap::new()),
            users: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThreadStore for InMemoryStore {
    async fn save_thread(&self, thread: &CommentThread) -> Result<()> {
        self.threads.insert(thread.id, thread.clone());
        tracing::debug!(thread_id = %thread.id, "Thread saved");
        Ok(())
    }

    async fn get_thread(&self, id: &Uuid) -> Result<Option<CommentThread>> {
        Ok(self.threads.get(id).map(|entry| entry.clone()))
    }

    async fn delete_thread(&self, id: &Uuid) -> Result<()> {
        if self.threads.remove(id).is_some() {
            tracing::debug!(thread_id = %id, "Thread deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Thread {} not found", id)))
        }
    }

    async fn find_threads_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CommentThread>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.threads.get(id).map(|entry| entry.clone()))
            .collect())
    }

    async fn recent_active_threads(
        &self,
        query: &RecentActivityQuery,
    ) -> Result<Vec<CommentThread>> {
        let mut threads: Vec<CommentThread> = self
            .threads
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|thread| {
                thread.course_id == query.course_id
                    && query
                        .commentable_id
                        .as_ref()
                        .map_or(true, |c| &thread.commentable_id == c)
                    && thread.last_activity_at >= query.since
            })
            .collect();

        threads.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        threads.truncate(query.limit);

        Ok(threads)
    }

    async fn save_comment(&self, comment: &Comment) -> Result<()> {
        self.comments.insert(comment.id, comment.clone());
        tracing::debug!(comment_id = %comment.id, "Comment saved");
        Ok(())
    }

    async fn get_comment(&self, id: &Uuid) -> Result<Option<Comment>> {
        Ok(self.comments.get(id).map(|entry| entry.clone()))
    }

    async fn contents_by_author(
        &self,
        author_id: &str,
        course_id: &str,
    ) -> Result<Vec<AuthoredContent>> {
        let mut contents: Vec<AuthoredContent> = self
            .threads
            .iter()
            .filter(|entry| {
                let thread = entry.value();
                thread.author_id == author_id
                    && thread.course_id == course_id
                    && !thread.anonymous
            })
            .map(|entry| AuthoredContent {
                thread_id: entry.value().id,
                updated_at: entry.value().updated_at,
            })
            .collect();

        contents.extend(
            self.comments
                .iter()
                .filter(|entry| {
                    let comment = entry.value();
                    comment.author_id == author_id
                        && comment.course_id == course_id
                        && !comment.anonymous
                })
                .map(|entry| AuthoredContent {
                    thread_id: entry.value().comment_thread_id,
                    updated_at: entry.value().updated_at,
                }),
        );

        contents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(contents)
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        self.users.insert(user.external_id.clone(), user.clone());
        tracing::debug!(user_id = %user.external_id, "User saved");
        Ok(())
    }

    async fn get_user(&self, external_id: &str) -> Result<Option<User>> {
        Ok(self.users.get(external_id).map(|entry| entry.clone()))
    }
}

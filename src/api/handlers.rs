use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentThread, SortKey, ThreadType, User};
use crate::search::{ThreadSearchOutcome, ThreadSearchParams};
use crate::state::RecentActivityQuery;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Threads returned by the recently-active listing
const RECENT_ACTIVE_LIMIT: usize = 5;

/// Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create a thread
pub async fn create_thread(
    State(state): State<AppState>,
    Json(request): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<CommentThread>)> {
    request.validate()?;

    let mut thread = CommentThread::new(
        request.course_id,
        request.commentable_id,
        request.title,
        request.body,
        request.author_id,
    );
    thread.thread_type = request.thread_type.unwrap_or_default();
    thread.group_id = request.group_id;
    thread.anonymous = request.anonymous;

    state.store.save_thread(&thread).await?;
    state.search.index_thread(&thread).await?;

    tracing::info!(thread_id = %thread.id, course_id = %thread.course_id, "Thread created");

    Ok((StatusCode::CREATED, Json(thread)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateThreadRequest {
    #[validate(length(min = 1, max = 255))]
    pub course_id: String,
    #[validate(length(min = 1, max = 255))]
    pub commentable_id: String,
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    pub body: String,
    #[validate(length(min = 1))]
    pub author_id: String,
    pub thread_type: Option<ThreadType>,
    pub group_id: Option<i64>,
    #[serde(default)]
    pub anonymous: bool,
}

/// Get a thread by id
pub async fn get_thread(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommentThread>> {
    let thread = state
        .store
        .get_thread(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Thread {} not found", id)))?;

    Ok(Json(thread))
}

/// Create a comment under a thread
pub async fn create_comment(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    request.validate()?;

    let mut thread = state
        .store
        .get_thread(&thread_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Thread {} not found", thread_id)))?;

    let mut comment = Comment::new(&thread, request.body, request.author_id);
    comment.anonymous = request.anonymous;

    state.store.save_comment(&comment).await?;

    thread.comment_count += 1;
    thread.touch_activity();
    state.store.save_thread(&thread).await?;

    // Keep both documents current: the comment is new, the thread's
    // recency changed
    state.search.index_comment(&comment).await?;
    state.search.index_thread(&thread).await?;

    tracing::info!(comment_id = %comment.id, thread_id = %thread_id, "Comment created");

    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1))]
    pub body: String,
    #[validate(length(min = 1))]
    pub author_id: String,
    #[serde(default)]
    pub anonymous: bool,
}

/// Full-text thread search
pub async fn search_threads(
    State(state): State<AppState>,
    Query(params): Query<ThreadSearchParams>,
) -> Result<Json<ThreadSearchOutcome>> {
    let outcome = state.search.search_threads(&params).await?;
    Ok(Json(outcome))
}

/// Recently active threads in a course
pub async fn recent_active_threads(
    State(state): State<AppState>,
    Query(params): Query<RecentActiveParams>,
) -> Result<Json<Vec<CommentThread>>> {
    let Some(course_id) = params.course_id else {
        return Ok(Json(Vec::new()));
    };

    let since = Utc::now()
        - match params.from_time.as_deref() {
            Some("today") => Duration::days(1),
            Some("this_month") => Duration::days(30),
            // "this_week" and anything unrecognized
            _ => Duration::weeks(1),
        };

    let query = RecentActivityQuery {
        course_id,
        commentable_id: params.commentable_id,
        since,
        limit: RECENT_ACTIVE_LIMIT,
    };

    let threads = state.store.recent_active_threads(&query).await?;
    Ok(Json(threads))
}

#[derive(Debug, Deserialize)]
pub struct RecentActiveParams {
    pub course_id: Option<String>,
    pub commentable_id: Option<String>,
    pub from_time: Option<String>,
}

/// Create a user record
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    request.validate()?;

    let user = User::new(request.id, request.username);
    state.store.save_user(&user).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1, max = 255))]
    pub username: String,
}

/// Get a user record
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>> {
    let user = state
        .store
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(user))
}

/// Update a user record
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let mut user = state
        .store
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    if let Some(username) = request.username {
        user.username = username;
    }
    if let Some(default_sort_key) = request.default_sort_key {
        user.default_sort_key = default_sort_key;
    }
    user.updated_at = Utc::now();

    state.store.save_user(&user).await?;

    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub default_sort_key: Option<SortKey>,
}

/// Threads a user most recently participated in.
///
/// Ordered by the user's own activity recency, deduplicated with the same
/// thread/comment reduction rule as the search pipeline, group-filtered with
/// inclusive-or-ungrouped semantics, and paginated with the page clamped
/// into the valid range.
pub async fn user_active_threads(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ActiveThreadsParams>,
) -> Result<Json<ActiveThreadsResponse>> {
    let Some(course_id) = params.course_id else {
        return Ok(Json(ActiveThreadsResponse {
            collection: Vec::new(),
            num_pages: 1,
            page: 1,
        }));
    };

    let per_page = match params.per_page {
        Some(per_page) if per_page > 0 => per_page,
        _ => 20,
    };

    let contents = state.store.contents_by_author(&user_id, &course_id).await?;

    // Contents arrive newest-first, so first occurrence wins
    let mut ordered_ids: Vec<Uuid> = Vec::new();
    for content in &contents {
        if !ordered_ids.contains(&content.thread_id) {
            ordered_ids.push(content.thread_id);
        }
    }

    let mut threads = state.store.find_threads_by_ids(&ordered_ids).await?;

    let group_ids = parse_group_ids(params.group_id.as_deref(), params.group_ids.as_deref());
    if !group_ids.is_empty() {
        threads.retain(|thread| thread.group_id.map_or(true, |g| group_ids.contains(&g)));
    }

    let num_pages = ((threads.len() + per_page - 1) / per_page).max(1);
    let page = params.page.unwrap_or(1).clamp(1, num_pages);

    threads.sort_by_key(|thread| ordered_ids.iter().position(|id| *id == thread.id));

    let collection: Vec<CommentThread> = threads
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Ok(Json(ActiveThreadsResponse {
        collection,
        num_pages,
        page,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ActiveThreadsParams {
    pub course_id: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub group_id: Option<String>,
    pub group_ids: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActiveThreadsResponse {
    pub collection: Vec<CommentThread>,
    pub num_pages: usize,
    pub page: usize,
}

fn parse_group_ids(group_id: Option<&str>, group_ids: Option<&str>) -> Vec<i64> {
    let mut ids: Vec<i64> = Vec::new();
    if let Some(raw) = group_id {
        ids.extend(raw.trim().parse::<i64>().ok());
    }
    if let Some(raw) = group_ids {
        ids.extend(raw.split(',').filter_map(|s| s.trim().parse::<i64>().ok()));
    }
    ids
}

//! HTTP API handlers for the boundary

use super::types::*;
use crate::metrics::{Timer, REQUEST_DURATION};
use crate::model::{EntityId, Reply, ThreadId};
use crate::store::{ErrorKind, NewReply, NewThread, Partition, StoreError, StoreHandle, StoreResult};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, Request, State,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

/// Error type for API responses
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be parsed
    BadRequest(String),
    /// The store rejected the action
    Store(StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::Invariant => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
                ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::BadRequest(message) => message,
            ApiError::Store(e) => e.to_string(),
        };
        if status.is_server_error() {
            warn!(status = %status, error = %error, "Request failed");
        } else {
            debug!(status = %status, error = %error, "Request rejected");
        }
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Record the duration of every request
pub async fn track_duration(request: Request, next: Next) -> Response {
    let timer = Timer::new(REQUEST_DURATION);
    let response = next.run(request).await;
    timer.stop();
    response
}

fn note_response(partition: &Partition, thread: ThreadId) -> StoreResult<NoteResponse> {
    let view = partition.thread_view(thread).ok_or(StoreError::ThreadNotFound(thread))?;
    let user = partition.user(view.thread.author_id).cloned();
    Ok(NoteResponse { thread: view, user })
}

// ============================================================================
// Auth Handlers
// ============================================================================

/// POST /api/auth/login - Look a user up by username.
///
/// Does not touch the interactive session.
pub async fn login(
    State(handle): State<StoreHandle>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username is required".to_string()));
    }

    let user = handle
        .read(|store| store.find_user_by_username(&req.instance_id, req.username.trim()).cloned())
        .await?;
    let token = format!("token-for-{}", user.username);
    Ok(Json(LoginResponse { user, token }))
}

// ============================================================================
// Note Handlers
// ============================================================================

/// GET /api/notes?instanceId= - Threads of an instance, newest first
pub async fn list_notes(
    State(handle): State<StoreHandle>,
    query: Result<Query<NotesQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<NoteResponse>>> {
    let Query(query) = query?;
    let instance = query
        .instance_id
        .ok_or_else(|| ApiError::BadRequest("instanceId is required".to_string()))?;

    let notes = handle
        .read(|store| -> StoreResult<Vec<NoteResponse>> {
            let partition = store.partition(&instance)?;
            Ok(partition
                .thread_views()
                .into_iter()
                .map(|view| {
                    let user = partition.user(view.thread.author_id).cloned();
                    NoteResponse { thread: view, user }
                })
                .collect())
        })
        .await?;
    Ok(Json(notes))
}

/// POST /api/notes - Create a thread
pub async fn create_note(
    State(handle): State<StoreHandle>,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<NoteResponse>)> {
    let Json(req) = payload?;
    let input = NewThread::post(req.author_id, req.title.unwrap_or_default(), req.content);

    let note = handle
        .mutate(|store| -> StoreResult<NoteResponse> {
            let thread = store.create_thread_in(&req.instance_id, input)?;
            note_response(store.partition(&req.instance_id)?, thread.id)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// POST /api/notes/:noteId/replies - Reply to a thread or to one of its replies
pub async fn create_reply(
    State(handle): State<StoreHandle>,
    note_id: Result<Path<EntityId>, PathRejection>,
    payload: Result<Json<CreateReplyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Reply>)> {
    let Path(note_id) = note_id?;
    let Json(req) = payload?;
    let input = NewReply::new(req.author_id, req.content);

    let reply = handle
        .mutate(|store| store.create_reply_in(&req.instance_id, note_id, req.parent_reply_id, input))
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// POST /api/notes/:noteId/like - Add a like and return the updated thread
pub async fn like_note(
    State(handle): State<StoreHandle>,
    note_id: Result<Path<EntityId>, PathRejection>,
    payload: Result<Json<LikeRequest>, JsonRejection>,
) -> ApiResult<Json<NoteResponse>> {
    let Path(note_id) = note_id?;
    let Json(LikeRequest { instance_id }) = payload?;

    let note = handle
        .mutate(|store| -> StoreResult<NoteResponse> {
            store.toggle_like_in(&instance_id, note_id, None)?;
            note_response(store.partition(&instance_id)?, note_id)
        })
        .await?;
    Ok(Json(note))
}

// ============================================================================
// Instance Handlers
// ============================================================================

/// GET /api/instances - Registry listing
pub async fn list_instances(State(handle): State<StoreHandle>) -> Json<InstanceListResponse> {
    let instances = handle.read(|store| store.instances()).await;
    Json(InstanceListResponse { instances })
}


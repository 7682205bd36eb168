//! Conversation endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::repos::{ConversationRepo, ConversationWithPosts, Post};
use crate::http::error::ApiError;
use crate::http::extractors::JsonBody;
use crate::http::server::AppState;
use crate::models::{to_iso8601, ConversationId, EpochMillis, NewPost};

/// Create conversation request
#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub topic: String,
    pub category: String,
    pub user: String,
    pub timestamp: EpochMillis,
    pub post_content: String,
    pub challenge_id: String,
}

/// Assign conversation request
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assigned_to: String,
}

/// Reply request
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub user: String,
    pub content: String,
    pub timestamp: EpochMillis,
}

/// Post as shown inside a challenge's conversation list
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub post_id: i64,
    pub user: String,
    pub timestamp: String,
    pub content: String,
}

impl From<Post> for PostSummary {
    fn from(p: Post) -> Self {
        Self {
            post_id: p.id,
            user: p.author,
            timestamp: to_iso8601(&p.created_at),
            content: p.content,
        }
    }
}

/// Conversation as listed under a challenge
#[derive(Debug, Serialize)]
pub struct ChallengeConversationResponse {
    pub topic: String,
    pub posts: Vec<PostSummary>,
}

impl From<ConversationWithPosts> for ChallengeConversationResponse {
    fn from(c: ConversationWithPosts) -> Self {
        Self {
            topic: c.conversation.topic,
            posts: c.posts.into_iter().map(PostSummary::from).collect(),
        }
    }
}

/// Full post record
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub conversation_id: String,
    pub user: String,
    pub timestamp: String,
    pub content: String,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            conversation_id: p.conversation_id,
            user: p.author,
            timestamp: to_iso8601(&p.created_at),
            content: p.content,
        }
    }
}

/// Full conversation record
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    pub topic: String,
    pub category: String,
    pub assigned_to: Option<String>,
    pub challenge_id: String,
    pub posts: Vec<PostResponse>,
}

impl From<ConversationWithPosts> for ConversationResponse {
    fn from(c: ConversationWithPosts) -> Self {
        Self {
            id: c.conversation.id,
            topic: c.conversation.topic,
            category: c.conversation.category,
            assigned_to: c.conversation.assigned_to,
            challenge_id: c.conversation.challenge_id,
            posts: c.posts.into_iter().map(PostResponse::from).collect(),
        }
    }
}

/// Response to conversation creation
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/v1/conversations - list all conversations with posts
async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ConversationResponse>>, ApiError> {
    let conversations = ConversationRepo::new(&state.pool).list().await?;
    Ok(Json(
        conversations
            .into_iter()
            .map(ConversationResponse::from)
            .collect(),
    ))
}

/// GET /api/v1/conversations/{challenge_id} - conversations about a challenge
async fn list_for_challenge(
    State(state): State<Arc<AppState>>,
    Path(challenge_id): Path<String>,
) -> Result<Json<Vec<ChallengeConversationResponse>>, ApiError> {
    let conversations = ConversationRepo::new(&state.pool)
        .list_for_challenge(&challenge_id)
        .await?;

    Ok(Json(
        conversations
            .into_iter()
            .map(ChallengeConversationResponse::from)
            .collect(),
    ))
}

/// POST /api/v1/conversations - open a conversation with its first post
async fn create_conversation(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateConversationRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let first_post = NewPost::new(req.user, req.post_content, req.timestamp.to_datetime()?);

    let id = ConversationRepo::new(&state.pool)
        .create_with_post(
            ConversationId::from_timestamp(req.timestamp),
            req.topic,
            req.category,
            req.challenge_id,
            first_post,
        )
        .await?;

    tracing::info!(conversation_id = %id.as_str(), "conversation created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Conversation created",
            id: id.into_string(),
        }),
    ))
}

/// POST /api/v1/conversations/{id}/assign - assign to a handler
async fn assign_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<AssignRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    ConversationRepo::new(&state.pool)
        .assign(&id, &req.assigned_to)
        .await?;

    Ok(Json(MessageResponse {
        message: format!("Conversation assigned to {}", req.assigned_to),
    }))
}

/// POST /api/v1/conversations/{id}/reply - append a post
async fn reply(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<ReplyRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let post = NewPost::new(req.user, req.content, req.timestamp.to_datetime()?);

    ConversationRepo::new(&state.pool).add_post(&id, post).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Reply posted".to_string(),
        }),
    ))
}

/// Conversation routes
///
/// The path parameter is `{id}` on every route; on the GET it holds a
/// challenge id.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v1/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route("/api/v1/conversations/{id}", get(list_for_challenge))
        .route("/api/v1/conversations/{id}/assign", post(assign_conversation))
        .route("/api/v1/conversations/{id}/reply", post(reply))
}

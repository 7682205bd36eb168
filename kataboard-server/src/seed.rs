//! Seed loader
//!
//! One-time import of the two JSON source documents:
//! - `{"coding_challenges": [...]}` - challenges with tags, objectives, hints
//! - `{"support_conversations": [...]}` - conversations with their posts
//!
//! Challenges are imported before conversations. Each record is written in
//! its own transaction, so a failure leaves earlier records in place.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::repos::{ChallengeRepo, ConversationRepo, DbError};
use crate::db::schema;
use crate::models::{ConversationId, EpochMillis, NewChallenge, NewConversation, NewPost};

/// Naive timestamp layouts accepted in seed documents, read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Errors raised while importing seed documents
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("schema error: {0}")]
    Schema(#[from] sqlx::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl SeedError {
    pub fn invalid_timestamp(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Challenge source document
#[derive(Debug, Deserialize)]
pub struct ChallengeDocument {
    pub coding_challenges: Vec<NewChallenge>,
}

/// Conversation source document
#[derive(Debug, Deserialize)]
pub struct ConversationDocument {
    pub support_conversations: Vec<SeedConversation>,
}

#[derive(Debug, Deserialize)]
pub struct SeedConversation {
    pub identifier: String,
    pub topic: String,
    pub category: String,
    pub challenge_id: String,
    #[serde(default)]
    pub posts: Vec<SeedPost>,
}

#[derive(Debug, Deserialize)]
pub struct SeedPost {
    pub post_id: i64,
    pub user: String,
    pub timestamp: SeedTimestamp,
    pub content: String,
}

/// Post timestamp as written in seed documents: epoch milliseconds,
/// RFC 3339, or a naive ISO-8601 date-time taken as UTC.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeedTimestamp {
    Millis(i64),
    Text(String),
}

impl SeedTimestamp {
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, SeedError> {
        match self {
            Self::Millis(ms) => EpochMillis::new(*ms)
                .to_datetime()
                .map_err(|e| SeedError::invalid_timestamp(ms.to_string(), e.to_string())),
            Self::Text(text) => parse_text_timestamp(text),
        }
    }
}

fn parse_text_timestamp(text: &str) -> Result<DateTime<Utc>, SeedError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| SeedError::invalid_timestamp(text, "expected RFC 3339 or ISO-8601"))
}

impl TryFrom<SeedConversation> for NewConversation {
    type Error = SeedError;

    fn try_from(seed: SeedConversation) -> Result<Self, Self::Error> {
        let posts = seed
            .posts
            .into_iter()
            .map(|post| -> Result<NewPost, SeedError> {
                Ok(NewPost {
                    id: Some(post.post_id),
                    created_at: post.timestamp.to_datetime()?,
                    author: post.user,
                    content: post.content,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: ConversationId::new(seed.identifier),
            topic: seed.topic,
            category: seed.category,
            challenge_id: seed.challenge_id,
            posts,
        })
    }
}

/// Files to import; either may be omitted.
#[derive(Debug, Clone, Default)]
pub struct SeedSources {
    pub challenges: Option<PathBuf>,
    pub conversations: Option<PathBuf>,
}

/// Counts of imported records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub challenges: usize,
    pub conversations: usize,
    pub posts: usize,
}

/// Read and parse a seed document.
pub async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, SeedError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&bytes).map_err(|source| SeedError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Import every challenge of a document. Returns the number imported.
pub async fn load_challenges(
    pool: &SqlitePool,
    document: &ChallengeDocument,
) -> Result<usize, SeedError> {
    let repo = ChallengeRepo::new(pool);
    for challenge in &document.coding_challenges {
        repo.insert(challenge).await?;
    }
    Ok(document.coding_challenges.len())
}

/// Import every conversation of a document with its posts.
///
/// Returns `(conversations, posts)` imported.
pub async fn load_conversations(
    pool: &SqlitePool,
    document: ConversationDocument,
) -> Result<(usize, usize), SeedError> {
    let repo = ConversationRepo::new(pool);
    let mut conversations = 0;
    let mut posts = 0;

    for seed in document.support_conversations {
        let conversation = NewConversation::try_from(seed)?;
        posts += conversation.posts.len();
        repo.insert(conversation).await?;
        conversations += 1;
    }

    Ok((conversations, posts))
}

/// Create the schema and import the given documents.
pub async fn run(pool: &SqlitePool, sources: &SeedSources) -> Result<SeedSummary, SeedError> {
    schema::create(pool).await?;

    let mut summary = SeedSummary::default();

    if let Some(path) = &sources.challenges {
        let document: ChallengeDocument = read_document(path).await?;
        summary.challenges = load_challenges(pool, &document).await?;
        tracing::info!(path = %path.display(), count = summary.challenges, "challenges imported");
    }

    if let Some(path) = &sources.conversations {
        let document: ConversationDocument = read_document(path).await?;
        let (conversations, posts) = load_conversations(pool, document).await?;
        summary.conversations = conversations;
        summary.posts = posts;
        tracing::info!(
            path = %path.display(),
            conversations,
            posts,
            "conversations imported"
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<DateTime<Utc>, SeedError> {
        serde_json::from_str::<SeedTimestamp>(json).unwrap().to_datetime()
    }

    #[test]
    fn accepts_rfc3339_with_offset() {
        let at = parse(r#""2024-05-01T14:30:00.123+02:00""#).unwrap();
        assert_eq!(at.timestamp_millis(), 1_714_566_600_123);
    }

    #[test]
    fn naive_text_is_utc() {
        let at = parse(r#""2024-05-01T12:30:00""#).unwrap();
        assert_eq!(at.timestamp_millis(), 1_714_566_600_000);

        let spaced = parse(r#""2024-05-01 12:30:00.5""#).unwrap();
        assert_eq!(spaced.timestamp_millis(), 1_714_566_600_500);
    }

    #[test]
    fn accepts_epoch_millis() {
        let at = parse("1714566600123").unwrap();
        assert_eq!(at.timestamp_millis(), 1_714_566_600_123);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse(r#""yesterday""#).unwrap_err();
        assert!(matches!(err, SeedError::InvalidTimestamp { .. }));
    }

    #[test]
    fn conversation_conversion_keeps_post_ids() {
        let seed: SeedConversation = serde_json::from_str(
            r#"{
                "identifier": "CONV_333",
                "topic": "Test Topic",
                "category": "Support",
                "challenge_id": "CHAL_111",
                "posts": [
                    {"post_id": 5, "user": "alice", "timestamp": "2024-05-01T12:30:00", "content": "Hi"}
                ]
            }"#,
        )
        .unwrap();

        let conversation = NewConversation::try_from(seed).unwrap();
        assert_eq!(conversation.id.as_str(), "CONV_333");
        assert_eq!(conversation.posts[0].id, Some(5));
        assert_eq!(conversation.posts[0].author, "alice");
    }
}

//! Conversation repository
//!
//! Handles support conversations with:
//! - Atomic creation with the first post (transaction)
//! - Eager loading of posts for every listing
//! - Append-only replies

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::{group_by_owner, DbError};
use crate::models::{ConversationId, NewConversation, NewPost};

/// Conversation record from database
#[derive(Debug, Clone, FromRow)]
pub struct Conversation {
    pub id: String,
    pub topic: String,
    pub category: String,
    pub challenge_id: String,
    pub assigned_to: Option<String>,
}

/// Post record from database
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub conversation_id: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
}

/// Conversation with its posts in insertion order
#[derive(Debug, Clone)]
pub struct ConversationWithPosts {
    pub conversation: Conversation,
    pub posts: Vec<Post>,
}

/// Conversation repository
pub struct ConversationRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ConversationRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List every conversation with its posts.
    pub async fn list(&self) -> Result<Vec<ConversationWithPosts>, DbError> {
        let mut tx = self.pool.begin().await?;

        let conversations: Vec<Conversation> = sqlx::query_as(
            r#"
            SELECT id, topic, category, challenge_id, assigned_to
            FROM conversations
            ORDER BY rowid
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let posts: Vec<Post> = sqlx::query_as(
            r#"
            SELECT id, conversation_id, author, created_at, content
            FROM posts
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(attach_posts(conversations, posts))
    }

    /// List conversations about one challenge, with posts.
    ///
    /// The challenge does not have to exist; an unknown id yields an empty list.
    pub async fn list_for_challenge(
        &self,
        challenge_id: &str,
    ) -> Result<Vec<ConversationWithPosts>, DbError> {
        let mut tx = self.pool.begin().await?;

        let conversations: Vec<Conversation> = sqlx::query_as(
            r#"
            SELECT id, topic, category, challenge_id, assigned_to
            FROM conversations
            WHERE challenge_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(challenge_id)
        .fetch_all(&mut *tx)
        .await?;

        let posts: Vec<Post> = sqlx::query_as(
            r#"
            SELECT p.id, p.conversation_id, p.author, p.created_at, p.content
            FROM posts p
            JOIN conversations c ON c.id = p.conversation_id
            WHERE c.challenge_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(challenge_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(attach_posts(conversations, posts))
    }

    /// Get a single conversation with its posts.
    pub async fn get(&self, id: &str) -> Result<ConversationWithPosts, DbError> {
        let conversation: Conversation = sqlx::query_as(
            r#"
            SELECT id, topic, category, challenge_id, assigned_to
            FROM conversations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "Conversation",
            id: id.to_owned(),
        })?;

        let posts: Vec<Post> = sqlx::query_as(
            r#"
            SELECT id, conversation_id, author, created_at, content
            FROM posts
            WHERE conversation_id = ?
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(ConversationWithPosts {
            conversation,
            posts,
        })
    }

    /// Create a conversation together with its first post (atomic).
    ///
    /// `challenge_id` is stored as given, without checking that the
    /// challenge exists. An id that is already taken yields
    /// `DbError::Conflict` and nothing is written.
    pub async fn create_with_post(
        &self,
        id: ConversationId,
        topic: String,
        category: String,
        challenge_id: String,
        first_post: NewPost,
    ) -> Result<ConversationId, DbError> {
        self.insert(NewConversation {
            id,
            topic,
            category,
            challenge_id,
            posts: vec![first_post],
        })
        .await
    }

    /// Insert a conversation and all of its posts in one transaction.
    pub async fn insert(&self, new: NewConversation) -> Result<ConversationId, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, topic, category, challenge_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(new.id.as_str())
        .bind(&new.topic)
        .bind(&new.category)
        .bind(&new.challenge_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::on_conflict(e, "Conversation", new.id.as_str()))?;

        for post in &new.posts {
            sqlx::query(
                r#"
                INSERT INTO posts (id, conversation_id, author, created_at, content)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(post.id)
            .bind(new.id.as_str())
            .bind(&post.author)
            .bind(post.created_at)
            .bind(&post.content)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                let id = post.id.map(|id| id.to_string()).unwrap_or_default();
                DbError::on_conflict(e, "Post", id)
            })?;
        }

        tx.commit().await?;
        tracing::debug!(
            conversation_id = %new.id.as_str(),
            posts = new.posts.len(),
            "conversation inserted"
        );
        Ok(new.id)
    }

    /// Set the handler a conversation is assigned to.
    ///
    /// Last writer wins; there is no version check.
    pub async fn assign(&self, id: &str, assignee: &str) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE conversations SET assigned_to = ? WHERE id = ?")
            .bind(assignee)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "Conversation",
                id: id.to_owned(),
            });
        }

        tracing::info!(conversation_id = id, assignee, "conversation assigned");
        Ok(())
    }

    /// Append a post to an existing conversation.
    ///
    /// A single autocommit insert; a missing conversation surfaces as a
    /// foreign key violation and is reported as `NotFound`.
    pub async fn add_post(&self, conversation_id: &str, post: NewPost) -> Result<Post, DbError> {
        let inserted: Post = sqlx::query_as(
            r#"
            INSERT INTO posts (id, conversation_id, author, created_at, content)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, conversation_id, author, created_at, content
            "#,
        )
        .bind(post.id)
        .bind(conversation_id)
        .bind(&post.author)
        .bind(post.created_at)
        .bind(&post.content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => DbError::NotFound {
                resource: "Conversation",
                id: conversation_id.to_owned(),
            },
            _ => {
                let id = post.id.map(|id| id.to_string()).unwrap_or_default();
                DbError::on_conflict(e, "Post", id)
            }
        })?;

        tracing::debug!(conversation_id, post_id = inserted.id, "reply appended");
        Ok(inserted)
    }
}

fn attach_posts(conversations: Vec<Conversation>, posts: Vec<Post>) -> Vec<ConversationWithPosts> {
    let mut by_conversation =
        group_by_owner(posts.into_iter().map(|p| (p.conversation_id.clone(), p)).collect());

    conversations
        .into_iter()
        .map(|conversation| ConversationWithPosts {
            posts: by_conversation.remove(&conversation.id).unwrap_or_default(),
            conversation,
        })
        .collect()
}

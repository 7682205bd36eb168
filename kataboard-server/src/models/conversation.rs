//! Conversation and post input records

use chrono::{DateTime, Utc};

use super::EpochMillis;

/// Prefix of conversation ids minted by the API.
const CONVERSATION_ID_PREFIX: &str = "CONV_";

/// Conversation identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id for a conversation opened through the API: `CONV_<millis>`.
    ///
    /// # Example
    /// ```
    /// use kataboard_server::models::{ConversationId, EpochMillis};
    ///
    /// let id = ConversationId::from_timestamp(EpochMillis::new(1700000000000));
    /// assert_eq!(id.as_str(), "CONV_1700000000000");
    /// ```
    pub fn from_timestamp(ts: EpochMillis) -> Self {
        Self(format!("{}{}", CONVERSATION_ID_PREFIX, ts))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// A post to be written.
///
/// `id` is `None` for posts created through the API; the store assigns the
/// next identifier. Seeded posts carry the id from the source document.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: Option<i64>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
}

impl NewPost {
    pub fn new(
        author: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            author: author.into(),
            created_at,
            content: content.into(),
        }
    }
}

/// A conversation with the posts to insert alongside it.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub id: ConversationId,
    pub topic: String,
    pub category: String,
    pub challenge_id: String,
    pub posts: Vec<NewPost>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_from_timestamp() {
        let id = ConversationId::from_timestamp(EpochMillis::new(42));
        assert_eq!(id.into_string(), "CONV_42");
    }

    #[test]
    fn api_posts_have_no_id() {
        let post = NewPost::new("user123", "Help me", Utc::now());
        assert!(post.id.is_none());
    }
}

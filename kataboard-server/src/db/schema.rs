//! Schema creation
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so this runs on each
//! server start and before every seed import.

use sqlx::SqlitePool;

const TABLES: &[(&str, &str)] = &[
    (
        "challenges",
        r#"
        CREATE TABLE IF NOT EXISTS challenges (
            challenge_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            points INTEGER NOT NULL DEFAULT 0
        )
        "#,
    ),
    (
        "tags",
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    ),
    (
        "challenge_tags",
        r#"
        CREATE TABLE IF NOT EXISTS challenge_tags (
            challenge_id TEXT NOT NULL REFERENCES challenges(challenge_id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (challenge_id, tag_id)
        )
        "#,
    ),
    (
        "objectives",
        r#"
        CREATE TABLE IF NOT EXISTS objectives (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            challenge_id TEXT NOT NULL REFERENCES challenges(challenge_id) ON DELETE CASCADE,
            content TEXT NOT NULL
        )
        "#,
    ),
    (
        "hints",
        r#"
        CREATE TABLE IF NOT EXISTS hints (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            challenge_id TEXT NOT NULL REFERENCES challenges(challenge_id) ON DELETE CASCADE,
            content TEXT NOT NULL
        )
        "#,
    ),
    // challenge_id is not a foreign key: conversations may point at
    // challenges that were never imported.
    (
        "conversations",
        r#"
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            topic TEXT NOT NULL,
            category TEXT NOT NULL,
            challenge_id TEXT NOT NULL,
            assigned_to TEXT
        )
        "#,
    ),
    (
        "posts",
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
            author TEXT NOT NULL,
            created_at TEXT NOT NULL,
            content TEXT NOT NULL
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_challenges_category ON challenges(category)",
    "CREATE INDEX IF NOT EXISTS idx_challenges_difficulty ON challenges(difficulty)",
    "CREATE INDEX IF NOT EXISTS idx_challenge_tags_tag ON challenge_tags(tag_id)",
    "CREATE INDEX IF NOT EXISTS idx_objectives_challenge ON objectives(challenge_id)",
    "CREATE INDEX IF NOT EXISTS idx_hints_challenge ON hints(challenge_id)",
    "CREATE INDEX IF NOT EXISTS idx_conversations_challenge ON conversations(challenge_id)",
    "CREATE INDEX IF NOT EXISTS idx_conversations_assigned ON conversations(assigned_to)",
    "CREATE INDEX IF NOT EXISTS idx_posts_conversation ON posts(conversation_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at)",
];

/// Create all tables and indexes.
pub async fn create(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::debug!("Creating schema...");

    for (table, ddl) in TABLES {
        sqlx::query(ddl).execute(pool).await?;
        tracing::trace!(table, "table ready");
    }

    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    tracing::info!("database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    #[tokio::test]
    async fn create_is_idempotent() {
        let pool = create_memory_pool().await.unwrap();
        create(&pool).await.unwrap();
        create(&pool).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<_> = tables.into_iter().map(|(n,)| n).collect();
        assert_eq!(
            names,
            vec![
                "challenge_tags",
                "challenges",
                "conversations",
                "hints",
                "objectives",
                "posts",
                "tags"
            ]
        );
    }

    #[tokio::test]
    async fn orphan_post_is_rejected() {
        let pool = create_memory_pool().await.unwrap();
        create(&pool).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO posts (conversation_id, author, created_at, content) VALUES ('CONV_missing', 'a', '2024-01-01T00:00:00Z', 'x')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }
}

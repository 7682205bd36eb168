//! Challenge repository
//!
//! Challenges, their tags, objectives and hints. Challenges are written only
//! by the seed loader; the HTTP surface reads them.

use sqlx::{FromRow, SqlitePool};

use super::{group_by_owner, DbError};
use crate::models::NewChallenge;

/// Challenge record from database
#[derive(Debug, Clone, FromRow)]
pub struct Challenge {
    pub challenge_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub points: i64,
}

/// Challenge with its related rows loaded
#[derive(Debug, Clone)]
pub struct ChallengeDetail {
    pub challenge: Challenge,
    pub tags: Vec<String>,
    pub objectives: Vec<String>,
    pub hints: Vec<String>,
}

/// Challenge repository
pub struct ChallengeRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ChallengeRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all challenges with tags, objectives and hints.
    ///
    /// Four queries regardless of the number of challenges, read inside one
    /// transaction so the relations come from the same snapshot. Challenges
    /// and their child rows are returned in insertion order.
    pub async fn list(&self) -> Result<Vec<ChallengeDetail>, DbError> {
        let mut tx = self.pool.begin().await?;

        let challenges: Vec<Challenge> = sqlx::query_as(
            r#"
            SELECT challenge_id, title, description, category, difficulty, points
            FROM challenges
            ORDER BY rowid
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let tags: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT ct.challenge_id, t.name
            FROM challenge_tags ct
            JOIN tags t ON t.id = ct.tag_id
            ORDER BY ct.rowid
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let objectives: Vec<(String, String)> =
            sqlx::query_as("SELECT challenge_id, content FROM objectives ORDER BY id")
                .fetch_all(&mut *tx)
                .await?;

        let hints: Vec<(String, String)> =
            sqlx::query_as("SELECT challenge_id, content FROM hints ORDER BY id")
                .fetch_all(&mut *tx)
                .await?;

        tx.commit().await?;

        let mut tags = group_by_owner(tags);
        let mut objectives = group_by_owner(objectives);
        let mut hints = group_by_owner(hints);

        Ok(challenges
            .into_iter()
            .map(|challenge| {
                let id = challenge.challenge_id.as_str();
                ChallengeDetail {
                    tags: tags.remove(id).unwrap_or_default(),
                    objectives: objectives.remove(id).unwrap_or_default(),
                    hints: hints.remove(id).unwrap_or_default(),
                    challenge,
                }
            })
            .collect())
    }

    /// Insert a challenge with its objectives and hints (atomic).
    ///
    /// Tags are found or created by name, so a tag shared between
    /// challenges is stored once.
    pub async fn insert(&self, new: &NewChallenge) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO challenges (challenge_id, title, description, category, difficulty, points)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.challenge_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.difficulty)
        .bind(new.points)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::on_conflict(e, "Challenge", &new.challenge_id))?;

        for name in &new.tags {
            let (tag_id,): (i64,) = sqlx::query_as(
                r#"
                INSERT INTO tags (name) VALUES (?)
                ON CONFLICT (name) DO UPDATE SET name = excluded.name
                RETURNING id
                "#,
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("INSERT OR IGNORE INTO challenge_tags (challenge_id, tag_id) VALUES (?, ?)")
                .bind(&new.challenge_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        for content in &new.learning_objectives {
            sqlx::query("INSERT INTO objectives (challenge_id, content) VALUES (?, ?)")
                .bind(&new.challenge_id)
                .bind(content)
                .execute(&mut *tx)
                .await?;
        }

        for content in &new.hints {
            sqlx::query("INSERT INTO hints (challenge_id, content) VALUES (?, ?)")
                .bind(&new.challenge_id)
                .bind(content)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(challenge_id = %new.challenge_id, tags = new.tags.len(), "challenge inserted");
        Ok(())
    }

    /// Delete a challenge and everything it owns.
    ///
    /// Objectives, hints and tag links go by cascade. Conversations are not
    /// tied to challenges by a foreign key, so they are deleted explicitly in
    /// the same transaction; their posts then cascade. Tags are kept.
    ///
    /// Returns the number of conversations removed.
    pub async fn delete(&self, challenge_id: &str) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM challenges WHERE challenge_id = ?")
            .bind(challenge_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "Challenge",
                id: challenge_id.to_owned(),
            });
        }

        let conversations = sqlx::query("DELETE FROM conversations WHERE challenge_id = ?")
            .bind(challenge_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        tracing::info!(challenge_id, conversations, "challenge deleted");
        Ok(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, schema};

    fn challenge(id: &str, tags: &[&str]) -> NewChallenge {
        NewChallenge {
            challenge_id: id.to_string(),
            title: format!("Title {}", id),
            description: "Prepare a Bell state".to_string(),
            category: "Intro".to_string(),
            difficulty: "Easy".to_string(),
            points: 100,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            learning_objectives: vec!["Learn Hadamard".to_string(), "Learn CNOT".to_string()],
            hints: vec!["Start with H".to_string()],
        }
    }

    async fn setup() -> SqlitePool {
        let pool = create_memory_pool().await.unwrap();
        schema::create(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn list_loads_relations_in_order() {
        let pool = setup().await;
        let repo = ChallengeRepo::new(&pool);
        repo.insert(&challenge("CHAL_2", &["qubits", "gates"])).await.unwrap();
        repo.insert(&challenge("CHAL_1", &["gates"])).await.unwrap();

        let list = repo.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].challenge.challenge_id, "CHAL_2");
        assert_eq!(list[0].tags, vec!["qubits", "gates"]);
        assert_eq!(list[0].objectives, vec!["Learn Hadamard", "Learn CNOT"]);
        assert_eq!(list[0].hints, vec!["Start with H"]);
        assert_eq!(list[1].tags, vec!["gates"]);
    }

    #[tokio::test]
    async fn shared_tags_are_stored_once() {
        let pool = setup().await;
        let repo = ChallengeRepo::new(&pool);
        repo.insert(&challenge("CHAL_1", &["gates", "gates"])).await.unwrap();
        repo.insert(&challenge("CHAL_2", &["gates"])).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let list = repo.list().await.unwrap();
        assert_eq!(list[0].tags, vec!["gates"]);
    }

    #[tokio::test]
    async fn empty_relations_are_empty_lists() {
        let pool = setup().await;
        let repo = ChallengeRepo::new(&pool);
        let mut bare = challenge("CHAL_BARE", &[]);
        bare.learning_objectives.clear();
        bare.hints.clear();
        repo.insert(&bare).await.unwrap();

        let list = repo.list().await.unwrap();
        assert!(list[0].tags.is_empty());
        assert!(list[0].objectives.is_empty());
        assert!(list[0].hints.is_empty());
    }

    #[tokio::test]
    async fn duplicate_challenge_is_conflict_and_rolls_back() {
        let pool = setup().await;
        let repo = ChallengeRepo::new(&pool);
        repo.insert(&challenge("CHAL_1", &[])).await.unwrap();

        let err = repo.insert(&challenge("CHAL_1", &[])).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { resource: "Challenge", .. }));

        let (objectives,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM objectives")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(objectives, 2);
    }

    #[tokio::test]
    async fn delete_missing_challenge_is_not_found() {
        let pool = setup().await;
        let err = ChallengeRepo::new(&pool).delete("CHAL_NONE").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "Challenge", .. }));
    }
}

//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Borrows the pool; one repository value per request
//! - Loads related rows with one query per relation (no N+1)
//! - Maps constraint violations to DbError::Conflict (no check-then-insert)
//! - Uses transactions for multi-row writes

pub mod challenges;
pub mod conversations;

pub use challenges::{Challenge, ChallengeDetail, ChallengeRepo};
pub use conversations::{Conversation, ConversationRepo, ConversationWithPosts, Post};

use std::collections::HashMap;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} '{id}' already exists")]
    Conflict { resource: &'static str, id: String },
}

impl DbError {
    /// Turn a unique or primary-key violation into `Conflict`.
    pub(crate) fn on_conflict(err: sqlx::Error, resource: &'static str, id: impl ToString) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict {
                resource,
                id: id.to_string(),
            },
            _ => Self::Sqlx(err),
        }
    }
}

/// Group `(owner, value)` rows by owner, keeping row order within each group.
pub(crate) fn group_by_owner<T>(rows: Vec<(String, T)>) -> HashMap<String, Vec<T>> {
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
    for (owner, value) in rows {
        grouped.entry(owner).or_default().push(value);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_preserves_order() {
        let rows = vec![
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("a".to_string(), 3),
        ];
        let grouped = group_by_owner(rows);
        assert_eq!(grouped["a"], vec![1, 3]);
        assert_eq!(grouped["b"], vec![2]);
    }

    #[test]
    fn non_constraint_errors_pass_through() {
        let err = DbError::on_conflict(sqlx::Error::RowNotFound, "Conversation", "CONV_1");
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
    }
}

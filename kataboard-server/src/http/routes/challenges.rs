//! Challenge endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::repos::{ChallengeDetail, ChallengeRepo};
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Challenge response
///
/// Relation lists are always arrays, empty when the challenge has none.
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub challenge_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub points: i64,
    pub tags: Vec<String>,
    pub learning_objectives: Vec<String>,
    pub hints: Vec<String>,
}

impl From<ChallengeDetail> for ChallengeResponse {
    fn from(d: ChallengeDetail) -> Self {
        Self {
            challenge_id: d.challenge.challenge_id,
            title: d.challenge.title,
            description: d.challenge.description,
            category: d.challenge.category,
            difficulty: d.challenge.difficulty,
            points: d.challenge.points,
            tags: d.tags,
            learning_objectives: d.objectives,
            hints: d.hints,
        }
    }
}

/// GET /api/v1/challenges - list all challenges
async fn list_challenges(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChallengeResponse>>, ApiError> {
    let challenges = ChallengeRepo::new(&state.pool).list().await?;
    Ok(Json(
        challenges.into_iter().map(ChallengeResponse::from).collect(),
    ))
}

/// Challenge routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/challenges", get(list_challenges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::Challenge;

    #[test]
    fn empty_relations_serialize_as_arrays() {
        let response = ChallengeResponse::from(ChallengeDetail {
            challenge: Challenge {
                challenge_id: "CHAL_001".into(),
                title: "Begin Here".into(),
                description: String::new(),
                category: "Intro".into(),
                difficulty: "Easy".into(),
                points: 10,
            },
            tags: vec![],
            objectives: vec![],
            hints: vec![],
        });

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["tags"], serde_json::json!([]));
        assert_eq!(value["learning_objectives"], serde_json::json!([]));
        assert_eq!(value["hints"], serde_json::json!([]));
        assert_eq!(value["points"], 10);
    }
}

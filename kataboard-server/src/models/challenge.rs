//! Challenge input records

use serde::Deserialize;

/// A challenge together with its owned rows and tag names, as imported by
/// the seed loader.
#[derive(Debug, Clone, Deserialize)]
pub struct NewChallenge {
    pub challenge_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub difficulty: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_default_to_empty() {
        let challenge: NewChallenge = serde_json::from_str(
            r#"{
                "challenge_id": "CHAL_001",
                "title": "Begin Here",
                "category": "Intro",
                "difficulty": "Easy",
                "points": 10
            }"#,
        )
        .unwrap();

        assert_eq!(challenge.points, 10);
        assert!(challenge.tags.is_empty());
        assert!(challenge.learning_objectives.is_empty());
        assert!(challenge.hints.is_empty());
    }
}

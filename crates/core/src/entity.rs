//! Scored entities returned by the ranking tasks.
//!
//! The ranking worker serializes ids as integers and scores as floats,
//! but older payloads carry both as strings. Both shapes are accepted.

use serde::{Deserialize, Deserializer, Serialize};

/// A ranked keyword, sentence, or transcription with its neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntity {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "score_from_any")]
    pub score: f64,
    /// Ids of the entities this one co-occurs with.
    #[serde(default, deserialize_with = "ids_from_any")]
    pub connected: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl ScoredEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score,
            connected: Vec::new(),
            tooltip: None,
        }
    }

    pub fn connected_to<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connected = ids.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn into_id(self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

fn id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Scalar::deserialize(deserializer)?.into_id())
}

fn ids_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Vec::<Scalar>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(Scalar::into_id).collect())
}

fn score_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom(format!("score {n} is not representable"))),
        Scalar::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("score '{s}' is not a number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_string_ids_and_scores() {
        let json = r#"{"id":"1","name":"alpha","score":"2","connected":["2"]}"#;
        let entity: ScoredEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.id, "1");
        assert_eq!(entity.score, 2.0);
        assert_eq!(entity.connected, vec!["2"]);
        assert!(entity.tooltip.is_none());
    }

    #[test]
    fn accepts_numeric_ids_and_scores() {
        let json = r#"{"id":4,"name":"beta","score":0.25,"connected":[1,2]}"#;
        let entity: ScoredEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.id, "4");
        assert_eq!(entity.score, 0.25);
        assert_eq!(entity.connected, vec!["1", "2"]);
    }

    #[test]
    fn missing_connected_defaults_to_empty() {
        let json = r#"{"id":0,"name":"gamma","score":1}"#;
        let entity: ScoredEntity = serde_json::from_str(json).unwrap();
        assert!(entity.connected.is_empty());
    }

    #[test]
    fn non_numeric_score_is_rejected() {
        let json = r#"{"id":0,"name":"gamma","score":"high"}"#;
        assert!(serde_json::from_str::<ScoredEntity>(json).is_err());
    }
}

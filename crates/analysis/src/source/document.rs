#![forbid(unsafe_code)]

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A match as returned by the match-v1 endpoint of the game API. Only the
/// fields the analysis reads are modelled; everything else is ignored.
///
/// Fields the analysis needs are optional here so that a document with a
/// missing or mistyped field still decodes. The shaper then rejects only the
/// participant (or match) the field belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<MatchMetadata>,
    #[serde(default, deserialize_with = "lenient")]
    pub info: Option<MatchInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub match_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub queue_id: Option<u32>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default, deserialize_with = "lenient")]
    pub last_round: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub placement: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub units: Option<Vec<Unit>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default, deserialize_with = "lenient")]
    pub character_id: Option<String>,
}

/// Decode an optional field, mapping a value of the wrong type to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// Decode a list element by element. An element that does not decode is
/// replaced by the default value, which has none of its fields set. Anything
/// other than an array is an empty list.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let serde_json::Value::Array(values) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(values
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap_or_default())
        .collect())
}

impl MatchDocument {
    pub fn new(queue_id: u32, participants: Vec<Participant>) -> Self {
        Self {
            metadata: None,
            info: Some(MatchInfo {
                queue_id: Some(queue_id),
                participants,
            }),
        }
    }

    pub fn match_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.match_id.as_deref()
    }
}

impl Participant {
    pub fn new<I, S>(last_round: u32, placement: u32, character_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            last_round: Some(last_round),
            placement: Some(placement),
            units: Some(
                character_ids
                    .into_iter()
                    .map(|id| Unit {
                        character_id: Some(id.into()),
                    })
                    .collect(),
            ),
        }
    }
}

/// One item read from a source: either a decoded match or the reason it
/// could not be decoded.
#[derive(Debug, Clone)]
pub enum Document {
    Parsed(MatchDocument),
    Undecodable { origin: String, reason: String },
}

impl Document {
    pub fn decode_str(text: &str, origin: impl FnOnce() -> String) -> Self {
        match serde_json::from_str(text) {
            Ok(document) => Document::Parsed(document),
            Err(err) => Document::Undecodable {
                origin: origin(),
                reason: err.to_string(),
            },
        }
    }

    pub fn decode_slice(bytes: &[u8], origin: impl FnOnce() -> String) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(document) => Document::Parsed(document),
            Err(err) => Document::Undecodable {
                origin: origin(),
                reason: err.to_string(),
            },
        }
    }

    pub fn decode_value(value: serde_json::Value, origin: impl FnOnce() -> String) -> Self {
        match serde_json::from_value(value) {
            Ok(document) => Document::Parsed(document),
            Err(err) => Document::Undecodable {
                origin: origin(),
                reason: err.to_string(),
            },
        }
    }
}

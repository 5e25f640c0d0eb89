//! Artist booking record

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use super::YesNo;

/// A persisted artist booking candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    /// Store-assigned identifier, always a string on the wire
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub response: YesNo,
    #[serde(default)]
    pub available: YesNo,
    #[serde(default)]
    pub cost: f64,
    /// Only ever set through the bulk commit of a selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved: Option<bool>,
}

impl Artist {
    /// Build a record from creation fields and a freshly assigned id
    pub fn from_new(id: String, new: NewArtist) -> Self {
        Self {
            id,
            name: new.name,
            response: new.response,
            available: new.available,
            cost: new.cost,
            saved: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.saved.unwrap_or(false)
    }
}

/// Fields accepted when creating a record; id and saved are never client-supplied
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewArtist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub response: YesNo,
    #[serde(default)]
    pub available: YesNo,
    #[serde(default)]
    pub cost: f64,
}

impl NewArtist {
    #[cfg(test)]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), UpdateError> {
        validate_cost(self.cost).map(|_| ())
    }
}

/// Mutable fields of an artist record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtistField {
    Name,
    Response,
    Available,
    Cost,
    Saved,
}

impl ArtistField {
    pub const ALL: [ArtistField; 5] = [
        ArtistField::Name,
        ArtistField::Response,
        ArtistField::Available,
        ArtistField::Cost,
        ArtistField::Saved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtistField::Name => "name",
            ArtistField::Response => "response",
            ArtistField::Available => "available",
            ArtistField::Cost => "cost",
            ArtistField::Saved => "saved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "name" => Some(ArtistField::Name),
            "response" => Some(ArtistField::Response),
            "available" => Some(ArtistField::Available),
            "cost" => Some(ArtistField::Cost),
            "saved" => Some(ArtistField::Saved),
            _ => None,
        }
    }
}

impl fmt::Display for ArtistField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection of a field/value pair
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: ArtistField, reason: String },
}

/// A typed single-field assignment
#[derive(Debug, Clone, PartialEq)]
pub enum ArtistUpdate {
    Name(String),
    Response(YesNo),
    Available(YesNo),
    Cost(f64),
    Saved(bool),
}

impl ArtistUpdate {
    /// Validate a raw `{field, value}` pair from the wire
    pub fn from_parts(field: &str, value: &Value) -> Result<Self, UpdateError> {
        let field =
            ArtistField::from_str(field).ok_or_else(|| UpdateError::UnknownField(field.into()))?;

        let invalid = |reason: &str| UpdateError::InvalidValue {
            field,
            reason: reason.to_string(),
        };

        match field {
            ArtistField::Name => value
                .as_str()
                .map(|s| ArtistUpdate::Name(s.to_string()))
                .ok_or_else(|| invalid("expected a string")),
            ArtistField::Response | ArtistField::Available => {
                let answer = value
                    .as_str()
                    .and_then(YesNo::from_str)
                    .ok_or_else(|| invalid("expected \"Yes\" or \"No\""))?;
                Ok(if field == ArtistField::Response {
                    ArtistUpdate::Response(answer)
                } else {
                    ArtistUpdate::Available(answer)
                })
            }
            ArtistField::Cost => {
                let cost = value.as_f64().ok_or_else(|| invalid("expected a number"))?;
                validate_cost(cost).map(ArtistUpdate::Cost)
            }
            ArtistField::Saved => value
                .as_bool()
                .map(ArtistUpdate::Saved)
                .ok_or_else(|| invalid("expected a boolean")),
        }
    }

    /// Snapshot the current value of `field` on a record
    pub fn read(field: ArtistField, artist: &Artist) -> Self {
        match field {
            ArtistField::Name => ArtistUpdate::Name(artist.name.clone()),
            ArtistField::Response => ArtistUpdate::Response(artist.response),
            ArtistField::Available => ArtistUpdate::Available(artist.available),
            ArtistField::Cost => ArtistUpdate::Cost(artist.cost),
            ArtistField::Saved => ArtistUpdate::Saved(artist.is_saved()),
        }
    }

    pub fn field(&self) -> ArtistField {
        match self {
            ArtistUpdate::Name(_) => ArtistField::Name,
            ArtistUpdate::Response(_) => ArtistField::Response,
            ArtistUpdate::Available(_) => ArtistField::Available,
            ArtistUpdate::Cost(_) => ArtistField::Cost,
            ArtistUpdate::Saved(_) => ArtistField::Saved,
        }
    }

    pub fn value(&self) -> Value {
        match self {
            ArtistUpdate::Name(name) => Value::String(name.clone()),
            ArtistUpdate::Response(v) | ArtistUpdate::Available(v) => {
                Value::String(v.as_str().to_string())
            }
            ArtistUpdate::Cost(cost) => serde_json::json!(cost),
            ArtistUpdate::Saved(saved) => Value::Bool(*saved),
        }
    }

    pub fn apply(&self, artist: &mut Artist) {
        match self {
            ArtistUpdate::Name(name) => artist.name = name.clone(),
            ArtistUpdate::Response(v) => artist.response = *v,
            ArtistUpdate::Available(v) => artist.available = *v,
            ArtistUpdate::Cost(cost) => artist.cost = *cost,
            ArtistUpdate::Saved(saved) => artist.saved = Some(*saved),
        }
    }

    /// Wire body of a single-record patch
    pub fn to_patch(&self) -> FieldPatch {
        FieldPatch {
            field: self.field(),
            value: self.value(),
        }
    }
}

/// `{field, value}` as sent by clients
#[derive(Debug, Clone, Serialize)]
pub struct FieldPatch {
    pub field: ArtistField,
    pub value: Value,
}

fn validate_cost(cost: f64) -> Result<f64, UpdateError> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(UpdateError::InvalidValue {
            field: ArtistField::Cost,
            reason: "expected a non-negative number".to_string(),
        });
    }
    Ok(cost)
}

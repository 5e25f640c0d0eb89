//! Enums for festival contacts

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Two-valued answer used by the `response` and `available` columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }

    /// Parse a stored value; only the exact wire spellings are accepted
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Yes" => Some(YesNo::Yes),
            "No" => Some(YesNo::No),
            _ => None,
        }
    }

    /// Lenient parse for user input ("yes", "Y", "no", ...)
    pub fn parse_input(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" => Some(YesNo::Yes),
            "no" | "n" | "false" => Some(YesNo::No),
            _ => None,
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, YesNo::Yes)
    }

    /// Display ordering: Yes sorts before No
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        other.is_yes().cmp(&self.is_yes())
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

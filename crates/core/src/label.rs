//! The canonical heading label table.
//!
//! One enum, one code table. Training writes class codes or names from this
//! table into the model artifact; inference decodes them back through it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadingLabel {
    Title,
    H1,
    H2,
    H3,
    H4,
    NotHeading,
}

impl HeadingLabel {
    /// Every label, in code order.
    pub const ALL: [HeadingLabel; 6] = [
        HeadingLabel::Title,
        HeadingLabel::H1,
        HeadingLabel::H2,
        HeadingLabel::H3,
        HeadingLabel::H4,
        HeadingLabel::NotHeading,
    ];

    pub fn code(self) -> u8 {
        match self {
            HeadingLabel::Title => 0,
            HeadingLabel::H1 => 1,
            HeadingLabel::H2 => 2,
            HeadingLabel::H3 => 3,
            HeadingLabel::H4 => 4,
            HeadingLabel::NotHeading => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HeadingLabel::Title => "Title",
            HeadingLabel::H1 => "H1",
            HeadingLabel::H2 => "H2",
            HeadingLabel::H3 => "H3",
            HeadingLabel::H4 => "H4",
            HeadingLabel::NotHeading => "NotHeading",
        }
    }

    pub fn is_heading(self) -> bool {
        self != HeadingLabel::NotHeading
    }
}

impl fmt::Display for HeadingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown heading label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for HeadingLabel {
    type Err = UnknownLabel;

    /// Accepts the variant name or the numeric code. `BODY` is an alias of
    /// `NotHeading`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| UnknownLabel(s.to_string()));
        }
        match trimmed {
            "Title" => Ok(HeadingLabel::Title),
            "H1" => Ok(HeadingLabel::H1),
            "H2" => Ok(HeadingLabel::H2),
            "H3" => Ok(HeadingLabel::H3),
            "H4" => Ok(HeadingLabel::H4),
            "NotHeading" | "BODY" => Ok(HeadingLabel::NotHeading),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

impl Serialize for HeadingLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HeadingLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! The feature manifest: the frozen, ordered list of attributes a scorer may
//! read off a candidate.
//!
//! Training and inference share this list. A model artifact names a subset
//! (or reordering) of these keys; anything outside the manifest is rejected
//! when the artifact loads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::record::LineRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    FontSize,
    Bold,
    SpacingBefore,
    SpacingAfter,
    Indent,
    Length,
    IsUpper,
    LineTop,
    LineBottom,
    EndsWithColon,
    IsShort,
    IsNumbered,
    FirstPage,
    Page,
    NumWords,
    NumVerbs,
    NumNouns,
    NumAdjectives,
    NumAdverbs,
    NumPronouns,
    NumCardinals,
    NumConjunctions,
    NumPredeterminers,
    NumInterjections,
}

/// The manifest, in training order.
pub const FEATURE_KEYS: [FeatureKey; 24] = [
    FeatureKey::FontSize,
    FeatureKey::Bold,
    FeatureKey::SpacingBefore,
    FeatureKey::SpacingAfter,
    FeatureKey::Indent,
    FeatureKey::Length,
    FeatureKey::IsUpper,
    FeatureKey::LineTop,
    FeatureKey::LineBottom,
    FeatureKey::EndsWithColon,
    FeatureKey::IsShort,
    FeatureKey::IsNumbered,
    FeatureKey::FirstPage,
    FeatureKey::Page,
    FeatureKey::NumWords,
    FeatureKey::NumVerbs,
    FeatureKey::NumNouns,
    FeatureKey::NumAdjectives,
    FeatureKey::NumAdverbs,
    FeatureKey::NumPronouns,
    FeatureKey::NumCardinals,
    FeatureKey::NumConjunctions,
    FeatureKey::NumPredeterminers,
    FeatureKey::NumInterjections,
];

impl FeatureKey {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKey::FontSize => "font_size",
            FeatureKey::Bold => "bold",
            FeatureKey::SpacingBefore => "spacing_before",
            FeatureKey::SpacingAfter => "spacing_after",
            FeatureKey::Indent => "indent",
            FeatureKey::Length => "length",
            FeatureKey::IsUpper => "is_upper",
            FeatureKey::LineTop => "line_top",
            FeatureKey::LineBottom => "line_bottom",
            FeatureKey::EndsWithColon => "ends_with_colon",
            FeatureKey::IsShort => "is_short",
            FeatureKey::IsNumbered => "is_numbered",
            FeatureKey::FirstPage => "first_page",
            FeatureKey::Page => "page",
            FeatureKey::NumWords => "num_words",
            FeatureKey::NumVerbs => "num_verbs",
            FeatureKey::NumNouns => "num_nouns",
            FeatureKey::NumAdjectives => "num_adjectives",
            FeatureKey::NumAdverbs => "num_adverbs",
            FeatureKey::NumPronouns => "num_pronouns",
            FeatureKey::NumCardinals => "num_cardinals",
            FeatureKey::NumConjunctions => "num_conjunctions",
            FeatureKey::NumPredeterminers => "num_predeterminers",
            FeatureKey::NumInterjections => "num_interjections",
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown feature key: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for FeatureKey {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FEATURE_KEYS
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

impl Serialize for FeatureKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeatureKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl LineRecord {
    /// Numeric value of one feature. Flags are 0/1; unset spacing is 0.
    pub fn feature(&self, key: FeatureKey) -> f64 {
        match key {
            FeatureKey::FontSize => self.font_size,
            FeatureKey::Bold => flag(self.bold),
            FeatureKey::SpacingBefore => self.spacing_before.unwrap_or(0.0),
            FeatureKey::SpacingAfter => self.spacing_after.unwrap_or(0.0),
            FeatureKey::Indent => self.indent,
            FeatureKey::Length => self.length as f64,
            FeatureKey::IsUpper => flag(self.is_upper),
            FeatureKey::LineTop => self.line_top,
            FeatureKey::LineBottom => self.line_bottom,
            FeatureKey::EndsWithColon => flag(self.ends_with_colon),
            FeatureKey::IsShort => flag(self.is_short),
            FeatureKey::IsNumbered => flag(self.is_numbered),
            FeatureKey::FirstPage => flag(self.first_page),
            FeatureKey::Page => self.page as f64,
            FeatureKey::NumWords => self.num_words as f64,
            FeatureKey::NumVerbs => self.pos.num_verbs as f64,
            FeatureKey::NumNouns => self.pos.num_nouns as f64,
            FeatureKey::NumAdjectives => self.pos.num_adjectives as f64,
            FeatureKey::NumAdverbs => self.pos.num_adverbs as f64,
            FeatureKey::NumPronouns => self.pos.num_pronouns as f64,
            FeatureKey::NumCardinals => self.pos.num_cardinals as f64,
            FeatureKey::NumConjunctions => self.pos.num_conjunctions as f64,
            FeatureKey::NumPredeterminers => self.pos.num_predeterminers as f64,
            FeatureKey::NumInterjections => self.pos.num_interjections as f64,
        }
    }

    /// Feature vector in the order given by `keys`.
    pub fn feature_vector(&self, keys: &[FeatureKey]) -> Vec<f64> {
        keys.iter().map(|&k| self.feature(k)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::record;

    #[test]
    fn test_manifest_order_and_names() {
        let names: Vec<&str> = FEATURE_KEYS.iter().map(|k| k.as_str()).collect();
        assert_eq!(names[0], "font_size");
        assert_eq!(names[2], "spacing_before");
        assert_eq!(names[13], "page");
        assert_eq!(names[23], "num_interjections");
        for key in FEATURE_KEYS {
            assert_eq!(key.as_str().parse::<FeatureKey>(), Ok(key));
        }
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert_eq!(
            "font_weight".parse::<FeatureKey>(),
            Err(UnknownFeature("font_weight".to_string()))
        );
        assert!(serde_json::from_str::<FeatureKey>("\"text\"").is_err());
    }

    #[test]
    fn test_manifest_matches_record_field_names() {
        let value = serde_json::to_value(record("Scope", 12.0, false, 0, 0.0)).unwrap();
        let object = value.as_object().unwrap();
        for key in FEATURE_KEYS {
            assert!(object.contains_key(key.as_str()), "missing {key}");
        }
        assert_eq!(object.len(), FEATURE_KEYS.len() + 1);
    }

    #[test]
    fn test_feature_vector_follows_requested_order() {
        let mut r = record("INTRODUCTION", 18.0, true, 2, 40.0);
        r.spacing_before = None;
        let v = r.feature_vector(&[
            FeatureKey::Page,
            FeatureKey::Bold,
            FeatureKey::FontSize,
            FeatureKey::SpacingBefore,
        ]);
        assert_eq!(v, vec![2.0, 1.0, 18.0, 0.0]);
    }
}

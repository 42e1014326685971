//! Heading classifier adapter.
//!
//! A [`Scorer`] maps a feature vector, laid out in the scorer's own key
//! order, to a [`HeadingLabel`]. The [`Classifier`] owns one scorer, builds
//! each candidate's vector from that key order, and assembles the final
//! [`Outline`] including title selection.
//!
//! Two scorers ship with the crate: a loaded [`ModelArtifact`] and the
//! rule-based [`HeuristicScorer`] used when no trained model is available.

use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::features::FeatureKey;
use crate::label::HeadingLabel;
use crate::model::ModelArtifact;
use crate::outline::{Outline, OutlineEntry};
use crate::record::LineRecord;

/// A trained (or hand-written) scoring function paired with the feature keys
/// it reads.
pub trait Scorer: Send + Sync {
    fn feature_keys(&self) -> &[FeatureKey];

    /// Score one vector laid out in [`feature_keys`](Self::feature_keys)
    /// order.
    fn score(&self, features: &[f64]) -> Result<HeadingLabel, ClassifyError>;
}

impl Scorer for ModelArtifact {
    fn feature_keys(&self) -> &[FeatureKey] {
        ModelArtifact::feature_keys(self)
    }

    fn score(&self, features: &[f64]) -> Result<HeadingLabel, ClassifyError> {
        self.predict(features)
    }
}

// ---------------------------------------------------------------------------
// Heuristic scorer
// ---------------------------------------------------------------------------

/// Font-size cutoffs for [`HeuristicScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeuristicConfig {
    pub h1_size: f64,
    pub h2_size: f64,
    pub h3_size: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            h1_size: 20.0,
            h2_size: 16.0,
            h3_size: 13.0,
        }
    }
}

const HEURISTIC_KEYS: [FeatureKey; 4] = [
    FeatureKey::FontSize,
    FeatureKey::Bold,
    FeatureKey::IsNumbered,
    FeatureKey::IsUpper,
];

/// Rule-based fallback: size bands for H1-H3, any emphasis for H4.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    config: HeuristicConfig,
}

impl HeuristicScorer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }
}

impl Scorer for HeuristicScorer {
    fn feature_keys(&self) -> &[FeatureKey] {
        &HEURISTIC_KEYS
    }

    fn score(&self, features: &[f64]) -> Result<HeadingLabel, ClassifyError> {
        let [size, bold, numbered, upper] = features else {
            return Err(ClassifyError::FeatureSchemaMismatch {
                expected: HEURISTIC_KEYS.len(),
                got: features.len(),
            });
        };
        let label = if *size >= self.config.h1_size {
            HeadingLabel::H1
        } else if *size >= self.config.h2_size {
            HeadingLabel::H2
        } else if *size >= self.config.h3_size {
            HeadingLabel::H3
        } else if *bold > 0.0 || *numbered > 0.0 || *upper > 0.0 {
            HeadingLabel::H4
        } else {
            HeadingLabel::NotHeading
        };
        Ok(label)
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Title selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TitleConfig {
    /// A first-page candidate at least this large can become the title.
    pub min_font_size: f64,
    pub require_bold: bool,
    /// Title used when no candidate qualifies.
    pub placeholder: String,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            min_font_size: 15.0,
            require_bold: true,
            placeholder: String::new(),
        }
    }
}

/// Owns a scorer and turns candidates into an [`Outline`].
///
/// Shareable across threads; nothing is mutated after construction.
pub struct Classifier {
    scorer: Box<dyn Scorer>,
    title: TitleConfig,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("feature_keys", &self.scorer.feature_keys())
            .field("title", &self.title)
            .finish()
    }
}

impl Classifier {
    pub fn new(scorer: Box<dyn Scorer>, title: TitleConfig) -> Self {
        Self { scorer, title }
    }

    pub fn from_model(model: ModelArtifact, title: TitleConfig) -> Self {
        Self::new(Box::new(model), title)
    }

    pub fn heuristic(config: HeuristicConfig, title: TitleConfig) -> Self {
        Self::new(Box::new(HeuristicScorer::new(config)), title)
    }

    pub fn feature_keys(&self) -> &[FeatureKey] {
        self.scorer.feature_keys()
    }

    /// Label a single candidate.
    pub fn label(&self, candidate: &LineRecord) -> Result<HeadingLabel, ClassifyError> {
        let features = candidate.feature_vector(self.scorer.feature_keys());
        self.scorer.score(&features)
    }

    /// Index of the heuristic title: the first page-0 candidate that is large
    /// enough (and bold, when required).
    fn heuristic_title(&self, candidates: &[LineRecord]) -> Option<usize> {
        candidates.iter().position(|c| {
            c.page == 0
                && c.font_size >= self.title.min_font_size
                && (c.bold || !self.title.require_bold)
        })
    }

    /// Classify every candidate and assemble the outline.
    ///
    /// The heuristic title, when present, is withheld from the outline.
    /// Otherwise the first candidate labelled `Title` supplies the title and
    /// stays in the outline. Any further `Title` predictions are dropped, as
    /// are `NotHeading` labels.
    pub fn build_outline(&self, candidates: &[LineRecord]) -> Result<Outline, ClassifyError> {
        let title_index = self.heuristic_title(candidates);
        let mut title = title_index.map(|i| candidates[i].text.clone());
        let mut outline = Vec::new();

        for (i, candidate) in candidates.iter().enumerate() {
            if Some(i) == title_index {
                continue;
            }
            let level = self.label(candidate)?;
            match level {
                HeadingLabel::NotHeading => continue,
                HeadingLabel::Title if title.is_some() => continue,
                HeadingLabel::Title => title = Some(candidate.text.clone()),
                _ => {}
            }
            outline.push(OutlineEntry {
                level,
                text: candidate.text.clone(),
                page: candidate.page,
            });
        }

        Ok(Outline {
            title: title.unwrap_or_else(|| self.title.placeholder.clone()),
            outline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::record;

    /// Labels by font size alone: >= 24 Title, >= 14 H1, else body.
    struct SizeScorer;

    impl Scorer for SizeScorer {
        fn feature_keys(&self) -> &[FeatureKey] {
            &[FeatureKey::FontSize]
        }

        fn score(&self, features: &[f64]) -> Result<HeadingLabel, ClassifyError> {
            Ok(match features[0] {
                s if s >= 24.0 => HeadingLabel::Title,
                s if s >= 14.0 => HeadingLabel::H1,
                _ => HeadingLabel::NotHeading,
            })
        }
    }

    #[test]
    fn test_heuristic_scorer_bands() {
        let scorer = HeuristicScorer::default();
        assert_eq!(scorer.score(&[22.0, 0.0, 0.0, 0.0]), Ok(HeadingLabel::H1));
        assert_eq!(scorer.score(&[16.0, 0.0, 0.0, 0.0]), Ok(HeadingLabel::H2));
        assert_eq!(scorer.score(&[13.0, 0.0, 0.0, 0.0]), Ok(HeadingLabel::H3));
        assert_eq!(scorer.score(&[11.0, 1.0, 0.0, 0.0]), Ok(HeadingLabel::H4));
        assert_eq!(scorer.score(&[11.0, 0.0, 1.0, 0.0]), Ok(HeadingLabel::H4));
        assert_eq!(scorer.score(&[11.0, 0.0, 0.0, 1.0]), Ok(HeadingLabel::H4));
        assert_eq!(scorer.score(&[11.0, 0.0, 0.0, 0.0]), Ok(HeadingLabel::NotHeading));
    }

    #[test]
    fn test_heuristic_scorer_rejects_wrong_length() {
        let scorer = HeuristicScorer::default();
        assert_eq!(
            scorer.score(&[11.0]),
            Err(ClassifyError::FeatureSchemaMismatch {
                expected: 4,
                got: 1
            })
        );
    }

    #[test]
    fn test_label_reads_features_in_scorer_order() {
        let classifier = Classifier::heuristic(HeuristicConfig::default(), TitleConfig::default());
        assert_eq!(classifier.feature_keys(), &HEURISTIC_KEYS);
        assert_eq!(
            classifier.label(&record("1.2 Scope", 11.0, false, 0, 0.0)),
            Ok(HeadingLabel::H4)
        );
    }

    #[test]
    fn test_heuristic_title_is_withheld() {
        let classifier = Classifier::new(Box::new(SizeScorer), TitleConfig::default());
        let outline = classifier
            .build_outline(&[
                record("Annual Report", 18.0, true, 0, 40.0),
                record("Summary", 16.0, true, 0, 100.0),
                record("Body line here", 10.0, false, 0, 140.0),
                record("Appendix", 16.0, false, 1, 40.0),
            ])
            .unwrap();
        assert_eq!(outline.title, "Annual Report");
        let texts: Vec<(&str, usize)> = outline
            .outline
            .iter()
            .map(|e| (e.text.as_str(), e.page))
            .collect();
        assert_eq!(texts, vec![("Summary", 0), ("Appendix", 1)]);
    }

    #[test]
    fn test_heuristic_title_requires_bold_and_first_page() {
        let classifier = Classifier::new(Box::new(SizeScorer), TitleConfig::default());
        let outline = classifier
            .build_outline(&[
                record("Not Bold", 18.0, false, 0, 40.0),
                record("Later Page", 18.0, true, 1, 40.0),
            ])
            .unwrap();
        assert_eq!(outline.title, "");
        assert_eq!(outline.len(), 2);
    }

    #[test]
    fn test_first_title_prediction_kept_once() {
        let title = TitleConfig {
            min_font_size: 100.0,
            ..TitleConfig::default()
        };
        let classifier = Classifier::new(Box::new(SizeScorer), title);
        let outline = classifier
            .build_outline(&[
                record("Grand Title", 28.0, true, 0, 40.0),
                record("Another Title", 26.0, true, 1, 40.0),
                record("Chapter", 14.0, true, 1, 80.0),
            ])
            .unwrap();
        assert_eq!(outline.title, "Grand Title");
        let levels: Vec<HeadingLabel> = outline.outline.iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![HeadingLabel::Title, HeadingLabel::H1]);
    }

    #[test]
    fn test_title_prediction_dropped_after_heuristic_title() {
        let classifier = Classifier::new(Box::new(SizeScorer), TitleConfig::default());
        let outline = classifier
            .build_outline(&[
                record("Cover Title", 18.0, true, 0, 40.0),
                record("Huge Banner", 30.0, true, 2, 40.0),
            ])
            .unwrap();
        assert_eq!(outline.title, "Cover Title");
        assert!(outline.is_empty());
    }

    #[test]
    fn test_placeholder_title() {
        let title = TitleConfig {
            placeholder: "Untitled".into(),
            ..TitleConfig::default()
        };
        let classifier = Classifier::new(Box::new(SizeScorer), title);
        let outline = classifier
            .build_outline(&[record("Small print", 9.0, false, 0, 40.0)])
            .unwrap();
        assert_eq!(outline.title, "Untitled");
        assert!(outline.is_empty());
    }

    #[test]
    fn test_model_artifact_as_scorer() {
        let model = ModelArtifact::from_json(
            &serde_json::json!({
                "format_version": 1,
                "feature_keys": ["bold"],
                "classes": ["NotHeading", "H2"],
                "estimator": { "kind": "forest", "trees": [{ "nodes": [
                    { "split": { "feature": 0, "threshold": 0.5, "left": 1, "right": 2 } },
                    { "leaf": { "value": [1.0, 0.0] } },
                    { "leaf": { "value": [0.0, 1.0] } }
                ]}]}
            })
            .to_string(),
        )
        .unwrap();
        let classifier = Classifier::from_model(model, TitleConfig::default());
        let outline = classifier
            .build_outline(&[
                record("Emphasised", 11.0, true, 0, 40.0),
                record("Plain words", 11.0, false, 0, 60.0),
            ])
            .unwrap();
        assert_eq!(outline.outline.len(), 1);
        assert_eq!(outline.outline[0].level, HeadingLabel::H2);
        assert_eq!(outline.outline[0].text, "Emphasised");
    }
}

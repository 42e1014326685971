//! Trained model artifacts.
//!
//! A model artifact is a single JSON document that pairs an estimator with
//! the exact ordered feature keys it was trained on, its output classes, and
//! the optional standard scaler fitted alongside it. The pairing is atomic:
//! the estimator is only ever fed vectors built from its own key list.
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_keys": ["font_size", "bold"],
//!   "classes": ["NotHeading", "H1"],
//!   "scaler": { "mean": [11.0, 0.2], "scale": [3.0, 0.4] },
//!   "estimator": {
//!     "kind": "forest",
//!     "trees": [
//!       { "nodes": [
//!           { "split": { "feature": 0, "threshold": 0.5, "left": 1, "right": 2 } },
//!           { "leaf": { "value": [9.0, 1.0] } },
//!           { "leaf": { "value": [0.0, 5.0] } }
//!       ] }
//!     ]
//!   }
//! }
//! ```
//!
//! Three estimator kinds cover the classifier variants produced by training:
//!
//! - `forest`: each leaf holds per-class counts or probabilities; leaves are
//!   normalized, averaged across trees, then argmax.
//! - `boosted`: one scalar tree per class per round; per-class sums plus
//!   `base_score`, then argmax.
//! - `mlp`: dense layers (`weights[out][in]`, `bias[out]`) with a hidden
//!   activation; argmax of the output layer.
//!
//! Validation runs at load; a structurally unsound artifact never reaches
//! inference.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, ModelError};
use crate::features::FeatureKey;
use crate::label::HeadingLabel;

pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArtifact {
    format_version: u32,
    feature_keys: Vec<String>,
    classes: Vec<RawClass>,
    #[serde(default)]
    scaler: Option<Scaler>,
    estimator: Estimator,
}

/// Classes may be written as label names or as numeric codes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawClass {
    Code(u8),
    Name(String),
}

impl RawClass {
    fn to_label(&self) -> Result<HeadingLabel, ModelError> {
        match self {
            RawClass::Code(code) => HeadingLabel::from_code(*code)
                .ok_or_else(|| ModelError::Invalid(format!("unknown class code {code}"))),
            RawClass::Name(name) => name
                .parse()
                .map_err(|e| ModelError::Invalid(format!("{e}"))),
        }
    }
}

/// Pre-fit standard scaling: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    /// Apply the scaling. A zero scale leaves the centred value unscaled.
    pub fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                (v - m) / s
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Estimator {
    Forest {
        trees: Vec<Tree>,
    },
    Boosted {
        trees: Vec<Tree>,
        #[serde(default)]
        base_score: f64,
    },
    Mlp {
        layers: Vec<DenseLayer>,
        activation: Activation,
    },
}

/// A decision tree stored as a flat node list rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    /// Go `left` when `x[feature] <= threshold`, otherwise `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DenseLayer {
    /// `weights[out][in]`.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Tanh,
    Logistic,
    Identity,
}

impl Activation {
    fn apply(self, v: f64) -> f64 {
        match self {
            Activation::Relu => v.max(0.0),
            Activation::Tanh => v.tanh(),
            Activation::Logistic => 1.0 / (1.0 + (-v).exp()),
            Activation::Identity => v,
        }
    }
}

// ---------------------------------------------------------------------------
// Validated artifact
// ---------------------------------------------------------------------------

/// A loaded and validated model artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    feature_keys: Vec<FeatureKey>,
    classes: Vec<HeadingLabel>,
    scaler: Option<Scaler>,
    estimator: Estimator,
}

impl ModelArtifact {
    /// Parse and validate an artifact from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawArtifact) -> Result<Self, ModelError> {
        if raw.format_version != FORMAT_VERSION {
            return Err(ModelError::Invalid(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                raw.format_version
            )));
        }

        let feature_keys = raw
            .feature_keys
            .iter()
            .map(|k| {
                k.parse::<FeatureKey>()
                    .map_err(|e| ModelError::FeatureSchemaMismatch(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if feature_keys.is_empty() {
            return Err(ModelError::FeatureSchemaMismatch(
                "artifact declares no feature keys".into(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = feature_keys.iter().find(|k| !seen.insert(**k)) {
            return Err(ModelError::FeatureSchemaMismatch(format!(
                "duplicate feature key {dup}"
            )));
        }

        let classes = raw
            .classes
            .iter()
            .map(RawClass::to_label)
            .collect::<Result<Vec<_>, _>>()?;

        let artifact = Self {
            feature_keys,
            classes,
            scaler: raw.scaler,
            estimator: raw.estimator,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ModelError> {
        let n_features = self.feature_keys.len();
        let n_classes = self.classes.len();
        if n_classes == 0 {
            return Err(ModelError::Invalid("classes must not be empty".into()));
        }

        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n_features || scaler.scale.len() != n_features {
                return Err(ModelError::Invalid(format!(
                    "scaler has {} means and {} scales for {n_features} features",
                    scaler.mean.len(),
                    scaler.scale.len()
                )));
            }
        }

        match &self.estimator {
            Estimator::Forest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::Invalid("forest has no trees".into()));
                }
                for (i, tree) in trees.iter().enumerate() {
                    validate_tree(tree, n_features, n_classes)
                        .map_err(|e| ModelError::Invalid(format!("tree {i}: {e}")))?;
                }
            }
            Estimator::Boosted { trees, .. } => {
                if trees.is_empty() || trees.len() % n_classes != 0 {
                    return Err(ModelError::Invalid(format!(
                        "boosted model has {} trees, expected a non-zero multiple of {n_classes}",
                        trees.len()
                    )));
                }
                for (i, tree) in trees.iter().enumerate() {
                    validate_tree(tree, n_features, 1)
                        .map_err(|e| ModelError::Invalid(format!("tree {i}: {e}")))?;
                }
            }
            Estimator::Mlp { layers, .. } => {
                if layers.is_empty() {
                    return Err(ModelError::Invalid("mlp has no layers".into()));
                }
                let mut width = n_features;
                for (i, layer) in layers.iter().enumerate() {
                    if layer.weights.is_empty() || layer.bias.len() != layer.weights.len() {
                        return Err(ModelError::Invalid(format!(
                            "layer {i}: {} weight rows and {} biases",
                            layer.weights.len(),
                            layer.bias.len()
                        )));
                    }
                    if let Some(row) = layer.weights.iter().position(|r| r.len() != width) {
                        return Err(ModelError::Invalid(format!(
                            "layer {i}: row {row} has {} inputs, expected {width}",
                            layer.weights[row].len()
                        )));
                    }
                    width = layer.weights.len();
                }
                if width != n_classes {
                    return Err(ModelError::Invalid(format!(
                        "mlp output width {width} does not match {n_classes} classes"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn feature_keys(&self) -> &[FeatureKey] {
        &self.feature_keys
    }

    pub fn classes(&self) -> &[HeadingLabel] {
        &self.classes
    }

    /// Predict the label for one feature vector, laid out in
    /// [`feature_keys`](Self::feature_keys) order.
    pub fn predict(&self, x: &[f64]) -> Result<HeadingLabel, ClassifyError> {
        if x.len() != self.feature_keys.len() {
            return Err(ClassifyError::FeatureSchemaMismatch {
                expected: self.feature_keys.len(),
                got: x.len(),
            });
        }

        let scaled;
        let x = match &self.scaler {
            Some(scaler) => {
                scaled = scaler.transform(x);
                scaled.as_slice()
            }
            None => x,
        };

        let scores = self.decision_scores(x);
        Ok(self.classes[argmax(&scores)])
    }

    /// Per-class scores, indexed like [`classes`](Self::classes).
    fn decision_scores(&self, x: &[f64]) -> Vec<f64> {
        let n_classes = self.classes.len();
        match &self.estimator {
            Estimator::Forest { trees } => {
                let mut acc = vec![0.0; n_classes];
                for tree in trees {
                    let leaf = tree.leaf(x);
                    let total: f64 = leaf.iter().sum();
                    for (a, v) in acc.iter_mut().zip(leaf) {
                        *a += if total > 0.0 { v / total } else { *v };
                    }
                }
                let n = trees.len() as f64;
                acc.iter().map(|a| a / n).collect()
            }
            Estimator::Boosted { trees, base_score } => {
                let mut acc = vec![*base_score; n_classes];
                for (i, tree) in trees.iter().enumerate() {
                    acc[i % n_classes] += tree.leaf(x)[0];
                }
                acc
            }
            Estimator::Mlp { layers, activation } => {
                let last = layers.len() - 1;
                let mut values = x.to_vec();
                for (i, layer) in layers.iter().enumerate() {
                    values = layer
                        .weights
                        .iter()
                        .zip(&layer.bias)
                        .map(|(row, b)| {
                            let z = row.iter().zip(&values).map(|(w, v)| w * v).sum::<f64>() + b;
                            if i == last {
                                z
                            } else {
                                activation.apply(z)
                            }
                        })
                        .collect();
                }
                values
            }
        }
    }
}

impl Tree {
    /// Walk from the root to a leaf. Only call on validated trees.
    fn leaf(&self, x: &[f64]) -> &[f64] {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => i = if x[*feature] <= *threshold { *left } else { *right },
                Node::Leaf { value } => return value,
            }
        }
    }
}

fn validate_tree(tree: &Tree, n_features: usize, leaf_len: usize) -> Result<(), String> {
    if tree.nodes.is_empty() {
        return Err("no nodes".into());
    }
    let n = tree.nodes.len();
    for (i, node) in tree.nodes.iter().enumerate() {
        match node {
            Node::Split {
                feature,
                left,
                right,
                ..
            } => {
                if *feature >= n_features {
                    return Err(format!("node {i} splits on feature {feature} of {n_features}"));
                }
                for child in [*left, *right] {
                    if child <= i || child >= n {
                        return Err(format!("node {i} has invalid child {child}"));
                    }
                }
            }
            Node::Leaf { value } => {
                if value.len() != leaf_len {
                    return Err(format!(
                        "leaf {i} has {} values, expected {leaf_len}",
                        value.len()
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Index of the largest score; ties go to the lowest index.
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, s) in scores.iter().enumerate().skip(1) {
        if *s > scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(value: serde_json::Value) -> Result<ModelArtifact, ModelError> {
        ModelArtifact::from_json(&value.to_string())
    }

    fn stump(feature: usize, threshold: f64, left: Vec<f64>, right: Vec<f64>) -> serde_json::Value {
        json!({ "nodes": [
            { "split": { "feature": feature, "threshold": threshold, "left": 1, "right": 2 } },
            { "leaf": { "value": left } },
            { "leaf": { "value": right } }
        ]})
    }

    fn forest() -> serde_json::Value {
        json!({
            "format_version": 1,
            "feature_keys": ["font_size", "bold"],
            "classes": ["NotHeading", "H1"],
            "scaler": null,
            "estimator": {
                "kind": "forest",
                "trees": [
                    stump(0, 14.0, vec![9.0, 1.0], vec![1.0, 9.0]),
                    stump(1, 0.5, vec![3.0, 1.0], vec![0.0, 4.0])
                ]
            }
        })
    }

    #[test]
    fn test_forest_predicts_with_normalized_average() {
        let model = load(forest()).unwrap();
        assert_eq!(model.predict(&[18.0, 1.0]), Ok(HeadingLabel::H1));
        assert_eq!(model.predict(&[10.0, 0.0]), Ok(HeadingLabel::NotHeading));
        // Tree 1 favours body 0.9, tree 2 favours H1 1.0 -> H1 on average.
        assert_eq!(model.predict(&[10.0, 1.0]), Ok(HeadingLabel::H1));
    }

    #[test]
    fn test_split_goes_left_on_equality() {
        let model = load(forest()).unwrap();
        // font_size == 14 goes left (body 0.9); bold 0 goes left (body 0.75).
        assert_eq!(model.predict(&[14.0, 0.0]), Ok(HeadingLabel::NotHeading));
    }

    #[test]
    fn test_wrong_vector_length_is_schema_mismatch() {
        let model = load(forest()).unwrap();
        assert_eq!(
            model.predict(&[18.0]),
            Err(ClassifyError::FeatureSchemaMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_scaler_applied_before_estimator() {
        let mut value = forest();
        value["scaler"] = json!({ "mean": [12.0, 0.0], "scale": [2.0, 0.0] });
        value["estimator"]["trees"] = json!([stump(0, 0.0, vec![1.0, 0.0], vec![0.0, 1.0])]);
        let model = load(value).unwrap();
        assert_eq!(model.predict(&[12.0, 0.0]), Ok(HeadingLabel::NotHeading));
        assert_eq!(model.predict(&[13.0, 0.0]), Ok(HeadingLabel::H1));
    }

    #[test]
    fn test_scaler_zero_scale_is_identity() {
        let scaler = Scaler {
            mean: vec![1.0, 1.0],
            scale: vec![0.0, 2.0],
        };
        assert_eq!(scaler.transform(&[3.0, 3.0]), vec![2.0, 1.0]);
    }

    #[test]
    fn test_boosted_sums_per_class() {
        let model = load(json!({
            "format_version": 1,
            "feature_keys": ["font_size"],
            "classes": [5, 2],
            "estimator": {
                "kind": "boosted",
                "base_score": 0.5,
                "trees": [
                    stump(0, 14.0, vec![1.0], vec![-1.0]),
                    stump(0, 14.0, vec![-1.0], vec![1.0]),
                    stump(0, 20.0, vec![0.2], vec![0.0]),
                    stump(0, 20.0, vec![0.0], vec![0.3])
                ]
            }
        }))
        .unwrap();
        assert_eq!(model.classes(), &[HeadingLabel::NotHeading, HeadingLabel::H2]);
        assert_eq!(model.predict(&[10.0]), Ok(HeadingLabel::NotHeading));
        assert_eq!(model.predict(&[16.0]), Ok(HeadingLabel::H2));
    }

    #[test]
    fn test_mlp_forward_pass() {
        let model = load(json!({
            "format_version": 1,
            "feature_keys": ["font_size", "bold"],
            "classes": ["NotHeading", "H1"],
            "estimator": {
                "kind": "mlp",
                "activation": "relu",
                "layers": [
                    { "weights": [[1.0, 0.0], [0.0, 1.0]], "bias": [-14.0, 0.0] },
                    { "weights": [[-1.0, -1.0], [1.0, 1.0]], "bias": [0.5, 0.0] }
                ]
            }
        }))
        .unwrap();
        assert_eq!(model.predict(&[10.0, 0.0]), Ok(HeadingLabel::NotHeading));
        assert_eq!(model.predict(&[18.0, 0.0]), Ok(HeadingLabel::H1));
        assert_eq!(model.predict(&[10.0, 1.0]), Ok(HeadingLabel::H1));
    }

    #[test]
    fn test_argmax_ties_go_to_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }

    #[test]
    fn test_unknown_feature_key_is_schema_mismatch() {
        let mut value = forest();
        value["feature_keys"] = json!(["font_size", "font_weight"]);
        assert!(matches!(load(value), Err(ModelError::FeatureSchemaMismatch(_))));
    }

    #[test]
    fn test_duplicate_feature_key_is_schema_mismatch() {
        let mut value = forest();
        value["feature_keys"] = json!(["font_size", "font_size"]);
        assert!(matches!(load(value), Err(ModelError::FeatureSchemaMismatch(_))));
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            ("/format_version", json!(2)),
            ("/classes", json!([])),
            ("/classes", json!(["H9"])),
            ("/scaler", json!({ "mean": [0.0], "scale": [1.0] })),
            ("/estimator/trees", json!([])),
            ("/estimator/trees", json!([stump(5, 1.0, vec![1.0, 0.0], vec![0.0, 1.0])])),
            ("/estimator/trees", json!([stump(0, 1.0, vec![1.0], vec![0.0, 1.0])])),
            (
                "/estimator/trees",
                json!([{ "nodes": [
                    { "split": { "feature": 0, "threshold": 1.0, "left": 0, "right": 1 } },
                    { "leaf": { "value": [1.0, 0.0] } }
                ]}]),
            ),
        ];
        for (pointer, replacement) in cases {
            let mut value = forest();
            *value.pointer_mut(pointer).unwrap() = replacement.clone();
            assert!(
                matches!(load(value), Err(ModelError::Invalid(_))),
                "{pointer} = {replacement} should be invalid"
            );
        }
    }

    #[test]
    fn test_boosted_tree_count_must_match_classes() {
        let err = load(json!({
            "format_version": 1,
            "feature_keys": ["font_size"],
            "classes": ["NotHeading", "H1"],
            "estimator": { "kind": "boosted", "trees": [stump(0, 1.0, vec![1.0], vec![0.0])] }
        }));
        assert!(matches!(err, Err(ModelError::Invalid(_))));
    }

    #[test]
    fn test_mlp_shapes_must_chain() {
        let err = load(json!({
            "format_version": 1,
            "feature_keys": ["font_size", "bold"],
            "classes": ["NotHeading", "H1"],
            "estimator": {
                "kind": "mlp",
                "activation": "tanh",
                "layers": [ { "weights": [[1.0], [1.0]], "bias": [0.0, 0.0] } ]
            }
        }));
        assert!(matches!(err, Err(ModelError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            ModelArtifact::from_json("{ not json"),
            Err(ModelError::Parse(_))
        ));
    }
}

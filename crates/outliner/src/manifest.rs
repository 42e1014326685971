use outliner_core::features::{FeatureKey, FEATURE_KEYS};
use outliner_core::HeadingLabel;
use serde::Serialize;

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "manifest")]
#[command(about = "Print the feature manifest and label table shared with training")]
pub struct App {}

#[derive(Debug, Serialize)]
pub struct LabelEntry {
    pub code: u8,
    pub label: HeadingLabel,
}

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub feature_keys: Vec<FeatureKey>,
    pub labels: Vec<LabelEntry>,
}

impl Manifest {
    pub fn current() -> Self {
        Self {
            feature_keys: FEATURE_KEYS.to_vec(),
            labels: HeadingLabel::ALL
                .iter()
                .map(|&label| LabelEntry {
                    code: label.code(),
                    label,
                })
                .collect(),
        }
    }
}

pub async fn run(_app: App, _global: crate::Global) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&Manifest::current())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_shape() {
        let value = serde_json::to_value(Manifest::current()).unwrap();

        let keys = value["feature_keys"].as_array().unwrap();
        assert_eq!(keys.len(), 24);
        assert_eq!(keys[0], "font_size");
        assert_eq!(keys[23], "num_interjections");

        assert_eq!(value["labels"][0], serde_json::json!({"code": 0, "label": "Title"}));
        assert_eq!(value["labels"][5], serde_json::json!({"code": 5, "label": "NotHeading"}));
    }
}

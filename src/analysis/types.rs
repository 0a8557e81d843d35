use serde::{Deserialize, Serialize};

use crate::overlay::types::{Finding, NormalizedBox};

/// One detection returned by `/analyze/image`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFinding {
    /// e.g. "face", "license_plate", "email", "credit_card".
    pub kind: String,
    /// Normalized `[x, y, w, h]`.
    pub bbox: NormalizedBox,
    #[serde(default)]
    pub conf: f64,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub ver: String,
    /// Masked text for OCR-derived items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<&ImageFinding> for Finding {
    fn from(f: &ImageFinding) -> Self {
        Finding {
            bbox: f.bbox,
            label: f.kind.clone(),
            text: f.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageResponse {
    pub findings: Vec<ImageFinding>,
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default)]
    pub image_shape: (u32, u32),
    #[serde(default = "default_coord_space")]
    pub coord_space: String,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
}

fn default_coord_space() -> String {
    "normalized".to_string()
}

impl AnalyzeImageResponse {
    pub fn to_findings(&self) -> Vec<Finding> {
        self.findings.iter().map(Finding::from).collect()
    }
}

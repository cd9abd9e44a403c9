use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }

    /// Display string shown next to each result
    pub fn display_name(&self) -> &'static str {
        match self {
            Gender::Female => "여성",
            Gender::Male => "남성",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "female" => Some(Gender::Female),
            "male" => Some(Gender::Male),
            _ => None,
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::from_token(&s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown gender '{}', expected 'female' or 'male'", s))
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One vocabulary entry, written as `<country>_<gender>` in the label resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub country: String,
    pub gender: Gender,
}

impl Label {
    pub fn new(country: impl Into<String>, gender: Gender) -> Self {
        Self {
            country: country.into(),
            gender,
        }
    }

    /// Parse `korean_female`, `hong_kong_male`, ...
    ///
    /// The gender is the token after the last underscore, so multi-word
    /// country tokens stay intact.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let (country, gender) = raw
            .rsplit_once('_')
            .ok_or_else(|| anyhow::anyhow!("label '{}' is not of the form <country>_<gender>", raw))?;

        if country.is_empty() {
            anyhow::bail!("label '{}' has an empty country token", raw);
        }

        let gender = Gender::from_token(gender)
            .ok_or_else(|| anyhow::anyhow!("label '{}' has unknown gender token '{}'", raw, gender))?;

        Ok(Self::new(country, gender))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.country, self.gender)
    }
}

/// Categorical distribution over the label vocabulary.
///
/// Always non-empty, finite, non-negative and normalized to sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionVector(Vec<f64>);

impl PredictionVector {
    /// Normalize raw non-negative scores by their sum.
    /// An all-zero input becomes the uniform distribution.
    pub fn from_scores(scores: Vec<f64>) -> anyhow::Result<Self> {
        if scores.is_empty() {
            anyhow::bail!("prediction vector is empty");
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_finite() || **s < 0.0) {
            anyhow::bail!("prediction vector contains invalid score {}", bad);
        }

        let total: f64 = scores.iter().sum();
        let len = scores.len();
        let normalized = if total > 0.0 {
            scores.into_iter().map(|s| s / total).collect()
        } else {
            vec![1.0 / len as f64; len]
        };

        Ok(Self(normalized))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Qualitative confidence derived from a raw probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "매우 높음")]
    VeryHigh,
    #[serde(rename = "높음")]
    High,
    #[serde(rename = "보통")]
    Medium,
    #[serde(rename = "낮음")]
    Low,
    #[serde(rename = "매우 낮음")]
    VeryLow,
}

impl ConfidenceLevel {
    /// Thresholds are inclusive lower bounds: 0.8, 0.6, 0.4, 0.2.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.8 {
            ConfidenceLevel::VeryHigh
        } else if probability >= 0.6 {
            ConfidenceLevel::High
        } else if probability >= 0.4 {
            ConfidenceLevel::Medium
        } else if probability >= 0.2 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "very high",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::VeryLow => "very low",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "매우 높음",
            ConfidenceLevel::High => "높음",
            ConfidenceLevel::Medium => "보통",
            ConfidenceLevel::Low => "낮음",
            ConfidenceLevel::VeryLow => "매우 낮음",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One row of the ranked result, formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub country: String,
    pub gender: String,
    /// Percentage with two decimals, e.g. `"70.00"`
    pub probability: String,
    pub confidence: ConfidenceLevel,
    #[serde(skip)]
    pub score: f64,
    #[serde(skip)]
    pub label_index: usize,
}

/// Static metadata shown alongside results.
///
/// Descriptive only: none of these figures are measured by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub accuracy: &'static str,
    pub training_data: &'static str,
    pub countries: u32,
    pub model_type: &'static str,
    pub input_size: &'static str,
    pub last_updated: &'static str,
}

impl ModelInfo {
    pub fn published() -> Self {
        Self {
            accuracy: "40.32%",
            training_data: "1,263개 이미지",
            countries: 8,
            model_type: "MobileNetV2 (전이학습)",
            input_size: "224x224",
            last_updated: "2025-08-08",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub is_loaded: bool,
    pub is_loading: bool,
    pub labels_count: usize,
    pub backend: String,
}

/// Raw user input: an encoded image and the selected gender.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub image: Option<Vec<u8>>,
    pub gender: Option<Gender>,
}

impl AnalysisRequest {
    pub fn new(image: Vec<u8>, gender: Gender) -> Self {
        Self {
            image: Some(image),
            gender: Some(gender),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub gender: Gender,
    pub face_detected: bool,
    pub results: Vec<RankedEntry>,
    pub backend: String,
    pub inference_time_ms: u64,
}

//! Label vocabulary and display tables.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::models::Label;

/// Vocabulary used when the label resource cannot be loaded.
pub const FALLBACK_LABELS: [&str; 16] = [
    "british_female", "british_male",
    "chinese_female", "chinese_male",
    "french_female", "french_male",
    "german_female", "german_male",
    "italian_female", "italian_male",
    "japanese_female", "japanese_male",
    "korean_female", "korean_male",
    "spanish_female", "spanish_male",
];

/// Expected vocabulary size for the published model.
pub const EXPECTED_LABEL_COUNT: usize = 16;

const COUNTRY_NAMES: [(&str, &str); 20] = [
    ("japanese", "일본"),
    ("korean", "한국"),
    ("chinese", "중국"),
    ("taiwanese", "대만"),
    ("hong_kong", "홍콩"),
    ("british", "영국"),
    ("german", "독일"),
    ("french", "프랑스"),
    ("italian", "이탈리아"),
    ("spanish", "스페인"),
    ("russian", "러시아"),
    ("indian", "인도"),
    ("brazilian", "브라질"),
    ("mexican", "멕시코"),
    ("turkish", "터키"),
    ("iranian", "이란"),
    ("nigerian", "나이지리아"),
    ("thai", "태국"),
    ("indonesian", "인도네시아"),
    ("indigenous_american", "아메리카 원주민"),
];

/// Map a country token to its display name.
/// Tokens missing from the table are returned unchanged.
pub fn format_country_name(token: &str) -> String {
    COUNTRY_NAMES
        .iter()
        .find(|(key, _)| *key == token)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| token.to_string())
}

/// JSON document describing the model's labels.
///
/// The training scripts also write `input_shape` and `num_classes`; both are
/// optional here.
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyDocument {
    pub labels: Vec<String>,
    #[serde(default)]
    pub input_shape: Option<Vec<usize>>,
    #[serde(default)]
    pub num_classes: Option<usize>,
}

/// Ordered label vocabulary; position `i` matches output `i` of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVocabulary {
    labels: Vec<Label>,
}

impl LabelVocabulary {
    pub fn new(labels: Vec<Label>) -> anyhow::Result<Self> {
        if labels.is_empty() {
            anyhow::bail!("label vocabulary is empty");
        }
        Ok(Self { labels })
    }

    pub fn from_tokens<I, S>(tokens: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels = tokens
            .into_iter()
            .map(|token| Label::parse(token.as_ref()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Self::new(labels)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let document: VocabularyDocument = serde_json::from_str(text)?;

        if let Some(num_classes) = document.num_classes {
            if num_classes != document.labels.len() {
                anyhow::bail!(
                    "num_classes is {} but {} labels are listed",
                    num_classes,
                    document.labels.len()
                );
            }
        }

        Self::from_tokens(&document.labels)
    }

    /// The hardcoded 16-entry vocabulary.
    pub fn fallback() -> Self {
        let labels = FALLBACK_LABELS
            .iter()
            .filter_map(|token| Label::parse(token).ok())
            .collect();
        Self { labels }
    }

    /// Read and parse the vocabulary resource.
    pub async fn load(path: &Path) -> Result<Self, LoadError> {
        debug!("Reading label vocabulary from {}", path.display());

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LoadError::ResourceFetch {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let vocabulary =
            Self::from_json(&text).map_err(|e| LoadError::InvalidVocabulary(format!("{:#}", e)))?;

        if vocabulary.len() != EXPECTED_LABEL_COUNT {
            warn!(
                "Label vocabulary has {} entries (expected {})",
                vocabulary.len(),
                EXPECTED_LABEL_COUNT
            );
        }

        Ok(vocabulary)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Label> {
        self.labels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }
}

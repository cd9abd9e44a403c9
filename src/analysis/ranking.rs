use anyhow::Result;

use crate::labels::{LabelVocabulary, format_country_name};
use crate::models::{ConfidenceLevel, Label, PredictionVector, RankedEntry};

/// Number of entries in a ranked result
pub const TOP_K: usize = 5;

/// Indices and probabilities of the `k` most likely labels.
///
/// Sorted by descending probability; equal probabilities keep vocabulary
/// order because the sort is stable.
pub fn top_k(prediction: &PredictionVector, k: usize) -> Vec<(usize, f64)> {
    let mut indexed: Vec<(usize, f64)> = prediction.as_slice().iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed.truncate(k);
    indexed
}

pub fn format_entry(label: &Label, label_index: usize, probability: f64) -> RankedEntry {
    RankedEntry {
        country: format_country_name(&label.country),
        gender: label.gender.display_name().to_string(),
        probability: format!("{:.2}", probability * 100.0),
        confidence: ConfidenceLevel::from_probability(probability),
        score: probability,
        label_index,
    }
}

/// Top-5 formatted entries for a prediction over `vocabulary`
pub fn rank_predictions(
    prediction: &PredictionVector,
    vocabulary: &LabelVocabulary,
) -> Result<Vec<RankedEntry>> {
    if prediction.len() != vocabulary.len() {
        anyhow::bail!(
            "prediction has {} scores but the vocabulary has {} labels",
            prediction.len(),
            vocabulary.len()
        );
    }

    top_k(prediction, TOP_K)
        .into_iter()
        .map(|(index, probability)| {
            let label = vocabulary
                .get(index)
                .ok_or_else(|| anyhow::anyhow!("no label at index {}", index))?;
            Ok(format_entry(label, index, probability))
        })
        .collect()
}

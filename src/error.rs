use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Reasons the loader fell back to the random-score model.
///
/// These never escape [`crate::AncestorModel::load`]; they are reported inside
/// [`crate::LoadOutcome::Degraded`] so callers can log why the fallback ran.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("failed to fetch label vocabulary from {path}: {reason}")]
    ResourceFetch { path: PathBuf, reason: String },
    #[error("invalid label vocabulary: {0}")]
    InvalidVocabulary(String),
    #[error("compute backend unavailable: {0}")]
    BackendInit(String),
    #[error("model loading timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors surfaced to whoever asked for an analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("model is not ready")]
    NotReady,
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("missing input: {0}")]
    MissingInput(&'static str),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("prediction timed out after {0:?}")]
    Timeout(Duration),
}

impl AnalysisError {
    /// Message shown to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::NotReady => "AI 모델이 아직 준비되지 않았습니다. 잠시 후 다시 시도해주세요.",
            AnalysisError::Decode(_) => "이미지를 읽을 수 없습니다. 다른 사진을 업로드해주세요.",
            AnalysisError::MissingInput(_) => "사진과 성별을 모두 선택해주세요.",
            AnalysisError::Inference(_) => "분석 중 오류가 발생했습니다. 다시 시도해주세요.",
            AnalysisError::Timeout(_) => "분석 시간이 초과되었습니다. 다시 시도해주세요.",
        }
    }
}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        AnalysisError::Inference(format!("{:#}", err))
    }
}

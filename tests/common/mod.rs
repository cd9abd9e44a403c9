mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from ancestor for tests
pub use ancestor::{
    AnalysisError, AnalysisRequest, AncestorModel, Config, ConfidenceLevel, Gender, InferenceMode,
    LoadError, LoadOutcome, ModelState,
};
pub use ancestor::inference::{BackendKind, ScoreSampler};

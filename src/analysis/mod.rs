pub mod face;
pub mod preprocessing;
pub mod ranking;
pub mod steps;

use std::sync::Arc;

use crate::inference::Engine;
use crate::labels::LabelVocabulary;
use crate::pipeline::{Pipeline, PipelineContext};

pub use face::detect_face;
pub use preprocessing::{decode_image, preprocess};
pub use ranking::rank_predictions;

/// Face check -> preprocess -> inference -> ranking
pub fn build_analysis_pipeline(
    engine: Engine,
    vocabulary: Arc<LabelVocabulary>,
    context: PipelineContext,
) -> Pipeline {
    use steps::*;

    let num_labels = vocabulary.len();

    Pipeline::new()
        .with_context(context)
        .add_step(Arc::new(FaceCheckStep))
        .add_step(Arc::new(PreprocessStep))
        .add_step(Arc::new(InferenceStep { engine, num_labels }))
        .add_step(Arc::new(RankingStep { vocabulary }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::FallbackScorer;

    #[test]
    fn test_standard_pipeline_steps() {
        let pipeline = build_analysis_pipeline(
            Engine::Fallback(Arc::new(FallbackScorer::new(Some(3)))),
            Arc::new(LabelVocabulary::fallback()),
            PipelineContext::default(),
        );
        assert_eq!(
            pipeline.step_names(),
            vec!["Face Check", "Preprocess", "Inference", "Ranking"]
        );
    }
}

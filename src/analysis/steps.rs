use std::sync::Arc;

use anyhow::Result;
use image::DynamicImage;
use tracing::debug;

use crate::analysis::{face, preprocessing, ranking};
use crate::inference::Engine;
use crate::labels::LabelVocabulary;
use crate::pipeline::{MetadataValue, PipelineContext, PipelineData, PipelineStep};

/// Record whether a face is present (always true) and where the region is
pub struct FaceCheckStep;

impl PipelineStep for FaceCheckStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let present = face::detect_face(&data.image);
        data.metadata
            .insert("face_present".to_string(), MetadataValue::Bool(present));

        if let Ok(region) = face::FaceRegion::central(data.image.width(), data.image.height()) {
            data.metadata.insert("face_x".to_string(), MetadataValue::Int(region.x as i32));
            data.metadata.insert("face_y".to_string(), MetadataValue::Int(region.y as i32));
            data.metadata
                .insert("face_size".to_string(), MetadataValue::Int(region.size as i32));
        }

        Ok(data)
    }

    fn name(&self) -> &str {
        "Face Check"
    }

    fn debug_image(&self, data: &PipelineData) -> Option<DynamicImage> {
        let region = face::FaceRegion {
            x: data.get_int("face_x")? as u32,
            y: data.get_int("face_y")? as u32,
            size: data.get_int("face_size")? as u32,
        };
        Some(face::annotate_face_region(&data.image, region))
    }
}

/// Resize to the model input and build the normalized tensor
pub struct PreprocessStep;

impl PipelineStep for PreprocessStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let tensor = preprocessing::preprocess(&data.image)?;
        if let Some(preview) = preprocessing::tensor_to_image(&tensor) {
            data.image = preview;
        }
        data.tensor = Some(tensor);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Preprocess"
    }
}

/// Run the engine on the input tensor
pub struct InferenceStep {
    pub engine: Engine,
    pub num_labels: usize,
}

impl PipelineStep for InferenceStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let tensor = data
            .tensor
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("inference requires a preprocessed tensor"))?;

        let prediction = self.engine.infer(tensor, self.num_labels)?;
        debug!("{} engine produced {} scores", self.engine.kind(), prediction.len());

        data.metadata.insert(
            "backend".to_string(),
            MetadataValue::String(self.engine.kind().as_str().to_string()),
        );
        data.prediction = Some(prediction);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Inference"
    }

    fn debug_image(&self, _data: &PipelineData) -> Option<DynamicImage> {
        None
    }
}

/// Rank and format the top labels
pub struct RankingStep {
    pub vocabulary: Arc<LabelVocabulary>,
}

impl PipelineStep for RankingStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let prediction = data
            .prediction
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("ranking requires a prediction"))?;

        data.ranked = ranking::rank_predictions(prediction, &self.vocabulary)?;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Ranking"
    }

    fn debug_image(&self, _data: &PipelineData) -> Option<DynamicImage> {
        None
    }
}

use std::collections::VecDeque;
use std::io::Cursor;

use ancestor::inference::ScoreSampler;
use ancestor::{Config, InferenceMode};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use tempfile::NamedTempFile;

/// Writes a vocabulary document with the given label tokens.
/// The file will be automatically cleaned up when dropped.
pub fn write_vocabulary(labels: &[&str]) -> NamedTempFile {
    let document = serde_json::json!({ "labels": labels });
    write_raw_vocabulary(&document.to_string())
}

/// Writes arbitrary text as a vocabulary file.
pub fn write_raw_vocabulary(content: &str) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create temp vocabulary file");
    std::fs::write(file.path(), content).expect("Failed to write vocabulary");
    file
}

/// Creates a skin-toned test image with a darker center patch.
pub fn create_test_image(width: u32, height: u32) -> DynamicImage {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let center = x > width / 3 && x < 2 * width / 3 && y > height / 3 && y < 2 * height / 3;
        if center {
            Rgb([150u8, 110u8, 90u8])
        } else {
            Rgb([230u8, 200u8, 180u8])
        }
    });
    DynamicImage::ImageRgb8(img)
}

/// Encodes an image as PNG bytes, the way an upload would arrive.
pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes.into_inner()
}

/// Returns prepared score vectors in order, then repeats the last one.
pub struct FixedScores {
    queue: VecDeque<Vec<f64>>,
    last: Vec<f64>,
}

impl FixedScores {
    pub fn new(scores: Vec<f64>) -> Self {
        Self::sequence(vec![scores])
    }

    pub fn sequence(scores: Vec<Vec<f64>>) -> Self {
        let last = scores.last().cloned().unwrap_or_default();
        Self {
            queue: scores.into(),
            last,
        }
    }

    pub fn boxed(scores: Vec<f64>) -> Box<dyn ScoreSampler> {
        Box::new(Self::new(scores))
    }
}

impl ScoreSampler for FixedScores {
    fn sample(&mut self, _len: usize) -> Vec<f64> {
        self.queue.pop_front().unwrap_or_else(|| self.last.clone())
    }
}

/// Configuration that forces the fallback engine on the given vocabulary.
pub fn fallback_config(labels: &NamedTempFile) -> Config {
    Config {
        labels_path: labels.path().to_path_buf(),
        mode: InferenceMode::Fallback,
        seed: Some(42),
        ..Config::default()
    }
}

/// Configuration that builds the untrained CPU network.
pub fn cpu_config(labels: &NamedTempFile) -> Config {
    Config {
        labels_path: labels.path().to_path_buf(),
        backend: "cpu".to_string(),
        mode: InferenceMode::Auto,
        seed: Some(7),
        ..Config::default()
    }
}

pub const KOREAN_PAIR: [&str; 2] = ["korean_female", "korean_male"];

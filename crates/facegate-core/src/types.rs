use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::encoder::EncoderError;

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection-over-Union with another box, 0.0 when the union is empty.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let inter = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

/// Face feature vector (512-dimensional and L2-normalized for ArcFace).
///
/// Serialized as a bare JSON array; this is the only thing the target store
/// writes to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Euclidean distance between two embeddings.
    ///
    /// Mismatched dimensions compare as infinitely far apart.
    pub fn distance(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return f32::INFINITY;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Distance threshold at or below which two embeddings are the same person.
///
/// Strict for unit-length ArcFace vectors (cosine 0.875); raise it through
/// configuration when separate photos of one person fail to match.
pub const DEFAULT_TOLERANCE: f32 = 0.5;

/// The face-recognition collaborator.
///
/// Implementations locate every face in an image and return one embedding per
/// face, in the implementation's own order. Callers that need a single face
/// take the first one.
pub trait FaceEncoder {
    fn detect_and_encode(&mut self, image: &RgbImage) -> Result<Vec<Embedding>, EncoderError>;

    /// Lower tolerance is stricter.
    fn compare(&self, target: &Embedding, candidate: &Embedding, tolerance: f32) -> bool {
        target.distance(candidate) <= tolerance
    }
}

/// Whether any candidate matches `target`, stopping at the first hit.
pub fn any_match<E: FaceEncoder + ?Sized>(
    encoder: &E,
    target: &Embedding,
    candidates: &[Embedding],
    tolerance: f32,
) -> bool {
    candidates
        .iter()
        .any(|candidate| encoder.compare(target, candidate, tolerance))
}

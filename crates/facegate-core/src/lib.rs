//! facegate-core: face encoding and single-target persistence.
//!
//! Uses SCRFD for face detection and ArcFace for face embeddings, both
//! running via ONNX Runtime, behind the [`FaceEncoder`] trait.

pub mod alignment;
pub mod decode;
pub mod detector;
pub mod encoder;
pub mod recognizer;
pub mod store;
pub mod types;

pub use decode::{decode_rgb, ImageError};
pub use encoder::{default_model_dir, EncoderError, OnnxFaceEncoder};
pub use store::{StoreError, TargetStore, DEFAULT_STORE_PATH};
pub use types::{any_match, BoundingBox, Embedding, FaceEncoder, DEFAULT_TOLERANCE};

//! Scripted encoder for tests: every pixel in row 0 is one "face".

use facegate_core::{Embedding, EncoderError, FaceEncoder};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A pixel that contributes no face.
pub const NO_FACE: Rgb<u8> = Rgb([0, 0, 0]);
/// A pixel that makes the encoder fail.
pub const FAIL: Rgb<u8> = Rgb([1, 1, 1]);
pub const PERSON_A: Rgb<u8> = Rgb([255, 0, 0]);
/// Same person as A under different lighting; within 0.5 of A.
pub const PERSON_A_ALT: Rgb<u8> = Rgb([240, 20, 0]);
pub const PERSON_B: Rgb<u8> = Rgb([0, 0, 255]);

pub fn embedding_of(pixel: Rgb<u8>) -> Embedding {
    Embedding::new(pixel.0.iter().map(|&c| c as f32 / 255.0).collect())
}

/// Encode a one-row PNG with one pixel per entry.
pub fn png(faces: &[Rgb<u8>]) -> Vec<u8> {
    let mut image = RgbImage::new(faces.len() as u32, 1);
    for (x, &p) in faces.iter().enumerate() {
        image.put_pixel(x as u32, 0, p);
    }
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode test png");
    buf.into_inner()
}

#[derive(Clone, Default)]
pub struct ScriptedEncoder {
    pub calls: Arc<AtomicUsize>,
}

impl FaceEncoder for ScriptedEncoder {
    fn detect_and_encode(&mut self, image: &RgbImage) -> Result<Vec<Embedding>, EncoderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut faces = Vec::new();
        for x in 0..image.width() {
            let pixel = *image.get_pixel(x, 0);
            if pixel == FAIL {
                return Err(EncoderError::Other("scripted failure".into()));
            }
            if pixel != NO_FACE {
                faces.push(embedding_of(pixel));
            }
        }
        Ok(faces)
    }
}

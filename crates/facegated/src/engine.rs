use facegate_core::{any_match, decode_rgb, Embedding, EncoderError, FaceEncoder, ImageError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("image error: {0}")]
    Image(#[from] ImageError),
    #[error("encoder error: {0}")]
    Encoder(#[from] EncoderError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Messages sent from HTTP handlers to the engine thread.
enum EngineRequest {
    Encode {
        image: Vec<u8>,
        reply: oneshot::Sender<Result<Vec<Embedding>, EngineError>>,
    },
    Match {
        image: Vec<u8>,
        target: Embedding,
        tolerance: f32,
        reply: oneshot::Sender<Result<bool, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Decode an upload and encode every face in it, in encoder order.
    pub async fn encode_faces(&self, image: Vec<u8>) -> Result<Vec<Embedding>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Encode {
                image,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Decode an upload and report whether any face in it matches `target`.
    pub async fn match_target(
        &self,
        image: Vec<u8>,
        target: Embedding,
        tolerance: f32,
    ) -> Result<bool, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Match {
                image,
                target,
                tolerance,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The encoder is moved onto the thread and never shared; requests are
/// served one at a time in arrival order.
pub fn spawn_engine<E>(mut encoder: E) -> Result<EngineHandle, EngineError>
where
    E: FaceEncoder + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(8);

    std::thread::Builder::new()
        .name("facegate-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Encode { image, reply } => {
                        let _ = reply.send(run_encode(&mut encoder, &image));
                    }
                    EngineRequest::Match {
                        image,
                        target,
                        tolerance,
                        reply,
                    } => {
                        let _ = reply.send(run_match(&mut encoder, &image, &target, tolerance));
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

fn run_encode<E: FaceEncoder>(
    encoder: &mut E,
    image: &[u8],
) -> Result<Vec<Embedding>, EngineError> {
    let rgb = decode_rgb(image)?;
    let embeddings = encoder.detect_and_encode(&rgb)?;
    tracing::debug!(faces = embeddings.len(), "encode: faces found");
    Ok(embeddings)
}

fn run_match<E: FaceEncoder>(
    encoder: &mut E,
    image: &[u8],
    target: &Embedding,
    tolerance: f32,
) -> Result<bool, EngineError> {
    let candidates = run_encode(encoder, image)?;
    let matched = any_match(&*encoder, target, &candidates, tolerance);
    tracing::debug!(faces = candidates.len(), matched, "match: compared against target");
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{embedding_of, png, ScriptedEncoder, FAIL, NO_FACE, PERSON_A, PERSON_B};

    #[tokio::test]
    async fn test_encode_returns_faces_in_order() {
        let engine = spawn_engine(ScriptedEncoder::default()).unwrap();
        let faces = engine
            .encode_faces(png(&[PERSON_B, NO_FACE, PERSON_A]))
            .await
            .unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0], embedding_of(PERSON_B));
    }

    #[tokio::test]
    async fn test_match_any_face() {
        let engine = spawn_engine(ScriptedEncoder::default()).unwrap();
        let target = embedding_of(PERSON_A);
        let group = png(&[PERSON_B, PERSON_A]);
        assert!(engine.match_target(group, target.clone(), 0.5).await.unwrap());

        let stranger = png(&[PERSON_B]);
        assert!(!engine.match_target(stranger, target, 0.5).await.unwrap());
    }

    #[tokio::test]
    async fn test_undecodable_image() {
        let engine = spawn_engine(ScriptedEncoder::default()).unwrap();
        let err = engine.encode_faces(b"garbage".to_vec()).await.unwrap_err();
        assert!(matches!(err, EngineError::Image(_)));
    }

    #[tokio::test]
    async fn test_encoder_failure_propagates() {
        let engine = spawn_engine(ScriptedEncoder::default()).unwrap();
        let err = engine.encode_faces(png(&[FAIL])).await.unwrap_err();
        assert!(matches!(err, EngineError::Encoder(_)));
    }
}

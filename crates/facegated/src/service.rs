use crate::engine::{EngineError, EngineHandle};
use crate::state::TargetState;
use facegate_core::{Embedding, StoreError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to persist target: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a registration attempt that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    NoFace,
}

/// Registration and verification against the single target.
#[derive(Clone)]
pub struct FaceService {
    engine: EngineHandle,
    target: Arc<TargetState>,
    tolerance: f32,
}

impl FaceService {
    pub fn new(engine: EngineHandle, target: Arc<TargetState>, tolerance: f32) -> Self {
        Self {
            engine,
            target,
            tolerance,
        }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Snapshot of the current target, if one is registered.
    pub async fn target(&self) -> Option<Embedding> {
        self.target.current().await
    }

    pub async fn has_target(&self) -> bool {
        self.target.is_set().await
    }

    /// Make the first face in `image` the new target.
    ///
    /// With several faces, the first one in encoder order wins. With none,
    /// the existing target is left alone.
    pub async fn register(&self, image: Vec<u8>) -> Result<Registration, ServiceError> {
        let faces = self.engine.encode_faces(image).await?;
        let face_count = faces.len();
        let Some(first) = faces.into_iter().next() else {
            tracing::info!("register: no face detected");
            return Ok(Registration::NoFace);
        };

        self.target.replace(first).await?;
        tracing::info!(faces = face_count, "register: target set from first face");
        Ok(Registration::Registered)
    }

    /// Whether any face in `image` matches `target`.
    pub async fn verify_against(
        &self,
        target: Embedding,
        image: Vec<u8>,
    ) -> Result<bool, ServiceError> {
        let matched = self
            .engine
            .match_target(image, target, self.tolerance)
            .await?;
        tracing::info!(matched, "verify: done");
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spawn_engine;
    use crate::testing::{png, ScriptedEncoder, NO_FACE, PERSON_A, PERSON_A_ALT, PERSON_B};
    use facegate_core::{TargetStore, DEFAULT_TOLERANCE};
    use std::path::{Path, PathBuf};

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("facegated-service-{}", uuid::Uuid::new_v4()))
            .join("target_face.json")
    }

    fn service_at(path: &Path) -> FaceService {
        let engine = spawn_engine(ScriptedEncoder::default()).unwrap();
        let target = Arc::new(TargetState::load(TargetStore::new(path)));
        FaceService::new(engine, target, DEFAULT_TOLERANCE)
    }

    async fn verify(service: &FaceService, image: Vec<u8>) -> bool {
        let target = service.target().await.expect("target set");
        service.verify_against(target, image).await.unwrap()
    }

    #[tokio::test]
    async fn test_register_then_verify_same_person() {
        let service = service_at(&scratch_path());
        assert_eq!(service.register(png(&[PERSON_A])).await.unwrap(), Registration::Registered);
        assert!(verify(&service, png(&[PERSON_A])).await);
        assert!(verify(&service, png(&[PERSON_A_ALT])).await);
    }

    #[tokio::test]
    async fn test_different_person_does_not_match() {
        let service = service_at(&scratch_path());
        service.register(png(&[PERSON_A])).await.unwrap();
        assert!(!verify(&service, png(&[PERSON_B])).await);
    }

    #[tokio::test]
    async fn test_no_face_keeps_previous_target() {
        let service = service_at(&scratch_path());
        service.register(png(&[PERSON_A])).await.unwrap();
        assert_eq!(service.register(png(&[NO_FACE])).await.unwrap(), Registration::NoFace);
        assert!(verify(&service, png(&[PERSON_A])).await);
    }

    #[tokio::test]
    async fn test_second_registration_replaces_first() {
        let service = service_at(&scratch_path());
        service.register(png(&[PERSON_A])).await.unwrap();
        service.register(png(&[PERSON_B])).await.unwrap();
        assert!(!verify(&service, png(&[PERSON_A])).await);
        assert!(verify(&service, png(&[PERSON_B])).await);
    }

    #[tokio::test]
    async fn test_register_uses_first_face() {
        let service = service_at(&scratch_path());
        service.register(png(&[PERSON_B, PERSON_A])).await.unwrap();
        assert!(verify(&service, png(&[PERSON_B])).await);
        assert!(!verify(&service, png(&[PERSON_A])).await);
    }

    #[tokio::test]
    async fn test_restart_reproduces_target() {
        let path = scratch_path();
        let service = service_at(&path);
        service.register(png(&[PERSON_A])).await.unwrap();
        drop(service);

        let restarted = service_at(&path);
        assert!(verify(&restarted, png(&[PERSON_A])).await);
        assert!(!verify(&restarted, png(&[PERSON_B])).await);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}

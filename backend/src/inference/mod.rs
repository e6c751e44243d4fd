pub mod classify;
pub mod preprocess;
#[cfg(feature = "libtorch")]
pub mod torch;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use classify::classify;
pub use preprocess::{ImageError, InputTensor};

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Error loading model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },
    #[error("Model forward pass failed: {0}")]
    Forward(String),
    #[error("Model returned an empty output tensor")]
    EmptyOutput,
    #[error("Input tensor has shape {actual:?}, model expects {expected:?}")]
    ShapeMismatch {
        expected: [usize; 4],
        actual: Vec<usize>,
    },
    #[error("Model returned an invalid confidence score: {0}")]
    InvalidScore(f32),
    #[error("No inference backend compiled in (enable the `libtorch` feature)")]
    BackendUnavailable,
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// A loaded model that maps one normalized image to P(dusty).
///
/// Implementations are shared across request handlers and must serialize
/// internally if the runtime is not reentrant.
pub trait PanelModel: Send + Sync {
    /// Expected input as `(width, height)`.
    fn input_size(&self) -> (u32, u32);

    fn predict(&self, input: &InputTensor) -> Result<f32, InferenceError>;

    /// Decode, normalize and score raw image bytes.
    fn predict_bytes(&self, bytes: &[u8]) -> Result<f32, InferenceError> {
        let tensor = preprocess::preprocess(bytes, self.input_size())?;
        self.predict(&tensor)
    }
}

pub type SharedModel = Arc<dyn PanelModel>;

pub fn check_input_shape(input: &InputTensor, (width, height): (u32, u32)) -> Result<(), InferenceError> {
    let expected = [1, height as usize, width as usize, 3];
    if input.shape() != &expected[..] {
        return Err(InferenceError::ShapeMismatch {
            expected,
            actual: input.shape().to_vec(),
        });
    }
    Ok(())
}

/// Rejects scores that are not a probability in `[0, 1]`.
pub fn check_confidence(confidence: f32) -> Result<f32, InferenceError> {
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(InferenceError::InvalidScore(confidence));
    }
    Ok(confidence)
}

/// Locks a model handle, recovering from poisoning. Only for state that a
/// panicking holder cannot leave half-updated.
pub(crate) fn lock_model<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(feature = "libtorch")]
pub fn load_model(path: &Path, input_size: (u32, u32)) -> Result<SharedModel, InferenceError> {
    let model = torch::TorchModel::load(path, input_size)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "libtorch"))]
pub fn load_model(path: &Path, _input_size: (u32, u32)) -> Result<SharedModel, InferenceError> {
    log::warn!("Cannot load {}: built without an inference backend", path.display());
    Err(InferenceError::BackendUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use ndarray::Array4;
    use std::io::Cursor;

    struct RecordingModel {
        seen: Mutex<Vec<Vec<usize>>>,
    }

    impl PanelModel for RecordingModel {
        fn input_size(&self) -> (u32, u32) {
            (32, 16)
        }

        fn predict(&self, input: &InputTensor) -> Result<f32, InferenceError> {
            check_input_shape(input, self.input_size())?;
            self.seen.lock().unwrap().push(input.shape().to_vec());
            Ok(input.mean().unwrap_or(0.0))
        }
    }

    #[test]
    fn predict_bytes_normalizes_to_model_size() {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255])))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let model = RecordingModel { seen: Mutex::new(Vec::new()) };
        let score = model.predict_bytes(&bytes).unwrap();

        assert!((score - 1.0).abs() < 1e-6);
        assert_eq!(model.seen.lock().unwrap().as_slice(), &[vec![1, 16, 32, 3]]);
    }

    #[test]
    fn decode_failure_surfaces_as_image_error() {
        let model = RecordingModel { seen: Mutex::new(Vec::new()) };
        let err = model.predict_bytes(b"nope").unwrap_err();
        assert!(matches!(err, InferenceError::Image(ImageError::Decode(_))));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn shape_check_rejects_wrong_size() {
        let tensor = Array4::<f32>::zeros((1, 10, 10, 3));
        let err = check_input_shape(&tensor, (224, 224)).unwrap_err();
        assert!(matches!(err, InferenceError::ShapeMismatch { .. }));
    }

    #[test]
    fn confidence_outside_unit_range_is_rejected() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -0.01, 1.5] {
            assert!(matches!(
                check_confidence(bad),
                Err(InferenceError::InvalidScore(_))
            ));
        }
        assert_eq!(check_confidence(0.0).unwrap(), 0.0);
        assert_eq!(check_confidence(1.0).unwrap(), 1.0);
    }

    #[test]
    fn poisoned_model_lock_is_recovered() {
        let module = Arc::new(Mutex::new(7u32));
        let held = Arc::clone(&module);
        let _ = std::thread::spawn(move || {
            let _guard = held.lock().unwrap();
            panic!("forward pass panicked");
        })
        .join();

        assert!(module.is_poisoned());
        assert_eq!(*lock_model(&module), 7);
    }

    #[cfg(not(feature = "libtorch"))]
    #[test]
    fn load_without_backend_is_unavailable() {
        let err = load_model(Path::new("missing.pt"), (224, 224)).err().unwrap();
        assert!(matches!(err, InferenceError::BackendUnavailable));
    }
}

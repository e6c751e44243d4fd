use crate::error::ApiError;
use crate::inference::SharedModel;
use crate::remote::ImageFetcher;

/// Per-process dependencies handed to every handler.
#[derive(Clone)]
pub struct AppState {
    model: Option<SharedModel>,
    pub fetcher: ImageFetcher,
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(model: Option<SharedModel>, fetcher: ImageFetcher, max_image_bytes: usize) -> Self {
        Self {
            model,
            fetcher,
            max_image_bytes,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Result<SharedModel, ApiError> {
        self.model.clone().ok_or(ApiError::ModelNotLoaded)
    }
}

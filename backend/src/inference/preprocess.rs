use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

/// Fixed resampling filter. Must stay in step with whatever the model saw at
/// training time.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Cannot identify image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image is empty")]
    EmptyImage,
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Batched NHWC tensor fed to the model, shape `(1, height, width, 3)`.
pub type InputTensor = Array4<f32>;

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyImage);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Converts to RGB, resizes to `(width, height)` and scales into `[0, 1]`.
pub fn normalize(image: &DynamicImage, (width, height): (u32, u32)) -> Result<InputTensor, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions(format!(
            "target size {}x{}",
            width, height
        )));
    }
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(ImageError::EmptyImage);
    }

    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, width, height, RESIZE_FILTER);

    let pixels: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|p| p as f32 / 255.0)
        .collect();

    Array4::from_shape_vec((1, height as usize, width as usize, 3), pixels)
        .map_err(|e| ImageError::InvalidDimensions(e.to_string()))
}

pub fn preprocess(bytes: &[u8], input_size: (u32, u32)) -> Result<InputTensor, ImageError> {
    let image = decode_image(bytes)?;
    normalize(&image, input_size)
}

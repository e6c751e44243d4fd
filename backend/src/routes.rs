use actix_multipart::Multipart;
use actix_web::error::JsonPayloadError;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use futures::TryStreamExt;
use log::{error, info, warn};
use shared::{HealthResponse, ModelStatus, PredictUrlRequest, PredictionResponse};

use crate::error::ApiError;
use crate::inference::{SharedModel, check_confidence, classify};
use crate::state::AppState;

const IMAGE_FIELD: &str = "image";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/predict-url").route(web::post().to(predict_url)));
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let err = ApiError::bad_request(format!("Invalid JSON body: {}", err));
    log_failure(req.path(), &err);
    err.into()
}

fn log_failure(endpoint: &str, err: &ApiError) {
    if err.status_code().is_client_error() {
        warn!("Rejected request to {}: {}", endpoint, err);
    } else {
        error!("Error in {} endpoint: {}", endpoint, err);
    }
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let model = if state.model_loaded() {
        ModelStatus::Loaded
    } else {
        ModelStatus::NotLoaded
    };
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        model,
    })
}

async fn predict(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let response = predict_upload(&state, payload)
        .await
        .inspect_err(|e| log_failure("/predict", e))?;
    Ok(HttpResponse::Ok().json(response))
}

async fn predict_upload(state: &AppState, payload: Multipart) -> Result<PredictionResponse, ApiError> {
    let upload = read_image_field(payload, state.max_image_bytes).await?;
    let model = state.model()?;

    let response = score(model, upload.bytes).await?;
    info!(
        "Predicted {} ({:.4}) for upload {}",
        response.result, response.confidence, upload.filename
    );
    Ok(response)
}

async fn predict_url(
    state: web::Data<AppState>,
    body: web::Json<PredictUrlRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = predict_remote(&state, body.into_inner())
        .await
        .inspect_err(|e| log_failure("/predict-url", e))?;
    Ok(HttpResponse::Ok().json(response))
}

async fn predict_remote(
    state: &AppState,
    request: PredictUrlRequest,
) -> Result<PredictionResponse, ApiError> {
    let image_url = request
        .image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("image_url not provided"))?;
    let model = state.model()?;

    let bytes = state.fetcher.fetch(&image_url).await?;
    let mut response = score(model, bytes).await?;
    info!(
        "Predicted {} ({:.4}) for {}",
        response.result, response.confidence, image_url
    );
    response.image_url = Some(image_url);
    Ok(response)
}

/// Runs decode, normalize and the forward pass on the blocking pool.
async fn score(model: SharedModel, bytes: Vec<u8>) -> Result<PredictionResponse, ApiError> {
    let confidence = web::block(move || model.predict_bytes(&bytes)).await??;
    Ok(classify(check_confidence(confidence)?))
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

fn multipart_error(err: actix_multipart::MultipartError) -> ApiError {
    ApiError::bad_request(format!("Invalid multipart payload: {}", err))
}

async fn read_image_field(mut payload: Multipart, max_bytes: usize) -> Result<Upload, ApiError> {
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            while field.try_next().await.map_err(multipart_error)?.is_some() {}
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        if filename.is_empty() {
            return Err(ApiError::bad_request("No file selected"));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(ApiError::bad_request(format!(
                    "Image too large (limit {} bytes)",
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Upload { filename, bytes });
    }

    Err(ApiError::bad_request("Image not found in request"))
}

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Body accepted by `POST /predict-url`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PredictUrlRequest {
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum PanelLabel {
    #[serde(rename = "Clean Panel")]
    #[strum(serialize = "Clean Panel")]
    Clean,
    #[serde(rename = "Dusty Panel")]
    #[strum(serialize = "Dusty Panel")]
    Dusty,
}

/// Outcome of one prediction. `image_url` is only present for `/predict-url`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    pub result: PanelLabel,
    pub confidence: f64,
    pub dustiness_percentage: f64,
    pub is_dusty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum ModelStatus {
    #[serde(rename = "loaded")]
    #[strum(serialize = "loaded")]
    Loaded,
    #[serde(rename = "not loaded")]
    #[strum(serialize = "not loaded")]
    NotLoaded,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model: ModelStatus,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

use shared::{PanelLabel, PredictionResponse};

/// Scores strictly above this are dusty; exactly 0.5 is clean.
pub const DUSTY_THRESHOLD: f64 = 0.5;

pub fn classify(confidence: f32) -> PredictionResponse {
    let confidence = f64::from(confidence);
    let is_dusty = confidence > DUSTY_THRESHOLD;
    let result = if is_dusty {
        PanelLabel::Dusty
    } else {
        PanelLabel::Clean
    };

    PredictionResponse {
        result,
        confidence,
        dustiness_percentage: round2(confidence * 100.0),
        is_dusty,
        image_url: None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dusty_above_threshold() {
        let result = classify(0.73);
        assert_eq!(result.result, PanelLabel::Dusty);
        assert!(result.is_dusty);
        assert_eq!(result.dustiness_percentage, 73.0);
    }

    #[test]
    fn exact_threshold_is_clean() {
        let result = classify(0.5);
        assert_eq!(result.result, PanelLabel::Clean);
        assert!(!result.is_dusty);
        assert_eq!(result.dustiness_percentage, 50.0);
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(classify(0.123456).dustiness_percentage, 12.35);
        assert_eq!(classify(0.0).dustiness_percentage, 0.0);
        assert_eq!(classify(1.0).dustiness_percentage, 100.0);
    }

    #[test]
    fn label_matches_is_dusty_across_range() {
        for step in 0..=1000 {
            let c = step as f32 / 1000.0;
            let result = classify(c);
            assert_eq!(result.is_dusty, f64::from(c) > 0.5);
            assert_eq!(result.result == PanelLabel::Dusty, result.is_dusty);
        }
    }

    #[test]
    fn raw_confidence_is_preserved() {
        let result = classify(0.25);
        assert_eq!(result.confidence, 0.25);
        assert!(result.image_url.is_none());
    }
}

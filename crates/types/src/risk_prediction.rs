//! Output records of the risk analyzer

use crate::common::PredictionType;
use serde::{Deserialize, Serialize};

/// A single prediction attached to an [`crate::Update`].
///
/// The analyzer emits one of these per axis (`risk_level`, `breaking_change`,
/// `security_risk`) rather than a single blended record, so downstream
/// consumers can inspect confidence per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub id: i64,
    pub update_id: i64,
    pub prediction_type: PredictionType,
    pub confidence: f64,
    pub result: String,
    pub reasoning: String,
}

impl RiskPrediction {
    #[must_use]
    pub fn new(
        update_id: i64,
        prediction_type: PredictionType,
        confidence: f64,
        result: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            update_id,
            prediction_type,
            confidence: confidence.clamp(0.0, 1.0),
            result: result.into(),
            reasoning: reasoning.into(),
        }
    }
}

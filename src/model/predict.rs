use tracing::{info, instrument, warn};

use crate::error::AppError;

use super::artifact::ClassifierArtifact;
use super::features::PatientInput;

/// Sentinel returned when the pipeline itself fails. Callers must treat it
/// as a valid-but-failed outcome, never as a reason to fail the request.
pub const PREDICTION_ERROR: &str = "Error in Prediction";

/// Wraps the classifier artifact behind the one operation the rest of the
/// service needs. A predictor without an artifact (missing or malformed
/// file at startup) stays usable and answers every call with the sentinel.
#[derive(Debug)]
pub struct Predictor {
    artifact: Option<ClassifierArtifact>,
}

impl Predictor {
    pub fn new(artifact: ClassifierArtifact) -> Self {
        Self {
            artifact: Some(artifact),
        }
    }

    pub fn disabled() -> Self {
        Self { artifact: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.artifact.is_some()
    }

    /// Predicts the proneness category for a patient submission.
    ///
    /// Input problems the user can fix (range violations, out-of-vocabulary
    /// categoricals) are returned as errors before the scaler or model run.
    /// Anything that goes wrong inside the pipeline degrades to the
    /// `PREDICTION_ERROR` sentinel instead.
    #[instrument(skip_all, fields(name = %input.name))]
    pub fn predict(&self, input: &PatientInput) -> Result<String, AppError> {
        input.check_ranges()?;

        let Some(artifact) = &self.artifact else {
            warn!("Prediction requested but no classifier artifact is loaded");
            return Ok(PREDICTION_ERROR.to_string());
        };

        input.check_vocabulary(artifact)?;

        match Self::run_pipeline(artifact, input) {
            Ok(category) => {
                info!(category = %category, "Prediction complete");
                Ok(category)
            }
            Err(err) => {
                err.log_and_record("prediction pipeline");
                Ok(PREDICTION_ERROR.to_string())
            }
        }
    }

    fn run_pipeline(
        artifact: &ClassifierArtifact,
        input: &PatientInput,
    ) -> Result<String, AppError> {
        let features = input.feature_vector(artifact)?;
        let standardized = artifact.scaler.transform(&features)?;
        let label_id = artifact.model.predict(&standardized)?;
        let category = artifact.category_encoder.inverse_transform(label_id)?;

        Ok(category.to_string())
    }
}

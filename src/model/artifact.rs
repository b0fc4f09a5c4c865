use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::AppError;

/// Feature order expected by the trained model:
/// [gender, marital_status, fatigue, slowing, pain, hygiene, movement].
/// Age is collected from the user but the model was trained without it.
pub const FEATURE_COUNT: usize = 7;

/// Maps a categorical value to the integer id it had at training time.
/// Classes are stored in the order the training process fit them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, value: &str) -> bool {
        self.classes.iter().any(|c| c == value)
    }

    pub fn transform(&self, value: &str) -> Result<usize, AppError> {
        self.classes
            .iter()
            .position(|c| c == value)
            .ok_or_else(|| {
                AppError::UnknownCategory(format!("'{}' was not seen during training", value))
            })
    }

    pub fn inverse_transform(&self, id: usize) -> Result<&str, AppError> {
        self.classes
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| AppError::Artifact(format!("Label id {} has no class mapping", id)))
    }
}

/// Zero-mean/unit-variance standardization fit at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, AppError> {
        if features.len() != self.mean.len() {
            return Err(AppError::Artifact(format!(
                "Scaler expects {} features, got {}",
                self.mean.len(),
                features.len()
            )));
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}

/// Multiclass linear model: one coefficient row and intercept per class,
/// discrete prediction is the argmax of the class scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl LinearClassifier {
    pub fn new(coefficients: Vec<Vec<f64>>, intercepts: Vec<f64>) -> Self {
        Self {
            coefficients,
            intercepts,
        }
    }

    pub fn class_count(&self) -> usize {
        self.coefficients.len()
    }

    pub fn predict(&self, features: &[f64]) -> Result<usize, AppError> {
        if self.coefficients.is_empty() {
            return Err(AppError::Artifact("Model has no classes".to_string()));
        }

        let mut best_id = 0;
        let mut best_score = f64::NEG_INFINITY;

        for (id, (row, intercept)) in self
            .coefficients
            .iter()
            .zip(self.intercepts.iter())
            .enumerate()
        {
            if row.len() != features.len() {
                return Err(AppError::Artifact(format!(
                    "Model expects {} features, got {}",
                    row.len(),
                    features.len()
                )));
            }

            let score: f64 = row.iter().zip(features.iter()).map(|(w, x)| w * x).sum::<f64>()
                + intercept;

            if score > best_score {
                best_score = score;
                best_id = id;
            }
        }

        Ok(best_id)
    }
}

/// The serialized bundle produced by the external training process:
/// trained model, feature scaler and the three label encoders. Loaded once
/// at startup and treated as immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub gender_encoder: LabelEncoder,
    pub marital_status_encoder: LabelEncoder,
    pub category_encoder: LabelEncoder,
    pub scaler: StandardScaler,
    pub model: LinearClassifier,
}

impl ClassifierArtifact {
    pub fn new(
        gender_encoder: LabelEncoder,
        marital_status_encoder: LabelEncoder,
        category_encoder: LabelEncoder,
        scaler: StandardScaler,
        model: LinearClassifier,
    ) -> Result<Self, AppError> {
        let artifact = Self {
            gender_encoder,
            marital_status_encoder,
            category_encoder,
            scaler,
            model,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Artifact(format!("Failed to read artifact file: {}", e)))?;

        let artifact: ClassifierArtifact = serde_json::from_str(&raw)
            .map_err(|e| AppError::Artifact(format!("Malformed artifact file: {}", e)))?;

        artifact.validate()?;

        info!(
            classes = artifact.category_encoder.classes().len(),
            "Loaded classifier artifact"
        );

        Ok(artifact)
    }

    /// Checks that the bundle satisfies the {encode, scale, predict, decode}
    /// capability the inference pipeline relies on. A mismatched schema means
    /// inference would silently fail, so it is rejected at load time.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.scaler.mean.len() != FEATURE_COUNT || self.scaler.scale.len() != FEATURE_COUNT {
            return Err(AppError::Artifact(format!(
                "Scaler dimensions {}x{} do not match feature count {}",
                self.scaler.mean.len(),
                self.scaler.scale.len(),
                FEATURE_COUNT
            )));
        }

        if self.scaler.scale.iter().any(|s| *s == 0.0) {
            return Err(AppError::Artifact(
                "Scaler contains a zero scale factor".to_string(),
            ));
        }

        if self.model.coefficients.len() != self.model.intercepts.len() {
            return Err(AppError::Artifact(format!(
                "Model has {} coefficient rows but {} intercepts",
                self.model.coefficients.len(),
                self.model.intercepts.len()
            )));
        }

        if self.model.coefficients.iter().any(|r| r.len() != FEATURE_COUNT) {
            return Err(AppError::Artifact(format!(
                "Model coefficient rows do not all have {} features",
                FEATURE_COUNT
            )));
        }

        if self.model.class_count() != self.category_encoder.classes().len() {
            return Err(AppError::Artifact(format!(
                "Model predicts {} classes but the category encoder knows {}",
                self.model.class_count(),
                self.category_encoder.classes().len()
            )));
        }

        if self.gender_encoder.classes().is_empty()
            || self.marital_status_encoder.classes().is_empty()
        {
            return Err(AppError::Artifact(
                "Categorical encoders must have a non-empty vocabulary".to_string(),
            ));
        }

        Ok(())
    }
}

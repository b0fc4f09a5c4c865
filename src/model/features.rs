use crate::error::AppError;

use super::artifact::ClassifierArtifact;

pub const SYMPTOM_MIN: f64 = 0.0;
pub const SYMPTOM_MAX: f64 = 10.0;

/// Converts a 0-10 symptom score into the 0-1 range the model was trained
/// on, rounded to 4 decimal places before standardization.
pub fn scale_symptom(value: f64) -> f64 {
    round4(value / 10.0)
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Raw patient form submission, before any encoding or scaling.
#[derive(Debug, Clone)]
pub struct PatientInput {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub marital_status: String,
    pub fatigue: f64,
    pub slowing: f64,
    pub pain: f64,
    pub hygiene: f64,
    pub movement: f64,
}

impl PatientInput {
    fn symptoms(&self) -> [(&'static str, f64); 5] {
        [
            ("fatigue", self.fatigue),
            ("slowing", self.slowing),
            ("pain", self.pain),
            ("hygiene", self.hygiene),
            ("movement", self.movement),
        ]
    }

    pub fn check_ranges(&self) -> Result<(), AppError> {
        if self.age == 0 {
            return Err(AppError::Validation("Age must be positive".to_string()));
        }

        for (field, value) in self.symptoms() {
            if !value.is_finite() || !(SYMPTOM_MIN..=SYMPTOM_MAX).contains(&value) {
                return Err(AppError::Validation(format!(
                    "{} must be between {} and {}",
                    field, SYMPTOM_MIN, SYMPTOM_MAX
                )));
            }
        }

        Ok(())
    }

    /// Rejects out-of-vocabulary categorical values before the encoders run,
    /// so the user sees a clear message instead of a pipeline failure.
    pub fn check_vocabulary(&self, artifact: &ClassifierArtifact) -> Result<(), AppError> {
        if !artifact.gender_encoder.contains(&self.gender) {
            return Err(AppError::UnknownCategory(format!(
                "Gender '{}' was not seen during training",
                self.gender
            )));
        }

        if !artifact.marital_status_encoder.contains(&self.marital_status) {
            return Err(AppError::UnknownCategory(format!(
                "Marital status '{}' was not seen during training",
                self.marital_status
            )));
        }

        Ok(())
    }

    /// Builds the fixed-order numeric vector the model expects. Age is not
    /// part of the vector; the model was trained without it.
    pub fn feature_vector(&self, artifact: &ClassifierArtifact) -> Result<Vec<f64>, AppError> {
        self.check_vocabulary(artifact)?;

        let gender_id = artifact.gender_encoder.transform(&self.gender)?;
        let marital_id = artifact.marital_status_encoder.transform(&self.marital_status)?;

        Ok(vec![
            gender_id as f64,
            marital_id as f64,
            scale_symptom(self.fatigue),
            scale_symptom(self.slowing),
            scale_symptom(self.pain),
            scale_symptom(self.hygiene),
            scale_symptom(self.movement),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::test_artifact;

    fn sample_input() -> PatientInput {
        PatientInput {
            name: "Jordan".to_string(),
            age: 30,
            gender: "Male".to_string(),
            marital_status: "Single".to_string(),
            fatigue: 5.0,
            slowing: 5.0,
            pain: 5.0,
            hygiene: 5.0,
            movement: 5.0,
        }
    }

    #[test]
    fn symptom_scaling_maps_into_unit_range() {
        assert_eq!(scale_symptom(0.0), 0.0);
        assert_eq!(scale_symptom(5.0), 0.5);
        assert_eq!(scale_symptom(10.0), 1.0);
    }

    #[test]
    fn symptom_scaling_rounds_to_four_places() {
        assert_eq!(scale_symptom(3.33333), 0.3333);
        assert_eq!(scale_symptom(6.66666), 0.6667);
    }

    #[test]
    fn feature_vector_has_expected_order_and_units() {
        let artifact = test_artifact();
        let input = sample_input();

        let features = input.feature_vector(&artifact).unwrap();
        assert_eq!(features, vec![1.0, 2.0, 0.5, 0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn unknown_gender_is_rejected_before_encoding() {
        let artifact = test_artifact();
        let mut input = sample_input();
        input.gender = "Unknown".to_string();

        let err = input.feature_vector(&artifact).unwrap_err();
        assert!(matches!(err, AppError::UnknownCategory(_)));
    }

    #[test]
    fn unknown_marital_status_is_rejected_before_encoding() {
        let artifact = test_artifact();
        let mut input = sample_input();
        input.marital_status = "Partnered".to_string();

        let err = input.feature_vector(&artifact).unwrap_err();
        assert!(matches!(err, AppError::UnknownCategory(_)));
    }

    #[test]
    fn out_of_range_symptom_fails_range_check() {
        let mut input = sample_input();
        input.pain = 11.0;

        let err = input.check_ranges().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        input.pain = f64::NAN;
        assert!(input.check_ranges().is_err());
    }

    #[test]
    fn zero_age_fails_range_check() {
        let mut input = sample_input();
        input.age = 0;

        assert!(matches!(
            input.check_ranges(),
            Err(AppError::Validation(_))
        ));
    }
}

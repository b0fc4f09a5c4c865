use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const DEFAULT_PRECAUTIONS: &str = "No precautions available.";

static PRECAUTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut precautions = HashMap::new();

    precautions.insert(
        "Low Proneness",
        "Light physical activity, engage in mindfulness practices, adequate sleep (7-8 hours).",
    );
    precautions.insert(
        "Moderate Proneness",
        "Engage in group therapy, maintain a routine, avoid stress, 7-8 hours of sleep.",
    );
    precautions.insert(
        "Elevated Proneness",
        "Regular checkups, meditation, moderate physical activity.",
    );
    precautions.insert(
        "High Proneness",
        "Monitor closely, engage in therapy sessions, ensure proper sleep (7-8 hours), avoid stress.",
    );
    precautions.insert(
        "Very High Proneness",
        "Immediate medical attention, medication as prescribed, high supervision, 8-9 hours of sleep.",
    );

    precautions
});

/// Total over all inputs: known categories map to their care advice, every
/// other string (including the prediction failure sentinel) maps to the
/// default.
pub fn precautions_for(category: &str) -> &'static str {
    PRECAUTIONS.get(category).copied().unwrap_or(DEFAULT_PRECAUTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::predict::PREDICTION_ERROR;

    #[test]
    fn every_known_category_has_specific_advice() {
        let categories = [
            "Low Proneness",
            "Moderate Proneness",
            "Elevated Proneness",
            "High Proneness",
            "Very High Proneness",
        ];

        for category in categories {
            let advice = precautions_for(category);
            assert_ne!(advice, DEFAULT_PRECAUTIONS, "missing advice for {}", category);
        }
    }

    #[test]
    fn unrecognized_categories_fall_back_to_the_default() {
        assert_eq!(precautions_for("Mild Proneness"), DEFAULT_PRECAUTIONS);
        assert_eq!(precautions_for(""), DEFAULT_PRECAUTIONS);
        assert_eq!(precautions_for(PREDICTION_ERROR), DEFAULT_PRECAUTIONS);
    }
}

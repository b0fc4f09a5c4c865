use std::fs;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::model::features::{PatientInput, scale_symptom};

/// One submitted patient row. Symptom fields are stored in the normalized
/// 0-1 range, the same units the model consumed, so chart axes and model
/// inputs stay consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub marital_status: String,
    pub fatigue: f64,
    pub slowing: f64,
    pub pain: f64,
    pub hygiene: f64,
    pub movement: f64,
    pub category: String,
}

impl PatientRecord {
    pub fn from_input(input: &PatientInput, category: String) -> Self {
        Self {
            name: input.name.clone(),
            age: input.age,
            gender: input.gender.clone(),
            marital_status: input.marital_status.clone(),
            fatigue: scale_symptom(input.fatigue),
            slowing: scale_symptom(input.slowing),
            pain: scale_symptom(input.pain),
            hygiene: scale_symptom(input.hygiene),
            movement: scale_symptom(input.movement),
            category,
        }
    }
}

const DATASET_HEADERS: [&str; 10] = [
    "Name",
    "Age",
    "Gender",
    "Marital_Status",
    "Fatigue",
    "Slowing",
    "Pain",
    "Hygiene",
    "Movement",
    "Proneness",
];

/// Append-only, in-memory table of every submitted patient. Lives only for
/// the process lifetime; non-durability is a documented property of the
/// system, not an oversight. Writes go through an exclusive lock so
/// concurrent submissions cannot lose updates.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: RwLock<Vec<PatientRecord>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<PatientRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Seeds the store from the historical dataset CSV. Header names are
    /// whitespace-trimmed before matching; rows that fail to parse are
    /// skipped with a warning rather than aborting startup.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Internal(format!("Failed to read dataset file: {}", e)))?;

        let mut lines = raw.lines();
        let header_line = lines
            .next()
            .ok_or_else(|| AppError::Validation("Dataset file is empty".to_string()))?;

        let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();

        let mut column_indexes = Vec::with_capacity(DATASET_HEADERS.len());
        for expected in DATASET_HEADERS {
            let index = headers.iter().position(|h| *h == expected).ok_or_else(|| {
                AppError::Validation(format!("Dataset is missing the '{}' column", expected))
            })?;
            column_indexes.push(index);
        }

        let mut records = Vec::new();
        for (line_no, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match parse_row(line, &column_indexes) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(line = line_no + 2, error = %err, "Skipping malformed dataset row");
                }
            }
        }

        info!(rows = records.len(), "Seeded record store from dataset");

        Ok(Self::with_records(records))
    }

    pub fn append(&self, record: PatientRecord) {
        let mut records = self.records.write().expect("record store lock poisoned");
        records.push(record);
    }

    pub fn all(&self) -> Vec<PatientRecord> {
        self.records
            .read()
            .expect("record store lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("record store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the accumulated records as an Age vs Fatigue scatter chart
    /// description, one series per predicted category. An empty store
    /// produces a placeholder chart instead of failing.
    pub fn render_chart(&self) -> ChartSpec {
        let records = self.records.read().expect("record store lock poisoned");

        if records.is_empty() {
            return ChartSpec::placeholder();
        }

        let mut series: Vec<ChartSeries> = Vec::new();
        for record in records.iter() {
            let point = ChartPoint {
                x: record.age as f64,
                y: record.fatigue,
                name: record.name.clone(),
                gender: record.gender.clone(),
                pain: record.pain,
                hygiene: record.hygiene,
                slowing: record.slowing,
            };

            match series.iter_mut().find(|s| s.category == record.category) {
                Some(existing) => existing.points.push(point),
                None => series.push(ChartSeries {
                    color: category_color(&record.category).to_string(),
                    category: record.category.clone(),
                    points: vec![point],
                }),
            }
        }

        ChartSpec {
            title: "Patient Proneness Levels".to_string(),
            x_axis: ChartAxis {
                title: "Age".to_string(),
                range: None,
            },
            y_axis: ChartAxis {
                title: "Fatigue Level".to_string(),
                range: None,
            },
            annotation: None,
            series,
        }
    }
}

fn parse_row(line: &str, column_indexes: &[usize]) -> Result<PatientRecord, AppError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    let field = |slot: usize| -> Result<&str, AppError> {
        fields
            .get(column_indexes[slot])
            .copied()
            .ok_or_else(|| AppError::Validation("Row has too few columns".to_string()))
    };

    let number = |slot: usize| -> Result<f64, AppError> {
        let raw = field(slot)?;
        raw.parse::<f64>()
            .map_err(|_| AppError::Validation(format!("'{}' is not a number", raw)))
    };

    Ok(PatientRecord {
        name: field(0)?.to_string(),
        age: field(1)?
            .parse::<u32>()
            .map_err(|_| AppError::Validation("Age is not a positive integer".to_string()))?,
        gender: field(2)?.to_string(),
        marital_status: field(3)?.to_string(),
        fatigue: number(4)?,
        slowing: number(5)?,
        pain: number(6)?,
        hygiene: number(7)?,
        movement: number(8)?,
        category: field(9)?.to_string(),
    })
}

/// Fixed category-to-color mapping so a category renders the same color in
/// every session.
pub fn category_color(category: &str) -> &'static str {
    match category {
        "Low Proneness" => "#8b5cf6",
        "Moderate Proneness" => "#f59e0b",
        "Elevated Proneness" => "#10b981",
        "High Proneness" => "#3b82f6",
        "Very High Proneness" => "#ef4444",
        _ => "#9ca3af",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: ChartAxis,
    pub y_axis: ChartAxis,
    pub annotation: Option<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    fn placeholder() -> Self {
        Self {
            title: "Patient Proneness Levels - Awaiting Data".to_string(),
            x_axis: ChartAxis {
                title: "Age".to_string(),
                range: Some([55.0, 100.0]),
            },
            y_axis: ChartAxis {
                title: "Fatigue".to_string(),
                range: Some([0.0, 1.2]),
            },
            annotation: Some("Submit patient data to visualize analysis".to_string()),
            series: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartAxis {
    pub title: String,
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    pub category: String,
    pub color: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub gender: String,
    pub pain: f64,
    pub hygiene: f64,
    pub slowing: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, age: u32, fatigue: f64, category: &str) -> PatientRecord {
        PatientRecord {
            name: name.to_string(),
            age,
            gender: "Female".to_string(),
            marital_status: "Married".to_string(),
            fatigue,
            slowing: 0.4,
            pain: 0.3,
            hygiene: 0.2,
            movement: 0.1,
            category: category.to_string(),
        }
    }

    #[test]
    fn append_then_read_back_preserves_fields_exactly() {
        let store = RecordStore::new();
        let original = record("Ada", 67, 0.5123, "High Proneness");

        store.append(original.clone());

        let records = store.all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], original);
    }

    #[test]
    fn empty_store_renders_the_placeholder_chart() {
        let store = RecordStore::new();

        let chart = store.render_chart();
        assert!(chart.series.is_empty());
        assert!(chart.annotation.is_some());
        assert_eq!(chart.x_axis.range, Some([55.0, 100.0]));
        assert_eq!(chart.y_axis.range, Some([0.0, 1.2]));
    }

    #[test]
    fn chart_groups_points_by_category_with_stable_colors() {
        let store = RecordStore::with_records(vec![
            record("Ada", 67, 0.5, "High Proneness"),
            record("Ben", 71, 0.8, "Very High Proneness"),
            record("Cam", 59, 0.4, "High Proneness"),
        ]);

        let chart = store.render_chart();
        assert_eq!(chart.series.len(), 2);

        let high = chart
            .series
            .iter()
            .find(|s| s.category == "High Proneness")
            .unwrap();
        assert_eq!(high.points.len(), 2);
        assert_eq!(high.color, "#3b82f6");
        assert_eq!(high.points[0].x, 67.0);
        assert_eq!(high.points[0].y, 0.5);

        let very_high = chart
            .series
            .iter()
            .find(|s| s.category == "Very High Proneness")
            .unwrap();
        assert_eq!(very_high.color, "#ef4444");
    }

    #[test]
    fn unknown_category_gets_the_fallback_color() {
        assert_eq!(category_color("Error in Prediction"), "#9ca3af");
    }

    #[test]
    fn csv_seeding_trims_headers_and_skips_bad_rows() {
        let dir = std::env::temp_dir().join("proneness-dashboard-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("patients.csv");
        std::fs::write(
            &path,
            "Name, Age ,Gender,Marital_Status,Fatigue,Slowing,Pain,Hygiene,Movement, Proneness\n\
             Ada,67,Female,Married,0.5,0.4,0.3,0.2,0.1,High Proneness\n\
             Bad,not-a-number,Male,Single,0.5,0.4,0.3,0.2,0.1,Low Proneness\n\
             Cam,59,Male,Single,0.4,0.3,0.2,0.1,0.0,Low Proneness\n",
        )
        .unwrap();

        let store = RecordStore::from_csv(&path).unwrap();
        let records = store.all();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Ada");
        assert_eq!(records[0].age, 67);
        assert_eq!(records[1].category, "Low Proneness");
    }

    #[test]
    fn csv_with_missing_column_is_rejected() {
        let dir = std::env::temp_dir().join("proneness-dashboard-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad_patients.csv");
        std::fs::write(&path, "Name,Age,Gender\nAda,67,Female\n").unwrap();

        assert!(RecordStore::from_csv(&path).is_err());
    }

    #[test]
    fn record_from_input_stores_scaled_symptoms() {
        let input = crate::model::features::PatientInput {
            name: "Ada".to_string(),
            age: 30,
            gender: "Female".to_string(),
            marital_status: "Married".to_string(),
            fatigue: 5.0,
            slowing: 7.5,
            pain: 0.0,
            hygiene: 10.0,
            movement: 3.3333,
        };

        let record = PatientRecord::from_input(&input, "Elevated Proneness".to_string());
        assert_eq!(record.fatigue, 0.5);
        assert_eq!(record.slowing, 0.75);
        assert_eq!(record.pain, 0.0);
        assert_eq!(record.hygiene, 1.0);
        assert_eq!(record.movement, 0.3333);
        assert_eq!(record.age, 30);
    }
}

//! Appointment Record Schema
//! Column names, dtypes and the attendance label mapping for the
//! no-show appointments dataset.

use polars::prelude::*;

/// Column names as they appear in the input file and the cleaned table.
pub mod columns {
    pub const PATIENT_ID: &str = "PatientId";
    pub const APPOINTMENT_ID: &str = "AppointmentID";
    pub const GENDER: &str = "Gender";
    pub const SCHEDULED_DAY: &str = "ScheduledDay";
    pub const APPOINTMENT_DAY: &str = "AppointmentDay";
    pub const AGE: &str = "Age";
    pub const NEIGHBOURHOOD: &str = "Neighbourhood";
    pub const SCHOLARSHIP: &str = "Scholarship";
    pub const HYPERTENSION: &str = "Hipertension";
    pub const DIABETES: &str = "Diabetes";
    pub const ALCOHOLISM: &str = "Alcoholism";
    pub const HANDICAP: &str = "Handcap";
    pub const SMS_RECEIVED: &str = "SMS_received";
    /// Raw attendance label, renamed during cleaning.
    pub const NO_SHOW_RAW: &str = "No-show";
    pub const NO_SHOW: &str = "No_show";
    pub const AWAITING_TIME: &str = "awaiting_time";
    pub const INDEX: &str = "index";
}

use columns::*;

/// Header of the input file, in order.
pub const RAW_HEADER: [&str; 14] = [
    PATIENT_ID,
    APPOINTMENT_ID,
    GENDER,
    SCHEDULED_DAY,
    APPOINTMENT_DAY,
    AGE,
    NEIGHBOURHOOD,
    SCHOLARSHIP,
    HYPERTENSION,
    DIABETES,
    ALCOHOLISM,
    HANDICAP,
    SMS_RECEIVED,
    NO_SHOW_RAW,
];

/// Numeric columns of the cleaned table, in display order.
pub const NUMERIC_COLUMNS: [&str; 9] = [
    AGE,
    SCHOLARSHIP,
    HYPERTENSION,
    DIABETES,
    ALCOHOLISM,
    HANDICAP,
    SMS_RECEIVED,
    NO_SHOW,
    AWAITING_TIME,
];

/// One appointment row.
///
/// The table lives in a polars `DataFrame`; this type carries the layouts
/// the frame is checked against before and after cleaning.
pub struct AppointmentRecord;

impl AppointmentRecord {
    /// Layout of the input file. Identifier columns are kept here because
    /// they are present in the raw export.
    pub fn raw_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(PATIENT_ID.into(), DataType::Float64),
            Field::new(APPOINTMENT_ID.into(), DataType::Int64),
            Field::new(GENDER.into(), DataType::String),
            Field::new(SCHEDULED_DAY.into(), DataType::String),
            Field::new(APPOINTMENT_DAY.into(), DataType::String),
            Field::new(AGE.into(), DataType::Int64),
            Field::new(NEIGHBOURHOOD.into(), DataType::String),
            Field::new(SCHOLARSHIP.into(), DataType::Int64),
            Field::new(HYPERTENSION.into(), DataType::Int64),
            Field::new(DIABETES.into(), DataType::Int64),
            Field::new(ALCOHOLISM.into(), DataType::Int64),
            Field::new(HANDICAP.into(), DataType::Int64),
            Field::new(SMS_RECEIVED.into(), DataType::Int64),
            Field::new(NO_SHOW_RAW.into(), DataType::String),
        ])
    }

    /// Layout of the table once every cleaning step has run.
    pub fn cleaned_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(GENDER.into(), DataType::String),
            Field::new(SCHEDULED_DAY.into(), DataType::Date),
            Field::new(APPOINTMENT_DAY.into(), DataType::Date),
            Field::new(AGE.into(), DataType::Int64),
            Field::new(NEIGHBOURHOOD.into(), DataType::String),
            Field::new(SCHOLARSHIP.into(), DataType::Int64),
            Field::new(HYPERTENSION.into(), DataType::Int64),
            Field::new(DIABETES.into(), DataType::Int64),
            Field::new(ALCOHOLISM.into(), DataType::Int64),
            Field::new(HANDICAP.into(), DataType::Int64),
            Field::new(SMS_RECEIVED.into(), DataType::Int64),
            Field::new(NO_SHOW.into(), DataType::Int64),
            Field::new(AWAITING_TIME.into(), DataType::Int64),
            Field::new(INDEX.into(), DataType::UInt32),
        ])
    }

    /// Names of the columns in `schema` that are missing from `df` or carry
    /// a different dtype, plus any extra columns in `df`.
    pub fn schema_mismatches(df: &DataFrame, schema: &Schema) -> Vec<String> {
        let mut mismatches: Vec<String> = schema
            .iter()
            .filter_map(|(name, dtype)| match df.column(name.as_str()) {
                Ok(col) if col.dtype() == dtype => None,
                Ok(col) => Some(format!("{name}: expected {dtype}, found {}", col.dtype())),
                Err(_) => Some(format!("{name}: missing")),
            })
            .collect();

        mismatches.extend(
            df.get_column_names()
                .iter()
                .filter(|name| schema.get(name.as_str()).is_none())
                .map(|name| format!("{name}: unexpected column")),
        );

        mismatches
    }
}

/// Whether a patient kept the appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attendance {
    /// Patient showed up (`No_show == 1`).
    Attended,
    /// Patient missed the appointment (`No_show == 0`).
    Missed,
}

impl Attendance {
    /// Both values, missed first to match the bar chart order.
    pub const ALL: [Attendance; 2] = [Attendance::Missed, Attendance::Attended];

    /// Map a raw `No-show` label. The raw column answers "did the patient
    /// miss it?", so "No" means the patient attended.
    pub fn from_raw_label(label: &str) -> Option<Self> {
        match label.trim() {
            "No" => Some(Attendance::Attended),
            "Yes" => Some(Attendance::Missed),
            _ => None,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Attendance::Attended),
            0 => Some(Attendance::Missed),
            _ => None,
        }
    }

    /// Integer stored in the cleaned `No_show` column.
    pub fn code(self) -> i64 {
        match self {
            Attendance::Attended => 1,
            Attendance::Missed => 0,
        }
    }

    /// Bar chart tick label.
    pub fn label(self) -> &'static str {
        match self {
            Attendance::Attended => "Show Up",
            Attendance::Missed => "No Show",
        }
    }

    /// Histogram legend label.
    pub fn legend(self) -> &'static str {
        match self {
            Attendance::Attended => "show up",
            Attendance::Missed => "no show",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_label_mapping_is_exhaustive() {
        assert_eq!(Attendance::from_raw_label("No"), Some(Attendance::Attended));
        assert_eq!(Attendance::from_raw_label("Yes"), Some(Attendance::Missed));
        assert_eq!(Attendance::from_raw_label(" No "), Some(Attendance::Attended));
        assert_eq!(Attendance::from_raw_label("Not specified"), None);
        assert_eq!(Attendance::from_raw_label("no"), None);
        assert_eq!(Attendance::from_raw_label(""), None);
    }

    #[test]
    fn test_codes() {
        for attendance in Attendance::ALL {
            assert_eq!(Attendance::from_code(attendance.code()), Some(attendance));
        }
        assert_eq!(Attendance::from_code(2), None);
    }

    #[test]
    fn test_raw_schema_matches_header() {
        let schema = AppointmentRecord::raw_schema();
        let names: Vec<&str> = schema.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, RAW_HEADER.to_vec());
    }

    #[test]
    fn test_schema_mismatches() {
        let df = DataFrame::new(vec![
            Column::new(AGE.into(), vec![1i64, 2]),
            Column::new("extra".into(), vec![1.0f64, 2.0]),
        ])
        .unwrap();
        let schema = Schema::from_iter(vec![
            Field::new(AGE.into(), DataType::Int64),
            Field::new(GENDER.into(), DataType::String),
        ]);

        let mismatches = AppointmentRecord::schema_mismatches(&df, &schema);
        assert_eq!(mismatches.len(), 2);
        assert!(mismatches.iter().any(|m| m.starts_with("Gender")));
        assert!(mismatches.iter().any(|m| m.starts_with("extra")));
    }
}

//! Test fixtures: raw appointment frames built in memory.

use crate::data::cleaner::DataCleaner;
use crate::data::schema::columns::*;
use polars::prelude::*;

/// One raw row; unspecified fields take the values of an ordinary
/// same-week appointment that was kept.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub gender: &'static str,
    pub scheduled: &'static str,
    pub appointment: &'static str,
    pub age: i64,
    pub neighbourhood: &'static str,
    pub scholarship: i64,
    pub hypertension: i64,
    pub diabetes: i64,
    pub alcoholism: i64,
    pub handicap: i64,
    pub sms: i64,
    pub no_show: &'static str,
}

impl Default for RawRow {
    fn default() -> Self {
        Self {
            gender: "F",
            scheduled: "2016-04-29T18:38:08Z",
            appointment: "2016-05-03T00:00:00Z",
            age: 40,
            neighbourhood: "JARDIM DA PENHA",
            scholarship: 0,
            hypertension: 0,
            diabetes: 0,
            alcoholism: 0,
            handicap: 0,
            sms: 0,
            no_show: "No",
        }
    }
}

/// Build a frame with the raw schema from `rows`.
pub fn raw_frame(rows: &[RawRow]) -> DataFrame {
    let ints = |f: fn(&RawRow) -> i64| rows.iter().map(f).collect::<Vec<i64>>();
    let strs = |f: fn(&RawRow) -> &'static str| rows.iter().map(f).collect::<Vec<&str>>();

    DataFrame::new(vec![
        Column::new(
            PATIENT_ID.into(),
            (0..rows.len()).map(|i| 1.0e13 + i as f64).collect::<Vec<f64>>(),
        ),
        Column::new(
            APPOINTMENT_ID.into(),
            (0..rows.len()).map(|i| 5_600_000 + i as i64).collect::<Vec<i64>>(),
        ),
        Column::new(GENDER.into(), strs(|r| r.gender)),
        Column::new(SCHEDULED_DAY.into(), strs(|r| r.scheduled)),
        Column::new(APPOINTMENT_DAY.into(), strs(|r| r.appointment)),
        Column::new(AGE.into(), ints(|r| r.age)),
        Column::new(NEIGHBOURHOOD.into(), strs(|r| r.neighbourhood)),
        Column::new(SCHOLARSHIP.into(), ints(|r| r.scholarship)),
        Column::new(HYPERTENSION.into(), ints(|r| r.hypertension)),
        Column::new(DIABETES.into(), ints(|r| r.diabetes)),
        Column::new(ALCOHOLISM.into(), ints(|r| r.alcoholism)),
        Column::new(HANDICAP.into(), ints(|r| r.handicap)),
        Column::new(SMS_RECEIVED.into(), ints(|r| r.sms)),
        Column::new(NO_SHOW_RAW.into(), strs(|r| r.no_show)),
    ])
    .unwrap()
}

/// Raw frame run through the full cleaning pipeline.
pub fn cleaned_frame(rows: &[RawRow]) -> DataFrame {
    DataCleaner::clean(&raw_frame(rows)).unwrap().df
}

/// Render `rows` as CSV text with the raw header.
pub fn csv_text(rows: &[RawRow]) -> String {
    let mut text = String::from(
        "PatientId,AppointmentID,Gender,ScheduledDay,AppointmentDay,Age,Neighbourhood,Scholarship,Hipertension,Diabetes,Alcoholism,Handcap,SMS_received,No-show\n",
    );
    for (i, r) in rows.iter().enumerate() {
        text.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            29_872_499_824_296u64 + i as u64,
            5_642_903 + i,
            r.gender,
            r.scheduled,
            r.appointment,
            r.age,
            r.neighbourhood,
            r.scholarship,
            r.hypertension,
            r.diabetes,
            r.alcoholism,
            r.handicap,
            r.sms,
            r.no_show
        ));
    }
    text
}

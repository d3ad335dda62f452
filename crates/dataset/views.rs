//! Row types of the derived views.

use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One point of the monthly series. A `None` month collects rows whose
/// month cell was empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    pub month: Option<i64>,
    pub count: u64,
}

/// One populated cell of the husband/wife age-bucket heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgePairCount {
    pub husband_age_bucket: Option<i64>,
    pub wife_age_bucket: Option<i64>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCount {
    pub job_code: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub type_code: Option<i64>,
    pub count: u64,
}

/// Scalar statistics over the whole table.
///
/// Means and percentages are `None` when the table has no rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_count: u64,
    pub avg_husband_age_bucket: Option<f64>,
    pub avg_wife_age_bucket: Option<f64>,
    pub husband_first_marriage_pct: Option<f64>,
    pub wife_first_marriage_pct: Option<f64>,
    pub husband_remarriage_pct: Option<f64>,
    pub wife_remarriage_pct: Option<f64>,
}

/// Distinct values offered by the sidebar multiselects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterChoices {
    pub husband_jobs: Vec<String>,
    pub wife_jobs: Vec<String>,
    pub husband_ages: Vec<i64>,
    pub wife_ages: Vec<i64>,
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `66.66` → `"66.7"`, `None` → `"-"`.
pub fn format_one_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", round_one_decimal(v)),
        None => "-".to_string(),
    }
}

/// Convert every row of `df` into `T` through the frame's JSON rendering.
/// Column names must match the serde field names of `T`.
pub(crate) fn frame_to_rows<T: DeserializeOwned>(df: &mut DataFrame) -> Result<Vec<T>> {
    if df.height() == 0 {
        return Ok(Vec::new());
    }
    let mut j = Vec::<u8>::new();
    JsonWriter::new(&mut j)
        .with_json_format(JsonFormat::Json)
        .finish(df)?;
    Ok(serde_json::from_slice::<Vec<T>>(&j)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_one_decimal(200.0 / 3.0), 66.7);
        assert_eq!(round_one_decimal(100.0 / 3.0), 33.3);
        assert_eq!(format_one_decimal(Some(3.66666)), "3.7");
        assert_eq!(format_one_decimal(None), "-");
    }

    #[test]
    fn frame_rows_keep_nulls() {
        let mut df = df!(
            "month" => &[Some(1i64), None],
            "count" => &[2u32, 1],
        )
        .unwrap();
        let rows: Vec<MonthCount> = frame_to_rows(&mut df).unwrap();
        assert_eq!(
            rows,
            vec![
                MonthCount { month: Some(1), count: 2 },
                MonthCount { month: None, count: 1 },
            ]
        );
    }
}

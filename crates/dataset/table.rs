use std::borrow::Cow;

use log::{debug, warn};
use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, SchemaError};
use crate::filter::FilterOptions;
use crate::schema::*;
use crate::views::{
    frame_to_rows, AgePairCount, FilterChoices, JobCount, MonthCount, SummaryMetrics, TypeCount,
};

/// The loaded registrations: exactly the required columns, integer codes as
/// `Int64` and job codes as text.
#[derive(Debug, Clone)]
pub struct MarriageTable {
    df: DataFrame,
}

#[derive(Deserialize)]
struct Distinct<T> {
    value: T,
}

/// Percentage of rows whose `column` equals `code`. Empty cells count as a
/// mismatch, so the denominator is always the row count.
fn share_of(column: &str, code: i64) -> Expr {
    col(column)
        .eq(lit(code))
        .fill_null(lit(false))
        .cast(DataType::Float64)
        .mean()
        * lit(100.0)
}

impl MarriageTable {
    /// Validate and normalize a raw frame.
    pub fn from_frame(df: DataFrame) -> Result<Self> {
        let missing: Vec<String> = {
            let present = df.get_column_names();
            REQUIRED_COLUMNS
                .iter()
                .filter(|name| !present.contains(*name))
                .map(|name| name.to_string())
                .collect()
        };
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing).into());
        }

        let mut df = df.select(REQUIRED_COLUMNS)?;
        for name in INTEGER_COLUMNS {
            let typed = df
                .column(name)?
                .strict_cast(&DataType::Int64)
                .map_err(|source| SchemaError::NotInteger {
                    column: name.to_string(),
                    source,
                })?;
            df.with_column(typed)?;
        }
        for name in TEXT_COLUMNS {
            let text = df.column(name)?.cast(&DataType::String)?;
            df.with_column(text)?;
        }

        if df.height() == 0 {
            warn!("EmptyDatasetWarning: the dataset has no rows, metrics will be empty");
        }
        Ok(MarriageTable { df })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Rows matching every selection in `filters`.
    pub fn filtered(&self, filters: &FilterOptions) -> Result<MarriageTable> {
        if filters.is_empty() {
            return Ok(self.clone());
        }
        let df = self.df.clone().lazy().filter(filters.to_expr()).collect()?;
        debug!("filtered {} rows down to {}", self.height(), df.height());
        Ok(MarriageTable { df })
    }

    /// The table a render cycle aggregates: the filtered subset when
    /// `apply` is set, the whole table otherwise.
    pub fn view<'a>(&'a self, filters: &FilterOptions, apply: bool) -> Result<Cow<'a, Self>> {
        if apply && !filters.is_empty() {
            return Ok(Cow::Owned(self.filtered(filters)?));
        }
        if !filters.is_empty() {
            debug!("filter selections present but not applied: {:?}", filters);
        }
        Ok(Cow::Borrowed(self))
    }

    fn count_by(&self, keys: &[&str]) -> LazyFrame {
        let by: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
        self.df.clone().lazy().group_by(by).agg([len().alias(COUNT)])
    }

    pub fn summary_metrics(&self) -> Result<SummaryMetrics> {
        let stats = self
            .df
            .clone()
            .lazy()
            .select([
                col(HUSBAND_AGE).mean().alias("avg_husband_age_bucket"),
                col(WIFE_AGE).mean().alias("avg_wife_age_bucket"),
                share_of(HUSBAND_MARRIAGE_TYPE, FIRST_MARRIAGE).alias("husband_first_marriage_pct"),
                share_of(WIFE_MARRIAGE_TYPE, FIRST_MARRIAGE).alias("wife_first_marriage_pct"),
                share_of(HUSBAND_MARRIAGE_TYPE, REMARRIAGE).alias("husband_remarriage_pct"),
                share_of(WIFE_MARRIAGE_TYPE, REMARRIAGE).alias("wife_remarriage_pct"),
            ])
            .collect()?;
        let value = |name: &str| -> Result<Option<f64>> {
            if self.is_empty() {
                return Ok(None);
            }
            Ok(stats.column(name)?.cast(&DataType::Float64)?.f64()?.get(0))
        };

        Ok(SummaryMetrics {
            total_count: self.height() as u64,
            avg_husband_age_bucket: value("avg_husband_age_bucket")?,
            avg_wife_age_bucket: value("avg_wife_age_bucket")?,
            husband_first_marriage_pct: value("husband_first_marriage_pct")?,
            wife_first_marriage_pct: value("wife_first_marriage_pct")?,
            husband_remarriage_pct: value("husband_remarriage_pct")?,
            wife_remarriage_pct: value("wife_remarriage_pct")?,
        })
    }

    /// Count per report month in ascending month order. Months without
    /// registrations are absent, an empty month cell sorts last.
    pub fn monthly_frame(&self) -> Result<DataFrame> {
        Ok(self
            .count_by(&[REPORT_MONTH])
            .sort([REPORT_MONTH], SortMultipleOptions::default().with_nulls_last(true))
            .select([col(REPORT_MONTH).alias("month"), col(COUNT)])
            .collect()?)
    }

    pub fn monthly_series(&self) -> Result<Vec<MonthCount>> {
        frame_to_rows(&mut self.monthly_frame()?)
    }

    /// Count per (husband bucket, wife bucket) pair that occurs in the data.
    pub fn age_heatmap_frame(&self) -> Result<DataFrame> {
        Ok(self
            .count_by(&[HUSBAND_AGE, WIFE_AGE])
            .sort(
                [HUSBAND_AGE, WIFE_AGE],
                SortMultipleOptions::default().with_nulls_last(true),
            )
            .select([
                col(HUSBAND_AGE).alias("husband_age_bucket"),
                col(WIFE_AGE).alias("wife_age_bucket"),
                col(COUNT),
            ])
            .collect()?)
    }

    pub fn age_heatmap(&self) -> Result<Vec<AgePairCount>> {
        frame_to_rows(&mut self.age_heatmap_frame()?)
    }

    /// Top husband job codes by count. Equal counts are ordered by job code.
    pub fn job_ranking_frame(&self) -> Result<DataFrame> {
        Ok(self
            .count_by(&[HUSBAND_JOB])
            .sort(
                [COUNT, HUSBAND_JOB],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, false])
                    .with_nulls_last(true),
            )
            .limit(JOB_RANKING_LIMIT)
            .select([col(HUSBAND_JOB).alias("job_code"), col(COUNT)])
            .collect()?)
    }

    pub fn job_ranking(&self) -> Result<Vec<JobCount>> {
        frame_to_rows(&mut self.job_ranking_frame()?)
    }

    /// Value counts of the husband marriage type, most frequent first.
    pub fn marriage_type_frame(&self) -> Result<DataFrame> {
        Ok(self
            .count_by(&[HUSBAND_MARRIAGE_TYPE])
            .sort(
                [COUNT, HUSBAND_MARRIAGE_TYPE],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, false])
                    .with_nulls_last(true),
            )
            .select([col(HUSBAND_MARRIAGE_TYPE).alias("type_code"), col(COUNT)])
            .collect()?)
    }

    pub fn marriage_type_distribution(&self) -> Result<Vec<TypeCount>> {
        frame_to_rows(&mut self.marriage_type_frame()?)
    }

    fn distinct<T: DeserializeOwned>(&self, column: &str) -> Result<Vec<T>> {
        let mut df = self
            .count_by(&[column])
            .filter(col(column).is_not_null())
            .sort([column], SortMultipleOptions::default())
            .select([col(column).alias("value")])
            .collect()?;
        let rows: Vec<Distinct<T>> = frame_to_rows(&mut df)?;
        Ok(rows.into_iter().map(|row| row.value).collect())
    }

    pub fn filter_choices(&self) -> Result<FilterChoices> {
        Ok(FilterChoices {
            husband_jobs: self.distinct(HUSBAND_JOB)?,
            wife_jobs: self.distinct(WIFE_JOB)?,
            husband_ages: self.distinct(HUSBAND_AGE)?,
            wife_ages: self.distinct(WIFE_AGE)?,
        })
    }
}

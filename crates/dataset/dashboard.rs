use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::filter::FilterOptions;
use crate::table::MarriageTable;
use crate::views::{AgePairCount, FilterChoices, JobCount, MonthCount, SummaryMetrics, TypeCount};

/// Everything one render cycle hands to the presentation surface.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub rendered_at: DateTime<Local>,
    pub filters: FilterOptions,
    pub filters_applied: bool,
    pub choices: FilterChoices,
    pub metrics: SummaryMetrics,
    pub monthly: Vec<MonthCount>,
    pub age_heatmap: Vec<AgePairCount>,
    pub job_ranking: Vec<JobCount>,
    pub marriage_types: Vec<TypeCount>,
}

impl Dashboard {
    /// Run every derivation against `table`, or against the rows matching
    /// `filters` when `apply_filters` is set. Choices always come from the
    /// whole table.
    pub fn compute(
        table: &MarriageTable,
        filters: &FilterOptions,
        apply_filters: bool,
    ) -> Result<Self> {
        let choices = table.filter_choices()?;
        let view = table.view(filters, apply_filters)?;
        let filters_applied = apply_filters && !filters.is_empty();

        let dashboard = Dashboard {
            rendered_at: Local::now(),
            filters: filters.clone(),
            filters_applied,
            choices,
            metrics: view.summary_metrics()?,
            monthly: view.monthly_series()?,
            age_heatmap: view.age_heatmap()?,
            job_ranking: view.job_ranking()?,
            marriage_types: view.marriage_type_distribution()?,
        };
        info!(
            "render cycle done: {} registrations, filters applied: {}",
            dashboard.metrics.total_count, filters_applied
        );
        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;
    use polars::prelude::*;

    fn table() -> MarriageTable {
        let df = df!(
            REPORT_MONTH => &[1i64, 2, 2, 3],
            HUSBAND_AGE => &[3i64, 4, 4, 5],
            WIFE_AGE => &[3i64, 3, 4, 5],
            HUSBAND_JOB => &["01", "02", "02", "03"],
            WIFE_JOB => &["01", "01", "02", "02"],
            HUSBAND_MARRIAGE_TYPE => &[1i64, 1, 2, 1],
            WIFE_MARRIAGE_TYPE => &[1i64, 2, 2, 1],
        )
        .unwrap();
        MarriageTable::from_frame(df).unwrap()
    }

    #[test]
    fn computes_every_view() {
        let dashboard = Dashboard::compute(&table(), &FilterOptions::default(), false).unwrap();
        assert_eq!(dashboard.metrics.total_count, 4);
        assert_eq!(dashboard.monthly.len(), 3);
        assert_eq!(dashboard.age_heatmap.len(), 4);
        assert_eq!(dashboard.job_ranking[0].job_code.as_deref(), Some("02"));
        assert_eq!(dashboard.marriage_types[0].type_code, Some(1));
        assert!(!dashboard.filters_applied);
    }

    #[test]
    fn selections_only_matter_when_applied() {
        let t = table();
        let filters = FilterOptions {
            wife_jobs: vec!["02".into()],
            ..Default::default()
        };

        let ignored = Dashboard::compute(&t, &filters, false).unwrap();
        assert_eq!(ignored.metrics.total_count, 4);
        assert!(!ignored.filters_applied);

        let applied = Dashboard::compute(&t, &filters, true).unwrap();
        assert_eq!(applied.metrics.total_count, 2);
        assert!(applied.filters_applied);
        assert_eq!(applied.choices, ignored.choices);
        let monthly: u64 = applied.monthly.iter().map(|m| m.count).sum();
        assert_eq!(monthly, 2);
    }

    #[test]
    fn serializes_to_json() {
        let dashboard = Dashboard::compute(&table(), &FilterOptions::default(), false).unwrap();
        let value = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(value["metrics"]["total_count"], 4);
        assert_eq!(value["monthly"][1]["month"], 2);
        assert_eq!(value["monthly"][1]["count"], 2);
    }
}

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{HUSBAND_AGE, HUSBAND_JOB, WIFE_AGE, WIFE_JOB};

/// Sidebar selections. An empty list places no restriction on its column;
/// non-empty lists are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub husband_jobs: Vec<String>,
    pub wife_jobs: Vec<String>,
    pub husband_ages: Vec<i64>,
    pub wife_ages: Vec<i64>,
}

fn any_text(column: &str, values: &[String]) -> Expr {
    values
        .iter()
        .fold(lit(false), |acc, v| acc.or(col(column).eq(lit(v.as_str()))))
}

fn any_code(column: &str, values: &[i64]) -> Expr {
    values
        .iter()
        .fold(lit(false), |acc, v| acc.or(col(column).eq(lit(*v))))
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.husband_jobs.is_empty()
            && self.wife_jobs.is_empty()
            && self.husband_ages.is_empty()
            && self.wife_ages.is_empty()
    }

    /// Merge `other` into `self`, keeping each value once.
    pub fn extend(&mut self, other: FilterOptions) {
        fn merge<T: PartialEq>(into: &mut Vec<T>, from: Vec<T>) {
            for v in from {
                if !into.contains(&v) {
                    into.push(v);
                }
            }
        }
        merge(&mut self.husband_jobs, other.husband_jobs);
        merge(&mut self.wife_jobs, other.wife_jobs);
        merge(&mut self.husband_ages, other.husband_ages);
        merge(&mut self.wife_ages, other.wife_ages);
    }

    /// Row predicate for the selections. Rows with an empty cell in a
    /// restricted column never match.
    pub fn to_expr(&self) -> Expr {
        let mut filter_expr = lit(true);

        if !self.husband_jobs.is_empty() {
            filter_expr = filter_expr.and(any_text(HUSBAND_JOB, &self.husband_jobs));
        }
        if !self.wife_jobs.is_empty() {
            filter_expr = filter_expr.and(any_text(WIFE_JOB, &self.wife_jobs));
        }
        if !self.husband_ages.is_empty() {
            filter_expr = filter_expr.and(any_code(HUSBAND_AGE, &self.husband_ages));
        }
        if !self.wife_ages.is_empty() {
            filter_expr = filter_expr.and(any_code(WIFE_AGE, &self.wife_ages));
        }
        filter_expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_deduplicates() {
        let mut options = FilterOptions {
            husband_jobs: vec!["01".into()],
            husband_ages: vec![3],
            ..Default::default()
        };
        options.extend(FilterOptions {
            husband_jobs: vec!["01".into(), "02".into()],
            wife_ages: vec![4],
            ..Default::default()
        });
        assert_eq!(options.husband_jobs, vec!["01", "02"]);
        assert_eq!(options.husband_ages, vec![3]);
        assert_eq!(options.wife_ages, vec![4]);
        assert!(!options.is_empty());
        assert!(FilterOptions::default().is_empty());
    }
}

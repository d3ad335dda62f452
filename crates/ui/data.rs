use dataset::views::format_one_decimal;
use dataset::{AgePairCount, SummaryMetrics, TypeCount};

/// One boxed figure of the metrics column.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(_) => format!("{}%", format_one_decimal(value)),
        None => format_one_decimal(None),
    }
}

pub fn metric_cards(metrics: &SummaryMetrics) -> Vec<MetricCard> {
    vec![
        MetricCard {
            label: "총 결혼 건수",
            value: format!("{} 건", thousands(metrics.total_count)),
        },
        MetricCard {
            label: "남편 평균 연령대 코드",
            value: format_one_decimal(metrics.avg_husband_age_bucket),
        },
        MetricCard {
            label: "아내 평균 연령대 코드",
            value: format_one_decimal(metrics.avg_wife_age_bucket),
        },
        MetricCard {
            label: "남편 초혼 비율",
            value: percent(metrics.husband_first_marriage_pct),
        },
        MetricCard {
            label: "아내 초혼 비율",
            value: percent(metrics.wife_first_marriage_pct),
        },
    ]
}

/// Text for a possibly empty code cell.
pub fn code_label<T: ToString>(code: Option<T>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "(없음)".to_string(),
    }
}

/// 1 → "15~19세", 2 → "20~24세", ...
pub fn age_bucket_label(code: i64) -> String {
    let low = 10 + 5 * code;
    format!("{}~{}세", low, low + 4)
}

/// Heatmap axis text; empty cells keep the `code_label` placeholder.
pub fn age_axis_label(code: Option<i64>) -> String {
    match code {
        Some(c) => age_bucket_label(c),
        None => code_label::<i64>(None),
    }
}

pub fn marriage_type_label(code: Option<i64>) -> String {
    match code {
        Some(1) => "초혼 (1)".to_string(),
        Some(2) => "재혼 (2)".to_string(),
        other => format!("코드 {}", code_label(other)),
    }
}

/// Slice of the marriage-type distribution with its share of the total.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub label: String,
    pub count: u64,
    pub pct: f64,
}

pub fn shares(distribution: &[TypeCount]) -> Vec<Share> {
    let total: u64 = distribution.iter().map(|t| t.count).sum();
    distribution
        .iter()
        .map(|t| Share {
            label: marriage_type_label(t.type_code),
            count: t.count,
            pct: if total == 0 {
                0.0
            } else {
                t.count as f64 * 100.0 / total as f64
            },
        })
        .collect()
}

/// Dense layout of the sparse heatmap triples. Pairs absent from the data
/// stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    pub husband_axis: Vec<Option<i64>>,
    pub wife_axis: Vec<Option<i64>>,
    pub cells: Vec<Vec<Option<u64>>>,
    pub max: u64,
}

impl HeatmapGrid {
    pub fn new(triples: &[AgePairCount]) -> Self {
        let mut husband_axis: Vec<Option<i64>> = Vec::new();
        let mut wife_axis: Vec<Option<i64>> = Vec::new();
        for t in triples {
            if !husband_axis.contains(&t.husband_age_bucket) {
                husband_axis.push(t.husband_age_bucket);
            }
            if !wife_axis.contains(&t.wife_age_bucket) {
                wife_axis.push(t.wife_age_bucket);
            }
        }
        // Option orders None first; empty buckets go last on screen
        let key = |v: &Option<i64>| (v.is_none(), *v);
        husband_axis.sort_by_key(key);
        wife_axis.sort_by_key(key);

        let mut cells = vec![vec![None; wife_axis.len()]; husband_axis.len()];
        let mut max = 0;
        for t in triples {
            let row = husband_axis.iter().position(|h| *h == t.husband_age_bucket);
            let column = wife_axis.iter().position(|w| *w == t.wife_age_bucket);
            if let (Some(row), Some(column)) = (row, column) {
                cells[row][column] = Some(t.count);
                max = max.max(t.count);
            }
        }
        HeatmapGrid {
            husband_axis,
            wife_axis,
            cells,
            max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> SummaryMetrics {
        SummaryMetrics {
            total_count: 1234567,
            avg_husband_age_bucket: Some(4.26),
            avg_wife_age_bucket: Some(3.84),
            husband_first_marriage_pct: Some(200.0 / 3.0),
            wife_first_marriage_pct: None,
            husband_remarriage_pct: Some(100.0 / 3.0),
            wife_remarriage_pct: None,
        }
    }

    #[test]
    fn formats_metric_cards() {
        let cards = metric_cards(&metrics());
        let values: Vec<_> = cards.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["1,234,567 건", "4.3", "3.8", "66.7%", "-"]);
        assert_eq!(cards[0].label, "총 결혼 건수");
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
    }

    #[test]
    fn labels() {
        assert_eq!(age_bucket_label(1), "15~19세");
        assert_eq!(age_bucket_label(3), "25~29세");
        assert_eq!(age_axis_label(Some(4)), "30~34세");
        assert_eq!(age_axis_label(None), "(없음)");
        assert_eq!(marriage_type_label(Some(1)), "초혼 (1)");
        assert_eq!(marriage_type_label(Some(9)), "코드 9");
        assert_eq!(marriage_type_label(None), "코드 (없음)");
    }

    #[test]
    fn shares_of_distribution() {
        let s = shares(&[
            TypeCount { type_code: Some(1), count: 2 },
            TypeCount { type_code: Some(2), count: 1 },
        ]);
        assert_eq!(s[0].label, "초혼 (1)");
        assert!((s[0].pct + s[1].pct - 100.0).abs() < 1e-9);
        assert!(shares(&[]).is_empty());
    }

    #[test]
    fn heatmap_grid_is_sparse() {
        let grid = HeatmapGrid::new(&[
            AgePairCount { husband_age_bucket: Some(4), wife_age_bucket: Some(3), count: 5 },
            AgePairCount { husband_age_bucket: Some(3), wife_age_bucket: Some(3), count: 2 },
            AgePairCount { husband_age_bucket: Some(3), wife_age_bucket: None, count: 1 },
        ]);
        assert_eq!(grid.husband_axis, vec![Some(3), Some(4)]);
        assert_eq!(grid.wife_axis, vec![Some(3), None]);
        assert_eq!(grid.cells, vec![vec![Some(2), Some(1)], vec![Some(5), None]]);
        assert_eq!(grid.max, 5);
    }
}

use config::ColorTheme;
use dataset::{Dashboard, FilterOptions, MarriageTable, SummaryMetrics};

use clap::builder::PossibleValuesParser;
use clap::Parser;
use csv::Writer;
use env_logger::Env;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::{error::Error, process};

use log::{debug, error, info};

/// 요약 지표를 csv 파일로 저장
///
/// # 인자
/// * `filename` - 파일 이름
/// * `metrics` - 요약 지표
pub fn write_metrics_csv<P: AsRef<Path>>(
    filename: P,
    metrics: &SummaryMetrics,
) -> Result<(), Box<dyn Error>> {
    let file = File::create(&filename)?;
    let mut wtr = Writer::from_writer(file);

    wtr.serialize(metrics)?;
    wtr.flush()?;
    info!("CSV file written successfully: {:?}", filename.as_ref());

    Ok(())
}

enum OutputType {
    CSV,
    TABLE,
    POLAR,
    JSON,
}

impl OutputType {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(OutputType::CSV),
            "table" => Some(OutputType::TABLE),
            "polar" => Some(OutputType::POLAR),
            "json" => Some(OutputType::JSON),
            _ => None,
        }
    }
}

trait Output {
    fn output(&self, table: &MarriageTable) -> Result<(), Box<dyn Error>>;
}

fn metrics_frame(metrics: &SummaryMetrics) -> PolarsResult<DataFrame> {
    df!(
        "metric" => &[
            "total_count",
            "avg_husband_age_bucket",
            "avg_wife_age_bucket",
            "husband_first_marriage_pct",
            "wife_first_marriage_pct",
            "husband_remarriage_pct",
            "wife_remarriage_pct",
        ],
        "value" => &[
            Some(metrics.total_count as f64),
            metrics.avg_husband_age_bucket,
            metrics.avg_wife_age_bucket,
            metrics.husband_first_marriage_pct,
            metrics.wife_first_marriage_pct,
            metrics.husband_remarriage_pct,
            metrics.wife_remarriage_pct,
        ],
    )
}

/// The derived frames of one render cycle, named after their csv files.
fn view_frames(table: &MarriageTable) -> Result<Vec<(&'static str, DataFrame)>, Box<dyn Error>> {
    Ok(vec![
        ("monthly", table.monthly_frame()?),
        ("age_heatmap", table.age_heatmap_frame()?),
        ("job_ranking", table.job_ranking_frame()?),
        ("marriage_type", table.marriage_type_frame()?),
    ])
}

struct PolarOutput {
    filters: FilterOptions,
    apply_filters: bool,
}

impl Output for PolarOutput {
    fn output(&self, table: &MarriageTable) -> Result<(), Box<dyn Error>> {
        let view = table.view(&self.filters, self.apply_filters)?;
        println!("metrics\n{}", metrics_frame(&view.summary_metrics()?)?);
        for (name, df) in view_frames(&view)? {
            println!("{name}\n{df}");
        }
        Ok(())
    }
}

struct CsvOutput {
    dir: PathBuf,
    filters: FilterOptions,
    apply_filters: bool,
}

impl Output for CsvOutput {
    fn output(&self, table: &MarriageTable) -> Result<(), Box<dyn Error>> {
        let view = table.view(&self.filters, self.apply_filters)?;
        fs::create_dir_all(&self.dir)?;
        write_metrics_csv(self.dir.join("metrics.csv"), &view.summary_metrics()?)?;
        for (name, mut df) in view_frames(&view)? {
            let path = self.dir.join(format!("{name}.csv"));
            let mut file = File::create(&path)?;
            CsvWriter::new(&mut file).finish(&mut df)?;
            info!("CSV file written successfully: {:?}", path);
        }
        Ok(())
    }
}

struct JsonOutput {
    filters: FilterOptions,
    apply_filters: bool,
}

impl Output for JsonOutput {
    fn output(&self, table: &MarriageTable) -> Result<(), Box<dyn Error>> {
        let dashboard = Dashboard::compute(table, &self.filters, self.apply_filters)?;
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        Ok(())
    }
}

struct TableOutput {
    filters: FilterOptions,
    apply_filters: bool,
    theme: ColorTheme,
}

impl Output for TableOutput {
    fn output(&self, table: &MarriageTable) -> Result<(), Box<dyn Error>> {
        ui::tui::run(table, self.filters.clone(), self.apply_filters, self.theme)
    }
}

/// 2024 Seoul marriage registration dashboard
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(
        short = 'F',
        long = "format",
        value_parser = PossibleValuesParser::new(["table", "polar", "json", "csv"]),
        default_value = "table",
        help = "output format"
    )]
    format: String,

    #[arg(short = 's', long = "source", help = "marriage csv file, default marriage.csv")]
    source: Option<String>,

    #[arg(short = 'e', long = "encoding", help = "encoding of SOURCE, default cp949")]
    encoding: Option<String>,

    #[arg(
        short = 'o',
        long = "output-dir",
        default_value = "report",
        help = "directory for --format csv"
    )]
    output_dir: PathBuf,

    #[arg(
        short = 't',
        long = "theme",
        value_parser = PossibleValuesParser::new(["Blues", "Reds", "Greens"]),
        help = "chart color theme"
    )]
    theme: Option<String>,

    #[arg(long = "husband-job", help = "husband job code filter, repeatable")]
    husband_jobs: Vec<String>,

    #[arg(long = "wife-job", help = "wife job code filter, repeatable")]
    wife_jobs: Vec<String>,

    #[arg(long = "husband-age", help = "husband age bucket filter, repeatable")]
    husband_ages: Vec<i64>,

    #[arg(long = "wife-age", help = "wife age bucket filter, repeatable")]
    wife_ages: Vec<i64>,

    #[arg(
        long = "apply-filters",
        overrides_with = "no_apply_filters",
        help = "subset rows by the filters before aggregating"
    )]
    apply_filters: bool,

    #[arg(
        long = "no-apply-filters",
        overrides_with = "apply_filters",
        help = "collect the filters without applying them"
    )]
    no_apply_filters: bool,

    #[arg(
        short = 'c',
        long = "config",
        default_value = config::DEFAULT_CONFIG_FILE,
        help = "config file"
    )]
    config: PathBuf,
}

impl Args {
    /// `None` when neither flag was given, the last one wins otherwise.
    fn apply_filters(&self) -> Option<bool> {
        match (self.apply_filters, self.no_apply_filters) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Arguments merged over the config file.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    source: String,
    encoding: String,
    theme: ColorTheme,
    filters: FilterOptions,
    apply_filters: bool,
    output_dir: PathBuf,
}

impl Settings {
    fn resolve(args: &Args, conf: config::Config) -> Settings {
        let mut filters = FilterOptions {
            husband_jobs: conf.filters.husband_jobs,
            wife_jobs: conf.filters.wife_jobs,
            husband_ages: conf.filters.husband_ages,
            wife_ages: conf.filters.wife_ages,
        };
        filters.extend(FilterOptions {
            husband_jobs: args.husband_jobs.clone(),
            wife_jobs: args.wife_jobs.clone(),
            husband_ages: args.husband_ages.clone(),
            wife_ages: args.wife_ages.clone(),
        });

        Settings {
            source: args.source.clone().unwrap_or(conf.source),
            encoding: args.encoding.clone().unwrap_or(conf.encoding),
            theme: args
                .theme
                .as_deref()
                .and_then(ColorTheme::from_str)
                .unwrap_or(conf.theme),
            filters,
            apply_filters: args.apply_filters().unwrap_or(conf.apply_filters),
            output_dir: args.output_dir.clone(),
        }
    }
}

fn get_output(output_type: OutputType, settings: &Settings) -> Box<dyn Output> {
    let filters = settings.filters.clone();
    let apply_filters = settings.apply_filters;
    match output_type {
        OutputType::TABLE => Box::new(TableOutput {
            filters,
            apply_filters,
            theme: settings.theme,
        }),
        OutputType::CSV => Box::new(CsvOutput {
            dir: settings.output_dir.clone(),
            filters,
            apply_filters,
        }),
        OutputType::POLAR => Box::new(PolarOutput {
            filters,
            apply_filters,
        }),
        OutputType::JSON => Box::new(JsonOutput {
            filters,
            apply_filters,
        }),
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let conf = config::Config::new(&args.config)?;
    let settings = Settings::resolve(&args, conf);
    debug!("settings: {:?}", settings);

    let table = dataset::load(&settings.source, &settings.encoding)?;

    let out_type = OutputType::from_str(args.format.as_str()).ok_or("output not match")?;
    get_output(out_type, &settings).output(&table)
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        error!("{err}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset::schema::*;
    use tempfile::tempdir;

    fn table() -> MarriageTable {
        let df = df!(
            REPORT_MONTH => &[1i64, 2, 2],
            HUSBAND_AGE => &[3i64, 4, 4],
            WIFE_AGE => &[3i64, 3, 4],
            HUSBAND_JOB => &["01", "02", "02"],
            WIFE_JOB => &["01", "01", "02"],
            HUSBAND_MARRIAGE_TYPE => &[1i64, 1, 2],
            WIFE_MARRIAGE_TYPE => &[1i64, 2, 2],
        )
        .unwrap();
        MarriageTable::from_frame(df).unwrap()
    }

    #[test]
    fn cli_overrides_config() {
        let args = Args::try_parse_from([
            "marriage-dashboard",
            "--source",
            "other.csv",
            "--theme",
            "Reds",
            "--husband-job",
            "03",
            "--husband-age",
            "4",
            "--husband-age",
            "5",
        ])
        .unwrap();
        let conf = config::Config {
            source: "data.csv".to_string(),
            encoding: "euc-kr".to_string(),
            theme: ColorTheme::Greens,
            apply_filters: false,
            filters: config::Filters {
                husband_jobs: vec!["01".to_string()],
                ..Default::default()
            },
        };

        let settings = Settings::resolve(&args, conf);
        assert_eq!(settings.source, "other.csv");
        assert_eq!(settings.encoding, "euc-kr");
        assert_eq!(settings.theme, ColorTheme::Reds);
        assert_eq!(settings.filters.husband_jobs, vec!["01", "03"]);
        assert_eq!(settings.filters.husband_ages, vec![4, 5]);
        assert!(!settings.apply_filters);
        assert_eq!(settings.output_dir, PathBuf::from("report"));
    }

    fn config_applying_filters() -> config::Config {
        config::Config {
            apply_filters: true,
            ..Default::default()
        }
    }

    #[test]
    fn cli_turns_off_config_filters() {
        let args = Args::try_parse_from(["marriage-dashboard", "--no-apply-filters"]).unwrap();
        assert!(!Settings::resolve(&args, config_applying_filters()).apply_filters);

        let args = Args::try_parse_from(["marriage-dashboard"]).unwrap();
        assert!(Settings::resolve(&args, config_applying_filters()).apply_filters);

        let args = Args::try_parse_from(["marriage-dashboard", "--apply-filters"]).unwrap();
        assert!(Settings::resolve(&args, config::Config::default()).apply_filters);
    }

    #[test]
    fn last_apply_filters_flag_wins() {
        let args = Args::try_parse_from([
            "marriage-dashboard",
            "--no-apply-filters",
            "--apply-filters",
        ])
        .unwrap();
        assert_eq!(args.apply_filters(), Some(true));

        let args = Args::try_parse_from([
            "marriage-dashboard",
            "--apply-filters",
            "--no-apply-filters",
        ])
        .unwrap();
        assert_eq!(args.apply_filters(), Some(false));
    }

    #[test]
    fn defaults_without_config() {
        let args = Args::try_parse_from(["marriage-dashboard"]).unwrap();
        let settings = Settings::resolve(&args, config::Config::default());
        assert_eq!(settings.source, "marriage.csv");
        assert_eq!(settings.encoding, "cp949");
        assert_eq!(settings.theme, ColorTheme::Blues);
        assert!(settings.filters.is_empty());
        assert_eq!(args.format, "table");
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Args::try_parse_from(["marriage-dashboard", "-F", "xml"]).is_err());
        assert!(OutputType::from_str("xml").is_none());
    }

    #[test]
    fn metrics_frame_lists_every_metric() {
        let metrics = table().summary_metrics().unwrap();
        let df = metrics_frame(&metrics).unwrap();
        assert_eq!(df.height(), 7);
        let values = df.column("value").unwrap().f64().unwrap();
        assert_eq!(values.get(0), Some(3.0));
    }

    #[test]
    fn csv_output_writes_every_view() {
        let dir = tempdir().unwrap();
        let out = CsvOutput {
            dir: dir.path().join("report"),
            filters: FilterOptions::default(),
            apply_filters: false,
        };
        out.output(&table()).unwrap();

        for name in ["metrics", "monthly", "age_heatmap", "job_ranking", "marriage_type"] {
            assert!(dir.path().join("report").join(format!("{name}.csv")).exists());
        }
        let monthly = fs::read_to_string(dir.path().join("report/monthly.csv")).unwrap();
        assert_eq!(monthly.lines().collect::<Vec<_>>(), vec!["month,count", "1,1", "2,2"]);
        let metrics = fs::read_to_string(dir.path().join("report/metrics.csv")).unwrap();
        assert!(metrics.starts_with("total_count,avg_husband_age_bucket"));
    }

    #[test]
    fn csv_output_honours_applied_filters() {
        let dir = tempdir().unwrap();
        let out = CsvOutput {
            dir: dir.path().to_path_buf(),
            filters: FilterOptions {
                husband_jobs: vec!["02".into()],
                ..Default::default()
            },
            apply_filters: true,
        };
        out.output(&table()).unwrap();
        let monthly = fs::read_to_string(dir.path().join("monthly.csv")).unwrap();
        assert_eq!(monthly.lines().collect::<Vec<_>>(), vec!["month,count", "2,2"]);
    }
}

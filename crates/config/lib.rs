use log::info;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = ".marriage-dashboard.yml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot open config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Chart color scale. Only changes colors, never the data.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorTheme {
    #[default]
    Blues,
    Reds,
    Greens,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 3] = [ColorTheme::Blues, ColorTheme::Reds, ColorTheme::Greens];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTheme::Blues => "Blues",
            ColorTheme::Reds => "Reds",
            ColorTheme::Greens => "Greens",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Blues" => Some(ColorTheme::Blues),
            "Reds" => Some(ColorTheme::Reds),
            "Greens" => Some(ColorTheme::Greens),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let count = Self::ALL.len();
        Self::ALL[(self.index() + count - 1) % count]
    }
}

// job codes may be written as `01` or `1` in YAML
fn deserialize_codes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<serde_yaml::Value> = Deserialize::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|value| match value {
            serde_yaml::Value::String(s) => Ok(s),
            serde_yaml::Value::Number(n) => Ok(n.to_string()),
            _ => Err(serde::de::Error::custom("Expected string|number")),
        })
        .collect()
}

/// Preselected sidebar filters.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Filters {
    #[serde(deserialize_with = "deserialize_codes")]
    pub husband_jobs: Vec<String>,
    #[serde(deserialize_with = "deserialize_codes")]
    pub wife_jobs: Vec<String>,
    pub husband_ages: Vec<i64>,
    pub wife_ages: Vec<i64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub source: String,
    pub encoding: String,
    pub theme: ColorTheme,
    pub apply_filters: bool,
    pub filters: Filters,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: "marriage.csv".to_string(),
            encoding: "cp949".to_string(),
            theme: ColorTheme::default(),
            apply_filters: false,
            filters: Filters::default(),
        }
    }
}

impl Config {
    /// Read `filename`, falling back to defaults when it does not exist.
    pub fn new<P: AsRef<Path>>(filename: P) -> Result<Config, ConfigError> {
        let path = filename.as_ref();
        if !path.exists() {
            info!("config {} not found, using defaults", path.display());
            return Ok(Config::default());
        }
        let reader = File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_yaml::from_reader(reader).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
        info!("config loaded from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config() {
        let content = r##"source: data/marriage.csv
encoding: euc-kr
theme: Greens
apply_filters: true
filters:
  husband_jobs: ["01", 7]
  wife_ages: [3, 4]
"##;
        let config: Config = serde_yaml::from_str(content).unwrap();
        println!("{:?}", config);
        assert_eq!(config.source, "data/marriage.csv");
        assert_eq!(config.encoding, "euc-kr");
        assert_eq!(config.theme, ColorTheme::Greens);
        assert!(config.apply_filters);
        assert_eq!(config.filters.husband_jobs, &["01", "7"]);
        assert!(config.filters.wife_jobs.is_empty());
        assert_eq!(config.filters.wife_ages, &[3, 4]);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: Config = serde_yaml::from_str("theme: Reds\n").unwrap();
        assert_eq!(config.source, "marriage.csv");
        assert_eq!(config.encoding, "cp949");
        assert_eq!(config.theme, ColorTheme::Reds);
        assert!(!config.apply_filters);
        assert_eq!(config.filters, Filters::default());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = Config::new("/no/such/dir/.marriage-dashboard.yml").unwrap();
        assert_eq!(config.source, "marriage.csv");
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "theme: Purples").unwrap();
        let err = Config::new(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn theme_cycles() {
        assert_eq!(ColorTheme::Blues.next(), ColorTheme::Reds);
        assert_eq!(ColorTheme::Greens.next(), ColorTheme::Blues);
        assert_eq!(ColorTheme::Blues.previous(), ColorTheme::Greens);
        assert_eq!(ColorTheme::from_str("Reds"), Some(ColorTheme::Reds));
        assert_eq!(ColorTheme::from_str("Purples"), None);
        assert_eq!(ColorTheme::Greens.as_str(), "Greens");
    }
}

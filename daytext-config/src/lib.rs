//! Loader for daytext configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, YAML sources in the order
//! they were added, then `DAYTEXT_`-prefixed environment variables using `__`
//! as the nesting separator (`DAYTEXT_RETRY__MAX_ATTEMPTS=3`). String values
//! may reference other variables as `${VAR}`; they are expanded after merging.
use chrono::{Datelike, NaiveDate};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "DAYTEXT";
pub const CONFIG_FILE_NAME: &str = "daytext.yaml";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.102 Safari/537.36 Edge/18.19042";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US, en;q=0.5";
const DAILY_TEXT_URL: &str = "https://wol.jw.org/en/wol/h/r1/lp-e/{year}/{month}/{day}";
const DAILY_TEXT_HOME_URL: &str = "https://wol.jw.org/en/wol/h/r1/lp-e";
const AMAZON_SEARCH_URL: &str =
    "https://www.amazon.com/s?k=mouse&crid=38UDRU7QNUXZ4&sprefix=mo%2Caps%2C430&ref=nb_sb_noss_2";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DaytextConfig {
    pub version: Option<String>,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub speech: SpeechConfig,
    pub sources: Vec<SourceSpec>,
}

impl Default for DaytextConfig {
    fn default() -> Self {
        Self {
            version: None,
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            speech: SpeechConfig::default(),
            sources: default_sources(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.into(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.into(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub backoff_step_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step_secs: 2,
        }
    }
}

/// Text-to-speech settings. `command: None` picks the platform default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub command: Option<String>,
    pub args: Vec<String>,
}

/// Shared fields + the per-kind details
#[derive(Debug, Deserialize)]
pub struct SourceSpec {
    pub id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub details: SourceDetails,
}

impl SourceSpec {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// The tag is `kind`; the payload lives in `config`
#[derive(Debug, Deserialize)]
#[serde(tag = "kind")]
pub enum SourceDetails {
    #[serde(rename = "daily_text")]
    DailyText { config: DailyTextConfig },

    #[serde(rename = "listing")]
    Listing { config: ListingConfig },
}

#[derive(Debug, Deserialize)]
pub struct DailyTextConfig {
    /// Page URL; `{year}`, `{month}`, `{day}` are filled in unpadded.
    pub url: String,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default = "default_date_attribute")]
    pub date_attribute: String,
    #[serde(default = "default_heading")]
    pub heading: String,
    #[serde(default)]
    pub heading_match: HeadingMatchMode,
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldConfig>,
}

impl DailyTextConfig {
    /// ```
    /// use chrono::NaiveDate;
    /// use daytext_config::DaytextConfig;
    ///
    /// let cfg = DaytextConfig::default();
    /// let (_, daily) = cfg.daily_text_source(None).unwrap();
    /// let d = NaiveDate::from_ymd_opt(2024, 8, 3).unwrap();
    /// assert_eq!(daily.url_for(d), "https://wol.jw.org/en/wol/h/r1/lp-e/2024/8/3");
    /// ```
    pub fn url_for(&self, date: NaiveDate) -> String {
        self.url
            .replace("{year}", &date.year().to_string())
            .replace("{month}", &date.month().to_string())
            .replace("{day}", &date.day().to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingMatchMode {
    #[default]
    Boundary,
    Substring,
}

#[derive(Debug, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// Human wording used in "No <label> found" messages; defaults to `name`.
    #[serde(default)]
    pub label: Option<String>,
    pub marker: String,
}

impl FieldConfig {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListingConfig {
    pub url: String,
    pub selector: String,
    #[serde(default)]
    pub take: TakeMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakeMode {
    #[default]
    All,
    First,
}

fn default_container() -> String {
    "div.tabContent".into()
}
fn default_date_attribute() -> String {
    "data-date".into()
}
fn default_heading() -> String {
    "h2".into()
}
fn default_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig {
            name: "theme".into(),
            label: Some("theme scripture".into()),
            marker: "p.themeScrp".into(),
        },
        FieldConfig {
            name: "dailyText".into(),
            label: Some("daily text".into()),
            marker: "p.sb".into(),
        },
    ]
}

fn default_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec {
            id: "daily-text".into(),
            enabled: None,
            details: SourceDetails::DailyText {
                config: DailyTextConfig {
                    url: DAILY_TEXT_URL.into(),
                    container: default_container(),
                    date_attribute: default_date_attribute(),
                    heading: default_heading(),
                    heading_match: HeadingMatchMode::default(),
                    fields: default_fields(),
                },
            },
        },
        SourceSpec {
            id: "daily-text-first".into(),
            enabled: None,
            details: SourceDetails::Listing {
                config: ListingConfig {
                    url: DAILY_TEXT_HOME_URL.into(),
                    selector: "p.sb".into(),
                    take: TakeMode::First,
                },
            },
        },
        SourceSpec {
            id: "amazon-mouse".into(),
            enabled: None,
            details: SourceDetails::Listing {
                config: ListingConfig {
                    url: AMAZON_SEARCH_URL.into(),
                    selector: "span.a-size-medium.a-color-base.a-text-normal".into(),
                    take: TakeMode::All,
                },
            },
        },
    ]
}

impl DaytextConfig {
    /// Enabled source by id, or the first enabled daily-text source.
    pub fn daily_text_source(&self, id: Option<&str>) -> Option<(&SourceSpec, &DailyTextConfig)> {
        self.enabled_sources().find_map(|s| match &s.details {
            SourceDetails::DailyText { config } if id.is_none_or(|id| id == s.id) => {
                Some((s, config))
            }
            _ => None,
        })
    }

    /// Enabled source by id, or the first enabled listing source.
    pub fn listing_source(&self, id: Option<&str>) -> Option<(&SourceSpec, &ListingConfig)> {
        self.enabled_sources().find_map(|s| match &s.details {
            SourceDetails::Listing { config } if id.is_none_or(|id| id == s.id) => {
                Some((s, config))
            }
            _ => None,
        })
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceSpec> {
        self.sources.iter().filter(|s| s.is_enabled())
    }

    /// Reject configurations that would only fail later at run time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.id.as_str()) {
                return Err(ConfigError::Message(format!(
                    "duplicate source id `{}`",
                    source.id
                )));
            }
            let url = match &source.details {
                SourceDetails::DailyText { config } => {
                    if config.fields.is_empty() {
                        return Err(ConfigError::Message(format!(
                            "source `{}` has no fields",
                            source.id
                        )));
                    }
                    &config.url
                }
                SourceDetails::Listing { config } => &config.url,
            };
            if url.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "source `{}` has an empty url",
                    source.id
                )));
            }
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Message("http.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Where a config file is looked for when none is given:
/// `./daytext.yaml`, then `<config dir>/daytext/daytext.yaml`.
pub fn discover_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|d| d.join("daytext").join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct DaytextConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env: Option<Environment>,
}

impl Default for DaytextConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DaytextConfigLoader {
    /// Defaults + `DAYTEXT_` env overrides; add files or snippets on top.
    ///
    /// ```
    /// use daytext_config::DaytextConfigLoader;
    ///
    /// let config = DaytextConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nretry:\n  max_attempts: 2")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.retry.max_attempts, 2);
    /// assert_eq!(config.retry.backoff_step_secs, 2);
    /// assert!(config.daily_text_source(None).is_some());
    /// ```
    pub fn new() -> Self {
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        Self {
            builder: Config::builder(),
            env: Some(env),
        }
    }

    /// Skip the environment overlay (tests, `--no-env` style callers).
    pub fn without_env(mut self) -> Self {
        self.env = None;
        self
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use daytext_config::{DaytextConfigLoader, SourceDetails, TakeMode};
    ///
    /// let cfg = DaytextConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// sources:
    ///   - id: "headlines"
    ///     kind: "listing"
    ///     config:
    ///       url: "https://example.org/"
    ///       selector: "h3.title"
    ///       take: first
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.sources.len(), 1);
    /// match &cfg.sources[0].details {
    ///     SourceDetails::Listing { config } => assert_eq!(config.take, TakeMode::First),
    ///     _ => panic!("expected a listing source"),
    /// }
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialize.
    pub fn load(self) -> Result<DaytextConfig, ConfigError> {
        let builder = match self.env {
            Some(env) => self.builder.add_source(env),
            None => self.builder,
        };
        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        if v.is_null() {
            v = Value::Object(Default::default());
        }
        expand_env_in_value(&mut v);

        let typed: DaytextConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use temp_env;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("DAYTEXT_TEST_LANG", Some("de"), || {
            let mut v = json!("https://wol.jw.org/${DAYTEXT_TEST_LANG}/wol");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("https://wol.jw.org/de/wol"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!(["hello-$CITY", { "loc": "${CITY}-${STATE}" }, 42, true, null]);
            expand_env_in_value(&mut v);
            assert_eq!(v, json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null]));
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_DAYTEXT}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_DAYTEXT}"));
    }

    #[test]
    fn defaults_cover_known_pages() {
        let cfg = DaytextConfig::default();
        cfg.validate().unwrap();

        let (source, daily) = cfg.daily_text_source(None).unwrap();
        assert_eq!(source.id, "daily-text");
        assert_eq!(daily.heading_match, HeadingMatchMode::Boundary);
        let labels: Vec<_> = daily.fields.iter().map(FieldConfig::label).collect();
        assert_eq!(labels, ["theme scripture", "daily text"]);

        let (first, listing) = cfg.listing_source(None).unwrap();
        assert_eq!(first.id, "daily-text-first");
        assert_eq!(listing.take, TakeMode::First);
        assert!(cfg.listing_source(Some("amazon-mouse")).is_some());
    }

    #[test]
    fn lookup_by_id_respects_kind_and_enabled() {
        let mut cfg = DaytextConfig::default();
        assert!(cfg.daily_text_source(Some("amazon-mouse")).is_none());
        cfg.sources[0].enabled = Some(false);
        assert!(cfg.daily_text_source(None).is_none());
    }

    #[test]
    fn url_template_is_unpadded() {
        let cfg = DaytextConfig::default();
        let (_, daily) = cfg.daily_text_source(None).unwrap();
        let d = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        assert!(daily.url_for(d).ends_with("/lp-e/2025/1/9"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut cfg = DaytextConfig::default();
        cfg.sources[1].id = "daily-text".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn label_falls_back_to_name() {
        let f = FieldConfig {
            name: "verse".into(),
            label: None,
            marker: "p.v".into(),
        };
        assert_eq!(f.label(), "verse");
    }
}

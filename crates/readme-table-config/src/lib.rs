//! Configuration primitives and loader for readme-table.
//!
//! Settings are resolved from layers, lowest precedence first:
//! built-in defaults → git root → working directory → override file →
//! command-line flags.
//! Every value remembers the layer that declared it so validation failures
//! and relative paths can be attributed to the right file.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".readme-table.toml";

/// Placeholder substituted with the selected version label in `docs_url`.
pub const VERSION_PLACEHOLDER: &str = "{version}";

const DEFAULT_INPUT: &str = "README.md";
const DEFAULT_OUTPUT: &str = "index.html";
const DEFAULT_TITLE: &str = "Specification";
const DEFAULT_DOCS_URL: &str = "./{version}/";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub paths: PathSettings,
    pub page: PageSettings,
    pub sources: ConfigSources,
}

/// Where the README is read from and the page is written to.
#[derive(Clone, Debug)]
pub struct PathSettings {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Settings that shape the assembled page.
#[derive(Clone, Debug)]
pub struct PageSettings {
    pub template: TemplateVariant,
    pub title: String,
    pub versions: VersionSettings,
    pub search: Option<SearchSettings>,
}

/// Version selector contents for the full template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionSettings {
    pub labels: Vec<String>,
    pub default_index: usize,
    pub docs_url: String,
}

impl VersionSettings {
    /// Label selected when the page loads.
    pub fn default_label(&self) -> Option<&str> {
        self.labels.get(self.default_index).map(String::as_str)
    }

    /// Documentation link for `label`.
    pub fn docs_url_for(&self, label: &str) -> String {
        self.docs_url.replace(VERSION_PLACEHOLDER, label)
    }
}

/// Hosted search widget credentials. Present only when fully configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchSettings {
    pub app_id: String,
    pub api_key: String,
    pub index_name: String,
}

/// Head/tail wrapper applied around the extracted table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TemplateVariant {
    #[default]
    Minimal,
    Full,
}

impl TemplateVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateVariant::Minimal => "minimal",
            TemplateVariant::Full => "full",
        }
    }
}

impl fmt::Display for TemplateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TemplateVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minimal" | "bare" => Ok(TemplateVariant::Minimal),
            "full" => Ok(TemplateVariant::Full),
            other => Err(format!(
                "unknown template '{other}' (expected 'minimal' or 'full')"
            )),
        }
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override/flags).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn command_line(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::CommandLine,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
    CommandLine,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
            ConfigSourceKind::CommandLine => "command-line flags",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub template: Option<TemplateVariant>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_template(mut self, template: TemplateVariant) -> Self {
        self.template = Some(template);
        self
    }

    fn has_flags(&self) -> bool {
        self.input.is_some() || self.output.is_some() || self.template.is_some()
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir.clone())?;
        let override_path = options
            .override_path
            .as_ref()
            .map(|path| make_absolute(path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = defaults_layer(default_source.clone());
        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        if options.has_flags() {
            let source = ConfigSource::command_line(working_dir.clone());
            merged.merge(flags_layer(&options, source.clone()));
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            paths: resolved.paths,
            page: resolved.page,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    PartialConfig {
        input: Some(Located::new(PathBuf::from(DEFAULT_INPUT), source.clone())),
        output: Some(Located::new(PathBuf::from(DEFAULT_OUTPUT), source.clone())),
        template: Some(Located::new(
            TemplateVariant::default().as_str().to_owned(),
            source.clone(),
        )),
        title: Some(Located::new(DEFAULT_TITLE.to_owned(), source.clone())),
        version_labels: Some(Located::new(
            vec!["main".to_owned(), "latest".to_owned()],
            source.clone(),
        )),
        docs_url: Some(Located::new(DEFAULT_DOCS_URL.to_owned(), source)),
        ..PartialConfig::default()
    }
}

fn flags_layer(options: &LoadOptions, source: ConfigSource) -> PartialConfig {
    PartialConfig {
        input: options
            .input
            .clone()
            .map(|value| Located::new(value, source.clone())),
        output: options
            .output
            .clone()
            .map(|value| Located::new(value, source.clone())),
        template: options
            .template
            .map(|value| Located::new(value.as_str().to_owned(), source)),
        ..PartialConfig::default()
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    input: Option<Located<PathBuf>>,
    output: Option<Located<PathBuf>>,
    template: Option<Located<String>>,
    title: Option<Located<String>>,
    version_labels: Option<Located<Vec<String>>>,
    default_version: Option<Located<i64>>,
    docs_url: Option<Located<String>>,
    search_app_id: Option<Located<String>>,
    search_api_key: Option<Located<String>>,
    search_index_name: Option<Located<String>>,
}

struct ResolvedConfig {
    paths: PathSettings,
    page: PageSettings,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        fn take<T>(slot: &mut Option<T>, other: Option<T>) {
            if other.is_some() {
                *slot = other;
            }
        }

        take(&mut self.input, other.input);
        take(&mut self.output, other.output);
        take(&mut self.template, other.template);
        take(&mut self.title, other.title);
        take(&mut self.version_labels, other.version_labels);
        take(&mut self.default_version, other.default_version);
        take(&mut self.docs_url, other.docs_url);
        take(&mut self.search_app_id, other.search_app_id);
        take(&mut self.search_api_key, other.search_api_key);
        take(&mut self.search_index_name, other.search_index_name);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let fallback = || ConfigSource::default(PathBuf::from("."));

        let input = self
            .input
            .unwrap_or_else(|| Located::new(PathBuf::from(DEFAULT_INPUT), fallback()));
        let output = self
            .output
            .unwrap_or_else(|| Located::new(PathBuf::from(DEFAULT_OUTPUT), fallback()));

        let template_loc = self.template.unwrap_or_else(|| {
            Located::new(TemplateVariant::default().as_str().to_owned(), fallback())
        });
        let template = match template_loc.value.parse::<TemplateVariant>() {
            Ok(template) => template,
            Err(message) => {
                errors.push(
                    ConfigValidationError::new(Some(template_loc.source.clone()), message)
                        .with_context("page.template"),
                );
                TemplateVariant::default()
            }
        };

        let title = self
            .title
            .map(|located| located.value)
            .unwrap_or_else(|| DEFAULT_TITLE.to_owned());

        let labels = self
            .version_labels
            .unwrap_or_else(|| Located::new(Vec::new(), fallback()));
        let docs_url = self
            .docs_url
            .unwrap_or_else(|| Located::new(DEFAULT_DOCS_URL.to_owned(), fallback()));
        // The second label when there is one, otherwise the first.
        let default_index = match &self.default_version {
            Some(located) => usize::try_from(located.value).unwrap_or(usize::MAX),
            None => labels.value.len().saturating_sub(1).min(1),
        };

        // Version settings only reach the page through the full template.
        if template == TemplateVariant::Full {
            validate_versions(
                &labels,
                self.default_version.as_ref(),
                default_index,
                &docs_url,
                &mut errors,
            );
        }

        let search = finalize_search(
            self.search_app_id,
            self.search_api_key,
            self.search_index_name,
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            paths: PathSettings {
                input: resolve_path(&input),
                output: resolve_path(&output),
            },
            page: PageSettings {
                template,
                title,
                versions: VersionSettings {
                    labels: labels.value,
                    default_index,
                    docs_url: docs_url.value,
                },
                search,
            },
        })
    }
}

fn validate_versions(
    labels: &Located<Vec<String>>,
    default_version: Option<&Located<i64>>,
    default_index: usize,
    docs_url: &Located<String>,
    errors: &mut Vec<ConfigValidationError>,
) {
    if labels.value.is_empty() {
        errors.push(ConfigValidationError::new(
            Some(labels.source.clone()),
            "page.versions.labels cannot be empty for the full template".into(),
        ));
    }
    if let Some(blank) = labels.value.iter().find(|label| label.trim().is_empty()) {
        errors.push(ConfigValidationError::new(
            Some(labels.source.clone()),
            format!("page.versions.labels contains a blank label ({blank:?})"),
        ));
    }

    if let Some(located) = default_version {
        if !labels.value.is_empty() && default_index >= labels.value.len() {
            errors.push(ConfigValidationError::new(
                Some(located.source.clone()),
                format!(
                    "page.versions.default must be between 0 and {} (received {})",
                    labels.value.len() - 1,
                    located.value
                ),
            ));
        }
    }

    if !docs_url.value.contains(VERSION_PLACEHOLDER) {
        errors.push(ConfigValidationError::new(
            Some(docs_url.source.clone()),
            format!("page.versions.docs_url must contain the {VERSION_PLACEHOLDER} placeholder"),
        ));
    }
}

fn finalize_search(
    app_id: Option<Located<String>>,
    api_key: Option<Located<String>>,
    index_name: Option<Located<String>>,
    errors: &mut Vec<ConfigValidationError>,
) -> Option<SearchSettings> {
    match (app_id, api_key, index_name) {
        (None, None, None) => None,
        (Some(app_id), Some(api_key), Some(index_name)) => Some(SearchSettings {
            app_id: app_id.value,
            api_key: api_key.value,
            index_name: index_name.value,
        }),
        (app_id, api_key, index_name) => {
            let source = app_id
                .as_ref()
                .or(api_key.as_ref())
                .or(index_name.as_ref())
                .map(|located| located.source.clone());
            let missing: Vec<&str> = [
                ("app_id", app_id.is_none()),
                ("api_key", api_key.is_none()),
                ("index_name", index_name.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            errors.push(
                ConfigValidationError::new(source, format!("missing {}", missing.join(", ")))
                    .with_context("page.search"),
            );
            None
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    make_absolute(&located.value, &located.source.base_dir)
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    paths: Option<RawPaths>,
    #[serde(default)]
    page: Option<RawPage>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPaths {
    #[serde(default)]
    input: Option<PathBuf>,
    #[serde(default)]
    output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPage {
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    versions: Option<RawVersions>,
    #[serde(default)]
    search: Option<RawSearch>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVersions {
    #[serde(default)]
    labels: Option<Vec<String>>,
    #[serde(default)]
    default: Option<i64>,
    #[serde(default)]
    docs_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSearch {
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    index_name: Option<String>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let at = |value| Located::new(value, source.clone());
        let mut partial = PartialConfig::default();

        if let Some(paths) = self.paths {
            partial.input = paths.input.map(|value| Located::new(value, source.clone()));
            partial.output = paths.output.map(|value| Located::new(value, source.clone()));
        }

        if let Some(page) = self.page {
            partial.template = page.template.map(at);
            partial.title = page.title.map(at);
            if let Some(versions) = page.versions {
                partial.version_labels = versions
                    .labels
                    .map(|value| Located::new(value, source.clone()));
                partial.default_version = versions
                    .default
                    .map(|value| Located::new(value, source.clone()));
                partial.docs_url = versions.docs_url.map(at);
            }
            if let Some(search) = page.search {
                partial.search_app_id = search.app_id.map(at);
                partial.search_api_key = search.api_key.map(at);
                partial.search_index_name = search.index_name.map(at);
            }
        }

        partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ConfigSource {
        ConfigSource::default(PathBuf::from("/work"))
    }

    #[test]
    fn template_variant_parses_known_names() {
        assert_eq!(
            "minimal".parse::<TemplateVariant>(),
            Ok(TemplateVariant::Minimal)
        );
        assert_eq!(" Full ".parse::<TemplateVariant>(), Ok(TemplateVariant::Full));
        assert_eq!("bare".parse::<TemplateVariant>(), Ok(TemplateVariant::Minimal));
        assert!("fancy".parse::<TemplateVariant>().is_err());
    }

    #[test]
    fn defaults_resolve_against_base_dir() {
        let resolved = defaults_layer(source()).finalize().expect("defaults valid");
        assert_eq!(resolved.paths.input, PathBuf::from("/work/README.md"));
        assert_eq!(resolved.paths.output, PathBuf::from("/work/index.html"));
        assert_eq!(resolved.page.template, TemplateVariant::Minimal);
        assert_eq!(resolved.page.versions.default_label(), Some("latest"));
        assert!(resolved.page.search.is_none());
    }

    #[test]
    fn docs_url_substitutes_version() {
        let versions = VersionSettings {
            labels: vec!["3.5".into()],
            default_index: 0,
            docs_url: "https://docs.example.org/{version}/spec.html".into(),
        };
        assert_eq!(
            versions.docs_url_for("3.5"),
            "https://docs.example.org/3.5/spec.html"
        );
    }

    #[test]
    fn partial_search_settings_are_rejected() {
        let mut partial = defaults_layer(source());
        partial.search_app_id = Some(Located::new("APP".into(), source()));

        let err = match partial.finalize() {
            Ok(_) => panic!("expected validation failure"),
            Err(err) => err,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("page.search: missing api_key, index_name"));
    }

    #[test]
    fn negative_default_version_is_out_of_range() {
        let mut partial = defaults_layer(source());
        partial.template = Some(Located::new("full".to_owned(), source()));
        partial.default_version = Some(Located::new(-1, source()));

        let err = match partial.finalize() {
            Ok(_) => panic!("expected validation failure"),
            Err(err) => err,
        };
        assert_eq!(err.0.len(), 1);
        assert!(err.0[0].message.contains("received -1"));
    }

    #[test]
    fn implied_default_version_is_second_label_when_present() {
        for (labels, expected) in [(vec!["3.6"], 0), (vec!["main", "3.6", "3.5"], 1)] {
            let mut partial = defaults_layer(source());
            partial.template = Some(Located::new("full".to_owned(), source()));
            partial.version_labels = Some(Located::new(
                labels.iter().map(|label| label.to_string()).collect(),
                source(),
            ));

            let resolved = partial.finalize().expect("labels alone are valid");
            assert_eq!(resolved.page.versions.default_index, expected);
        }
    }
}

use anyhow::Context;
use config::{Config, File};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub mod validator;

use crate::cli::Cli;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub schema: SchemaSettings,
    #[serde(default)]
    pub mocks: MockSettings,
    /// Type name to rule, loaded from `mocks.rules_dir`
    #[serde(skip)]
    pub rules: IndexMap<String, MockRuleConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    /// 0 picks an ephemeral port
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaSettings {
    /// File path or glob pattern of SDL files
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MockSettings {
    #[serde(default = "default_list_length")]
    pub list_length: usize,
    /// Fixed seed for reproducible responses
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_rules_dir")]
    pub rules_dir: String,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            list_length: default_list_length(),
            seed: None,
            rules_dir: default_rules_dir(),
        }
    }
}

fn default_list_length() -> usize {
    crate::adapters::mock_registry::DEFAULT_LIST_LENGTH
}

fn default_rules_dir() -> String {
    "config/mocks".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MockRuleStrategy {
    Constant,
    Integer,
    Float,
    Boolean,
    Uuid,
    Enum,
    Pattern,
    Faker,
    Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FakerKind {
    FirstName,
    LastName,
    Name,
    Username,
    Email,
    Phone,
    City,
    Country,
    Word,
    Sentence,
    Paragraph,
}

/// One mock rule as written in a rule file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MockRuleConfig {
    pub strategy: MockRuleStrategy,
    /// Value for `constant`
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Choices for `enum`
    #[serde(default)]
    pub values: Option<Vec<Value>>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub faker: Option<FakerKind>,
    /// Partial field overrides for `fields`
    #[serde(default)]
    pub fields: Option<serde_json::Map<String, Value>>,
    /// Element count for lists of this type
    #[serde(default)]
    pub list_length: Option<usize>,
}

impl Settings {
    /// Create settings from CLI arguments (includes config file and CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let root = cli
            .config
            .parent()
            .and_then(|p| p.to_str())
            .filter(|p| !p.is_empty())
            .unwrap_or(".")
            .to_string();

        let s = Self::builder(File::from(cli.config.clone()).required(false))?;
        let mut settings: Settings = s.try_deserialize()?;
        settings.resolve_paths(&root);

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.finish()
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let config_path = Path::new(root).join("graphql-mock");
        let s = Self::builder(File::from(config_path).required(false))?;
        let mut settings: Settings = s.try_deserialize()?;
        settings.resolve_paths(root);
        settings.finish()
    }

    fn builder(
        file: impl config::Source + Send + Sync + 'static,
    ) -> Result<Config, anyhow::Error> {
        Ok(Config::builder()
            .add_source(file)
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 0)?
            .set_default("schema.path", "schema.graphql")?
            .build()?)
    }

    fn finish(mut self) -> Result<Self, anyhow::Error> {
        let rules_dir = self.mocks.rules_dir.clone();
        self.load_rules_from_dir(&rules_dir)?;

        validator::ConfigValidator::validate(&self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        Ok(self)
    }

    /// Relative paths in the config file are relative to the file's directory.
    fn resolve_paths(&mut self, root: &str) {
        if root == "." {
            return;
        }
        let root = Path::new(root);
        if Path::new(&self.schema.path).is_relative() {
            self.schema.path = root.join(&self.schema.path).to_string_lossy().into_owned();
        }
        if Path::new(&self.mocks.rules_dir).is_relative() {
            self.mocks.rules_dir = root.join(&self.mocks.rules_dir).to_string_lossy().into_owned();
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(schema) = &cli.schema {
            self.schema.path = schema.clone();
        }
        if let Some(seed) = cli.seed {
            self.mocks.seed = Some(seed);
        }
        if let Some(list_length) = cli.list_length {
            self.mocks.list_length = list_length;
        }
    }

    /// Each rule file maps type names to rules. Files are read in sorted
    /// order and later definitions replace earlier ones.
    fn load_rules_from_dir(&mut self, path: &str) -> Result<(), anyhow::Error> {
        let pattern = format!("{}/*", path);
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) => {
                    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                        if matches!(ext, "json" | "yaml" | "yml" | "toml") {
                            let content = std::fs::read_to_string(&path)?;
                            let rules: IndexMap<String, MockRuleConfig> = match ext {
                                "json" => serde_json::from_str(&content)?,
                                "toml" => toml::from_str(&content)?,
                                _ => serde_yaml::from_str(&content)?,
                            };
                            tracing::debug!("Loaded {} mock rules from {}", rules.len(), path.display());
                            self.rules.extend(rules);
                        }
                    }
                }
                Err(e) => tracing::warn!("Failed to read glob entry: {}", e),
            }
        }
        Ok(())
    }

    /// Reads the schema source. A glob pattern concatenates every match in sorted order.
    pub fn read_schema(&self) -> Result<String, anyhow::Error> {
        let path = &self.schema.path;
        if !path.contains(['*', '?', '[']) {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read schema file {}", path));
        }

        let mut files: Vec<_> = glob::glob(path)?.filter_map(Result::ok).collect();
        files.sort();
        if files.is_empty() {
            return Err(anyhow::anyhow!("No schema files match {}", path));
        }
        let mut sdl = String::new();
        for file in files {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read schema file {}", file.display()))?;
            sdl.push_str(&content);
            sdl.push('\n');
        }
        Ok(sdl)
    }
}

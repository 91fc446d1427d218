use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};

/// Top-level weft configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub spark: SparkConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
    #[serde(default)]
    pub workflows: WorkflowsConfig,
}

/// Remote language-model service credentials and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparkConfig {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Model domain used when a node does not name one.
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_uid")]
    pub uid: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_response_timeout")]
    pub response_timeout_secs: u64,
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_url: default_api_url(),
            domain: default_domain(),
            uid: default_uid(),
            connect_timeout_secs: default_connect_timeout(),
            response_timeout_secs: default_response_timeout(),
        }
    }
}

impl SparkConfig {
    /// Whether key material is present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

fn default_api_url() -> String { "wss://spark-api.xf-yun.com/v3.5/chat".to_string() }
fn default_domain() -> String { "generalv3.5".to_string() }
fn default_uid() -> String { "workflow-user".to_string() }
fn default_connect_timeout() -> u64 { 60 }
fn default_response_timeout() -> u64 { 300 }

/// External tool service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    #[serde(default = "default_aitools_url")]
    pub aitools_url: String,
    #[serde(default = "default_plugin_timeout")]
    pub timeout_secs: u64,
    /// Voice speed used when a plugin node does not set one.
    #[serde(default = "default_speed")]
    pub default_speed: i64,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            aitools_url: default_aitools_url(),
            timeout_secs: default_plugin_timeout(),
            default_speed: default_speed(),
        }
    }
}

fn default_aitools_url() -> String { "http://127.0.0.1:18668".to_string() }
fn default_plugin_timeout() -> u64 { 300 }
fn default_speed() -> i64 { 50 }

/// Workflow storage and caller-level run budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowsConfig {
    #[serde(default = "default_workflows_dir")]
    pub dir: String,
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            dir: default_workflows_dir(),
            run_timeout_secs: default_run_timeout(),
        }
    }
}

fn default_workflows_dir() -> String { "./workflows".to_string() }
fn default_run_timeout() -> u64 { 600 }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| WeftError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded)
            .map_err(|e| WeftError::Config(e.to_string()))
    }

    /// Candidate config paths, in lookup order: `./weft.toml`, then
    /// `~/.weft/config.toml`.
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("weft.toml")];
        if let Some(home) = dirs_home() {
            paths.push(home.join(".weft").join("config.toml"));
        }
        paths
    }

    /// Resolve the workflows directory (expand ~).
    pub fn workflows_dir(&self) -> PathBuf {
        let dir = &self.workflows.dir;
        if let Some(rest) = dir.strip_prefix("~/") {
            if let Some(home) = dirs_home() {
                return home.join(rest);
            }
        }
        PathBuf::from(dir)
    }

    /// Copy with key material replaced by a mask, for display.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        copy.spark.api_key = mask(&copy.spark.api_key);
        copy.spark.api_secret = mask(&copy.spark.api_secret);
        copy
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}****")
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

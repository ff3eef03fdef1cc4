use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SymGraphError};

/// Name of the configuration file stored inside the `.symgraph` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory used to store symgraph metadata.
pub const SYMGRAPH_DIR: &str = ".symgraph";

/// Configuration for a symgraph project.
///
/// Controls which files are scanned, how the language server is started,
/// and how reference queries are anchored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymGraphConfig {
    /// Glob patterns for files to include.
    pub include: Vec<String>,
    /// Glob patterns for files to exclude. Exclusion wins over inclusion.
    pub exclude: Vec<String>,
    /// Maximum file size in bytes; larger files are skipped.
    pub max_file_size: u64,
    /// Language server executable.
    pub server_command: String,
    /// Arguments passed to the language server.
    pub server_args: Vec<String>,
    /// Language id announced when opening documents.
    pub language_id: String,
    /// Keywords that may precede a declared identifier on its line.
    pub declaration_keywords: Vec<String>,
    /// Words marking a line as an import; such lines are never queried.
    pub import_markers: Vec<String>,
    /// Output file name, relative to the project root unless absolute.
    pub output: String,
}

impl Default for SymGraphConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.py".to_string()],
            exclude: vec![
                ".git/**".to_string(),
                ".symgraph/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/.venv/**".to_string(),
                "**/venv/**".to_string(),
                "node_modules/**".to_string(),
                "build/**".to_string(),
                "dist/**".to_string(),
            ],
            max_file_size: 1_048_576,
            server_command: "pylsp".to_string(),
            server_args: Vec::new(),
            language_id: "python".to_string(),
            declaration_keywords: vec!["def".to_string(), "class".to_string()],
            import_markers: vec!["import".to_string()],
            output: "symbols.gxl".to_string(),
        }
    }
}

/// Returns the path to the `.symgraph` directory within the given project root.
pub fn get_symgraph_dir(project_root: &Path) -> PathBuf {
    project_root.join(SYMGRAPH_DIR)
}

/// Returns the path to the configuration file within the `.symgraph` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_symgraph_dir(project_root).join(CONFIG_FILENAME)
}

/// Loads the configuration from disk.
///
/// If the configuration file does not exist, returns the default
/// configuration. Fields missing from the file take their defaults.
pub fn load_config(project_root: &Path) -> Result<SymGraphConfig> {
    let config_path = get_config_path(project_root);

    if !config_path.exists() {
        return Ok(SymGraphConfig::default());
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| SymGraphError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    let config: SymGraphConfig =
        serde_json::from_str(&contents).map_err(|e| SymGraphError::Config {
            message: format!(
                "failed to parse config file '{}': {}",
                config_path.display(),
                e
            ),
        })?;

    Ok(config)
}

/// Saves the configuration to disk using an atomic write.
pub fn save_config(project_root: &Path, config: &SymGraphConfig) -> Result<()> {
    let symgraph_dir = get_symgraph_dir(project_root);
    fs::create_dir_all(&symgraph_dir).map_err(|e| SymGraphError::Config {
        message: format!(
            "failed to create symgraph directory '{}': {}",
            symgraph_dir.display(),
            e
        ),
    })?;

    let json = serde_json::to_string_pretty(config).map_err(|e| SymGraphError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    write_atomic(&get_config_path(project_root), json.as_bytes()).map_err(|e| {
        SymGraphError::Config {
            message: e.to_string(),
        }
    })
}

/// Writes `contents` to a sibling temporary file and renames it into place,
/// so a partial write never leaves a truncated file behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");

    fs::write(&tmp_path, contents).map_err(|e| SymGraphError::File {
        message: format!("failed to write temporary file: {}", e),
        path: tmp_path.display().to_string(),
    })?;

    fs::rename(&tmp_path, path).map_err(|e| SymGraphError::File {
        message: format!(
            "failed to rename temporary file '{}': {}",
            tmp_path.display(),
            e
        ),
        path: path.display().to_string(),
    })?;

    Ok(())
}

/// Compiled include/exclude patterns.
///
/// Used both for discovery and to reject references pointing into files the
/// configuration excludes.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileFilter {
    /// Compiles the patterns of a configuration.
    ///
    /// Invalid patterns are a configuration error rather than silently
    /// matching nothing.
    pub fn from_config(config: &SymGraphConfig) -> Result<Self> {
        Ok(Self {
            include: compile_patterns(&config.include)?,
            exclude: compile_patterns(&config.exclude)?,
        })
    }

    /// Returns `true` if the file matches an exclude pattern.
    pub fn is_excluded(&self, file_path: &str) -> bool {
        self.exclude
            .iter()
            .any(|p| p.matches_with(file_path, match_options()))
    }

    /// Returns `true` if the file matches an include pattern and no exclude pattern.
    pub fn is_included(&self, file_path: &str) -> bool {
        !self.is_excluded(file_path)
            && self
                .include
                .iter()
                .any(|p| p.matches_with(file_path, match_options()))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| SymGraphError::Config {
                message: format!("invalid glob pattern '{}': {}", p, e),
            })
        })
        .collect()
}

fn match_options() -> glob::MatchOptions {
    glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    }
}

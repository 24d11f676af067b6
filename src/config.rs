use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::format::CellFormat;
use crate::table_session::{TableSession, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZES};
use crate::upload_gate::{UploadGate, DEFAULT_MAX_FILE_SIZE_MB};

/// Largest page size accepted in `[table] page_sizes`.
pub const MAX_PAGE_SIZE: usize = 100;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string with comments
    /// All fields are commented out so defaults are used, but users can uncomment to override
    pub fn generate_default_config(&self) -> Result<String> {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;

        let comments = Self::collect_all_comments();
        Ok(Self::comment_all_fields(toml_str, comments))
    }

    /// Collect all field comments from struct constants into a map
    fn collect_all_comments() -> HashMap<String, String> {
        let mut comments = HashMap::new();

        for (field, comment) in APP_COMMENTS {
            comments.insert(field.to_string(), comment.to_string());
        }
        let sections: [(&str, &[(&str, &str)]); 5] = [
            ("store", STORE_COMMENTS),
            ("upload", UPLOAD_COMMENTS),
            ("table", TABLE_COMMENTS),
            ("display", DISPLAY_COMMENTS),
            ("debug", DEBUG_COMMENTS),
        ];
        for (section, fields) in sections {
            for (field, comment) in fields {
                comments.insert(format!("{}.{}", section, field), comment.to_string());
            }
        }

        comments
    }

    /// Comment out all fields in TOML and add comments
    /// Also adds missing Option fields as commented-out entries
    fn comment_all_fields(toml: String, comments: HashMap<String, String>) -> String {
        let mut result = String::new();
        result.push_str("# csvdeck configuration file\n");
        result
            .push_str("# This file uses TOML format. See https://toml.io/ for syntax reference.\n");
        result.push('\n');

        let mut current_section = String::new();
        let mut seen_fields: HashSet<String> = HashSet::new();

        for line in toml.lines() {
            if let Some(section) = Self::extract_section_name(line) {
                current_section = section.clone();

                if let Some(header) = SECTION_HEADERS.iter().find(|(s, _)| *s == section) {
                    result.push_str(header.1);
                    result.push('\n');
                }

                result.push_str("# ");
                result.push_str(line);
                result.push('\n');
                continue;
            }

            if let Some(field_path) = Self::extract_field_path_simple(line, &current_section) {
                if let Some(comment) = comments.get(&field_path) {
                    for comment_line in comment.lines() {
                        result.push_str("# ");
                        result.push_str(comment_line);
                        result.push('\n');
                    }
                }
                seen_fields.insert(field_path);

                result.push_str("# ");
                result.push_str(line);
                result.push('\n');
            } else if line.trim().is_empty() {
                result.push('\n');
            } else {
                // continuation of a multi-line array
                result.push_str("# ");
                result.push_str(line);
                result.push('\n');
            }
        }

        Self::add_missing_option_fields(result, &comments, &seen_fields)
    }

    /// Add Option fields that were not serialized because they are None
    fn add_missing_option_fields(
        mut result: String,
        comments: &HashMap<String, String>,
        seen_fields: &HashSet<String>,
    ) -> String {
        for (field_path, example) in OPTION_FIELDS {
            if seen_fields.contains(*field_path) {
                continue;
            }
            let Some((section, field)) = field_path.split_once('.') else {
                continue;
            };
            let section_header = format!("# [{}]\n", section);
            let Some(section_pos) = result.find(&section_header) else {
                continue;
            };
            let insert_pos = section_pos + section_header.len();

            let mut new_content = String::new();
            if let Some(comment) = comments.get(*field_path) {
                for comment_line in comment.lines() {
                    new_content.push_str("# ");
                    new_content.push_str(comment_line);
                    new_content.push('\n');
                }
            }
            new_content.push_str(&format!("# {} = {}\n", field, example));
            result.insert_str(insert_pos, &new_content);
        }
        result
    }

    /// Extract section name from TOML line like "[table]"
    fn extract_section_name(line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            Some(trimmed[1..trimmed.len() - 1].to_string())
        } else {
            None
        }
    }

    /// Extract field path from a line
    fn extract_field_path_simple(line: &str, current_section: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('[') {
            return None;
        }

        let eq_pos = trimmed.find('=')?;
        let field_name = trimmed[..eq_pos].trim();
        if current_section.is_empty() {
            Some(field_name.to_string())
        } else {
            Some(format!("{}.{}", current_section, field_name))
        }
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;

        let template = self.generate_default_config()?;
        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}

const APP_COMMENTS: &[(&str, &str)] = &[(
    "version",
    "Configuration format version (for future compatibility)",
)];

const SECTION_HEADERS: &[(&str, &str)] = &[
    (
        "store",
        "# ============================================================================\n# Data Store\n# ============================================================================",
    ),
    (
        "upload",
        "# ============================================================================\n# Upload Admission\n# ============================================================================\n# Checked before a file is handed to the store.",
    ),
    (
        "table",
        "# ============================================================================\n# Table Paging\n# ============================================================================",
    ),
    (
        "display",
        "# ============================================================================\n# Display\n# ============================================================================",
    ),
    (
        "debug",
        "# ============================================================================\n# Debug\n# ============================================================================",
    ),
];

const STORE_COMMENTS: &[(&str, &str)] = &[(
    "data_dir",
    "Directory holding uploaded files and their catalog\nDefault: <user data dir>/csvdeck. Overridden by --data-dir",
)];

const UPLOAD_COMMENTS: &[(&str, &str)] = &[
    ("max_file_size_mb", "Largest accepted upload, in megabytes"),
    (
        "allowed_extensions",
        "Accepted file extensions (case-insensitive)\nAdd \".xlsx\" or \".xls\" to accept spreadsheets (first worksheet is imported)",
    ),
];

const TABLE_COMMENTS: &[(&str, &str)] = &[
    (
        "page_sizes",
        "Page sizes offered by the table (each between 1 and 100)",
    ),
    (
        "default_page_size",
        "Page size used when a file is opened; must be one of page_sizes",
    ),
];

const DISPLAY_COMMENTS: &[(&str, &str)] = &[
    ("row_numbers", "Show row numbers in the table"),
    (
        "thousands_separator",
        "Group digits of numeric cells with commas (12,345)",
    ),
    (
        "float_precision",
        "Digits after the decimal point for float cells",
    ),
];

const DEBUG_COMMENTS: &[(&str, &str)] = &[
    (
        "enabled",
        "Enable tracing output (same as --debug)\nCommands log to stderr; browse logs to the cache directory",
    ),
    (
        "log_filter",
        "Tracing filter directive, e.g. \"info\" or \"csvdeck=debug\"\nRUST_LOG takes precedence when set",
    ),
];

/// Option fields written as commented examples when unset
const OPTION_FIELDS: &[(&str, &str)] = &[("store.data_dir", "\"/path/to/data\"")];

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub store: StoreConfig,
    pub upload: UploadConfig,
    pub table: TableConfig,
    pub display: DisplayConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_file_size_mb: u64,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub page_sizes: Vec<usize>,
    pub default_page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub row_numbers: bool,
    pub thousands_separator: bool,
    pub float_precision: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            store: StoreConfig::default(),
            upload: UploadConfig::default(),
            table: TableConfig::default(),
            display: DisplayConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            allowed_extensions: vec![".csv".to_string()],
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_sizes: DEFAULT_PAGE_SIZES.to_vec(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            row_numbers: false,
            thousands_separator: true,
            float_precision: 2,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_filter: "info".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let manager = ConfigManager::new(app_name)?;
        Self::load_from(&manager)
    }

    /// Load defaults merged with `config.toml` from the manager's directory
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        let config_path = manager.config_path("config.toml");

        if let Some(user_config) = Self::load_user_config(&config_path)? {
            config.merge(user_config);
        }

        // Report config file path on error
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_path.display(), e))?;

        Ok(config)
    }

    fn load_user_config(config_path: &Path) -> Result<Option<AppConfig>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map(Some).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.store.merge(other.store);
        self.upload.merge(other.upload);
        self.table.merge(other.table);
        self.display.merge(other.display);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.upload.max_file_size_mb == 0 {
            return Err(eyre!("max_file_size_mb must be greater than 0"));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(eyre!("allowed_extensions must not be empty"));
        }
        if let Some(ext) = self
            .upload
            .allowed_extensions
            .iter()
            .find(|e| e.trim().trim_start_matches('.').is_empty())
        {
            return Err(eyre!("Invalid extension in allowed_extensions: {:?}", ext));
        }

        if self.table.page_sizes.is_empty() {
            return Err(eyre!("page_sizes must not be empty"));
        }
        if let Some(size) = self
            .table
            .page_sizes
            .iter()
            .find(|s| !(1..=MAX_PAGE_SIZE).contains(*s))
        {
            return Err(eyre!(
                "Invalid page size {}. Page sizes must be between 1 and {}",
                size,
                MAX_PAGE_SIZE
            ));
        }
        if !self.table.page_sizes.contains(&self.table.default_page_size) {
            return Err(eyre!(
                "default_page_size {} is not one of page_sizes {:?}",
                self.table.default_page_size,
                self.table.page_sizes
            ));
        }

        if self.display.float_precision > 10 {
            return Err(eyre!("float_precision must be at most 10"));
        }

        tracing_subscriber::EnvFilter::try_new(&self.debug.log_filter)
            .map_err(|e| eyre!("Invalid log_filter {:?}: {}", self.debug.log_filter, e))?;

        Ok(())
    }

    /// Data directory from config, falling back to `<user data dir>/<app_name>`
    pub fn data_dir(&self, app_name: &str) -> Result<PathBuf> {
        if let Some(dir) = &self.store.data_dir {
            return Ok(dir.clone());
        }
        Ok(dirs::data_dir()
            .ok_or_else(|| eyre!("Could not determine data directory"))?
            .join(app_name))
    }

    pub fn upload_gate(&self) -> UploadGate {
        UploadGate::new(
            self.upload.allowed_extensions.clone(),
            self.upload.max_file_size_mb.saturating_mul(1024 * 1024),
        )
    }

    pub fn table_session(&self) -> Result<TableSession> {
        Ok(TableSession::new(
            self.table.page_sizes.clone(),
            self.table.default_page_size,
        )?)
    }

    pub fn cell_format(&self) -> CellFormat {
        CellFormat {
            thousands_separator: self.display.thousands_separator,
            float_precision: self.display.float_precision,
        }
    }
}

// Merge implementations for each config section
impl StoreConfig {
    pub fn merge(&mut self, other: Self) {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
    }
}

impl UploadConfig {
    pub fn merge(&mut self, other: Self) {
        let default = UploadConfig::default();
        if other.max_file_size_mb != default.max_file_size_mb {
            self.max_file_size_mb = other.max_file_size_mb;
        }
        if other.allowed_extensions != default.allowed_extensions {
            self.allowed_extensions = other.allowed_extensions;
        }
    }
}

impl TableConfig {
    pub fn merge(&mut self, other: Self) {
        let default = TableConfig::default();
        if other.page_sizes != default.page_sizes {
            self.page_sizes = other.page_sizes;
        }
        if other.default_page_size != default.default_page_size {
            self.default_page_size = other.default_page_size;
        }
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.row_numbers != default.row_numbers {
            self.row_numbers = other.row_numbers;
        }
        if other.thousands_separator != default.thousands_separator {
            self.thousands_separator = other.thousands_separator;
        }
        if other.float_precision != default.float_precision {
            self.float_precision = other.float_precision;
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.log_filter != default.log_filter {
            self.log_filter = other.log_filter;
        }
    }
}

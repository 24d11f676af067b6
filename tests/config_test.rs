use csvdeck::config::{AppConfig, ConfigManager};
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

fn write_config(manager: &ConfigManager, content: &str) {
    manager.ensure_config_dir().unwrap();
    fs::write(manager.config_path("config.toml"), content).unwrap();
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");
    assert_eq!(config.store.data_dir, None);

    assert_eq!(config.upload.max_file_size_mb, 50);
    assert_eq!(config.upload.allowed_extensions, vec![".csv"]);

    assert_eq!(config.table.page_sizes, vec![5, 10, 20, 50]);
    assert_eq!(config.table.default_page_size, 10);

    assert!(!config.display.row_numbers);
    assert!(config.display.thousands_separator);
    assert_eq!(config.display.float_precision, 2);

    assert!(!config.debug.enabled);
    assert_eq!(config.debug.log_filter, "info");

    assert!(config.validate().is_ok());
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config().unwrap();

    assert!(template.contains("[upload]"));
    assert!(template.contains("[table]"));
    assert!(template.contains("[display]"));
    assert!(template.contains("[debug]"));
    assert!(template.contains("version = \"0.1\""));
    // unset option fields still appear as examples
    assert!(template.contains("data_dir"));

    // every non-blank line is a comment, so the file changes nothing until edited
    for line in template.lines().filter(|l| !l.trim().is_empty()) {
        assert!(line.trim_start().starts_with('#'), "uncommented line: {line}");
    }
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");
    assert!(config_path.exists());

    // second write without force fails, with force succeeds
    assert!(config_manager.write_default_config(false).is_err());
    assert!(config_manager.write_default_config(true).is_ok());

    // the generated file loads back as the defaults
    let loaded = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(loaded, AppConfig::default());
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let loaded = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(loaded, AppConfig::default());
}

#[test]
fn test_partial_config_merges_over_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(
        &config_manager,
        r#"
[upload]
allowed_extensions = [".csv", ".xlsx"]

[table]
page_sizes = [25, 50, 100]
default_page_size = 25

[display]
row_numbers = true
"#,
    );

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.upload.allowed_extensions, vec![".csv", ".xlsx"]);
    assert_eq!(config.upload.max_file_size_mb, 50);
    assert_eq!(config.table.page_sizes, vec![25, 50, 100]);
    assert_eq!(config.table.default_page_size, 25);
    assert!(config.display.row_numbers);
    assert_eq!(config.display.float_precision, 2);

    let session = config.table_session().unwrap();
    assert_eq!(session.page_size(), 25);
    assert!(config.upload_gate().admit("book.XLSX", 1).is_ok());
}

#[test]
fn test_default_page_size_must_be_offered() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(
        &config_manager,
        r#"
[table]
page_sizes = [5, 10]
default_page_size = 20
"#,
    );

    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Invalid configuration in"));
}

#[test]
fn test_invalid_values_are_rejected() {
    let mut config = AppConfig::default();
    config.table.page_sizes = vec![10, 500];
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.upload.max_file_size_mb = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.upload.allowed_extensions = vec![];
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.version = "9.0".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.debug.log_filter = "csvdeck=notalevel".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_malformed_toml_names_the_file() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(&config_manager, "[table\npage_sizes = ");

    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_cell_format_follows_display_section() {
    let mut config = AppConfig::default();
    config.display.thousands_separator = false;
    config.display.float_precision = 4;
    let format = config.cell_format();
    assert!(!format.thousands_separator);
    assert_eq!(format.float_precision, 4);
}

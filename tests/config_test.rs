use symgraph::config::*;
use symgraph::errors::SymGraphError;
use tempfile::TempDir;

#[test]
fn test_default_config_targets_python() {
    let config = SymGraphConfig::default();
    assert!(config.include.iter().any(|p| p == "**/*.py"));
    assert!(config.exclude.iter().any(|p| p == "**/__pycache__/**"));
    assert_eq!(config.server_command, "pylsp");
    assert_eq!(config.declaration_keywords, vec!["def", "class"]);
}

#[test]
fn test_save_and_load_config() {
    let dir = TempDir::new().unwrap();
    let config = SymGraphConfig {
        server_command: "pyright-langserver".to_string(),
        server_args: vec!["--stdio".to_string()],
        ..SymGraphConfig::default()
    };
    save_config(dir.path(), &config).unwrap();
    assert!(get_config_path(dir.path()).exists());
    assert!(!get_config_path(dir.path()).with_extension("tmp").exists());

    let loaded = load_config(dir.path()).unwrap();
    assert_eq!(config, loaded);
}

#[test]
fn test_missing_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_config(dir.path()).unwrap();
    assert_eq!(config, SymGraphConfig::default());
    assert_eq!(config.output, "symbols.gxl");
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(get_symgraph_dir(dir.path())).unwrap();
    std::fs::write(
        get_config_path(dir.path()),
        r#"{ "language_id": "cython", "import_markers": ["import", "cimport"] }"#,
    )
    .unwrap();

    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.language_id, "cython");
    assert_eq!(config.import_markers, vec!["import", "cimport"]);
    assert_eq!(config.max_file_size, 1_048_576);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(get_symgraph_dir(dir.path())).unwrap();
    std::fs::write(
        get_config_path(dir.path()),
        r#"{ "version": 1, "root_dir": "/elsewhere", "output": "graph.gxl" }"#,
    )
    .unwrap();
    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.output, "graph.gxl");
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(get_symgraph_dir(dir.path())).unwrap();
    std::fs::write(get_config_path(dir.path()), "{ not json").unwrap();
    let err = load_config(dir.path()).unwrap_err();
    assert!(matches!(err, SymGraphError::Config { .. }));
}

#[test]
fn test_symgraph_dir_location() {
    let dir = TempDir::new().unwrap();
    assert!(get_symgraph_dir(dir.path()).ends_with(".symgraph"));
    assert!(get_config_path(dir.path()).ends_with(".symgraph/config.json"));
}

#[test]
fn test_file_filter_include_and_exclude() {
    let filter = FileFilter::from_config(&SymGraphConfig::default()).unwrap();
    assert!(filter.is_included("main.py"));
    assert!(filter.is_included("pkg/sub/mod.py"));
    assert!(!filter.is_included("README.md"));
    assert!(!filter.is_included("build/gen.py"));
    assert!(!filter.is_included("pkg/__pycache__/mod.py"));
    assert!(filter.is_excluded("build/gen.py"));
    assert!(!filter.is_excluded("pkg/mod.py"));
}

#[test]
fn test_invalid_pattern_is_rejected() {
    let config = SymGraphConfig {
        include: vec!["[".to_string()],
        ..SymGraphConfig::default()
    };
    let err = FileFilter::from_config(&config).unwrap_err();
    assert!(matches!(err, SymGraphError::Config { .. }));
}

#[test]
fn test_empty_filter_includes_nothing() {
    let filter = FileFilter::default();
    assert!(!filter.is_included("a.py"));
    assert!(!filter.is_excluded("a.py"));
}

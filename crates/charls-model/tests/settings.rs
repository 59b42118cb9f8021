//! Integration tests for loading `charls.toml`.

use std::fs;

use charls_model::{ConfigError, DEFAULT_CONFIG_FILENAME, Settings};

#[test]
fn loads_partial_file_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
    fs::write(
        &path,
        r#"
[vocabulary]
ordinal = ["srh", "edu"]

[vocabulary.ordinal_levels]
srh = ["very poor", "poor", "fair", "good", "very good"]

[targets]
preference = ["cesd10"]

[mcmc]
seed = 2024
workers = 4
"#,
    )
    .unwrap();

    let settings = Settings::resolve(Some(&path)).unwrap();

    assert_eq!(settings.vocabulary.ordinal, vec!["srh", "edu"]);
    assert_eq!(settings.vocabulary.ordinal_levels["srh"].len(), 5);
    assert_eq!(settings.targets.preference, vec!["cesd10"]);
    assert_eq!(settings.mcmc.seed, Some(2024));
    assert_eq!(settings.mcmc.workers, Some(4));
    assert_eq!(settings.mcmc.chains, 3);
    assert_eq!(settings.columns.wave, "wave");
}

#[test]
fn written_defaults_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
    fs::write(&path, Settings::default().to_toml_string().unwrap()).unwrap();

    assert_eq!(Settings::load(&path).unwrap(), Settings::default());
}

#[test]
fn malformed_file_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
    fs::write(&path, "[mcmc\nchains = ").unwrap();

    assert!(matches!(Settings::load(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
    fs::write(&path, "[mcmc]\ndraws = 0\n").unwrap();

    assert!(matches!(
        Settings::load(&path),
        Err(ConfigError::InvalidMcmc { field: "draws", .. })
    ));
}

#[test]
fn missing_file_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Settings::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

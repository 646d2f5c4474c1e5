use kiji_config::{KijiConfigLoader, OutputFormat};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
version: "1"
logging:
  format: json
  stderr: false
pipeline:
  similarity_threshold: 85
  preserve_line_breaks: true
jobs:
  - name: "2022"
    inputs: ["${KIJI_TEST_ROOT}/2022"]
    output: "out/2022.csv"
  - name: "2023"
    inputs: ["data/2023/a.warc", "data/2023/b.warc.gz"]
    output: "out/2023"
    format: text
"#;

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "kiji.yaml", FILE_YAML);

    let config = temp_env::with_var("KIJI_TEST_ROOT", Some("/srv/warc"), || {
        KijiConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config")
    });

    assert_eq!(config.pipeline.similarity_threshold, 85);
    assert!(config.pipeline.preserve_line_breaks);
    assert!(!config.logging.stderr);
    assert_eq!(config.jobs.len(), 2);
    assert_eq!(config.jobs[0].inputs, vec![PathBuf::from("/srv/warc/2022")]);
    assert_eq!(config.jobs[0].format, OutputFormat::Csv);
    assert_eq!(config.jobs[1].format, OutputFormat::Text);
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "kiji.yaml", FILE_YAML);

    let config = temp_env::with_var(
        "KIJI__PIPELINE__SIMILARITY_THRESHOLD",
        Some("95"),
        || KijiConfigLoader::new().with_file(&p).load().expect("load config"),
    );

    assert_eq!(config.pipeline.similarity_threshold, 95);
}

#[test]
#[serial]
fn missing_optional_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = KijiConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");

    assert!(config.jobs.is_empty());
    assert_eq!(config.pipeline.similarity_threshold, 90);
    assert!(config.pipeline.rules.is_none());
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = KijiConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

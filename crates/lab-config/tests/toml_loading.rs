//! Integration tests for TOML configuration loading.
//!
//! Uses `figment::Jail` for sandboxed working directory and env manipulation.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use lab_config::{ConfigError, LOCAL_CONFIG_PATH, LabConfig};
use lab_core::sections::SectionKey;
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn loads_all_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[catalog]
max_code_len = 12
allow_inactive_children = true

[sections]
unsectioned_label = "Otros"

[sections.titles]
hemo = "Hemograma completo"
bio = "Química sanguínea"

[general]
default_format = "raw"
"#,
        )?;

        let config: LabConfig = Figment::from(Serialized::defaults(LabConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.catalog.max_code_len, 12);
        assert!(config.catalog.allow_inactive_children);
        assert_eq!(config.general.default_format, "raw");

        let titles = config.sections.titles();
        assert_eq!(titles.title_for(&SectionKey::Unsectioned), "Otros");
        assert_eq!(
            titles.title_for(&SectionKey::Named("hemo".into())),
            "Hemograma completo"
        );
        Ok(())
    });
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r"
[catalog]
max_code_len = 8
",
        )?;

        let config: LabConfig = Figment::from(Serialized::defaults(LabConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.catalog.max_code_len, 8);
        assert!(!config.catalog.allow_inactive_children);
        assert_eq!(config.sections.unsectioned_label, "General");
        assert!(config.sections.titles.is_empty());
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        std::fs::create_dir(".labx").map_err(|e| e.to_string())?;
        jail.create_file(
            LOCAL_CONFIG_PATH,
            r#"
[sections]
unsectioned_label = "Sin sección"
"#,
        )?;

        let config = LabConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.sections.unsectioned_label, "Sin sección");
        Ok(())
    });
}

#[test]
fn explicit_file_is_layered_over_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[general]\ndefault_format = \"raw\"").expect("write");

    let config = LabConfig::load_from(file.path()).expect("config loads");
    assert_eq!(config.general.default_format, "raw");
    assert_eq!(config.catalog.max_code_len, 20);
}

#[test]
fn out_of_bounds_values_fail_validation() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[general]
default_format = "table"
"#,
        )?;

        let figment = Figment::from(Serialized::defaults(LabConfig::default()))
            .merge(Toml::file("config.toml"));
        let err = LabConfig::from_figment(&figment).expect_err("should reject");
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "general.default_format"
        ));
        Ok(())
    });
}

//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global: REPLACE
//! - Global → Local: UNION with negation support
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Global config is passed explicitly so the user's real XDG config never
//! leaks into the tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use symtree::config::{local_config_path, Settings, LOCAL_CONFIG_FILE};
use symtree::domain::VisibilityFilter;

fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn given_no_config_files_when_load_then_uses_defaults() {
    let project = TempDir::new().unwrap();

    let settings = Settings::load_from(None, Some(project.path())).expect("load settings");

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_local_config_with_exclude_when_load_then_unions_with_global() {
    let global_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let global = write_config(
        global_dir.path(),
        "symtree.toml",
        r#"exclude = ["pkg/tests"]"#,
    );
    write_config(
        project.path(),
        LOCAL_CONFIG_FILE,
        r#"exclude = ["pkg/_vendor"]"#,
    );

    let settings = Settings::load_from(Some(&global), Some(project.path())).expect("load");

    assert_eq!(
        settings.exclude,
        vec![PathBuf::from("pkg/_vendor"), PathBuf::from("pkg/tests")]
    );
}

#[test]
fn given_local_config_with_negation_when_load_then_removes_inherited_entry() {
    let global_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let global = write_config(
        global_dir.path(),
        "symtree.toml",
        r#"exclude = ["pkg/tests", "pkg/docs"]"#,
    );
    write_config(
        project.path(),
        LOCAL_CONFIG_FILE,
        r#"exclude = ["!pkg/tests"]"#,
    );

    let settings = Settings::load_from(Some(&global), Some(project.path())).expect("load");

    assert_eq!(settings.exclude, vec![PathBuf::from("pkg/docs")]);
}

#[test]
fn given_local_scalars_when_load_then_override_global() {
    let global_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let global = write_config(
        global_dir.path(),
        "symtree.toml",
        r#"
visibility = "all"
skip_undoc = true
"#,
    );
    write_config(project.path(), LOCAL_CONFIG_FILE, r#"visibility = "private""#);

    let settings = Settings::load_from(Some(&global), Some(project.path())).expect("load");

    assert_eq!(settings.visibility, VisibilityFilter::Private);
    assert!(settings.skip_undoc, "unset local scalar inherits global");
}

#[test]
fn given_invalid_toml_when_load_then_returns_config_error() {
    let project = TempDir::new().unwrap();
    write_config(project.path(), LOCAL_CONFIG_FILE, "visibility = [");

    let err = Settings::load_from(None, Some(project.path())).unwrap_err();

    assert!(err.to_string().contains("config error"), "got: {err}");
}

#[test]
fn given_unknown_visibility_when_load_then_fails() {
    let project = TempDir::new().unwrap();
    write_config(project.path(), LOCAL_CONFIG_FILE, r#"visibility = "hidden""#);

    assert!(Settings::load_from(None, Some(project.path())).is_err());
}

#[test]
fn given_template_when_parsed_then_is_valid_toml() {
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), Settings::template()).unwrap();

    let settings = Settings::load_from(None, Some(project.path())).expect("template loads");

    assert_eq!(settings, Settings::default());
}

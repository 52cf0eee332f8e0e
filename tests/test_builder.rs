use std::fs;
use std::path::Path;

use feature_config::{Builder, Diagnostic, ResolveError, Severity, SourceError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const NO_FEATURES: &[&str] = &[];

fn write(root: &Path, relative: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_add_directory_missing() {
    let mut builder = Builder::new();
    let result = builder.add_directory("/nonexistent/path/configs");
    assert!(matches!(result, Err(SourceError::DirectoryNotFound(_))));
}

#[test]
fn test_add_directory_on_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "myConfig.json", "{}");

    let mut builder = Builder::new();
    let result = builder.add_directory(dir.path().join("myConfig.json"));
    assert!(matches!(result, Err(SourceError::NotADirectory(_))));
}

#[test]
fn test_failed_add_directory_leaves_builder_usable() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "myConfig.json", r#"{"x": 1}"#);

    let mut builder = Builder::new();
    assert!(builder.add_directory(dir.path().join("missing")).is_err());
    builder.add_directory(dir.path()).unwrap();
    let provider = builder.build().unwrap();
    assert_eq!(provider.keys(), vec!["myConfig"]);
}

#[test]
fn test_multiple_roots_accumulate() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write(first.path(), "server.json", r#"{"port": 80}"#);
    write(first.path(), "canary/server.json", r#"{"port": 81}"#);
    write(second.path(), "cache.yaml", "ttl: 60\n");
    write(second.path(), "experiments/short_ttl/cache.yaml", "ttl: 5\n");

    let mut builder = Builder::new();
    builder
        .add_directory(first.path())
        .unwrap()
        .add_directory(second.path())
        .unwrap();
    let provider = builder.build().unwrap();

    assert_eq!(provider.keys(), vec!["cache", "server"]);
    assert_eq!(provider.features(), vec!["canary", "experiments/short_ttl"]);
    assert_eq!(
        provider.get_options_json("cache", &["experiments/short_ttl"]).unwrap(),
        r#"{"ttl":5}"#
    );

    // Features belong to the root that defines them.
    let err = provider.get_options_json("cache", &["canary"]).unwrap_err();
    assert!(matches!(err, ResolveError::UnknownFeature { .. }));
}

#[test]
fn test_identical_key_in_two_roots_is_allowed() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write(first.path(), "shared.json", r#"{"a": 1}"#);
    write(second.path(), "shared.toml", "a = 1\n");
    write(second.path(), "beta/shared.toml", "a = 2\n");

    let mut builder = Builder::new();
    builder.add_directory(first.path()).unwrap();
    builder.add_directory(second.path()).unwrap();
    let provider = builder.build().unwrap();

    assert_eq!(
        provider.get_options_json("shared", &["beta"]).unwrap(),
        r#"{"a":2}"#
    );
}

#[test]
fn test_conflicting_key_in_two_roots_fails_build() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write(first.path(), "shared.json", r#"{"a": 1}"#);
    write(second.path(), "shared.json", r#"{"a": 2}"#);

    let mut builder = Builder::new();
    builder.add_directory(first.path()).unwrap();
    builder.add_directory(second.path()).unwrap();
    let err = builder.build().unwrap_err();

    match err.diagnostics() {
        [Diagnostic::ConflictingBase { key, .. }] => assert_eq!(key, "shared"),
        other => panic!("unexpected diagnostics: {other:?}"),
    }
}

#[test]
fn test_build_reports_every_parse_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.json", "// comments are not JSON\n{}");
    write(dir.path(), "b.json5", "// fine in JSON5\n{ ok: true }");
    write(dir.path(), "feature/c.yaml", "key: [unclosed\n");
    write(dir.path(), "d.json", b"{\"x\": \"\xFF\xFE\"}".as_slice());

    let mut builder = Builder::new();
    builder.add_directory(dir.path()).unwrap();
    assert_eq!(builder.diagnostics().len(), 3);

    let err = builder.build().unwrap_err();
    assert_eq!(err.diagnostics().len(), 3);
    assert!(err
        .diagnostics()
        .iter()
        .all(|d| matches!(d, Diagnostic::Parse(_)) && d.severity() == Severity::Error));
    assert!(err.to_string().contains("3 error(s)"), "{err}");
}

#[test]
fn test_overlay_with_wrong_shape_fails_build() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "myConfig.json", r#"{"servers": ["a", "b"]}"#);
    write(dir.path(), "feature/myConfig.json", r#"{"servers": {"a": true}}"#);

    let mut builder = Builder::new();
    builder.add_directory(dir.path()).unwrap();
    let err = builder.build().unwrap_err();

    match err.diagnostics() {
        [Diagnostic::OverlayTypeConflict { key, feature, at, .. }] => {
            assert_eq!(key, "myConfig");
            assert_eq!(feature, "feature");
            assert_eq!(at.to_string(), "servers");
        }
        other => panic!("unexpected diagnostics: {other:?}"),
    }
}

#[test]
fn test_hidden_and_unsupported_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "myConfig.json", r#"{"x": 1}"#);
    write(dir.path(), "README.md", "# docs");
    write(dir.path(), "notes.txt", "not a config");
    write(dir.path(), ".hidden/myConfig.json", "not even json");
    write(dir.path(), ".myConfig.json", "not even json");

    let mut builder = Builder::new();
    builder.add_directory(dir.path()).unwrap();
    assert!(builder.diagnostics().is_empty());

    let provider = builder.build().unwrap();
    assert_eq!(provider.keys(), vec!["myConfig"]);
    assert!(provider.features().is_empty());
}

#[test]
fn test_max_depth_limits_feature_nesting() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "myConfig.json", r#"{"x": 1}"#);
    write(dir.path(), "a/myConfig.json", r#"{"x": 2}"#);
    write(dir.path(), "a/b/myConfig.json", r#"{"x": 3}"#);

    let mut builder = Builder::new();
    builder.max_depth(Some(1)).add_directory(dir.path()).unwrap();
    let provider = builder.build().unwrap();
    assert_eq!(provider.features(), vec!["a"]);
}

#[test]
fn test_scan_settings_can_change_between_roots() {
    let shallow = TempDir::new().unwrap();
    write(shallow.path(), "first.json", r#"{"x": 1}"#);
    write(shallow.path(), "a/first.json", r#"{"x": 2}"#);
    write(shallow.path(), "a/b/first.json", r#"{"x": 3}"#);
    let deep = TempDir::new().unwrap();
    write(deep.path(), "second.json", r#"{"y": 1}"#);
    write(deep.path(), "c/d/second.json", r#"{"y": 2}"#);

    let mut builder = Builder::new();
    builder.max_depth(Some(1)).add_directory(shallow.path()).unwrap();
    builder.max_depth(None).add_directory(deep.path()).unwrap();
    let provider = builder.build().unwrap();

    assert_eq!(provider.features(), vec!["a", "c/d"]);
    assert_eq!(
        provider.get_options_json("second", &["c/d"]).unwrap(),
        r#"{"y":2}"#
    );
}

#[test]
fn test_overlay_without_base_uses_empty_mapping() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "flags/experimental.json", r#"{"enabled": true}"#);

    let mut builder = Builder::new();
    builder.add_directory(dir.path()).unwrap();
    let provider = builder.build().unwrap();

    assert_eq!(
        provider.get_options_json("experimental", NO_FEATURES).unwrap(),
        "{}"
    );
    assert_eq!(
        provider.get_options_json("experimental", &["flags"]).unwrap(),
        r#"{"enabled":true}"#
    );
}

#[test]
fn test_imports_expand_in_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "service.yaml", "timeout: 30\nretries: 1\nhosts: [local]\n");
    write(dir.path(), "retries/service.yaml", "retries: 5\n");
    write(dir.path(), "remote/service.yaml", "hosts: [a.example, b.example]\ntimeout: 10\n");
    write(dir.path(), "production/service.yaml", "timeout: 60\n");
    write(
        dir.path(),
        "production/_metadata.toml",
        "# applied before production's own overlay\nimports = [\"remote\", \"retries\"]\naliases = [\"prod\"]\n",
    );

    let mut builder = Builder::new();
    builder.add_directory(dir.path()).unwrap();
    let provider = builder.build().unwrap();

    assert_eq!(provider.features(), vec!["production", "remote", "retries"]);
    assert_eq!(
        provider.get_options_json("service", &["prod"]).unwrap(),
        r#"{"hosts":["a.example","b.example"],"retries":5,"timeout":60}"#
    );
    assert_eq!(
        provider.get_options_json("service", &["production", "remote"]).unwrap(),
        r#"{"hosts":["a.example","b.example"],"retries":5,"timeout":10}"#
    );
}

#[test]
fn test_import_cycle_fails_build() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "service.json", r#"{"x": 0}"#);
    write(dir.path(), "a/service.json", r#"{"x": 1}"#);
    write(dir.path(), "a/_metadata.json", r#"{"imports": ["b"]}"#);
    write(dir.path(), "b/_metadata.json", r#"{"imports": ["a"]}"#);

    let mut builder = Builder::new();
    builder.add_directory(dir.path()).unwrap();
    let err = builder.build().unwrap_err();

    match err.diagnostics() {
        [Diagnostic::ImportCycle { cycle }] => assert_eq!(cycle, &["a", "b", "a"]),
        other => panic!("unexpected diagnostics: {other:?}"),
    }
    assert!(err.to_string().contains("a -> b -> a"), "{err}");
}

#[test]
fn test_alias_colliding_with_feature_fails_build() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "service.json", "{}");
    write(dir.path(), "blue/service.json", "{}");
    write(dir.path(), "green/service.json", "{}");
    write(dir.path(), "green/_metadata.yaml", "aliases: [Blue]\n");

    let mut builder = Builder::new();
    builder.add_directory(dir.path()).unwrap();
    let err = builder.build().unwrap_err();
    assert!(matches!(
        err.diagnostics(),
        [Diagnostic::AmbiguousFeatureName { name, first, second }]
            if name == "Blue" && first == "blue" && second == "green"
    ));
}

//! End-to-end overlay lifecycle tests
//!
//! Construction from shipped default files, recovery from unusable backing
//! files, persistence round trips and copies, through the public API only.

mod fixtures;

use fixtures::{capture, def_config_path, nested_defaults_path};
use json_overlay::value::{ValueMap, BOOLEAN, DOUBLE, INTEGER, STRING, VALUE_LIST};
use json_overlay::{ConfigOverlay, ConverterRegistry, JsonValue, LoadOutcome, Shape};
use serde_json::{json, Map, Value};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_generates_config_identical_to_default() {
    let dir = TempDir::new().unwrap();
    let overlay = ConfigOverlay::in_dir(dir.path(), "config", def_config_path());

    assert!(matches!(overlay.outcome(), LoadOutcome::Created));
    assert_eq!(overlay.get_as_with("var1", &INTEGER), Some(10));

    let generated: Value = serde_json::from_str(&fs::read_to_string(overlay.path()).unwrap()).unwrap();
    let shipped: Value = serde_json::from_str(&fs::read_to_string(def_config_path()).unwrap()).unwrap();
    assert_eq!(generated, shipped);
}

#[test]
fn test_nested_document_round_trips_as_nested_values() {
    let dir = TempDir::new().unwrap();
    let overlay =
        ConfigOverlay::with_default_file(dir.path().join("mod.json"), nested_defaults_path());

    assert_eq!(overlay.get_as("title", String::new()), "Example Mod");
    assert_eq!(overlay.get_as("spawn_rate", 0.0), 0.75);
    assert_eq!(overlay.get_as("max_entities", 0i64), 120);
    assert!(overlay.get_as("enabled", false));
    assert_eq!(overlay.get("comment").shape(), Shape::Null);

    let tags = overlay.get_as_with("tags", &VALUE_LIST).unwrap();
    let tags: Vec<String> = tags.iter().map(|tag| tag.to_typed(String::new())).collect();
    assert_eq!(tags, vec!["hostile", "night"]);

    let limits = overlay.get_as("limits", ValueMap::new());
    assert_eq!(limits["per_chunk"].to_typed(0i64), 4);
    let biomes = limits["biomes"].to_typed(ValueMap::new());
    assert!(biomes["forest"].to_typed(false));
    assert!(!biomes["desert"].to_typed(true));
}

#[test]
fn test_unreadable_config_is_broken_and_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    // A directory exists at the path but cannot be read as a file.
    fs::create_dir(&path).unwrap();

    let (overlay, captured) = capture(|| ConfigOverlay::with_default_file(&path, def_config_path()));

    assert!(overlay.is_broken());
    assert_eq!(overlay.snapshot_current(), overlay.snapshot_default());
    assert_eq!(overlay.get_as("var1", 0i64), 10);
    assert!(captured.text().contains("falling back to default values"));
}

#[test]
fn test_malformed_config_is_broken_and_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{\"var1\": 11,,}").unwrap();

    let overlay = ConfigOverlay::with_default_file(&path, def_config_path());

    assert!(overlay.is_broken());
    assert_eq!(overlay.snapshot_current(), overlay.snapshot_default());
    // The corrupt file is left alone until the next save.
    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"var1\": 11,,}");
}

#[test]
fn test_lookup_layering() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"a": "current"}"#).unwrap();

    let mut defaults = Map::new();
    defaults.insert("a".to_string(), json!("default"));
    defaults.insert("b".to_string(), json!(2));
    let overlay = ConfigOverlay::with_default_values(&path, defaults);

    assert_eq!(overlay.get("a"), JsonValue::new(json!("current")));
    assert_eq!(overlay.get_or_default("b"), overlay.get_from_default("b"));
    assert_eq!(overlay.get_or("c", json!(3)), JsonValue::new(json!(3)));
    assert!(overlay.get_or_default("c").is_absent());
}

#[test]
fn test_put_save_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut overlay = ConfigOverlay::with_default_values(&path, Map::new());
    overlay.put("a", 1);
    overlay.put("b", 2);
    assert!(overlay.save());

    let reopened = ConfigOverlay::with_default_values(&path, Map::new());
    assert_eq!(reopened.get_as("a", 0i64), 1);
    assert_eq!(reopened.get_as("b", 0i64), 2);
    assert_eq!(
        reopened.snapshot_current().keys().collect::<Vec<_>>(),
        vec!["a", "b"]
    );
}

#[test]
fn test_repeated_saves_keep_key_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut overlay = ConfigOverlay::with_default_file(&path, nested_defaults_path());
    overlay.put("zzz", "last");
    assert!(overlay.save());
    let first = fs::read_to_string(&path).unwrap();

    let mut reopened = ConfigOverlay::with_default_file(&path, nested_defaults_path());
    assert!(reopened.save());
    let second = fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
    assert!(first.trim_end().ends_with("\"zzz\": \"last\"\n}"));
}

#[test]
fn test_copy_independence() {
    let dir = TempDir::new().unwrap();
    let mut original = ConfigOverlay::with_default_file(dir.path().join("c.json"), def_config_path());
    original.put("x", 1);

    let mut copy = original.copy();
    copy.put("x", 2);

    assert_eq!(original.get_as("x", 0i64), 1);
    assert_eq!(copy.get_as("x", 0i64), 2);
    assert_eq!(copy.is_broken(), original.is_broken());
}

#[test]
fn test_delete_then_save_regenerates() {
    let dir = TempDir::new().unwrap();
    let mut overlay = ConfigOverlay::with_default_file(dir.path().join("c.json"), def_config_path());

    let (deleted, captured) = capture(|| overlay.delete());
    assert!(deleted);
    assert!(captured.text().contains("WARN"));
    assert!(!overlay.path().exists());
    assert!(!overlay.delete());

    overlay.put("var1", 20);
    let (saved, captured) = capture(|| overlay.save());
    assert!(saved);
    assert!(!captured.text().contains("WARN"));

    let reopened = ConfigOverlay::with_default_file(overlay.path(), def_config_path());
    assert_eq!(reopened.get_as("var1", 0i64), 20);
}

#[test]
fn test_typed_lookups_degrade_to_fallback() {
    let dir = TempDir::new().unwrap();
    let mut overlay = ConfigOverlay::with_default_file(dir.path().join("c.json"), def_config_path());
    overlay.put("n", 10.9);
    overlay.put("s", "text");

    assert_eq!(overlay.get_as("n", 0i64), 10);
    assert_eq!(overlay.get_as("s", 1.5), 1.5);
    assert_eq!(overlay.get_as_with("n", &DOUBLE), Some(10.9));
    assert_eq!(overlay.get_as_with("n", &BOOLEAN), None);
    assert_eq!(overlay.get_as_with("s", &STRING), Some("text".to_string()));

    let registry = ConverterRegistry::with_builtins();
    assert_eq!(overlay.get_as_registered("n", 0i64, &registry), 10);
    assert_eq!(overlay.get_as_registered("n", 0u16, &registry), 0);
}

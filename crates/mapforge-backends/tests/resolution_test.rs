//! Integration tests for resolving definitions against the built-in
//! registry: every configuration error must surface at resolve time,
//! before anything external would run.

use mapforge_backends::default_registry;
use mapforge_core::{Definition, Error, RemoteSink};

const FULL_DEFINITION: &str = r#"
name: Survival world
world: /srv/worlds/survival
dest: /srv/www/maps/survival
tasks:
  - --dim: overworld
spreadsheet:
  type: gsheet
  id: sheet-id
  key: not-a-real-key
  dimensions:
    overworld:
      id: 0
      name: Players!A2:A
      position: Players!B2:D
remote:
  type: rsync
  ip: maps.example.net
  path: volume/maps/survival
webhook:
  type: discord
  url: https://discord.test/webhook
  link: https://maps.example.net/survival/
"#;

#[test]
fn test_full_definition_resolves() {
    let registry = default_registry();
    let defi = Definition::from_yaml(FULL_DEFINITION).unwrap();
    defi.resolve(&registry).unwrap();

    assert!(defi.spreadsheet().is_some());
    assert!(defi.remote().is_some());
    assert!(defi.webhook().is_some());
}

#[test]
fn test_resolution_binds_owner() {
    let registry = default_registry();
    let defi = Definition::from_yaml(FULL_DEFINITION).unwrap();
    defi.resolve(&registry).unwrap();

    let remote = defi.remote().unwrap();
    let context = remote.owner().resolve(None).unwrap();
    assert_eq!(context.name.as_deref(), Some("Survival world"));
}

#[test]
fn test_unknown_spreadsheet_type_fails_at_resolve() {
    let registry = default_registry();
    let defi = Definition::from_yaml(
        "world: /w\ndest: /d\nspreadsheet:\n  type: excel\n",
    )
    .unwrap();

    let err = defi.resolve(&registry).unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownExtensionType { capability: "spreadsheet", tag } if tag == "excel"
    ));
}

#[test]
fn test_invalid_rsync_path_fails_at_resolve() {
    let registry = default_registry();
    let defi = Definition::from_yaml(
        "world: /w\ndest: /d\nremote:\n  type: rsync\n  ip: host\n  path: \"bad:path\"\n",
    )
    .unwrap();
    assert!(defi.resolve(&registry).is_err());
}

#[test]
fn test_missing_discord_fields_fail_at_resolve() {
    let registry = default_registry();
    let defi = Definition::from_yaml(
        "world: /w\ndest: /d\nwebhook:\n  type: discord\n  url: https://discord.test/webhook\n",
    )
    .unwrap();
    // `link` is mandatory
    assert!(defi.resolve(&registry).is_err());
}

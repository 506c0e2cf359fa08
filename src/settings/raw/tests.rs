use std::fs;
use std::path::PathBuf;

use clap::Parser;
use facetree_widgets::WidgetSpec;
use tempfile::tempdir;

use super::RawConfig;
use crate::cli::CliArgs;
use crate::settings::sources::build_config;

#[test]
fn cli_overrides_take_precedence() {
    let cli = CliArgs::parse_from([
        "facetree",
        "--records",
        "/tmp/catalog.json",
        "--root-index",
        "catalog",
        "--url",
        "?catalog%5Bquery%5D=phone",
    ]);

    let mut config = RawConfig::default();
    config.search.records = Some(PathBuf::from("/tmp/other.json"));
    config.apply_cli_overrides(&cli);

    assert_eq!(config.search.records, cli.records);
    assert_eq!(config.search.root_index, cli.root_index);
    assert_eq!(config.search.url, cli.url);
}

#[test]
fn files_load_search_settings_and_layout() {
    let dir = tempdir().expect("tempdir");
    let records = dir.path().join("products.json");
    fs::write(&records, "[]").expect("write records");
    let config_path = dir.path().join("facetree.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[search]
records = "{}"
base_url = "https://shop.example/search"
timeout_ms = 2000

[[layout.widgets]]
type = "searchBox"

[[layout.widgets]]
type = "refinementList"
attribute = "brand"
operator = "or"

[[layout.widgets]]
type = "index"
indexName = "products"
indexId = "nested"

[[layout.widgets.widgets]]
type = "hits"
"#,
            records.display()
        ),
    )
    .expect("write config");

    let cli = CliArgs::parse_from([
        "facetree",
        "--no-config",
        "--config",
        config_path.to_str().expect("utf-8 path"),
    ]);
    let raw: RawConfig = build_config(&cli)
        .expect("config builds")
        .try_deserialize()
        .expect("config deserializes");
    let resolved = raw.resolve(&cli).expect("config resolves");

    assert_eq!(resolved.root_index, "products");
    assert_eq!(resolved.records, records);
    assert_eq!(
        resolved.base_url.as_ref().map(|url| url.as_str()),
        Some("https://shop.example/search")
    );
    assert_eq!(resolved.timeout.as_millis(), 2000);
    assert_eq!(resolved.widgets.len(), 3);
    assert_eq!(resolved.widgets[0], WidgetSpec::SearchBox);
    match &resolved.widgets[2] {
        WidgetSpec::Index(index) => {
            assert_eq!(index.index_id.as_deref(), Some("nested"));
            assert_eq!(index.widgets, vec![WidgetSpec::Hits]);
        }
        other => panic!("expected a nested index, got {other:?}"),
    }
}

#[test]
fn invalid_base_url_reports_its_origin() {
    let dir = tempdir().expect("tempdir");
    let records = dir.path().join("products.json");
    fs::write(&records, "[]").expect("write records");

    let cli = CliArgs::parse_from(["facetree", "--no-config"]);
    let mut config = RawConfig::default();
    config.search.records = Some(records);
    config.search.base_url = Some("not a url".into());

    let err = config.resolve(&cli).expect_err("invalid url");
    let message = err.to_string();
    assert!(message.contains("search.base_url"));
    assert!(message.contains("configuration key"));
}

#[test]
fn missing_records_are_required() {
    let cli = CliArgs::parse_from(["facetree", "--no-config"]);
    let err = RawConfig::default().resolve(&cli).expect_err("no records");
    assert!(err.to_string().contains("search.records"));
}

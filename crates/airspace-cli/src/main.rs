//! Airspace Catalog CLI
//!
//! Reads a record payload (JSON array or JSONP), builds the grouped catalog and writes it as
//! GeoJSON or as a catalog document with the build summary.

mod error;
mod settings;

use std::io::{Read, Write};
use std::process::ExitCode;

use airspace_lib::{Catalog, CatalogBuild, Config};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use error::CliError;
use settings::{OutputFormat, Settings};

fn main() -> ExitCode {
    let settings = Settings::parse();
    init_logging(&settings);

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Build failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays clean for the output document
fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(settings: &Settings) -> Result<(), CliError> {
    let config = settings.build_config()?;
    let payload = read_input(settings)?;
    tracing::debug!(bytes = payload.len(), "Read record payload");

    let build = Catalog::from_payload(&payload, &config)?;
    let document = render(&build, settings.format, &config)?;
    write_output(settings, &document)
}

fn read_input(settings: &Settings) -> Result<String, CliError> {
    match settings.input_path() {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::ReadInput {
            path: path.display().to_string(),
            source,
        }),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| CliError::ReadInput {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            Ok(text)
        }
    }
}

/// Serialize the build into the requested output document
fn render(build: &CatalogBuild, format: OutputFormat, config: &Config) -> Result<String, CliError> {
    let warnings: Vec<String> = build.warnings.iter().map(ToString::to_string).collect();
    let value = match format {
        OutputFormat::Geojson => serde_json::to_value(build.catalog.to_geojson())?,
        OutputFormat::Catalog => json!({
            "summary": build.summary,
            "bbox": build.catalog.bounding_box(),
            "center": build.catalog.center(),
            "config": config,
            "catalog": build.catalog,
            "warnings": warnings,
        }),
        OutputFormat::Summary => json!({
            "summary": build.summary,
            "bbox": build.catalog.bounding_box(),
            "warnings": warnings,
        }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

fn write_output(settings: &Settings, document: &str) -> Result<(), CliError> {
    match &settings.output {
        Some(path) => {
            std::fs::write(path, document).map_err(|source| CliError::WriteOutput {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), "Wrote output");
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{document}").map_err(|source| CliError::WriteOutput {
                path: "<stdout>".into(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const PAYLOAD: &str = r#"cb([
        {"nom": "CTR A", "categorie": "CTR", "couleur": "ff0000", "plancher": "SFC", "plafond": "FL065",
         "p1": "[[0,0],[2,0],[2,2],[0,2],[0,0]]"},
        {"nom": "Exit N", "categorie": "Navigation", "p1": "[5, 5]"},
        {"nom": "", "categorie": "CTR"}
    ]);"#;

    fn build() -> CatalogBuild {
        Catalog::from_payload(PAYLOAD, &Config::default()).unwrap()
    }

    #[test]
    fn test_render_geojson() {
        let text = render(&build(), OutputFormat::Geojson, &Config::default()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
        assert_eq!(value["bbox"], json!([0.0, 0.0, 2.0, 2.0]));
    }

    #[test]
    fn test_render_summary() {
        let text = render(&build(), OutputFormat::Summary, &Config::default()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["summary"]["records"], 3);
        assert_eq!(value["summary"]["composed"], 1);
        assert_eq!(value["summary"]["points"], 1);
        assert_eq!(value["summary"]["dropped"], 1);
        assert_eq!(value["warnings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_render_catalog() {
        let text = render(&build(), OutputFormat::Catalog, &Config::default()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert!(value["catalog"].is_object());
        assert_eq!(value["center"], json!([1.0, 1.0]));
        assert_eq!(value["config"]["default_layer"], "Default");
    }

    #[test]
    fn test_run_file_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("records.js");
        let output = dir.path().join("out.geojson");
        std::fs::write(&input, PAYLOAD).unwrap();

        let settings = Settings::try_parse_from([
            "airspace-catalog",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run(&settings).unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_run_missing_input() {
        let settings =
            Settings::try_parse_from(["airspace-catalog", "/nonexistent/records.json"]).unwrap();
        assert!(matches!(run(&settings), Err(CliError::ReadInput { .. })));
    }
}

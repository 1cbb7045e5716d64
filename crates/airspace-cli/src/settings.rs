use airspace_lib::{AxisOrder, Config, HexColor};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::error::CliError;

/// Output document written by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// GeoJSON FeatureCollection with style properties and the aggregate bbox
    Geojson,
    /// Grouped catalog with build summary and warnings
    Catalog,
    /// Build summary and warnings only
    Summary,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Airspace Catalog - compose quad-based airspace records into map-ready features
pub struct Settings {
    /// Record payload (JSON array or JSONP); reads stdin when omitted or "-"
    #[clap(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// TOML file with build settings
    #[clap(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where to write the result; stdout when omitted
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output document
    #[clap(short, long, value_enum, default_value = "geojson")]
    pub format: OutputFormat,

    /// Bare coordinate pairs are [lat, lon] instead of [lon, lat]
    #[clap(long, default_value = "false")]
    pub lat_lon: bool,

    /// Let marker coordinates extend the bounding box
    #[clap(long, default_value = "false")]
    pub bbox_includes_points: bool,

    /// Classify records on a single thread
    #[clap(long, default_value = "false")]
    pub sequential: bool,

    /// Color for records without a valid one (e.g. 3388ff)
    #[clap(long, value_name = "COLOR")]
    pub default_color: Option<String>,

    /// Category rendered as a point marker (repeatable, replaces the configured set)
    #[clap(long = "point-category", value_name = "CATEGORY")]
    pub point_categories: Vec<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Settings {
    /// Resolve the build configuration: defaults, then the config file, then flags
    pub fn build_config(&self) -> Result<Config, CliError> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => Config::default(),
        };

        if self.lat_lon {
            config.axis_order = AxisOrder::LatLon;
        }
        if self.bbox_includes_points {
            config.bbox_includes_points = true;
        }
        if self.sequential {
            config.parallel = false;
        }
        if let Some(raw) = &self.default_color {
            config.default_color =
                HexColor::parse(raw).ok_or_else(|| CliError::InvalidColor(raw.clone()))?;
        }
        if !self.point_categories.is_empty() {
            config.point_categories = self.point_categories.clone();
        }

        Ok(config)
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Input path, `None` meaning stdin
    pub fn input_path(&self) -> Option<&Path> {
        self.input
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }
}

fn load_config_file(path: &Path) -> Result<Config, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| CliError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}

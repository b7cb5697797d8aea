//! `gridmap` developer tool: dumps what the map core would hand the engine.

use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use engine::HeadlessEngine;
use foundation::{IsoCode, IsoCodeError};
use gridmap_web::{ConfigError, MapConfig};
use layers::{LayerError, LayerManager, ToggleState, ZoneColorMode};
use serde_json::Value;
use streaming::{TileLayer, TileSourceManager, build_tile_url};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Usage(String),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Iso(#[from] IsoCodeError),
    #[error(transparent)]
    Layers(#[from] LayerError),
    #[error("write output: {0}")]
    Output(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Environment inputs, captured once so commands stay testable.
#[derive(Debug, Clone, Default)]
pub struct ToolEnv {
    /// `GRIDMAP_TILE_BASE`: overrides the tile endpoint.
    pub tile_base: Option<String>,
    /// `GRIDMAP_CONFIG`: path to a JSON `MapConfig`.
    pub config_path: Option<PathBuf>,
}

impl ToolEnv {
    pub fn from_process_env() -> Self {
        Self {
            tile_base: env::var("GRIDMAP_TILE_BASE").ok(),
            config_path: env::var("GRIDMAP_CONFIG").ok().map(PathBuf::from),
        }
    }

    pub fn load_config(&self) -> Result<MapConfig, ToolError> {
        let mut config = match &self.config_path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| ToolError::Io {
                    path: path.clone(),
                    source,
                })?;
                MapConfig::from_json_str(&raw)?
            }
            None => MapConfig::default(),
        };
        if let Some(base) = &self.tile_base {
            config.sources.tile_base_url = base.clone();
        }
        Ok(config)
    }
}

/// Inspect what the map core hands to the engine.
#[derive(Parser, Debug)]
#[command(name = "gridmap", version, about = "Grid map style and tile URL inspector")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the full style document (sources + layers) with default toggles
    Style {
        /// Zone coloring; defaults to the configured mode
        #[arg(long, value_enum)]
        color_mode: Option<ColorMode>,

        /// ISO codes to filter per-ISO sources by
        isos: Vec<String>,
    },

    /// Print the tile URL template for one tile layer
    TileUrl {
        /// Tile layer name, e.g. substations or gpkg_power_lines
        layer: String,

        /// ISO codes to filter by
        isos: Vec<String>,
    },
}

/// Zone color mode as spelled on the command line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Classification,
    Value,
}

impl From<ColorMode> for ZoneColorMode {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Classification => ZoneColorMode::Classification,
            ColorMode::Value => ZoneColorMode::Value,
        }
    }
}

fn parse_isos(raw: &[String]) -> Result<Vec<IsoCode>, ToolError> {
    raw.iter()
        .map(|s| IsoCode::parse(s).map_err(ToolError::from))
        .collect()
}

/// The full style document the core registers on load, with default toggles.
pub fn style_document(config: &MapConfig, isos: &[IsoCode]) -> Result<Value, ToolError> {
    let mut engine = HeadlessEngine::new(config.initial_view);
    let mut sources = TileSourceManager::new(config.sources.clone());
    sources
        .add_sources(&mut engine, isos)
        .map_err(LayerError::from)?;
    let layers = LayerManager::new(config.zone_color_mode).map_err(LayerError::from)?;
    let added = layers.add_layers(&mut engine, &ToggleState::default())?;
    info!(layers = added, isos = isos.len(), "style document built");
    Ok(engine.style_document())
}

pub fn run(cli: Cli, env: &ToolEnv, out: &mut impl Write) -> Result<(), ToolError> {
    let mut config = env.load_config()?;

    match cli.command {
        Command::Style { color_mode, isos } => {
            if let Some(mode) = color_mode {
                config.zone_color_mode = mode.into();
            }
            let doc = style_document(&config, &parse_isos(&isos)?)?;
            serde_json::to_writer_pretty(&mut *out, &doc)?;
            writeln!(out)?;
        }
        Command::TileUrl { layer, isos } => {
            let layer = TileLayer::from_name(&layer)
                .ok_or_else(|| ToolError::Usage(format!("unknown tile layer: {layer}")))?;
            let url = build_tile_url(&config.sources.tile_base_url, layer, &parse_isos(&isos)?);
            writeln!(out, "{url}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use layers::{ZoneColorMode, zone_color};
    use serde_json::Value;

    use super::{Cli, ToolEnv, ToolError, run};

    fn run_to_string(list: &[&str], env: &ToolEnv) -> Result<String, ToolError> {
        let cli = Cli::try_parse_from(std::iter::once("gridmap").chain(list.iter().copied()))
            .map_err(|e| ToolError::Usage(e.to_string()))?;
        let mut out = Vec::new();
        run(cli, env, &mut out)?;
        Ok(String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn tile_url_honours_env_base() {
        let env = ToolEnv {
            tile_base: Some("https://tiles.example/v1/".into()),
            config_path: None,
        };
        let out = run_to_string(&["tile-url", "substations", "pjm", "miso"], &env).expect("run");
        assert_eq!(
            out.trim(),
            "https://tiles.example/v1/substations/{z}/{x}/{y}.mvt?iso_id=pjm,miso"
        );
    }

    #[test]
    fn infrastructure_urls_ignore_isos() {
        let out = run_to_string(&["tile-url", "gpkg_power_lines", "pjm"], &ToolEnv::default())
            .expect("run");
        assert_eq!(out.trim(), "/api/tiles/gpkg_power_lines/{z}/{x}/{y}.mvt");
    }

    #[test]
    fn style_lists_sources_and_layers() {
        let out = run_to_string(&["style", "caiso"], &ToolEnv::default()).expect("run");
        let doc: Value = serde_json::from_str(&out).expect("json");
        assert_eq!(doc["sources"].as_object().map(|s| s.len()), Some(11));
        let layers = doc["layers"].as_array().expect("layers");
        assert_eq!(layers[0]["id"], "zones-fill");
        assert!(
            doc["sources"]["zones"]["tiles"][0]
                .as_str()
                .expect("tiles")
                .ends_with("iso_id=caiso")
        );
    }

    #[test]
    fn color_mode_flag_recolors_zones() {
        let out = run_to_string(&["style", "--color-mode", "value"], &ToolEnv::default())
            .expect("run");
        let doc: Value = serde_json::from_str(&out).expect("json");
        let expected = zone_color(ZoneColorMode::Value).expect("expr").to_json();
        assert_eq!(doc["layers"][0]["paint"]["fill-color"], expected);
    }

    #[test]
    fn bad_input_is_a_usage_error() {
        let env = ToolEnv::default();
        assert!(matches!(run_to_string(&[], &env), Err(ToolError::Usage(_))));
        assert!(matches!(
            run_to_string(&["tile-url", "roads"], &env),
            Err(ToolError::Usage(_))
        ));
        assert!(matches!(
            run_to_string(&["style", "--color-mode", "rainbow"], &env),
            Err(ToolError::Usage(_))
        ));
        assert!(matches!(
            run_to_string(&["tile-url", "zones", "p&m"], &env),
            Err(ToolError::Iso(_))
        ));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let env = ToolEnv {
            tile_base: None,
            config_path: Some("/nonexistent/gridmap.json".into()),
        };
        assert!(matches!(
            run_to_string(&["tile-url", "zones"], &env),
            Err(ToolError::Io { .. })
        ));
    }
}

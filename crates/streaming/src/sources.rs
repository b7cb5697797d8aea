use engine::{ClusterOptions, EngineError, MapEngine, SourceSpec};
use foundation::IsoCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::geojson::{HostingCapacityRecord, empty_collection, hosting_capacity_collection};
use crate::tiles::{TileLayer, build_tile_url};

/// Source id of the client-side hosting-capacity GeoJSON source.
pub const HOSTING_CAPACITY_SOURCE: &str = "hosting-capacity";

/// Configuration for tile and GeoJSON sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base of the tile endpoint, e.g. `https://api.example/tiles`.
    pub tile_base_url: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Tile property promoted to the feature id (required for hover state).
    pub promote_id: Option<String>,
    pub cluster_radius_px: u32,
    pub cluster_max_zoom: u8,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            tile_base_url: "/api/tiles".to_string(),
            min_zoom: 0,
            max_zoom: 14,
            promote_id: Some("id".to_string()),
            cluster_radius_px: 50,
            cluster_max_zoom: 12,
        }
    }
}

/// Owns the tile-layer → source → URL mapping and keeps it in step with the
/// ISO filter.
#[derive(Debug, Clone)]
pub struct TileSourceManager {
    config: SourceConfig,
    registered: bool,
    active: Vec<IsoCode>,
}

impl TileSourceManager {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            registered: false,
            active: Vec::new(),
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn tile_url(&self, layer: TileLayer) -> String {
        build_tile_url(&self.config.tile_base_url, layer, &self.active)
    }

    /// Registers every vector source plus the hosting-capacity GeoJSON source.
    ///
    /// Registering twice is an error: source ids are unique per engine.
    pub fn add_sources<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        isos: &[IsoCode],
    ) -> Result<(), EngineError> {
        self.active = dedup(isos);
        for layer in TileLayer::ALL {
            let spec = SourceSpec::Vector {
                tiles: vec![self.tile_url(layer)],
                min_zoom: self.config.min_zoom,
                max_zoom: self.config.max_zoom,
                promote_id: self.config.promote_id.clone(),
            };
            engine.add_source(layer.source_id(), &spec)?;
        }
        engine.add_source(
            HOSTING_CAPACITY_SOURCE,
            &SourceSpec::GeoJson {
                data: empty_collection(),
                cluster: Some(ClusterOptions {
                    radius_px: self.config.cluster_radius_px,
                    max_zoom: self.config.cluster_max_zoom,
                }),
            },
        )?;
        self.registered = true;
        info!(
            sources = TileLayer::ALL.len() + 1,
            isos = ?self.active,
            "tile sources registered"
        );
        Ok(())
    }

    /// Points every ISO-filtered source at URLs for `isos`, in place.
    ///
    /// Returns how many sources were updated; zero when `isos` is already
    /// applied, so calling this on every reconcile is cheap. Before [`Self::add_sources`] has
    /// run this is a no-op, since store changes can arrive before the engine
    /// has loaded.
    pub fn refresh_source_urls<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        isos: &[IsoCode],
    ) -> Result<usize, EngineError> {
        if !self.registered {
            debug!("refresh before sources registered; ignoring");
            return Ok(0);
        }
        let next = dedup(isos);
        if next == self.active {
            return Ok(0);
        }

        // `active` only moves once every source points at `next`, so a failed
        // refresh is retried in full by the next call.
        let mut refreshed = 0;
        for layer in TileLayer::ALL.into_iter().filter(|l| l.iso_filtered()) {
            if !engine.has_source(layer.source_id()) {
                warn!(source = layer.source_id(), "source missing during refresh");
                continue;
            }
            let url = build_tile_url(&self.config.tile_base_url, layer, &next);
            engine.set_source_tiles(layer.source_id(), &[url])?;
            refreshed += 1;
        }
        self.active = next;
        debug!(refreshed, isos = ?self.active, "tile urls refreshed");
        Ok(refreshed)
    }

    /// Replaces the hosting-capacity source data wholesale.
    ///
    /// Returns the number of features pushed; a no-op before registration.
    pub fn push_hosting_capacity<E: MapEngine + ?Sized>(
        &self,
        engine: &mut E,
        records: &[HostingCapacityRecord],
    ) -> Result<usize, EngineError> {
        if !self.registered || !engine.has_source(HOSTING_CAPACITY_SOURCE) {
            return Ok(0);
        }
        let collection = hosting_capacity_collection(records);
        let count = collection["features"].as_array().map_or(0, Vec::len);
        engine.set_source_data(HOSTING_CAPACITY_SOURCE, &collection)?;
        debug!(
            features = count,
            dropped = records.len() - count,
            "hosting capacity pushed"
        );
        Ok(count)
    }
}

fn dedup(isos: &[IsoCode]) -> Vec<IsoCode> {
    let mut out: Vec<IsoCode> = Vec::with_capacity(isos.len());
    for code in isos {
        if !out.contains(code) {
            out.push(code.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{HOSTING_CAPACITY_SOURCE, SourceConfig, TileSourceManager};
    use crate::geojson::HostingCapacityRecord;
    use crate::tiles::{TileLayer, parse_iso_param};
    use engine::{EngineError, HeadlessEngine, MapEngine};
    use foundation::IsoCode;
    use pretty_assertions::assert_eq;

    fn iso(code: &str) -> IsoCode {
        IsoCode::parse(code).expect("valid")
    }

    fn first_tile(engine: &HeadlessEngine, layer: TileLayer) -> String {
        engine
            .source(layer.source_id())
            .and_then(|s| s.tiles())
            .and_then(|t| t.first().cloned())
            .unwrap_or_default()
    }

    #[test]
    fn add_sources_registers_every_layer() {
        let mut engine = HeadlessEngine::default();
        let mut sources = TileSourceManager::new(SourceConfig::default());
        sources.add_sources(&mut engine, &[]).expect("add");

        for layer in TileLayer::ALL {
            assert!(engine.has_source(layer.source_id()), "{layer:?}");
            assert!(!first_tile(&engine, layer).contains("iso_id"));
        }
        assert!(engine.has_source(HOSTING_CAPACITY_SOURCE));
    }

    #[test]
    fn add_sources_twice_is_an_error() {
        let mut engine = HeadlessEngine::default();
        let mut sources = TileSourceManager::new(SourceConfig::default());
        sources.add_sources(&mut engine, &[]).expect("add");
        let err = sources.add_sources(&mut engine, &[]).expect_err("duplicate");
        assert_eq!(err, EngineError::DuplicateSource("zones".into()));
    }

    #[test]
    fn refresh_before_registration_is_a_noop() {
        let mut engine = HeadlessEngine::default();
        let mut sources = TileSourceManager::new(SourceConfig::default());
        assert_eq!(sources.refresh_source_urls(&mut engine, &[iso("pjm")]), Ok(0));
        assert_eq!(engine.source_update_count("zones"), 0);
    }

    #[test]
    fn refresh_updates_only_iso_filtered_sources_in_place() {
        let mut engine = HeadlessEngine::default();
        let mut sources = TileSourceManager::new(SourceConfig::default());
        sources.add_sources(&mut engine, &[]).expect("add");

        let n = sources
            .refresh_source_urls(&mut engine, &[iso("caiso")])
            .expect("refresh");
        assert_eq!(n, 7);
        assert_eq!(
            parse_iso_param(&first_tile(&engine, TileLayer::Feeders)),
            vec![iso("caiso")]
        );
        assert_eq!(engine.source_update_count("zones"), 1);
        assert_eq!(engine.source_update_count("gpkg_power_lines"), 0);
        assert!(!first_tile(&engine, TileLayer::InfraPowerPlants).contains("iso_id"));

        // Same set again: nothing to do.
        let n = sources
            .refresh_source_urls(&mut engine, &[iso("caiso"), iso("caiso")])
            .expect("refresh");
        assert_eq!(n, 0);

        // Clearing the filter drops the parameter.
        sources.refresh_source_urls(&mut engine, &[]).expect("refresh");
        assert!(!first_tile(&engine, TileLayer::Zones).contains("iso_id"));
    }

    #[test]
    fn failed_refresh_is_retried_with_the_same_isos() {
        let mut engine = HeadlessEngine::default();
        let mut sources = TileSourceManager::new(SourceConfig::default());
        sources.add_sources(&mut engine, &[]).expect("add");

        engine.fail_next_tile_update(TileLayer::Substations.source_id());
        assert!(matches!(
            sources.refresh_source_urls(&mut engine, &[iso("caiso")]),
            Err(EngineError::Backend(_))
        ));

        let n = sources
            .refresh_source_urls(&mut engine, &[iso("caiso")])
            .expect("retry");
        assert_eq!(n, 7);
        for layer in TileLayer::ALL.into_iter().filter(|l| l.iso_filtered()) {
            assert_eq!(
                parse_iso_param(&first_tile(&engine, layer)),
                vec![iso("caiso")],
                "{layer:?}"
            );
        }
    }

    #[test]
    fn hosting_capacity_push_replaces_data() {
        let mut engine = HeadlessEngine::default();
        let mut sources = TileSourceManager::new(SourceConfig::default());
        let mut rec = HostingCapacityRecord::new("F-1");
        rec.latitude = Some(35.0);
        rec.longitude = Some(-80.0);

        assert_eq!(sources.push_hosting_capacity(&mut engine, &[rec.clone()]), Ok(0));
        sources.add_sources(&mut engine, &[]).expect("add");
        let pushed = sources
            .push_hosting_capacity(&mut engine, &[rec, HostingCapacityRecord::new("F-2")])
            .expect("push");
        assert_eq!(pushed, 1);
        assert_eq!(engine.source_update_count(HOSTING_CAPACITY_SOURCE), 1);
    }
}

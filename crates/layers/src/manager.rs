use engine::{EngineError, MapEngine, Visibility};
use style::{Expr, StyleError};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{LayerDef, ZONES_FILL, ZONES_OUTLINE, ZoneColorMode, layer_catalog, zone_color};
use crate::toggles::{Toggle, ToggleState, ToggleTable};

#[derive(Debug, Error)]
pub enum LayerError {
    #[error(transparent)]
    Style(#[from] StyleError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Owns the layer catalog and applies visibility and paint changes to an engine.
///
/// Every mutation checks that the target layer exists first; a layer that was
/// never added (its source is absent in a minimal configuration) is skipped
/// rather than reported.
#[derive(Debug, Clone)]
pub struct LayerManager {
    defs: Vec<LayerDef>,
    table: ToggleTable,
    color_mode: ZoneColorMode,
}

impl LayerManager {
    pub fn new(color_mode: ZoneColorMode) -> Result<Self, StyleError> {
        let defs = layer_catalog(color_mode)?;
        let table = ToggleTable::from_catalog(&defs);
        Ok(Self {
            defs,
            table,
            color_mode,
        })
    }

    pub fn defs(&self) -> &[LayerDef] {
        &self.defs
    }

    pub fn table(&self) -> &ToggleTable {
        &self.table
    }

    pub fn color_mode(&self) -> ZoneColorMode {
        self.color_mode
    }

    /// Adds every catalog layer whose source is registered, in draw order.
    ///
    /// Initial visibility follows `toggles`. Returns the number of layers added.
    pub fn add_layers<E: MapEngine + ?Sized>(
        &self,
        engine: &mut E,
        toggles: &ToggleState,
    ) -> Result<usize, LayerError> {
        let mut added = 0;
        for def in &self.defs {
            if engine.has_layer(def.id()) {
                continue;
            }
            if !engine.has_source(&def.spec.source) {
                debug!(layer = def.id(), source = %def.spec.source, "source missing; layer skipped");
                continue;
            }
            let visibility = Visibility::from_flag(toggles.get(def.toggle));
            engine.add_layer(&def.spec, visibility)?;
            added += 1;
        }
        info!(added, total = self.defs.len(), "map layers added");
        Ok(added)
    }

    /// Shows or hides one layer. Returns false when the layer does not exist.
    pub fn set_visibility<E: MapEngine + ?Sized>(
        &self,
        engine: &mut E,
        layer_id: &str,
        visible: bool,
    ) -> Result<bool, LayerError> {
        if !engine.has_layer(layer_id) {
            return Ok(false);
        }
        let value = Expr::text(Visibility::from_flag(visible).as_str());
        engine.set_layout_property(layer_id, "visibility", &value)?;
        Ok(true)
    }

    /// Fans a toggle out to every layer it controls.
    pub fn apply_toggle<E: MapEngine + ?Sized>(
        &self,
        engine: &mut E,
        toggle: Toggle,
        visible: bool,
    ) -> Result<usize, LayerError> {
        let mut applied = 0;
        for id in self.table.layers_for(toggle) {
            if self.set_visibility(engine, id, visible)? {
                applied += 1;
            }
        }
        debug!(?toggle, visible, applied, "toggle applied");
        Ok(applied)
    }

    pub fn set_paint<E: MapEngine + ?Sized>(
        &self,
        engine: &mut E,
        layer_id: &str,
        property: &str,
        value: &Expr,
    ) -> Result<bool, LayerError> {
        if !engine.has_layer(layer_id) {
            return Ok(false);
        }
        engine.set_paint_property(layer_id, property, value)?;
        Ok(true)
    }

    /// Recolors the zone fill and outline together.
    ///
    /// Both layers must exist; otherwise nothing changes and false is returned.
    pub fn set_zone_color_mode<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        mode: ZoneColorMode,
    ) -> Result<bool, LayerError> {
        if !(engine.has_layer(ZONES_FILL) && engine.has_layer(ZONES_OUTLINE)) {
            return Ok(false);
        }
        let color = zone_color(mode)?;
        self.set_paint(engine, ZONES_FILL, "fill-color", &color)?;
        self.set_paint(engine, ZONES_OUTLINE, "line-color", &color)?;
        self.color_mode = mode;
        info!(?mode, "zone color mode changed");
        Ok(true)
    }
}

//! Terrain editing tools that act on the local mirror.

use crate::mirror::WorldMirror;
use log::debug;
use shared::{
    bounded_flood_fill, brush_footprint, brush_stroke, ExportedTileState, HexLayout, Terrain,
    TileKey, DEFAULT_FLOOD_FILL_DEPTH,
};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PaintTool {
    #[default]
    Brush,
    PaintBucket,
}

#[derive(Debug, Clone)]
pub struct MapPainter {
    pub tool: PaintTool,
    pub selected_terrain: Terrain,
    /// Paint the six neighbours along with the hex under the cursor.
    pub thick_brush: bool,
    pub max_fill_depth: usize,
    layout: HexLayout,
}

impl Default for MapPainter {
    fn default() -> Self {
        Self::new(HexLayout::default())
    }
}

impl MapPainter {
    pub fn new(layout: HexLayout) -> Self {
        Self {
            tool: PaintTool::default(),
            selected_terrain: Terrain::default(),
            thick_brush: false,
            max_fill_depth: DEFAULT_FLOOD_FILL_DEPTH,
            layout,
        }
    }

    /// Handles a drag from `from` to `to` in world space with the current
    /// tool. Returns the number of tiles whose terrain changed.
    pub fn handle_drag(&self, mirror: &mut WorldMirror, from: (f64, f64), to: (f64, f64)) -> usize {
        match self.tool {
            PaintTool::Brush => self.brush(mirror, from, to),
            PaintTool::PaintBucket => self.paint_bucket(mirror, to),
        }
    }

    pub fn brush(&self, mirror: &mut WorldMirror, from: (f64, f64), to: (f64, f64)) -> usize {
        let mut dabbed = HashSet::new();
        let mut changed = 0;
        brush_stroke(&self.layout, from, to, |center| {
            for coord in brush_footprint(center, self.thick_brush) {
                if dabbed.insert(coord) && mirror.set_terrain(coord, self.selected_terrain) {
                    changed += 1;
                }
            }
        });
        changed
    }

    /// Fills the region of same terrain around the hex under `at`. Missing
    /// tiles stop the fill; a region already of the selected terrain is left
    /// alone.
    pub fn paint_bucket(&self, mirror: &mut WorldMirror, at: (f64, f64)) -> usize {
        let start = self.layout.world_to_axial_int(at.0, at.1);
        let Some(filter) = mirror.get_tile(start).map(|tile| tile.terrain) else {
            return 0;
        };
        let selected = self.selected_terrain;
        if filter == selected {
            return 0;
        }

        let mut changed = 0;
        let visited = bounded_flood_fill(
            mirror,
            start,
            |mirror, coord| {
                mirror
                    .get_tile(coord)
                    .map_or(false, |tile| tile.terrain == filter && tile.terrain != selected)
            },
            |mirror, coord| {
                if mirror.set_terrain(coord, selected) {
                    changed += 1;
                }
            },
            self.max_fill_depth,
        );
        debug!("Paint bucket at {} visited {} tiles", start, visited);
        changed
    }
}

/// Every mirrored tile in the seed-file shape, keyed by tile key.
pub fn export_tile_states(mirror: &WorldMirror) -> BTreeMap<TileKey, ExportedTileState> {
    mirror
        .tiles()
        .map(|tile| {
            (
                tile.coord.key(),
                ExportedTileState {
                    name: tile.name.clone(),
                    terrain: tile.terrain,
                    controller: tile.controller.clone(),
                    population: tile.population,
                    industry: tile.industry,
                },
            )
        })
        .collect()
}

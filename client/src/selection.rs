//! The tile the user has clicked on

use crate::camera::Camera;
use crate::mirror::{MirrorTile, WorldMirror};
use shared::{Axial, HexLayout};

/// Remembers the selected hex by coordinate. The tile itself is looked up in
/// the mirror on demand, so a selection survives a snapshot replacing the
/// mirror and may point at a hex that holds no tile.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TileSelection {
    layout: HexLayout,
    selected: Option<Axial>,
}

impl TileSelection {
    pub fn new(layout: HexLayout) -> Self {
        Self {
            layout,
            selected: None,
        }
    }

    pub fn select(&mut self, coord: Axial) {
        self.selected = Some(coord);
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<Axial> {
        self.selected
    }

    pub fn is_selected(&self, coord: Axial) -> bool {
        self.selected == Some(coord)
    }

    /// Selects the hex under a click at canvas position (`canvas_x`, `canvas_y`).
    pub fn click(&mut self, camera: &Camera, canvas_x: f64, canvas_y: f64) -> Axial {
        let (x, y) = camera.canvas_to_world(canvas_x, canvas_y);
        let coord = self.layout.world_to_axial_int(x, y);
        self.select(coord);
        coord
    }

    /// The selected tile, if one is selected and the mirror has it.
    pub fn selected_tile<'a>(&self, mirror: &'a WorldMirror) -> Option<&'a MirrorTile> {
        mirror.get_tile(self.selected?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ZoomDirection;
    use crate::mirror::tests::snapshot;

    #[test]
    fn test_select_and_deselect() {
        let mut selection = TileSelection::default();
        assert_eq!(selection.selected(), None);

        selection.select(Axial::new(1, 0));
        assert!(selection.is_selected(Axial::new(1, 0)));
        assert!(!selection.is_selected(Axial::new(0, 0)));

        selection.deselect();
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn test_selected_tile_comes_from_mirror() {
        let mirror = WorldMirror::from_snapshot(snapshot());
        let mut selection = TileSelection::default();
        assert!(selection.selected_tile(&mirror).is_none());

        selection.select(Axial::new(1, 0));
        let tile = selection.selected_tile(&mirror).unwrap();
        assert_eq!(tile.coord, Axial::new(1, 0));

        // a hex with no tile stays selected but resolves to nothing
        selection.select(Axial::new(40, 40));
        assert!(selection.selected_tile(&mirror).is_none());
        assert_eq!(selection.selected(), Some(Axial::new(40, 40)));
    }

    #[test]
    fn test_click_goes_through_camera() {
        let layout = HexLayout::default();
        let mut selection = TileSelection::new(layout);
        let mut camera = Camera::default();
        camera.change_zoom(ZoomDirection::In, 0.0, 0.0);
        camera.pan(-200.0, 0.0);

        let target = Axial::new(2, -1);
        let (wx, wy) = layout.axial_to_world(target);
        let (cx, cy) = camera.world_to_canvas(wx, wy);

        assert_eq!(selection.click(&camera, cx, cy), target);
        assert_eq!(selection.selected(), Some(target));
    }
}

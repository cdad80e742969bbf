//! Hexagonal grid geometry
//!
//! Tiles are addressed with axial coordinates `(p, q)` on a flat-topped hex
//! grid. World space is the continuous cartesian plane the map is drawn in,
//! with the centre of hex `(0, 0)` at the origin.
//!
//! The forward transform, where `l` is the hexagon side length, is
//!
//! ```text
//! [ x ]   [  3l/2     0   ] [ p ]
//! [   ] = [               ] [   ]
//! [ y ]   [  l√3/2   l√3  ] [ q ]
//! ```
//!
//! and [`HexLayout::world_to_axial_fractional`] applies its inverse. Resolving
//! a world point to a hex goes through cube coordinates `(x, y, z)` with
//! `x + y + z = 0` so that rounding never leaves that plane.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side length of a hexagon in world units. Also the circumcircle radius.
pub const DEFAULT_SIDE_LENGTH: f64 = 50.0;

/// Integer axial coordinate of a single hex tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Axial {
    pub p: i32,
    pub q: i32,
}

impl Axial {
    pub const fn new(p: i32, q: i32) -> Self {
        Self { p, q }
    }

    /// The implicit third cube component, `-p - q`.
    pub fn s(&self) -> i32 {
        -self.p - self.q
    }

    /// Map key used on the wire, `"p,q"`.
    pub fn key(&self) -> String {
        format!("{},{}", self.p, self.q)
    }

    /// Parses a `"p,q"` tile key. Whitespace around either number is tolerated.
    pub fn from_key(key: &str) -> Option<Self> {
        let (p, q) = key.split_once(',')?;
        let p = p.trim().parse().ok()?;
        let q = q.trim().parse().ok()?;
        Some(Self { p, q })
    }
}

impl fmt::Display for Axial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.p, self.q)
    }
}

impl From<(i32, i32)> for Axial {
    fn from((p, q): (i32, i32)) -> Self {
        Self { p, q }
    }
}

/// Number of single steps between two hexes. Computed in `i64`, so any two
/// `i32` coordinates have a distance.
pub fn hex_distance(a: Axial, b: Axial) -> u64 {
    let dp = i64::from(a.p) - i64::from(b.p);
    let dq = i64::from(a.q) - i64::from(b.q);
    let ds = -dp - dq;
    dp.unsigned_abs().max(dq.unsigned_abs()).max(ds.unsigned_abs())
}

/// Converts between axial tile coordinates and world space for a fixed
/// hexagon size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexLayout {
    side_length: f64,
}

impl Default for HexLayout {
    fn default() -> Self {
        Self::new(DEFAULT_SIDE_LENGTH)
    }
}

impl HexLayout {
    pub fn new(side_length: f64) -> Self {
        Self { side_length }
    }

    pub fn side_length(&self) -> f64 {
        self.side_length
    }

    /// Radius of the inscribed circle, `l√3/2`.
    pub fn incircle_radius(&self) -> f64 {
        self.side_length * 3f64.sqrt() / 2.0
    }

    /// World-space centre of a hex.
    pub fn axial_to_world(&self, coord: Axial) -> (f64, f64) {
        let p = coord.p as f64;
        let q = coord.q as f64;
        let x = 1.5 * self.side_length * p;
        let y = self.side_length * 3f64.sqrt() * (p / 2.0 + q);
        (x, y)
    }

    /// Exact inverse of [`HexLayout::axial_to_world`]. The result is generally
    /// not integral; use [`HexLayout::world_to_axial_int`] to find the hex
    /// containing a point.
    pub fn world_to_axial_fractional(&self, x: f64, y: f64) -> (f64, f64) {
        let p = x * (2.0 / (3.0 * self.side_length));
        let q = x * (-1.0 / (3.0 * self.side_length)) + y / (self.side_length * 3f64.sqrt());
        (p, q)
    }

    /// Axial coordinate of the hex containing a world point.
    pub fn world_to_axial_int(&self, x: f64, y: f64) -> Axial {
        let (p, q) = self.world_to_axial_fractional(x, y);
        cube_round(p, q, -p - q)
    }
}

/// Rounds a fractional cube coordinate to the nearest hex.
///
/// Each component is rounded on its own, then the component with the largest
/// rounding error is recomputed from the other two so the result stays on the
/// `x + y + z = 0` plane. Halves round towards positive infinity, which fixes
/// the hex that owns points on an edge or vertex.
fn cube_round(x: f64, y: f64, z: f64) -> Axial {
    let mut rx = round_half_up(x);
    let mut ry = round_half_up(y);
    let rz = round_half_up(z);

    let dx = (rx - x).abs();
    let dy = (ry - y).abs();
    let dz = (rz - z).abs();

    if dx > dy && dx > dz {
        rx = -ry - rz;
    } else if dy > dz {
        ry = -rx - rz;
    }
    // otherwise z carries the largest error; axial only needs x and y

    // float to int casts saturate, so far-off points clamp to the grid edge
    Axial::new(rx as i32, ry as i32)
}

/// Nearest integer, with exact halves going up: `-0.5` becomes `0`.
fn round_half_up(v: f64) -> f64 {
    let floor = v.floor();
    if v - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use proptest::prelude::*;

    #[test]
    fn test_origin_maps_to_origin() {
        let layout = HexLayout::default();
        let (x, y) = layout.axial_to_world(Axial::new(0, 0));
        assert_eq!(x, 0.0);
        assert_eq!(y, 0.0);
        assert_eq!(layout.world_to_axial_int(0.0, 0.0), Axial::new(0, 0));
    }

    #[test]
    fn test_axial_to_world_matches_matrix() {
        let layout = HexLayout::new(10.0);
        let (x, y) = layout.axial_to_world(Axial::new(2, -1));
        assert_approx_eq!(x, 30.0, 1e-9);
        // l√3 * (p/2 + q) = 10√3 * 0
        assert_approx_eq!(y, 0.0, 1e-9);

        let (x, y) = layout.axial_to_world(Axial::new(1, 1));
        assert_approx_eq!(x, 15.0, 1e-9);
        assert_approx_eq!(y, 10.0 * 3f64.sqrt() * 1.5, 1e-9);
    }

    #[test]
    fn test_fractional_inverse() {
        let layout = HexLayout::default();
        let (x, y) = layout.axial_to_world(Axial::new(-7, 4));
        let (p, q) = layout.world_to_axial_fractional(x, y);
        assert_approx_eq!(p, -7.0, 1e-9);
        assert_approx_eq!(q, 4.0, 1e-9);

        let (p, q) = layout.world_to_axial_fractional(12.5, -3.25);
        let l = layout.side_length();
        let x2 = 1.5 * l * p;
        let y2 = l * 3f64.sqrt() * (p / 2.0 + q);
        assert_approx_eq!(x2, 12.5, 1e-9);
        assert_approx_eq!(y2, -3.25, 1e-9);
    }

    #[test]
    fn test_center_of_three_minus_two() {
        let layout = HexLayout::default();
        let (x, y) = layout.axial_to_world(Axial::new(3, -2));
        assert_eq!(layout.world_to_axial_int(x, y), Axial::new(3, -2));
    }

    #[test]
    fn test_points_inside_incircle_resolve_to_that_hex() {
        let layout = HexLayout::default();
        let radius = layout.incircle_radius() * 0.95;
        for coord in [Axial::new(0, 0), Axial::new(5, -3), Axial::new(-4, 9)] {
            let (cx, cy) = layout.axial_to_world(coord);
            for step in 0..24 {
                let angle = step as f64 * std::f64::consts::PI / 12.0;
                let x = cx + radius * angle.cos();
                let y = cy + radius * angle.sin();
                assert_eq!(layout.world_to_axial_int(x, y), coord, "angle step {step}");
            }
        }
    }

    #[test]
    fn test_near_vertex_points_stay_inside() {
        // flat-topped: vertices sit at multiples of 60 degrees, side length away
        let layout = HexLayout::default();
        let coord = Axial::new(2, 2);
        let (cx, cy) = layout.axial_to_world(coord);
        for k in 0..6 {
            let angle = k as f64 * std::f64::consts::PI / 3.0;
            let r = layout.side_length() * 0.97;
            let got = layout.world_to_axial_int(cx + r * angle.cos(), cy + r * angle.sin());
            assert_eq!(got, coord, "vertex {k}");
        }
    }

    #[test]
    fn test_shared_edge_resolves_consistently() {
        let layout = HexLayout::default();
        let a = Axial::new(0, 0);
        let b = Axial::new(1, 0);
        let (ax, ay) = layout.axial_to_world(a);
        let (bx, by) = layout.axial_to_world(b);
        let mid = ((ax + bx) / 2.0, (ay + by) / 2.0);

        let first = layout.world_to_axial_int(mid.0, mid.1);
        assert!(first == a || first == b, "got {first}");
        for _ in 0..10 {
            assert_eq!(layout.world_to_axial_int(mid.0, mid.1), first);
        }
    }

    #[test]
    fn test_rounding_stays_on_cube_plane() {
        // independent rounding of (0.4, 0.4, -0.8) gives (0, 0, -1), which is off-plane
        let got = cube_round(0.4, 0.4, -0.8);
        assert!(got == Axial::new(0, 1) || got == Axial::new(1, 0), "got {got}");

        let got = cube_round(0.1, 0.7, -0.8);
        assert_eq!(got, Axial::new(0, 1));
    }

    #[test]
    fn test_halves_round_up() {
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(0.5), 1.0);
        assert_eq!(round_half_up(-1.5), -1.0);
        assert_eq!(round_half_up(-0.49), 0.0);
        assert_eq!(round_half_up(0.49999999999999994), 0.0);
        assert_eq!(round_half_up(2.7), 3.0);

        assert_eq!(cube_round(-0.5, 0.5, 0.0), Axial::new(0, 0));
    }

    #[test]
    fn test_boundary_points_resolve_to_fixed_hex() {
        let layout = HexLayout::default();
        // edges and vertices of hex (0, 0) on its upper left and top
        assert_eq!(layout.world_to_axial_int(-37.5, 21.650635094610966), Axial::new(0, 0));
        assert_eq!(layout.world_to_axial_int(-37.5, -21.650635094610966), Axial::new(0, 0));
        assert_eq!(layout.world_to_axial_int(0.0, -43.30127018922193), Axial::new(0, 0));
        assert_eq!(layout.world_to_axial_int(-112.5, 21.650635094610966), Axial::new(-1, 1));
    }

    #[test]
    fn test_far_points_clamp_to_grid_edge() {
        let layout = HexLayout::default();
        let far = layout.world_to_axial_int(1e12, 0.0);
        assert_eq!(far.p, i32::MAX);
        assert_eq!(layout.world_to_axial_int(f64::NAN, 0.0), Axial::new(0, 0));
    }

    #[test]
    fn test_tile_key_roundtrip() {
        let coord = Axial::new(-12, 7);
        assert_eq!(coord.key(), "-12,7");
        assert_eq!(Axial::from_key("-12,7"), Some(coord));
        assert_eq!(Axial::from_key(" 3 , -4 "), Some(Axial::new(3, -4)));
        assert_eq!(Axial::from_key("3;4"), None);
        assert_eq!(Axial::from_key("a,b"), None);
        assert_eq!(Axial::from_key(""), None);
    }

    #[test]
    fn test_hex_distance() {
        let origin = Axial::new(0, 0);
        assert_eq!(hex_distance(origin, origin), 0);
        assert_eq!(hex_distance(origin, Axial::new(1, -1)), 1);
        assert_eq!(hex_distance(origin, Axial::new(3, -1)), 3);
        assert_eq!(hex_distance(Axial::new(-2, 4), Axial::new(2, 0)), 4);
    }

    #[test]
    fn test_hex_distance_across_whole_range() {
        let low = Axial::new(i32::MIN, 0);
        let high = Axial::new(i32::MAX, 0);
        assert_eq!(hex_distance(low, high), u32::MAX as u64);

        let corner = Axial::new(i32::MAX, i32::MAX);
        let opposite = Axial::new(i32::MIN, i32::MIN);
        // the s component spans twice the i32 range
        assert_eq!(hex_distance(corner, opposite), 2 * u32::MAX as u64);
    }

    proptest! {
        #[test]
        fn prop_center_roundtrip(p in -5_000i32..5_000, q in -5_000i32..5_000) {
            let layout = HexLayout::default();
            let coord = Axial::new(p, q);
            let (x, y) = layout.axial_to_world(coord);
            prop_assert_eq!(layout.world_to_axial_int(x, y), coord);
        }

        #[test]
        fn prop_result_is_nearest_center(x in -10_000.0f64..10_000.0, y in -10_000.0f64..10_000.0) {
            let layout = HexLayout::default();
            let hex = layout.world_to_axial_int(x, y);
            let (cx, cy) = layout.axial_to_world(hex);
            let own = (cx - x).hypot(cy - y);
            for (dp, dq) in [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)] {
                let (nx, ny) = layout.axial_to_world(Axial::new(hex.p + dp, hex.q + dq));
                prop_assert!(own <= (nx - x).hypot(ny - y) + 1e-6);
            }
        }
    }
}

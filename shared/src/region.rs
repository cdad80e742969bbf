//! Batch operations over tiles addressed by axial coordinates
//!
//! None of these functions know what a tile is. Callers hand in closures that
//! read or mutate their own tile storage, which keeps the traversal usable for
//! both the authoritative world and a client's mirror.

use crate::hex::{hex_distance, Axial, HexLayout};
use std::collections::{HashSet, VecDeque};

/// Offsets of the six neighbours of a hex.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)];

/// Hop limit for [`bounded_flood_fill`] used by the editing tools.
pub const DEFAULT_FLOOD_FILL_DEPTH: usize = 1000;

/// Upper bound on the samples taken along one brush stroke.
pub const MAX_STROKE_SAMPLES: usize = 4096;

/// The neighbours of `coord`. Offsets that would leave the `i32` grid are
/// left out, so a hex on the edge of the grid has fewer than six.
pub fn neighbors(coord: Axial) -> Vec<Axial> {
    NEIGHBOR_OFFSETS
        .iter()
        .filter_map(|&(dp, dq)| {
            Some(Axial::new(coord.p.checked_add(dp)?, coord.q.checked_add(dq)?))
        })
        .collect()
}

/// Applies `apply` to `start` and to every hex reachable from it through
/// neighbours accepted by `matches`, up to `max_depth` hops from `start`.
///
/// `matches` is evaluated against the current state of `target`, so a
/// predicate that rejects already-painted tiles stops the fill from
/// re-entering them. Each hex is applied at most once per call. Returns the
/// number of hexes applied.
pub fn bounded_flood_fill<T, M, A>(
    target: &mut T,
    start: Axial,
    mut matches: M,
    mut apply: A,
    max_depth: usize,
) -> usize
where
    T: ?Sized,
    M: FnMut(&T, Axial) -> bool,
    A: FnMut(&mut T, Axial),
{
    let mut visited = HashSet::new();
    let mut frontier = VecDeque::new();

    visited.insert(start);
    frontier.push_back((start, 0usize));

    let mut applied = 0;
    while let Some((coord, depth)) = frontier.pop_front() {
        apply(&mut *target, coord);
        applied += 1;

        if depth >= max_depth {
            continue;
        }

        for next in neighbors(coord) {
            if visited.contains(&next) || !matches(&*target, next) {
                continue;
            }
            visited.insert(next);
            frontier.push_back((next, depth + 1));
        }
    }

    applied
}

/// Applies `apply` to every hex under a drag from `from` to `to`, both in
/// world space.
///
/// The segment is sampled twice per hex step between its endpoints (plus the
/// endpoints themselves) so a fast drag cannot jump over a hex. A hex hit by
/// several samples is applied once. Returns the hexes applied, in stroke order.
///
/// Strokes longer than [`MAX_STROKE_SAMPLES`] samples are thinned to that many
/// evenly spaced samples.
pub fn brush_stroke<A>(layout: &HexLayout, from: (f64, f64), to: (f64, f64), mut apply: A) -> Vec<Axial>
where
    A: FnMut(Axial),
{
    let start = layout.world_to_axial_int(from.0, from.1);
    let end = layout.world_to_axial_int(to.0, to.1);
    // two samples per hex step so a segment grazing a corner still lands in
    // every hex it crosses
    let steps = hex_distance(start, end)
        .saturating_mul(2)
        .clamp(1, MAX_STROKE_SAMPLES as u64) as usize;

    let mut seen = HashSet::new();
    let mut painted = Vec::new();
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = from.0 + (to.0 - from.0) * t;
        let y = from.1 + (to.1 - from.1) * t;
        let coord = layout.world_to_axial_int(x, y);
        if seen.insert(coord) {
            apply(coord);
            painted.push(coord);
        }
    }
    painted
}

/// The hexes painted by a single brush dab: the centre, plus its ring of
/// neighbours for a thick brush.
pub fn brush_footprint(center: Axial, thick: bool) -> Vec<Axial> {
    let mut footprint = vec![center];
    if thick {
        footprint.extend(neighbors(center));
    }
    footprint
}

/// All hexes of a `width` x `height` rectangle of a flat-topped grid, column
/// by column. Every other column is shifted half a hex so the region lines up
/// as a rectangle in world space.
pub fn rectangle(width: u32, height: u32) -> Vec<Axial> {
    let mut coords = Vec::with_capacity(width as usize * height as usize);
    for p in 0..width as i32 {
        let offset = p.div_euclid(2);
        for row in 0..height as i32 {
            coords.push(Axial::new(p, row - offset));
        }
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_neighbors_are_six_distinct() {
        let origin = Axial::new(4, -2);
        let ring = neighbors(origin);
        let unique: HashSet<_> = ring.iter().copied().collect();
        assert_eq!(unique.len(), 6);
        assert!(!unique.contains(&origin));
        for n in ring {
            assert_eq!(hex_distance(origin, n), 1);
        }
    }

    #[test]
    fn test_flood_fill_visits_each_tile_once() {
        let mut grid: HashMap<Axial, u32> = rectangle(10, 10).into_iter().map(|c| (c, 0)).collect();
        let start = Axial::new(0, 0);

        let applied = bounded_flood_fill(
            &mut grid,
            start,
            |g, c| g.contains_key(&c),
            |g, c| {
                if let Some(count) = g.get_mut(&c) {
                    *count += 1;
                }
            },
            DEFAULT_FLOOD_FILL_DEPTH,
        );

        assert_eq!(applied, 100);
        assert!(grid.values().all(|&count| count == 1));
    }

    #[test]
    fn test_flood_fill_stops_at_non_matching() {
        // three columns of land split by a column of water at p = 1
        let mut grid: HashMap<Axial, char> = rectangle(3, 5)
            .into_iter()
            .map(|c| (c, if c.p == 1 { 'w' } else { 'l' }))
            .collect();

        bounded_flood_fill(
            &mut grid,
            Axial::new(0, 0),
            |g, c| g.get(&c) == Some(&'l'),
            |g, c| {
                g.insert(c, 'x');
            },
            DEFAULT_FLOOD_FILL_DEPTH,
        );

        for (coord, terrain) in &grid {
            match coord.p {
                0 => assert_eq!(*terrain, 'x'),
                1 => assert_eq!(*terrain, 'w'),
                _ => assert_eq!(*terrain, 'l'),
            }
        }
    }

    #[test]
    fn test_flood_fill_repaint_same_value_terminates() {
        // painted tiles stop matching, so the fill cannot re-enter them
        let mut grid: HashMap<Axial, char> = rectangle(6, 6).into_iter().map(|c| (c, 'g')).collect();
        let applied = bounded_flood_fill(
            &mut grid,
            Axial::new(2, 0),
            |g, c| g.get(&c) == Some(&'g'),
            |g, c| {
                g.insert(c, 's');
            },
            DEFAULT_FLOOD_FILL_DEPTH,
        );
        assert_eq!(applied, 36);
        assert!(grid.values().all(|&t| t == 's'));
    }

    #[test]
    fn test_flood_fill_depth_bound_on_unbounded_plane() {
        // every coordinate matches; only the depth bound can stop this
        let mut touched: Vec<Axial> = Vec::new();
        let start = Axial::new(0, 0);
        let applied = bounded_flood_fill(&mut touched, start, |_, _| true, |t, c| t.push(c), 5);

        // hexes within 5 steps: 1 + 3 * 5 * 6
        assert_eq!(applied, 91);
        assert!(touched.iter().all(|c| hex_distance(start, *c) <= 5));
    }

    #[test]
    fn test_flood_fill_zero_depth_applies_only_start() {
        let mut touched: Vec<Axial> = Vec::new();
        let applied = bounded_flood_fill(&mut touched, Axial::new(1, 1), |_, _| true, |t, c| t.push(c), 0);
        assert_eq!(applied, 1);
        assert_eq!(touched, vec![Axial::new(1, 1)]);
    }

    #[test]
    fn test_flood_fill_visited_does_not_leak_between_calls() {
        let mut grid: HashMap<Axial, u32> = rectangle(3, 3).into_iter().map(|c| (c, 0)).collect();
        for _ in 0..2 {
            bounded_flood_fill(
                &mut grid,
                Axial::new(0, 0),
                |g, c| g.contains_key(&c),
                |g, c| {
                    if let Some(count) = g.get_mut(&c) {
                        *count += 1;
                    }
                },
                DEFAULT_FLOOD_FILL_DEPTH,
            );
        }
        assert!(grid.values().all(|&count| count == 2));
    }

    #[test]
    fn test_brush_stroke_does_not_skip_hexes() {
        let layout = HexLayout::default();
        let from = layout.axial_to_world(Axial::new(0, 0));
        let to = layout.axial_to_world(Axial::new(8, 0));

        let mut applied = Vec::new();
        let painted = brush_stroke(&layout, from, to, |c| applied.push(c));

        assert_eq!(painted, applied);
        assert_eq!(painted.first(), Some(&Axial::new(0, 0)));
        assert_eq!(painted.last(), Some(&Axial::new(8, 0)));
        for pair in painted.windows(2) {
            assert_eq!(hex_distance(pair[0], pair[1]), 1, "gap between {} and {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_brush_stroke_single_point() {
        let layout = HexLayout::default();
        let point = layout.axial_to_world(Axial::new(-3, 2));
        let painted = brush_stroke(&layout, point, point, |_| {});
        assert_eq!(painted, vec![Axial::new(-3, 2)]);
    }

    #[test]
    fn test_brush_footprint() {
        let center = Axial::new(1, 1);
        assert_eq!(brush_footprint(center, false), vec![center]);

        let thick = brush_footprint(center, true);
        assert_eq!(thick.len(), 7);
        assert_eq!(thick[0], center);
    }

    #[test]
    fn test_rectangle_size_and_uniqueness() {
        let coords = rectangle(7, 4);
        assert_eq!(coords.len(), 28);
        let unique: HashSet<_> = coords.iter().copied().collect();
        assert_eq!(unique.len(), 28);
        assert!(rectangle(0, 5).is_empty());
    }

    #[test]
    fn test_neighbors_at_grid_edge() {
        let corner = Axial::new(i32::MAX, i32::MIN);
        let ring = neighbors(corner);
        // only (-1, 0), (0, 1) and (-1, 1) stay on the grid
        assert_eq!(ring.len(), 3);
        assert!(ring.iter().all(|&n| hex_distance(corner, n) == 1));
        assert_eq!(neighbors(Axial::new(i32::MAX, 0)).len(), 4);
    }

    #[test]
    fn test_flood_fill_from_grid_edge() {
        let mut touched: Vec<Axial> = Vec::new();
        let start = Axial::new(i32::MAX, 0);
        let applied = bounded_flood_fill(&mut touched, start, |_, _| true, |t, c| t.push(c), 2);

        // a radius-2 ball has 19 hexes; the half with p > i32::MAX is cut off
        assert_eq!(applied, 12);
        assert!(touched.iter().all(|c| hex_distance(start, *c) <= 2));
    }

    #[test]
    fn test_brush_stroke_far_apart_endpoints() {
        let layout = HexLayout::default();
        let mut applied = 0;
        let painted = brush_stroke(&layout, (1e12, 0.0), (-1e12, 0.0), |_| applied += 1);

        assert!(!painted.is_empty());
        assert!(painted.len() <= MAX_STROKE_SAMPLES + 1);
        assert_eq!(applied, painted.len());
        let unique: HashSet<_> = painted.iter().copied().collect();
        assert_eq!(unique.len(), painted.len());
    }

    proptest! {
        #[test]
        fn prop_neighbor_relation_is_symmetric(p in -10_000i32..10_000, q in -10_000i32..10_000) {
            let coord = Axial::new(p, q);
            let ring = neighbors(coord);
            let unique: HashSet<_> = ring.iter().copied().collect();
            prop_assert_eq!(unique.len(), 6);
            for n in ring {
                prop_assert!(neighbors(n).contains(&coord));
            }
        }
    }
}

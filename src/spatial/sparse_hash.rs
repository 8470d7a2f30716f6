//! Sparse hash grid for nearest-intersection ray queries

use ahash::AHashMap;
use glam::DVec2;
use ordered_float::OrderedFloat;

use crate::core::types::{Meters, ModelId, Radians};
use crate::spatial::geometry::Footprint;

/// Nearest accepted intersection found by [`SparseHashGrid::query_nearest`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit {
    pub model: ModelId,
    pub range: Meters,
    pub point: DVec2,
}

/// Footprints covering more cells than this skip the grid and are checked
/// by every query instead
pub const MAX_CELLS_PER_ENTRY: usize = 4096;

struct Entry {
    footprint: Footprint,
    cells: Vec<(i32, i32)>,
}

/// Sparse hash grid bucketing model footprints by the cells they overlap
pub struct SparseHashGrid {
    cell_size: f64,
    cells: AHashMap<(i32, i32), Vec<ModelId>>,
    /// Sorted ids of footprints too large to bucket
    oversized: Vec<ModelId>,
    entries: AHashMap<ModelId, Entry>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
            oversized: Vec::new(),
            entries: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: DVec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, model: ModelId) -> bool {
        self.entries.contains_key(&model)
    }

    pub fn footprint(&self, model: ModelId) -> Option<&Footprint> {
        self.entries.get(&model).map(|e| &e.footprint)
    }

    /// Insert a model, or move it if it is already present
    pub fn insert(&mut self, model: ModelId, footprint: Footprint) {
        self.remove(model);

        let (min, max) = footprint.aabb();
        let (x0, y0) = self.cell_coord(min);
        let (x1, y1) = self.cell_coord(max);

        let span_x = i64::from(x1) - i64::from(x0) + 1;
        let span_y = i64::from(y1) - i64::from(y0) + 1;
        let covered = span_x
            .checked_mul(span_y)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| n <= MAX_CELLS_PER_ENTRY);
        let Some(covered) = covered else {
            if let Err(pos) = self.oversized.binary_search(&model) {
                self.oversized.insert(pos, model);
            }
            self.entries.insert(
                model,
                Entry {
                    footprint,
                    cells: Vec::new(),
                },
            );
            return;
        };

        let mut cells = Vec::with_capacity(covered);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                let bucket = self.cells.entry((cx, cy)).or_default();
                // Buckets stay sorted so candidate order never depends on
                // insertion history.
                if let Err(pos) = bucket.binary_search(&model) {
                    bucket.insert(pos, model);
                }
                cells.push((cx, cy));
            }
        }

        self.entries.insert(model, Entry { footprint, cells });
    }

    pub fn remove(&mut self, model: ModelId) -> bool {
        let Some(entry) = self.entries.remove(&model) else {
            return false;
        };
        if let Ok(pos) = self.oversized.binary_search(&model) {
            self.oversized.remove(pos);
        }
        for coord in entry.cells {
            if let Some(bucket) = self.cells.get_mut(&coord) {
                bucket.retain(|&m| m != model);
                if bucket.is_empty() {
                    self.cells.remove(&coord);
                }
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.oversized.clear();
        self.entries.clear();
    }

    /// Nearest footprint hit by a ray and accepted by `accept`
    ///
    /// Cells are visited in ray order and the walk stops once the best hit
    /// lies strictly before the current cell's far boundary. Equal ranges
    /// resolve to the lowest [`ModelId`].
    pub fn query_nearest(
        &self,
        origin: DVec2,
        heading: Radians,
        max_range: Meters,
        mut accept: impl FnMut(ModelId) -> bool,
    ) -> Option<IndexHit> {
        if self.entries.is_empty() || !max_range.is_finite() || max_range < 0.0 {
            return None;
        }

        let dir = DVec2::from_angle(heading);
        let mut best: Option<(OrderedFloat<f64>, ModelId)> = None;

        for &model in &self.oversized {
            self.consider(model, origin, dir, max_range, &mut best, &mut accept);
        }

        let (mut cx, mut cy) = self.cell_coord(origin);
        let (step_x, mut t_next_x, t_delta_x) = self.axis_walk(origin.x, dir.x, cx);
        let (step_y, mut t_next_y, t_delta_y) = self.axis_walk(origin.y, dir.y, cy);

        loop {
            if let Some(bucket) = self.cells.get(&(cx, cy)) {
                for &model in bucket {
                    self.consider(model, origin, dir, max_range, &mut best, &mut accept);
                }
            }

            let cell_exit = t_next_x.min(t_next_y);
            if cell_exit > max_range {
                break;
            }
            if let Some((range, _)) = best {
                if range.0 < cell_exit {
                    break;
                }
            }

            if t_next_x < t_next_y {
                cx += step_x;
                t_next_x += t_delta_x;
            } else {
                cy += step_y;
                t_next_y += t_delta_y;
            }
        }

        best.map(|(range, model)| IndexHit {
            model,
            range: range.0,
            point: origin + dir * range.0,
        })
    }

    /// Replace `best` with `model` if it is hit sooner (or as soon, with a
    /// lower id) and accepted
    fn consider(
        &self,
        model: ModelId,
        origin: DVec2,
        dir: DVec2,
        max_range: Meters,
        best: &mut Option<(OrderedFloat<f64>, ModelId)>,
        accept: &mut impl FnMut(ModelId) -> bool,
    ) {
        let Some(entry) = self.entries.get(&model) else {
            return;
        };
        let Some(range) = entry.footprint.ray_distance(origin, dir, max_range) else {
            return;
        };
        let key = (OrderedFloat(range), model);
        if best.is_some_and(|b| key >= b) {
            return;
        }
        if accept(model) {
            *best = Some(key);
        }
    }

    /// Per-axis DDA setup: (step, distance to first boundary, distance per cell)
    fn axis_walk(&self, origin: f64, dir: f64, cell: i32) -> (i32, f64, f64) {
        if dir > 0.0 {
            let boundary = (cell + 1) as f64 * self.cell_size;
            (1, (boundary - origin) / dir, self.cell_size / dir)
        } else if dir < 0.0 {
            let boundary = cell as f64 * self.cell_size;
            (-1, (boundary - origin) / dir, self.cell_size / -dir)
        } else {
            (0, f64::INFINITY, f64::INFINITY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Geom, Pose, Size};

    fn square(x: f64, y: f64, side: f64) -> Footprint {
        Footprint::from_geom(
            &Pose::new(x, y, 0.0, 0.0),
            &Geom::new(Pose::default(), Size::new(side, side, 1.0)),
        )
    }

    #[test]
    fn test_nearest_of_two_along_ray() {
        let mut grid = SparseHashGrid::new(1.0);
        grid.insert(ModelId(1), square(5.0, 0.0, 1.0));
        grid.insert(ModelId(2), square(2.0, 0.0, 1.0));

        let hit = grid
            .query_nearest(DVec2::ZERO, 0.0, 10.0, |_| true)
            .unwrap();
        assert_eq!(hit.model, ModelId(2));
        assert!((hit.range - 1.5).abs() < 1e-12);
        assert!((hit.point.x - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejected_candidate_is_skipped() {
        let mut grid = SparseHashGrid::new(1.0);
        grid.insert(ModelId(1), square(5.0, 0.0, 1.0));
        grid.insert(ModelId(2), square(2.0, 0.0, 1.0));

        let hit = grid
            .query_nearest(DVec2::ZERO, 0.0, 10.0, |m| m != ModelId(2))
            .unwrap();
        assert_eq!(hit.model, ModelId(1));
    }

    #[test]
    fn test_equal_range_tie_goes_to_lowest_id() {
        let mut grid = SparseHashGrid::new(1.0);
        grid.insert(ModelId(9), square(2.0, 0.0, 1.0));
        grid.insert(ModelId(4), square(2.0, 0.0, 1.0));
        grid.insert(ModelId(7), square(2.0, 0.0, 1.0));

        let hit = grid
            .query_nearest(DVec2::ZERO, 0.0, 10.0, |_| true)
            .unwrap();
        assert_eq!(hit.model, ModelId(4));
    }

    #[test]
    fn test_out_of_range_is_no_hit() {
        let mut grid = SparseHashGrid::new(1.0);
        grid.insert(ModelId(1), square(5.0, 0.0, 1.0));
        assert!(grid.query_nearest(DVec2::ZERO, 0.0, 4.0, |_| true).is_none());
    }

    #[test]
    fn test_negative_direction_walk() {
        let mut grid = SparseHashGrid::new(0.5);
        grid.insert(ModelId(3), square(-3.0, -3.0, 0.5));
        let hit = grid
            .query_nearest(DVec2::ZERO, -3.0 * std::f64::consts::FRAC_PI_4, 10.0, |_| true)
            .unwrap();
        assert_eq!(hit.model, ModelId(3));
    }

    #[test]
    fn test_huge_footprint_is_kept_out_of_the_grid() {
        // 500 m square on a 1 cm grid: far more cells than one entry may cover
        let mut grid = SparseHashGrid::new(0.01);
        grid.insert(ModelId(0), square(0.0, 0.0, 500.0));
        grid.insert(ModelId(1), square(2.0, 0.5, 0.5));
        assert_eq!(grid.len(), 2);
        assert!(grid.cells.len() <= MAX_CELLS_PER_ENTRY);

        // starting inside the ground plane hits it at once
        let hit = grid.query_nearest(DVec2::ZERO, 0.0, 10.0, |_| true).unwrap();
        assert_eq!(hit.model, ModelId(0));
        assert_eq!(hit.range, 0.0);

        // rejecting it falls through to the bucketed box
        let hit = grid
            .query_nearest(DVec2::new(0.0, 0.5), 0.0, 10.0, |m| m != ModelId(0))
            .unwrap();
        assert_eq!(hit.model, ModelId(1));
        assert!((hit.range - 1.75).abs() < 1e-9);

        assert!(grid.remove(ModelId(0)));
        let hit = grid.query_nearest(DVec2::new(0.0, 0.5), 0.0, 10.0, |_| true).unwrap();
        assert_eq!(hit.model, ModelId(1));
    }

    #[test]
    fn test_oversized_ties_with_bucketed_go_to_lowest_id() {
        let mut grid = SparseHashGrid::new(0.01);
        // long wall whose near face is at x = 2, same as the small box's
        grid.insert(ModelId(5), square(2.25, 0.0, 0.5));
        let wall = Footprint::from_geom(
            &Pose::new(52.0, 0.0, 0.0, 0.0),
            &Geom::new(Pose::default(), Size::new(100.0, 100.0, 1.0)),
        );
        grid.insert(ModelId(8), wall);
        grid.insert(ModelId(3), wall);

        let hit = grid.query_nearest(DVec2::ZERO, 0.0, 10.0, |_| true).unwrap();
        assert_eq!(hit.model, ModelId(3));
        assert!((hit.range - 2.0).abs() < 1e-9);

        let hit = grid
            .query_nearest(DVec2::ZERO, 0.0, 10.0, |m| m != ModelId(3) && m != ModelId(8))
            .unwrap();
        assert_eq!(hit.model, ModelId(5));
    }

    #[test]
    fn test_move_and_remove() {
        let mut grid = SparseHashGrid::new(1.0);
        grid.insert(ModelId(1), square(2.0, 0.0, 1.0));
        grid.insert(ModelId(1), square(0.0, 8.0, 1.0));
        assert_eq!(grid.len(), 1);
        assert!(grid.query_nearest(DVec2::ZERO, 0.0, 10.0, |_| true).is_none());

        assert!(grid.remove(ModelId(1)));
        assert!(!grid.remove(ModelId(1)));
        assert!(grid.is_empty());
    }
}

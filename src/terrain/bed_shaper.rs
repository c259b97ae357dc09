//! Incremental road bed shaping.
//!
//! A [`BedShapingJob`] rewrites heightmap samples near taken areas of one type,
//! pulling them toward the height of the nearest centerline. The job is
//! resumable: each [`BedShapingJob::tick`] processes whole rows until the slice
//! budget runs out and returns, keeping the next row and a frozen copy of the
//! pre-pass heights. Splitting a pass over any number of ticks gives the same
//! result as running it in one go.

use super::taken_area::{nearest_of_type, NearestMatch, TakenAreaType};
use super::HeightMap;
use crate::map::Map;
use crate::resources::{BuildPreferences, RoadSettings};
use bevy::prelude::*;
use std::time::{Duration, Instant};

/// Added to the squared padding so zero padding still catches exact hits
pub const PADDING_EPSILON: f32 = 1e-5;

/// Shape of the bed carved around one kind of taken area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedParams {
    /// Width of the falloff band beyond `radius`
    pub padding: f32,
    /// Radius of the fully carved core around the centerline
    pub radius: f32,
    /// Vertical offset applied at the centerline
    pub offset_y: f32,
    /// 0 keeps the sample's own slope, 1 flattens it to the centerline height
    pub horizontality: f32,
    pub area_type: TakenAreaType,
    /// Also search the neighbor cell across the nearest edge
    pub smooth_ends: bool,
}

impl BedParams {
    pub fn from_settings(settings: &RoadSettings) -> Self {
        Self {
            padding: settings.bed_padding.get(),
            radius: settings.road_radius.get(),
            offset_y: settings.bed_offset_y.get(),
            horizontality: settings.bed_horizontality.get(),
            area_type: TakenAreaType::Road,
            smooth_ends: settings.features.contains(crate::roads::RoadFeatures::SMOOTH_ENDS),
        }
    }

    pub fn threshold_sq(&self) -> f32 {
        self.padding * self.padding + PADDING_EPSILON
    }

    /// New height of a sample at squared distance `dist_sq` from the bed core.
    ///
    /// At distance zero the sample takes the full offset; at `threshold_sq` it
    /// keeps `my_h` exactly.
    pub fn blend(&self, my_h: f32, center_h: f32, dist_sq: f32) -> f32 {
        let h = lerp(my_h, center_h, self.horizontality);
        lerp(h + self.offset_y, my_h, dist_sq / self.threshold_sq())
    }
}

/// `a` at `t == 0`, exactly `b` at `t == 1`
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// How much work a single tick may do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBudget {
    pub max_duty: Duration,
    /// Rows between two clock checks
    pub rows_per_check: u32,
}

impl SliceBudget {
    /// Budget that never suspends
    pub const UNLIMITED: SliceBudget = SliceBudget {
        max_duty: Duration::MAX,
        rows_per_check: u32::MAX,
    };
}

impl From<&BuildPreferences> for SliceBudget {
    fn from(preferences: &BuildPreferences) -> Self {
        Self {
            max_duty: preferences.duty_per_frame(),
            rows_per_check: preferences.rows_per_budget_check.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapingProgress {
    /// Budget ran out; the next tick resumes at `next_row`
    Suspended { next_row: u32 },
    Finished,
}

impl ShapingProgress {
    pub fn is_finished(self) -> bool {
        matches!(self, ShapingProgress::Finished)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapingStats {
    pub samples_touched: u64,
    pub slices: u32,
    pub rows: u32,
    pub elapsed: Duration,
}

/// One resumable shaping pass over a heightmap
#[derive(Debug, Resource)]
pub struct BedShapingJob {
    params: BedParams,
    snapshot: Vec<f32>,
    width: u32,
    height: u32,
    next_row: u32,
    finished: bool,
    stats: ShapingStats,
}

impl BedShapingJob {
    /// Start a pass, freezing the current heights as the read source
    pub fn new(heightmap: &HeightMap, params: BedParams) -> Self {
        Self {
            params,
            snapshot: heightmap.heights.clone(),
            width: heightmap.width,
            height: heightmap.height,
            next_row: 1,
            finished: heightmap.width < 3 || heightmap.height < 3,
            stats: ShapingStats::default(),
        }
    }

    pub fn params(&self) -> &BedParams {
        &self.params
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stats(&self) -> ShapingStats {
        self.stats
    }

    /// Process rows until the pass ends or the budget is spent.
    ///
    /// The clock is read every `rows_per_check` rows, so a slice always ends on
    /// a row boundary and a zero budget still makes progress.
    pub fn tick(&mut self, map: &Map, heightmap: &mut HeightMap, budget: &SliceBudget) -> ShapingProgress {
        if self.finished {
            return ShapingProgress::Finished;
        }
        if heightmap.width != self.width
            || heightmap.height != self.height
            || heightmap.heights.len() != self.snapshot.len()
        {
            warn!(
                "Heightmap changed from {}x{} to {}x{} during bed shaping, pass abandoned",
                self.width, self.height, heightmap.width, heightmap.height
            );
            self.finished = true;
            return ShapingProgress::Finished;
        }

        let started = Instant::now();
        let last_row = self.height - 1;
        let rows_per_check = budget.rows_per_check.max(1);
        let mut rows_in_slice = 0u32;

        while self.next_row < last_row {
            self.stats.samples_touched += self.shape_row(map, heightmap, self.next_row);
            self.next_row += 1;
            rows_in_slice += 1;

            if self.next_row < last_row
                && rows_in_slice % rows_per_check == 0
                && started.elapsed() >= budget.max_duty
            {
                break;
            }
        }

        let elapsed = started.elapsed();
        self.stats.slices += 1;
        self.stats.rows += rows_in_slice;
        self.stats.elapsed += elapsed;
        debug!(
            "Bed shaping slice {}: {} rows in {:.3} ms",
            self.stats.slices,
            rows_in_slice,
            elapsed.as_secs_f64() * 1000.0
        );

        if self.next_row < last_row {
            return ShapingProgress::Suspended {
                next_row: self.next_row,
            };
        }

        self.finished = true;
        info!(
            "Road bed shaped: {} samples touched over {} slices ({:.2} ms)",
            self.stats.samples_touched,
            self.stats.slices,
            self.stats.elapsed.as_secs_f64() * 1000.0
        );
        ShapingProgress::Finished
    }

    /// Run the remaining rows without suspending
    pub fn run_to_completion(&mut self, map: &Map, heightmap: &mut HeightMap) -> ShapingStats {
        while !self.tick(map, heightmap, &SliceBudget::UNLIMITED).is_finished() {}
        self.stats
    }

    fn shape_row(&self, map: &Map, heightmap: &mut HeightMap, j: u32) -> u64 {
        let mut touched = 0;
        for i in 1..self.width - 1 {
            let point = heightmap.sample_to_world(i, j);
            let Some(found) = self.find_match(map, point) else {
                continue;
            };

            let (ci, cj) = heightmap.world_to_sample(found.point);
            let center_h = self.snapshot[heightmap.index(ci, cj)];
            let index = heightmap.index(i, j);
            let my_h = self.snapshot[index];
            heightmap.heights[index] = self.params.blend(my_h, center_h, found.dist_sq);
            touched += 1;
        }
        touched
    }

    /// Nearest taken area within the padding threshold, if any
    fn find_match(&self, map: &Map, point: Vec2) -> Option<NearestMatch> {
        let geometry = map.geometry();
        let threshold = self.params.threshold_sq();
        let within = |m: &NearestMatch| m.dist_sq <= threshold;
        let query = |hex| {
            map.get(hex).and_then(|cell| {
                nearest_of_type(&cell.taken_areas, self.params.area_type, point, self.params.radius)
            })
        };

        let hex = geometry.point_to_hex(point);
        let found = query(hex).filter(within);
        if found.is_some() || !self.params.smooth_ends {
            return found;
        }

        // the area may be stored in the cell across the nearest edge
        let neighbor = geometry.neighbor(hex, geometry.point_to_edge(hex, point));
        query(neighbor).filter(within)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GeometryKind, GridCoord};
    use crate::map::test_support::flat_map;
    use crate::terrain::taken_area::TakenArea;

    fn params() -> BedParams {
        BedParams {
            padding: 1.5,
            radius: 0.7,
            offset_y: -0.3,
            horizontality: 1.0,
            area_type: TakenAreaType::Road,
            smooth_ends: false,
        }
    }

    /// Rect map (cells 2 wide) with a straight road through row 2 along z = 4
    fn road_map() -> Map {
        let mut map = flat_map(GeometryKind::Rect, 5);
        for x in 1..=3 {
            let from = Vec2::new(2.0 * x as f32 - 1.0, 4.0);
            let to = Vec2::new(2.0 * x as f32 + 1.0, 4.0);
            map.get_mut(GridCoord::new(x, 2))
                .unwrap()
                .taken_areas
                .push(TakenArea::new(from, to, 0.7, TakenAreaType::Road));
        }
        map
    }

    fn sloped_heightmap() -> HeightMap {
        let heights = (0..81)
            .map(|k| {
                let (i, j) = ((k % 9) as f32, (k / 9) as f32);
                0.1 * i + 0.05 * j * j + (i * j).sin() * 0.2
            })
            .collect();
        HeightMap::new(9, 9, heights, 1.0).unwrap()
    }

    #[test]
    fn test_blend_boundary_keeps_original_height() {
        let p = params();
        assert_eq!(p.blend(3.25, 1.0, p.threshold_sq()), 3.25);
        assert_eq!(p.blend(3.25, 1.0, 0.0), 1.0 - 0.3);
    }

    #[test]
    fn test_samples_on_road_take_offset() {
        let map = road_map();
        let mut heightmap = HeightMap::create_flat(9, 9, 1.0, 0.0).unwrap();
        let stats = BedShapingJob::new(&heightmap, params()).run_to_completion(&map, &mut heightmap);

        assert!(stats.samples_touched > 0);
        assert_eq!(heightmap.get(4, 4), Some(-0.3));
        assert_eq!(heightmap.get(2, 4), Some(-0.3));
        // owned by an unroaded cell and smooth ends disabled
        assert_eq!(heightmap.get(4, 5), Some(0.0));
        assert_eq!(heightmap.get(4, 7), Some(0.0));
        // the border ring is never written
        assert_eq!(heightmap.get(0, 4), Some(0.0));
    }

    #[test]
    fn test_smooth_ends_searches_neighbor_cell() {
        let map = road_map();
        let mut heightmap = HeightMap::create_flat(9, 9, 1.0, 0.0).unwrap();
        let params = BedParams {
            smooth_ends: true,
            ..params()
        };
        BedShapingJob::new(&heightmap, params).run_to_completion(&map, &mut heightmap);

        let h = heightmap.get(4, 5).unwrap();
        assert!(h < 0.0 && h > -0.3, "partially carved, got {h}");
        assert_eq!(heightmap.get(4, 7), Some(0.0));
    }

    #[test]
    fn test_flat_pass_is_idempotent() {
        let map = road_map();
        let mut heightmap = HeightMap::create_flat(9, 9, 1.0, 2.0).unwrap();
        let params = BedParams {
            offset_y: 0.0,
            ..params()
        };
        BedShapingJob::new(&heightmap, params).run_to_completion(&map, &mut heightmap);
        let once = heightmap.heights.clone();
        BedShapingJob::new(&heightmap, params).run_to_completion(&map, &mut heightmap);

        for (a, b) in once.iter().zip(&heightmap.heights) {
            assert!((a - 2.0).abs() < 1e-5);
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sliced_pass_matches_single_pass() {
        let map = road_map();
        let mut whole = sloped_heightmap();
        BedShapingJob::new(&whole, params()).run_to_completion(&map, &mut whole);

        let mut sliced = sloped_heightmap();
        let mut job = BedShapingJob::new(&sliced, params());
        let budget = SliceBudget {
            max_duty: Duration::ZERO,
            rows_per_check: 1,
        };
        let mut suspensions = 0;
        while let ShapingProgress::Suspended { next_row } = job.tick(&map, &mut sliced, &budget) {
            assert!(next_row > 1 && next_row < 8);
            suspensions += 1;
        }

        assert_eq!(suspensions, 6);
        assert_eq!(job.stats().slices, 7);
        assert_eq!(job.stats().rows, 7);
        assert_eq!(whole.heights, sliced.heights);
        assert_ne!(whole.heights, sloped_heightmap().heights);
    }

    #[test]
    fn test_finished_job_stays_finished() {
        let map = road_map();
        let mut heightmap = HeightMap::create_flat(9, 9, 1.0, 0.0).unwrap();
        let mut job = BedShapingJob::new(&heightmap, params());
        assert!(job.tick(&map, &mut heightmap, &SliceBudget::UNLIMITED).is_finished());
        let before = heightmap.heights.clone();
        assert!(job.tick(&map, &mut heightmap, &SliceBudget::UNLIMITED).is_finished());
        assert_eq!(job.stats().slices, 1);
        assert_eq!(before, heightmap.heights);
    }

    #[test]
    fn test_resized_heightmap_abandons_pass() {
        let map = road_map();
        let heightmap = HeightMap::create_flat(9, 9, 1.0, 0.0).unwrap();
        let mut job = BedShapingJob::new(&heightmap, params());
        let mut other = HeightMap::create_flat(5, 5, 1.0, 0.0).unwrap();
        assert!(job.tick(&map, &mut other, &SliceBudget::UNLIMITED).is_finished());
        assert!(other.heights.iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_budget_from_preferences() {
        let budget = SliceBudget::from(&BuildPreferences::default());
        assert_eq!(budget.rows_per_check, 10);
        assert!(budget.max_duty > Duration::ZERO);
    }
}

//! Static world geometry and the collision queries the actor core makes against it.
//!
//! Instead of iterating over every solid for each query, solids are bucketed in a spatial
//! hash on the XZ plane. Column and proximity queries only visit the buckets they overlap.

use bevy::prelude::*;
use std::collections::HashMap;

/// Size of each spatial grid cell in world units.
/// Should be roughly the size of the most common solid footprint.
pub const SPATIAL_CELL_SIZE: f32 = 8.0;

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap: touching faces do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Whether the XZ rectangle of this box overlaps the rectangle `[min, max]`.
    pub fn overlaps_footprint(&self, min: Vec2, max: Vec2) -> bool {
        self.min.x <= max.x && self.max.x >= min.x && self.min.z <= max.y && self.max.z >= min.y
    }

    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        point.clamp(self.min, self.max).distance_squared(point)
    }
}

/// What a piece of static geometry is. Blocks and buildings double as cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolidKind {
    Block,
    Building,
    Prop,
}

impl SolidKind {
    pub fn is_occluder(&self) -> bool {
        matches!(self, SolidKind::Block | SolidKind::Building)
    }
}

/// A single static solid in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Solid {
    pub bounds: Aabb,
    pub kind: SolidKind,
}

impl Solid {
    pub fn new(kind: SolidKind, bounds: Aabb) -> Self {
        Self { bounds, kind }
    }

    /// A solid resting on `base_y`, centered on `(x, z)`.
    pub fn placed(kind: SolidKind, x: f32, z: f32, base_y: f32, size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(
            kind,
            Aabb::new(
                Vec3::new(x - half.x, base_y, z - half.z),
                Vec3::new(x + half.x, base_y + size.y, z + half.z),
            ),
        )
    }

    pub fn top(&self) -> f32 {
        self.bounds.max.y
    }

    pub fn center(&self) -> Vec3 {
        self.bounds.center()
    }
}

/// Read-only geometry queries used by the physics, movement and cover search code.
pub trait CollisionWorld {
    /// Solids whose XZ extent overlaps the footprint centered on `center`.
    fn query_column(&self, center: Vec2, half_extents: Vec2) -> Vec<Solid>;

    /// Solids that come within `radius` of `position`.
    fn query_near(&self, position: Vec3, radius: f32) -> Vec<Solid>;
}

/// Spatial hash grid over static solids.
#[derive(Resource, Default, Debug, Clone)]
pub struct SolidGrid {
    /// Map from grid cell (x, z) to indices of solids overlapping that cell.
    cells: HashMap<(i32, i32), Vec<usize>>,
    solids: Vec<Solid>,
}

impl SolidGrid {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn world_to_cell(x: f32, z: f32) -> (i32, i32) {
        (
            (x / SPATIAL_CELL_SIZE).floor() as i32,
            (z / SPATIAL_CELL_SIZE).floor() as i32,
        )
    }

    pub fn insert(&mut self, solid: Solid) {
        let min_cell = Self::world_to_cell(solid.bounds.min.x, solid.bounds.min.z);
        let max_cell = Self::world_to_cell(solid.bounds.max.x, solid.bounds.max.z);

        let idx = self.solids.len();
        self.solids.push(solid);

        for cx in min_cell.0..=max_cell.0 {
            for cz in min_cell.1..=max_cell.1 {
                self.cells.entry((cx, cz)).or_default().push(idx);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.solids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Solid> {
        self.solids.iter()
    }

    /// Indices of solids registered in any cell overlapping `[min, max]`, deduplicated.
    fn candidates(&self, min: Vec2, max: Vec2) -> Vec<usize> {
        let min_cell = Self::world_to_cell(min.x, min.y);
        let max_cell = Self::world_to_cell(max.x, max.y);
        let mut indices: Vec<usize> = (min_cell.0..=max_cell.0)
            .flat_map(|cx| (min_cell.1..=max_cell.1).map(move |cz| (cx, cz)))
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .collect();

        // Insertion order, each solid once.
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl CollisionWorld for SolidGrid {
    fn query_column(&self, center: Vec2, half_extents: Vec2) -> Vec<Solid> {
        let min = center - half_extents;
        let max = center + half_extents;
        self.candidates(min, max)
            .into_iter()
            .map(|idx| self.solids[idx])
            .filter(|solid| solid.bounds.overlaps_footprint(min, max))
            .collect()
    }

    fn query_near(&self, position: Vec3, radius: f32) -> Vec<Solid> {
        let center = Vec2::new(position.x, position.z);
        let reach = Vec2::splat(radius.max(0.0));
        let radius_sq = radius * radius;
        self.candidates(center - reach, center + reach)
            .into_iter()
            .map(|idx| self.solids[idx])
            .filter(|solid| solid.bounds.distance_squared_to_point(position) <= radius_sq)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_at(x: f32, z: f32) -> Solid {
        Solid::placed(SolidKind::Block, x, z, 0.0, Vec3::ONE)
    }

    #[test]
    fn column_query_finds_solid_under_footprint() {
        let mut grid = SolidGrid::new();
        grid.insert(block_at(0.5, 0.5));
        grid.insert(block_at(20.5, 0.5));

        let hits = grid.query_column(Vec2::new(0.7, 0.7), Vec2::splat(0.3));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].top(), 1.0);

        assert!(grid.query_column(Vec2::new(10.0, 10.0), Vec2::splat(0.3)).is_empty());
    }

    #[test]
    fn near_query_crosses_cell_boundaries() {
        let mut grid = SolidGrid::new();
        // Sits in a different cell than the query point.
        grid.insert(block_at(9.0, 0.5));

        let hits = grid.query_near(Vec3::new(7.0, 0.5, 0.5), 2.0);
        assert_eq!(hits.len(), 1);
        assert!(grid.query_near(Vec3::new(7.0, 0.5, 0.5), 1.0).is_empty());
    }

    #[test]
    fn large_solid_is_reported_once() {
        let mut grid = SolidGrid::new();
        grid.insert(Solid::placed(SolidKind::Building, 0.0, 0.0, 0.0, Vec3::new(30.0, 6.0, 30.0)));

        assert_eq!(grid.query_near(Vec3::ZERO, 50.0).len(), 1);
        assert_eq!(grid.query_column(Vec2::ZERO, Vec2::splat(20.0)).len(), 1);
    }

    #[test]
    fn wide_query_lists_each_solid_once_in_insertion_order() {
        let mut grid = SolidGrid::new();
        grid.insert(Solid::placed(SolidKind::Building, 20.0, 20.0, 0.0, Vec3::new(30.0, 6.0, 30.0)));
        grid.insert(block_at(-15.0, 0.5));
        grid.insert(Solid::placed(SolidKind::Building, -20.0, -20.0, 0.0, Vec3::new(16.0, 6.0, 16.0)));

        let kinds: Vec<_> = grid.query_near(Vec3::ZERO, 40.0).iter().map(|s| s.kind).collect();
        assert_eq!(kinds, [SolidKind::Building, SolidKind::Block, SolidKind::Building]);
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(!a.intersects(&b));
        let c = Aabb::new(Vec3::new(0.9, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&c));
    }
}

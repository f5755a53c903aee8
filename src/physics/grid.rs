// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Hierarchical occupancy grid (octree) traversal.
//!
//! An [`OccupancyGrid`] is itself a leaf payload a [`crate::physics::BroadphaseManager`]
//! can track like any other object (via its enclosing world-space AABB), but
//! it can also be queried directly for the finer-grained overlap its own
//! internal subdivision carries — useful for voxelized terrain or destructible
//! geometry where the coarse AABB alone would accept far too many false
//! positives.

use crate::math::{AffineTransform, Aabb};

/// A node in an octree-shaped occupancy grid: either a uniform cell (a leaf,
/// fully free or fully/partially solid) or eight children covering its
/// octants.
#[derive(Debug, Clone)]
struct GridCell {
    bounds: Aabb,
    occupancy: f32,
    children: Option<Box<[GridCell; 8]>>,
}

impl GridCell {
    fn leaf(bounds: Aabb, occupancy: f32) -> Self {
        Self {
            bounds,
            occupancy,
            children: None,
        }
    }

    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }
        let center = self.bounds.center();
        let min = self.bounds.min;
        let max = self.bounds.max;
        let mk = |lo: crate::math::Vec3, hi: crate::math::Vec3| {
            GridCell::leaf(Aabb::from_min_max(lo, hi), self.occupancy)
        };
        use crate::math::Vec3;
        let children = [
            mk(min, center),
            mk(Vec3::new(center.x, min.y, min.z), Vec3::new(max.x, center.y, center.z)),
            mk(Vec3::new(min.x, center.y, min.z), Vec3::new(center.x, max.y, center.z)),
            mk(Vec3::new(center.x, center.y, min.z), Vec3::new(max.x, max.y, center.z)),
            mk(Vec3::new(min.x, min.y, center.z), Vec3::new(center.x, center.y, max.z)),
            mk(Vec3::new(center.x, min.y, center.z), Vec3::new(max.x, center.y, max.z)),
            mk(Vec3::new(min.x, center.y, center.z), Vec3::new(center.x, max.y, max.z)),
            mk(center, max),
        ];
        self.children = Some(Box::new(children));
    }

    fn mark_occupied(&mut self, region: &Aabb, occupancy: f32, depth_budget: u32) {
        if !self.bounds.intersects_aabb(region) {
            return;
        }
        if depth_budget == 0 || region.contains_aabb(&self.bounds) {
            self.occupancy = occupancy;
            self.children = None;
            return;
        }
        self.subdivide();
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.mark_occupied(region, occupancy, depth_budget - 1);
            }
        }
        self.occupancy = self.average_child_occupancy();
    }

    fn average_child_occupancy(&self) -> f32 {
        match &self.children {
            Some(children) => {
                children.iter().map(|c| c.occupancy).sum::<f32>() / children.len() as f32
            }
            None => self.occupancy,
        }
    }

    /// Finds the solid cell (by `threshold_occupied`) nearest to `query` by
    /// AABB-to-AABB distance, descending nearer-child-first and pruning any
    /// child whose own distance already exceeds the best found so far.
    fn nearest(&self, query: &Aabb, threshold_occupied: f32, best: &mut Option<(Aabb, f32)>) {
        let dist = self.bounds.distance_aabb(query);
        if let Some((_, best_dist)) = best {
            if dist >= *best_dist {
                return;
            }
        }
        if self.occupancy < threshold_occupied {
            return;
        }

        match &self.children {
            None => *best = Some((self.bounds, dist)),
            Some(children) => {
                let mut ordered: [usize; 8] = std::array::from_fn(|i| i);
                ordered.sort_by(|&a, &b| {
                    let da = children[a].bounds.distance_aabb(query);
                    let db = children[b].bounds.distance_aabb(query);
                    da.partial_cmp(&db).unwrap()
                });
                for idx in ordered {
                    children[idx].nearest(query, threshold_occupied, best);
                }
            }
        }
    }

    /// Visits solid cells (by `threshold_occupied`) intersecting `query`,
    /// descending only while the cost of treating a cell as an opaque leaf
    /// (its volume weighted by `cost_density`) exceeds the cost of
    /// recursing into its children.
    fn query(
        &self,
        query: &Aabb,
        cost_density: f32,
        threshold_occupied: f32,
        callback: &mut dyn FnMut(Aabb) -> bool,
    ) -> bool {
        if !self.bounds.intersects_aabb(query) {
            return true;
        }
        if self.occupancy < threshold_occupied {
            return true;
        }

        match &self.children {
            None => callback(self.bounds),
            Some(children) => {
                let leaf_cost = self.bounds.surface_area() * cost_density;
                let recurse_cost: f32 =
                    children.iter().map(|c| c.bounds.surface_area()).sum::<f32>() * cost_density * 0.5;
                if leaf_cost <= recurse_cost {
                    return callback(self.bounds);
                }
                for child in children.iter() {
                    if !child.query(query, cost_density, threshold_occupied, callback) {
                        return false;
                    }
                }
                true
            }
        }
    }
}

/// A hierarchical occupancy grid usable as a broad-phase leaf payload.
///
/// Geometry is recorded in the grid's own local space; queries carry a
/// [`AffineTransform`] describing where the grid currently sits in world
/// space. When that transform's rotation is the identity, the query AABB is
/// transformed into local space by a plain translation; otherwise the exact
/// oriented box is computed by transforming the query AABB's corners, which
/// is the one case this traversal pays the full rotation cost for.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    root: GridCell,
    max_depth: u32,
}

impl OccupancyGrid {
    /// Creates an empty (fully free) occupancy grid over `bounds`, allowing
    /// subdivision up to `max_depth` octree levels.
    pub fn new(bounds: Aabb, max_depth: u32) -> Self {
        Self {
            root: GridCell::leaf(bounds, 0.0),
            max_depth,
        }
    }

    /// Returns the grid's overall local-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.root.bounds
    }

    /// Marks `region` (in the grid's local space) as occupied to the given
    /// density, subdividing as needed up to the grid's configured depth.
    pub fn mark_occupied(&mut self, region: Aabb, occupancy: f32) {
        self.root.mark_occupied(&region, occupancy, self.max_depth);
    }

    /// Visits every solid cell overlapping `query_world`, a world-space
    /// AABB, given the grid's current `transform`. `callback` receives each
    /// solid cell's world-space bounds and returns `false` to stop early.
    pub fn query(
        &self,
        query_world: &Aabb,
        transform: &AffineTransform,
        cost_density: f32,
        threshold_occupied: f32,
        mut callback: impl FnMut(Aabb) -> bool,
    ) {
        let local_query = if transform.rotation().dot(crate::math::Quaternion::IDENTITY) >= 1.0 - crate::math::EPSILON
        {
            // Pure translation: shift the query into local space directly.
            query_world.translated(-transform.translation())
        } else {
            // General case: transform the query AABB's eight corners into
            // local space via the inverse transform and re-derive an AABB.
            match transform.inverse() {
                Some(inv) => transform_aabb(query_world, &inv),
                None => *query_world,
            }
        };

        self.root.query(&local_query, cost_density, threshold_occupied, &mut |local_bounds| {
            let world_bounds = transform_aabb(&local_bounds, transform);
            callback(world_bounds)
        });
    }

    /// Finds the solid cell nearest to `query_world` by AABB-to-AABB
    /// distance, returning its world-space bounds and that distance. Mirrors
    /// [`Self::query`]'s local-space transform handling, but descends
    /// nearest-child-first with branch-and-bound pruning instead of the
    /// cost-density leaf/recurse comparison, since there's no "stop early"
    /// signal from a single running minimum the way there is for overlap.
    pub fn nearest(
        &self,
        query_world: &Aabb,
        transform: &AffineTransform,
        threshold_occupied: f32,
    ) -> Option<(Aabb, f32)> {
        let local_query = if transform.rotation().dot(crate::math::Quaternion::IDENTITY) >= 1.0 - crate::math::EPSILON
        {
            query_world.translated(-transform.translation())
        } else {
            match transform.inverse() {
                Some(inv) => transform_aabb(query_world, &inv),
                None => *query_world,
            }
        };

        let mut best = None;
        self.root.nearest(&local_query, threshold_occupied, &mut best);
        best.map(|(local_bounds, dist)| (transform_aabb(&local_bounds, transform), dist))
    }
}

fn transform_aabb(aabb: &Aabb, transform: &AffineTransform) -> Aabb {
    let mat: crate::math::Mat4 = (*transform).into();
    aabb.transform(&mat)
}

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

//! Tunable parameters governing a [`crate::physics::BroadphaseManager`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables governing rebalance strategy selection and octree query
/// dispatch, collected so every one of them is a field a caller can read
/// and change rather than a hardcoded constant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BroadphaseConfig {
    /// Threshold on `height - log2(leaf_count)` above which `setup()` chooses
    /// a full top-down rebuild over incremental rebalancing.
    pub max_tree_nonbalanced_level: i32,
    /// Number of local rotations `setup()` performs per call when the tree
    /// is within the incremental-balance regime.
    pub tree_incremental_balance_pass: u32,
    /// Leaf-count threshold at which a top-down rebuild stops recursively
    /// splitting and folds the remaining leaves into a flat chain instead.
    pub tree_topdown_balance_threshold: usize,
    /// Recursion depth (0 at the root) below which a top-down rebuild picks
    /// each split's median with a single quickselect pass instead of fully
    /// sorting the partition. `0` keeps every depth on the exact sort; a
    /// larger value trades precision for speed on the widest, shallowest
    /// splits, where the leaf count being partitioned is largest.
    pub tree_topdown_level: u32,
    /// Recursion depth at which the initial top-down build triggered by
    /// `register_objects` on an empty manager stops splitting further and
    /// folds the remaining leaves into a flat chain, regardless of how many
    /// are left. `0` disables the cap (the initial build recurses down to
    /// `tree_topdown_balance_threshold` like any other rebuild).
    pub tree_init_level: u32,
    /// When `true`, a registered occupancy-grid object is queried as an
    /// opaque AABB leaf on overlap queries rather than being dispatched to
    /// the specialized hierarchical-grid traversal.
    pub octree_as_geometry_collide: bool,
    /// Same as `octree_as_geometry_collide`, but for distance queries.
    pub octree_as_geometry_distance: bool,
    /// Margin by which a freshly registered or reinserted tight AABB is
    /// fattened before it becomes a leaf's stored AABB. Not part of the
    /// tunable surface proper, but kept configurable here rather than a
    /// hardcoded constant since the right margin is scene-scale dependent.
    pub fat_aabb_margin: f32,
    /// Multiplier applied to an object's center-to-center displacement when
    /// padding its fattened AABB predictively in the direction of motion.
    /// Same rationale as `fat_aabb_margin`.
    pub displacement_multiplier: f32,
    /// Default surface-area cost density used by an occupancy-grid query
    /// when the grid itself doesn't carry a per-node override.
    pub octree_cost_density: f32,
    /// Default occupancy threshold above which a grid cell is treated as
    /// solid by an occupancy-grid query.
    pub octree_threshold_occupied: f32,
}

impl Default for BroadphaseConfig {
    fn default() -> Self {
        Self {
            max_tree_nonbalanced_level: 10,
            tree_incremental_balance_pass: 10,
            tree_topdown_balance_threshold: 2,
            tree_topdown_level: 0,
            tree_init_level: 0,
            octree_as_geometry_collide: true,
            octree_as_geometry_distance: false,
            fat_aabb_margin: 0.1,
            displacement_multiplier: 2.0,
            octree_cost_density: 1.0,
            octree_threshold_occupied: 0.5,
        }
    }
}

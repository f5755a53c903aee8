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

//! # Dynamic AABB Tree
//!
//! A spatial partitioning structure for broad-phase collision detection: an
//! incrementally balanced binary tree of enlarged ("fat") AABBs, plus the
//! top-down rebuild used when incremental rotations can no longer keep the
//! tree within its balance budget.
//!
//! The tree owns its nodes in a flat arena addressed by stable integer
//! handles (a free list recycles removed slots) so the cyclic parent/child
//! links never need `Rc`/`RefCell` or unsafe pointer juggling.

use crate::math::{Aabb, Vec3};

const NULL_NODE: i32 = -1;

#[derive(Debug, Clone)]
struct TreeNode<T> {
    aabb: Aabb,
    user_data: Option<T>,
    parent: i32,
    children: [i32; 2],
    height: i32,
}

impl<T> TreeNode<T> {
    #[inline]
    fn is_leaf(&self) -> bool {
        self.children[0] == NULL_NODE
    }
}

/// A dynamic AABB tree mapping opaque leaf payloads to enlarged bounding
/// boxes, supporting logarithmic-expected insert/remove/update and the
/// pairwise and single-query traversals built on top of it.
#[derive(Debug, Clone)]
pub struct DynamicTree<T> {
    root: i32,
    nodes: Vec<TreeNode<T>>,
    free_list: i32,
    leaf_count: usize,
}

impl<T> Default for DynamicTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DynamicTree<T> {
    /// Creates a new, empty dynamic tree.
    pub fn new() -> Self {
        Self {
            root: NULL_NODE,
            nodes: Vec::new(),
            free_list: NULL_NODE,
            leaf_count: 0,
        }
    }

    /// Returns the number of leaves (tracked objects) in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Returns `true` if the tree has no leaves.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Returns the height of the tree (0 for an empty or single-leaf tree).
    pub fn height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root as usize].height
        }
    }

    /// Returns the root node's fat AABB, if the tree is non-empty.
    pub fn root_aabb(&self) -> Option<Aabb> {
        if self.root == NULL_NODE {
            None
        } else {
            Some(self.nodes[self.root as usize].aabb)
        }
    }

    /// Returns the stored fat AABB for a leaf.
    pub fn leaf_aabb(&self, leaf: i32) -> Aabb {
        self.nodes[leaf as usize].aabb
    }

    /// Overwrites a leaf's stored AABB directly, without fattening,
    /// reinsertion, or touching ancestors. Callers doing a batch of these
    /// must follow up with [`Self::refit`] to bring internal AABBs back in
    /// sync before querying.
    pub fn set_leaf_aabb(&mut self, leaf: i32, aabb: Aabb) {
        debug_assert!(self.nodes[leaf as usize].is_leaf());
        self.nodes[leaf as usize].aabb = aabb;
    }

    /// Inserts a new leaf (pre-fattened by the caller) and returns its handle.
    pub fn insert(&mut self, fat_aabb: Aabb, user_data: T) -> i32 {
        let leaf = self.allocate_node();
        self.nodes[leaf as usize].aabb = fat_aabb;
        self.nodes[leaf as usize].user_data = Some(user_data);
        self.nodes[leaf as usize].height = 0;

        self.insert_leaf(leaf);
        self.leaf_count += 1;
        leaf
    }

    /// Removes a leaf from the tree, returning its stored payload.
    pub fn remove(&mut self, leaf: i32) -> T {
        debug_assert!(leaf != NULL_NODE);
        debug_assert!(self.nodes[leaf as usize].is_leaf());

        self.remove_leaf(leaf);
        let data = self.nodes[leaf as usize].user_data.take().unwrap();
        self.deallocate_node(leaf);
        self.leaf_count -= 1;
        data
    }

    /// Updates a leaf's fat AABB if `tight_aabb` has escaped the current
    /// fattened volume, re-fattening with `margin` plus a predictive pad
    /// along `displacement` scaled by `displacement_multiplier`.
    ///
    /// Returns `true` if the tree was actually touched (the leaf moved
    /// within the hierarchy), mirroring the "no reinsertion needed" fast
    /// path: a small pose change that stays inside the fat AABB costs
    /// nothing beyond the containment check.
    pub fn update(
        &mut self,
        leaf: i32,
        tight_aabb: Aabb,
        displacement: Vec3,
        margin: f32,
        displacement_multiplier: f32,
        force_update: bool,
    ) -> bool {
        debug_assert!(leaf != NULL_NODE);
        debug_assert!(self.nodes[leaf as usize].is_leaf());

        if !force_update && self.nodes[leaf as usize].aabb.contains_aabb(&tight_aabb) {
            return false;
        }

        self.remove_leaf(leaf);

        let extension = Vec3::ONE * margin;
        let mut fat_aabb = Aabb {
            min: tight_aabb.min - extension,
            max: tight_aabb.max + extension,
        };

        let d = displacement * displacement_multiplier;
        if d.x < 0.0 {
            fat_aabb.min.x += d.x;
        } else {
            fat_aabb.max.x += d.x;
        }
        if d.y < 0.0 {
            fat_aabb.min.y += d.y;
        } else {
            fat_aabb.max.y += d.y;
        }
        if d.z < 0.0 {
            fat_aabb.min.z += d.z;
        } else {
            fat_aabb.max.z += d.z;
        }

        self.nodes[leaf as usize].aabb = fat_aabb;
        self.insert_leaf(leaf);
        true
    }

    /// Returns a reference to the payload stored at `leaf`.
    pub fn get(&self, leaf: i32) -> &T {
        self.nodes[leaf as usize].user_data.as_ref().unwrap()
    }

    /// Replaces the payload stored at `leaf` without touching its geometry.
    pub fn set_payload(&mut self, leaf: i32, data: T) {
        self.nodes[leaf as usize].user_data = Some(data);
    }

    /// Visits every leaf payload in the tree; `callback` returns `false` to
    /// stop the traversal early.
    pub fn visit_leaves<F>(&self, mut callback: F)
    where
        F: FnMut(&T) -> bool,
    {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            if node.is_leaf() {
                if !callback(node.user_data.as_ref().unwrap()) {
                    return;
                }
            } else {
                stack.push(node.children[0]);
                stack.push(node.children[1]);
            }
        }
    }

    /// Enumerates every pair of leaves whose fat AABBs overlap within this
    /// single tree. `callback` returns `true` to stop the walk immediately;
    /// no further pairs are reported once it does.
    pub fn query_pairs<F>(&self, mut callback: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        if self.root == NULL_NODE {
            return;
        }
        self.self_collision_recurse(self.root, &mut callback);
    }

    /// Enumerates every pair of leaves, one drawn from `self` and one from
    /// `other`, whose fat AABBs overlap. Same early-stop contract as
    /// [`Self::query_pairs`].
    pub fn query_pairs_with<F>(&self, other: &DynamicTree<T>, mut callback: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        if self.root == NULL_NODE || other.root == NULL_NODE {
            return;
        }
        self.overlap_recurse_cross(self.root, other, other.root, &mut callback);
    }

    /// Returns `true` if the walk was stopped by `callback`.
    fn self_collision_recurse<F>(&self, index: i32, callback: &mut F) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        let node = &self.nodes[index as usize];
        if node.is_leaf() {
            return false;
        }
        let (left, right) = (node.children[0], node.children[1]);

        if self.self_collision_recurse(left, callback) {
            return true;
        }
        if self.self_collision_recurse(right, callback) {
            return true;
        }
        self.overlap_recurse(left, right, callback)
    }

    /// Returns `true` if `callback` asked to stop.
    fn overlap_recurse<F>(&self, i_a: i32, i_b: i32, callback: &mut F) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        let node_a = &self.nodes[i_a as usize];
        let node_b = &self.nodes[i_b as usize];

        if !node_a.aabb.intersects_aabb(&node_b.aabb) {
            return false;
        }

        if node_a.is_leaf() && node_b.is_leaf() {
            if i_a == i_b {
                return false;
            }
            return callback(
                node_a.user_data.as_ref().unwrap(),
                node_b.user_data.as_ref().unwrap(),
            );
        }

        if node_a.is_leaf() {
            if self.overlap_recurse(i_a, node_b.children[0], callback) {
                return true;
            }
            self.overlap_recurse(i_a, node_b.children[1], callback)
        } else if node_b.is_leaf() {
            if self.overlap_recurse(node_a.children[0], i_b, callback) {
                return true;
            }
            self.overlap_recurse(node_a.children[1], i_b, callback)
        } else {
            // Descend into whichever side has the larger volume first; the
            // heuristic doesn't change correctness, only how quickly
            // non-overlapping subtrees get pruned.
            let area_a = node_a.aabb.surface_area();
            let area_b = node_b.aabb.surface_area();
            if area_a > area_b {
                if self.overlap_recurse(node_a.children[0], i_b, callback) {
                    return true;
                }
                self.overlap_recurse(node_a.children[1], i_b, callback)
            } else {
                if self.overlap_recurse(i_a, node_b.children[0], callback) {
                    return true;
                }
                self.overlap_recurse(i_a, node_b.children[1], callback)
            }
        }
    }

    /// Returns `true` if `callback` asked to stop.
    fn overlap_recurse_cross<F>(
        &self,
        i_a: i32,
        other: &DynamicTree<T>,
        i_b: i32,
        callback: &mut F,
    ) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        let node_a = &self.nodes[i_a as usize];
        let node_b = &other.nodes[i_b as usize];

        if !node_a.aabb.intersects_aabb(&node_b.aabb) {
            return false;
        }

        if node_a.is_leaf() && node_b.is_leaf() {
            return callback(
                node_a.user_data.as_ref().unwrap(),
                node_b.user_data.as_ref().unwrap(),
            );
        }

        if node_a.is_leaf() {
            if self.overlap_recurse_cross(i_a, other, node_b.children[0], callback) {
                return true;
            }
            self.overlap_recurse_cross(i_a, other, node_b.children[1], callback)
        } else if node_b.is_leaf() {
            if self.overlap_recurse_cross(node_a.children[0], other, i_b, callback) {
                return true;
            }
            self.overlap_recurse_cross(node_a.children[1], other, i_b, callback)
        } else {
            let area_a = node_a.aabb.surface_area();
            let area_b = node_b.aabb.surface_area();
            if area_a > area_b {
                if self.overlap_recurse_cross(node_a.children[0], other, i_b, callback) {
                    return true;
                }
                self.overlap_recurse_cross(node_a.children[1], other, i_b, callback)
            } else {
                if self.overlap_recurse_cross(i_a, other, node_b.children[0], callback) {
                    return true;
                }
                self.overlap_recurse_cross(i_a, other, node_b.children[1], callback)
            }
        }
    }

    /// Runs the self-distance traversal: visits candidate pairs
    /// nearest-first, seeded with `initial_min_dist` (typically
    /// `f32::INFINITY`), pruning any branch whose AABB-to-AABB distance
    /// already exceeds the running `min_dist`. `callback` may shrink
    /// `min_dist` to prune more aggressively and returns `true` to stop the
    /// walk immediately.
    pub fn for_each_pair_by_distance<F>(&self, initial_min_dist: f32, mut callback: F)
    where
        F: FnMut(&T, &T, &mut f32) -> bool,
    {
        if self.root == NULL_NODE {
            return;
        }
        let mut min_dist = initial_min_dist;
        self.self_distance_recurse(self.root, &mut min_dist, &mut callback);
    }

    /// Cross-tree counterpart of [`Self::for_each_pair_by_distance`], pairing
    /// every leaf of `self` against every leaf of `other`.
    pub fn for_each_pair_by_distance_with<F>(
        &self,
        other: &DynamicTree<T>,
        initial_min_dist: f32,
        mut callback: F,
    ) where
        F: FnMut(&T, &T, &mut f32) -> bool,
    {
        if self.root == NULL_NODE || other.root == NULL_NODE {
            return;
        }
        let mut min_dist = initial_min_dist;
        self.distance_recurse_cross(self.root, other, other.root, &mut min_dist, &mut callback);
    }

    fn self_distance_recurse<F>(&self, index: i32, min_dist: &mut f32, callback: &mut F) -> bool
    where
        F: FnMut(&T, &T, &mut f32) -> bool,
    {
        let node = &self.nodes[index as usize];
        if node.is_leaf() {
            return false;
        }
        let (left, right) = (node.children[0], node.children[1]);

        if self.self_distance_recurse(left, min_dist, callback) {
            return true;
        }
        if self.self_distance_recurse(right, min_dist, callback) {
            return true;
        }
        self.distance_recurse_pair(left, right, min_dist, callback)
    }

    /// Returns `true` if `callback` asked to stop.
    fn distance_recurse_pair<F>(
        &self,
        i_a: i32,
        i_b: i32,
        min_dist: &mut f32,
        callback: &mut F,
    ) -> bool
    where
        F: FnMut(&T, &T, &mut f32) -> bool,
    {
        let node_a = &self.nodes[i_a as usize];
        let node_b = &self.nodes[i_b as usize];

        if node_a.aabb.distance_aabb(&node_b.aabb) > *min_dist {
            return false;
        }

        if node_a.is_leaf() && node_b.is_leaf() {
            if i_a == i_b {
                return false;
            }
            return callback(
                node_a.user_data.as_ref().unwrap(),
                node_b.user_data.as_ref().unwrap(),
                min_dist,
            );
        }

        // Same descent-side rule as overlap: expand the side that isn't a
        // leaf, preferring the larger of two internal nodes.
        let descend_a = node_b.is_leaf() || (!node_a.is_leaf() && node_a.aabb.surface_area() > node_b.aabb.surface_area());

        if descend_a {
            let (c0, c1) = (node_a.children[0], node_a.children[1]);
            let d0 = self.nodes[c0 as usize].aabb.distance_aabb(&node_b.aabb);
            let d1 = self.nodes[c1 as usize].aabb.distance_aabb(&node_b.aabb);
            let (nearer, farther, farther_dist) = if d0 <= d1 { (c0, c1, d1) } else { (c1, c0, d0) };
            if self.distance_recurse_pair(nearer, i_b, min_dist, callback) {
                return true;
            }
            if farther_dist > *min_dist {
                return false;
            }
            self.distance_recurse_pair(farther, i_b, min_dist, callback)
        } else {
            let (c0, c1) = (node_b.children[0], node_b.children[1]);
            let d0 = node_a.aabb.distance_aabb(&self.nodes[c0 as usize].aabb);
            let d1 = node_a.aabb.distance_aabb(&self.nodes[c1 as usize].aabb);
            let (nearer, farther, farther_dist) = if d0 <= d1 { (c0, c1, d1) } else { (c1, c0, d0) };
            if self.distance_recurse_pair(i_a, nearer, min_dist, callback) {
                return true;
            }
            if farther_dist > *min_dist {
                return false;
            }
            self.distance_recurse_pair(i_a, farther, min_dist, callback)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn distance_recurse_cross<F>(
        &self,
        i_a: i32,
        other: &DynamicTree<T>,
        i_b: i32,
        min_dist: &mut f32,
        callback: &mut F,
    ) -> bool
    where
        F: FnMut(&T, &T, &mut f32) -> bool,
    {
        let node_a = &self.nodes[i_a as usize];
        let node_b = &other.nodes[i_b as usize];

        if node_a.aabb.distance_aabb(&node_b.aabb) > *min_dist {
            return false;
        }

        if node_a.is_leaf() && node_b.is_leaf() {
            return callback(
                node_a.user_data.as_ref().unwrap(),
                node_b.user_data.as_ref().unwrap(),
                min_dist,
            );
        }

        let descend_a = node_b.is_leaf() || (!node_a.is_leaf() && node_a.aabb.surface_area() > node_b.aabb.surface_area());

        if descend_a {
            let (c0, c1) = (node_a.children[0], node_a.children[1]);
            let d0 = self.nodes[c0 as usize].aabb.distance_aabb(&node_b.aabb);
            let d1 = self.nodes[c1 as usize].aabb.distance_aabb(&node_b.aabb);
            let (nearer, farther, farther_dist) = if d0 <= d1 { (c0, c1, d1) } else { (c1, c0, d0) };
            if self.distance_recurse_cross(nearer, other, i_b, min_dist, callback) {
                return true;
            }
            if farther_dist > *min_dist {
                return false;
            }
            self.distance_recurse_cross(farther, other, i_b, min_dist, callback)
        } else {
            let (c0, c1) = (node_b.children[0], node_b.children[1]);
            let d0 = node_a.aabb.distance_aabb(&other.nodes[c0 as usize].aabb);
            let d1 = node_a.aabb.distance_aabb(&other.nodes[c1 as usize].aabb);
            let (nearer, farther, farther_dist) = if d0 <= d1 { (c0, c1, d1) } else { (c1, c0, d0) };
            if self.distance_recurse_cross(i_a, other, nearer, min_dist, callback) {
                return true;
            }
            if farther_dist > *min_dist {
                return false;
            }
            self.distance_recurse_cross(i_a, other, farther, min_dist, callback)
        }
    }

    /// Finds the pair of leaves within this tree with the smallest
    /// AABB-to-AABB distance, pruning subtrees whose minimum possible
    /// distance already exceeds the best distance found so far.
    pub fn closest_pair(&self) -> Option<(&T, &T, f32)>
    where
        T: Clone,
    {
        if self.root == NULL_NODE || self.nodes[self.root as usize].is_leaf() {
            return None;
        }

        let mut best: Option<(i32, i32, f32)> = None;
        let mut stack: Vec<(i32, i32)> = Vec::with_capacity(256);
        stack.push((self.root, self.root));

        while let Some((i_a, i_b)) = stack.pop() {
            self.distance_recurse(i_a, i_b, &mut best, &mut stack, true);
        }

        best.map(|(a, b, d)| {
            (
                self.nodes[a as usize].user_data.as_ref().unwrap(),
                self.nodes[b as usize].user_data.as_ref().unwrap(),
                d,
            )
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn distance_recurse(
        &self,
        i_a: i32,
        i_b: i32,
        best: &mut Option<(i32, i32, f32)>,
        stack: &mut Vec<(i32, i32)>,
        self_traversal: bool,
    ) {
        let node_a = &self.nodes[i_a as usize];
        let node_b = &self.nodes[i_b as usize];

        let dist = node_a.aabb.distance_aabb(&node_b.aabb);
        if let Some((_, _, best_dist)) = best {
            if dist > *best_dist {
                return;
            }
        }

        if node_a.is_leaf() && node_b.is_leaf() {
            if self_traversal && i_a == i_b {
                return;
            }
            let better = match best {
                Some((_, _, best_dist)) => dist < *best_dist,
                None => true,
            };
            if better {
                *best = Some((i_a, i_b, dist));
            }
        } else if node_a.is_leaf() {
            stack.push((i_a, node_b.children[0]));
            stack.push((i_a, node_b.children[1]));
        } else if node_b.is_leaf() {
            stack.push((node_a.children[0], i_b));
            stack.push((node_a.children[1], i_b));
        } else {
            stack.push((node_a.children[0], node_b.children[0]));
            stack.push((node_a.children[0], node_b.children[1]));
            stack.push((node_a.children[1], node_b.children[0]));
            stack.push((node_a.children[1], node_b.children[1]));
        }
    }

    /// Finds the closest pair between a leaf of `self` and a leaf of `other`.
    pub fn closest_pair_with(&self, other: &DynamicTree<T>) -> Option<(&T, &T, f32)> {
        if self.root == NULL_NODE || other.root == NULL_NODE {
            return None;
        }

        let mut best: Option<(i32, i32, f32)> = None;
        let mut stack: Vec<(i32, i32)> = Vec::with_capacity(256);
        stack.push((self.root, other.root));

        while let Some((i_a, i_b)) = stack.pop() {
            let node_a = &self.nodes[i_a as usize];
            let node_b = &other.nodes[i_b as usize];

            let dist = node_a.aabb.distance_aabb(&node_b.aabb);
            if let Some((_, _, best_dist)) = best {
                if dist > best_dist {
                    continue;
                }
            }

            if node_a.is_leaf() && node_b.is_leaf() {
                let better = match best {
                    Some((_, _, best_dist)) => dist < best_dist,
                    None => true,
                };
                if better {
                    best = Some((i_a, i_b, dist));
                }
            } else if node_a.is_leaf() {
                stack.push((i_a, node_b.children[0]));
                stack.push((i_a, node_b.children[1]));
            } else if node_b.is_leaf() {
                stack.push((node_a.children[0], i_b));
                stack.push((node_a.children[1], i_b));
            } else {
                stack.push((node_a.children[0], node_b.children[0]));
                stack.push((node_a.children[0], node_b.children[1]));
                stack.push((node_a.children[1], node_b.children[0]));
                stack.push((node_a.children[1], node_b.children[1]));
            }
        }

        best.map(|(a, b, d)| {
            (
                self.nodes[a as usize].user_data.as_ref().unwrap(),
                other.nodes[b as usize].user_data.as_ref().unwrap(),
                d,
            )
        })
    }

    /// Visits every leaf whose fat AABB overlaps `aabb`; `callback` returns
    /// `false` to stop the traversal early.
    pub fn query<F>(&self, aabb: &Aabb, mut callback: F)
    where
        F: FnMut(&T) -> bool,
    {
        if self.root == NULL_NODE {
            return;
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            if node.aabb.intersects_aabb(aabb) {
                if node.is_leaf() {
                    if !callback(node.user_data.as_ref().unwrap()) {
                        return;
                    }
                } else {
                    stack.push(node.children[0]);
                    stack.push(node.children[1]);
                }
            }
        }
    }

    /// Finds the leaf nearest to `aabb` by AABB-to-AABB distance, along with
    /// that distance.
    pub fn query_nearest(&self, aabb: &Aabb) -> Option<(&T, f32)> {
        if self.root == NULL_NODE {
            return None;
        }

        let mut best: Option<(i32, f32)> = None;
        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            let dist = node.aabb.distance_aabb(aabb);
            if let Some((_, best_dist)) = best {
                if dist >= best_dist {
                    continue;
                }
            }
            if node.is_leaf() {
                best = Some((node_id, dist));
            } else {
                stack.push(node.children[0]);
                stack.push(node.children[1]);
            }
        }

        best.map(|(id, d)| (self.nodes[id as usize].user_data.as_ref().unwrap(), d))
    }

    /// Recomputes every internal AABB bottom-up from the current leaf AABBs
    /// without changing the tree's shape. Used after a batch of leaf AABBs
    /// were mutated directly (not applicable through `update`, which already
    /// keeps ancestors in sync) and as a cheap sanity pass after a top-down
    /// rebuild.
    pub fn refit(&mut self) {
        if self.root == NULL_NODE {
            return;
        }
        self.refit_recurse(self.root);
    }

    fn refit_recurse(&mut self, index: i32) {
        if self.nodes[index as usize].is_leaf() {
            return;
        }
        let child1 = self.nodes[index as usize].children[0];
        let child2 = self.nodes[index as usize].children[1];
        self.refit_recurse(child1);
        self.refit_recurse(child2);
        self.update_node_meta(index);
    }

    /// Performs at most `passes` local rotations, walking down from the root
    /// and rotating at every internal node whose children's heights differ
    /// by more than one (the same single-rotation `balance` step insertion
    /// and removal already apply along their ancestor chains, just run here
    /// as a standalone sweep). Does not change the leaf set.
    ///
    /// This is the cheap per-frame counterpart to [`Self::rebuild_top_down`]:
    /// `O(passes)` instead of `O(n log n)`, at the cost of only fixing
    /// imbalance local to the nodes it happens to visit.
    pub fn balance_incremental(&mut self, passes: u32) {
        if self.root == NULL_NODE || passes == 0 {
            return;
        }

        let mut budget = passes;
        let mut stack: Vec<i32> = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(index) = stack.pop() {
            if budget == 0 {
                break;
            }
            if self.nodes[index as usize].is_leaf() {
                continue;
            }
            let balanced = self.balance(index);
            budget -= 1;

            let node = &self.nodes[balanced as usize];
            stack.push(node.children[0]);
            stack.push(node.children[1]);
        }
    }

    /// Rebuilds the tree from scratch using repeated centroid-median splits,
    /// replacing the incrementally-rotated shape with a balanced one. This
    /// is `O(n log n)` and is reserved for when incremental rotations have
    /// let the tree drift outside its balance budget (see
    /// `max_tree_nonbalanced_level` in [`crate::physics::BroadphaseConfig`]).
    ///
    /// Chains shorter than `min_nodes` are left as a flat linear list rather
    /// than recursed into further, since median-splitting a handful of
    /// leaves buys nothing over a direct scan.
    ///
    /// `topdown_level` is the recursion depth (0 at the root) below which
    /// each split skips sorting the whole partition and instead picks the
    /// median with a single quickselect pass: the shallowest calls touch the
    /// most leaves, so that's where skipping the full sort pays off most,
    /// while the smaller partitions further down keep the exact centroid
    /// ordering. `0` (the default) keeps every depth on the exact sort.
    pub fn rebuild_top_down(&mut self, min_nodes: usize, topdown_level: u32) {
        self.rebuild_top_down_inner(min_nodes, topdown_level, u32::MAX);
    }

    /// Same as [`Self::rebuild_top_down`], but also caps recursion depth at
    /// `init_level` (`0` means uncapped): once a split reaches that depth,
    /// the remaining leaves are folded into a flat chain regardless of how
    /// many are left. Used for the initial top-down construction of a
    /// freshly populated tree, where a shallower starting shape is
    /// preferred over paying for the full recursion down to
    /// `min_nodes`-sized chains.
    pub fn rebuild_top_down_at_level(&mut self, min_nodes: usize, topdown_level: u32, init_level: u32) {
        let depth_cap = if init_level == 0 { u32::MAX } else { init_level };
        self.rebuild_top_down_inner(min_nodes, topdown_level, depth_cap);
    }

    fn rebuild_top_down_inner(&mut self, min_nodes: usize, topdown_level: u32, depth_cap: u32) {
        if self.leaf_count < 2 {
            return;
        }

        let mut leaves: Vec<i32> = Vec::with_capacity(self.leaf_count);
        self.collect_leaves(self.root, &mut leaves);

        self.root = self.build_median_split(&mut leaves, min_nodes, 0, topdown_level, depth_cap);
        self.nodes[self.root as usize].parent = NULL_NODE;
    }

    fn collect_leaves(&self, index: i32, out: &mut Vec<i32>) {
        if index == NULL_NODE {
            return;
        }
        if self.nodes[index as usize].is_leaf() {
            out.push(index);
        } else {
            let children = self.nodes[index as usize].children;
            self.collect_leaves(children[0], out);
            self.collect_leaves(children[1], out);
        }
    }

    fn build_median_split(
        &mut self,
        leaves: &mut [i32],
        min_nodes: usize,
        depth: u32,
        topdown_level: u32,
        depth_cap: u32,
    ) -> i32 {
        if leaves.len() == 1 {
            return leaves[0];
        }

        if leaves.len() <= min_nodes || depth >= depth_cap {
            // Terminal chain: fold the remaining leaves left-to-right rather
            // than continuing to split a handful of nodes.
            let mut acc = leaves[0];
            for &leaf in &leaves[1..] {
                acc = self.join(acc, leaf);
            }
            return acc;
        }

        let mut bounds = self.nodes[leaves[0] as usize].aabb;
        for &leaf in leaves.iter().skip(1) {
            bounds = bounds.merge(&self.nodes[leaf as usize].aabb);
        }
        let extents = bounds.size();
        let axis = if extents.x > extents.y && extents.x > extents.z {
            0
        } else if extents.y > extents.z {
            1
        } else {
            2
        };

        let centroid = |nodes: &[TreeNode<T>], i: i32| -> f32 {
            let c = nodes[i as usize].aabb.center();
            match axis {
                0 => c.x,
                1 => c.y,
                _ => c.z,
            }
        };

        let mid = leaves.len() / 2;
        if depth < topdown_level {
            // Quickselect: partitions the slice around the median without
            // fully ordering either half, cheaper than a full sort for the
            // wide partitions near the root.
            let nodes = &self.nodes;
            leaves.select_nth_unstable_by(mid, |&a, &b| {
                centroid(nodes, a).partial_cmp(&centroid(nodes, b)).unwrap()
            });
        } else {
            let nodes = &self.nodes;
            leaves.sort_by(|&a, &b| {
                centroid(nodes, a).partial_cmp(&centroid(nodes, b)).unwrap()
            });
        }

        let (left, right) = leaves.split_at_mut(mid);
        let left_root = self.build_median_split(left, min_nodes, depth + 1, topdown_level, depth_cap);
        let right_root = self.build_median_split(right, min_nodes, depth + 1, topdown_level, depth_cap);
        self.join(left_root, right_root)
    }

    fn join(&mut self, a: i32, b: i32) -> i32 {
        let parent = self.allocate_node();
        self.nodes[parent as usize].children = [a, b];
        self.nodes[parent as usize].aabb = self.nodes[a as usize].aabb.merge(&self.nodes[b as usize].aabb);
        self.nodes[parent as usize].height =
            1 + self.nodes[a as usize].height.max(self.nodes[b as usize].height);
        self.nodes[a as usize].parent = parent;
        self.nodes[b as usize].parent = parent;
        parent
    }

    // --- Internal leaf management ---

    fn insert_leaf(&mut self, leaf: i32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[self.root as usize].parent = NULL_NODE;
            return;
        }

        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let node = &self.nodes[index as usize];
            let child1 = node.children[0];
            let child2 = node.children[1];

            let area = node.aabb.surface_area();
            let combined_aabb = node.aabb.merge(&leaf_aabb);
            let combined_area = combined_aabb.surface_area();

            let cost = 2.0 * combined_area;
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost1 = {
                let child1_node = &self.nodes[child1 as usize];
                let new_area = child1_node.aabb.merge(&leaf_aabb).surface_area();
                if child1_node.is_leaf() {
                    new_area + inheritance_cost
                } else {
                    let old_area = child1_node.aabb.surface_area();
                    (new_area - old_area) + inheritance_cost
                }
            };

            let cost2 = {
                let child2_node = &self.nodes[child2 as usize];
                let new_area = child2_node.aabb.merge(&leaf_aabb).surface_area();
                if child2_node.is_leaf() {
                    new_area + inheritance_cost
                } else {
                    let old_area = child2_node.aabb.surface_area();
                    (new_area - old_area) + inheritance_cost
                }
            };

            if cost < cost1 && cost < cost2 {
                break;
            }

            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;

        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.allocate_node();
        self.nodes[new_parent as usize].parent = old_parent;
        self.nodes[new_parent as usize].user_data = None;
        self.nodes[new_parent as usize].aabb = leaf_aabb.merge(&self.nodes[sibling as usize].aabb);
        self.nodes[new_parent as usize].height = self.nodes[sibling as usize].height + 1;

        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].children[0] == sibling {
                self.nodes[old_parent as usize].children[0] = new_parent;
            } else {
                self.nodes[old_parent as usize].children[1] = new_parent;
            }
            self.nodes[new_parent as usize].children[0] = sibling;
            self.nodes[new_parent as usize].children[1] = leaf;
            self.nodes[sibling as usize].parent = new_parent;
            self.nodes[leaf as usize].parent = new_parent;
        } else {
            self.nodes[new_parent as usize].children[0] = sibling;
            self.nodes[new_parent as usize].children[1] = leaf;
            self.nodes[sibling as usize].parent = new_parent;
            self.nodes[leaf as usize].parent = new_parent;
            self.root = new_parent;
        }

        index = self.nodes[leaf as usize].parent;
        while index != NULL_NODE {
            index = self.balance(index);

            let child1 = self.nodes[index as usize].children[0];
            let child2 = self.nodes[index as usize].children[1];

            debug_assert!(child1 != NULL_NODE);
            debug_assert!(child2 != NULL_NODE);

            self.update_node_meta(index);

            index = self.nodes[index as usize].parent;
        }
    }

    fn remove_leaf(&mut self, leaf: i32) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grand_parent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].children[0] == leaf {
            self.nodes[parent as usize].children[1]
        } else {
            self.nodes[parent as usize].children[0]
        };

        if grand_parent != NULL_NODE {
            if self.nodes[grand_parent as usize].children[0] == parent {
                self.nodes[grand_parent as usize].children[0] = sibling;
            } else {
                self.nodes[grand_parent as usize].children[1] = sibling;
            }
            self.nodes[sibling as usize].parent = grand_parent;
            self.deallocate_node(parent);

            let mut index = grand_parent;
            while index != NULL_NODE {
                index = self.balance(index);
                self.update_node_meta(index);
                index = self.nodes[index as usize].parent;
            }
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL_NODE;
            self.deallocate_node(parent);
        }
    }

    // --- Node allocation (free-list arena) ---

    fn allocate_node(&mut self) -> i32 {
        if self.free_list != NULL_NODE {
            let index = self.free_list;
            self.free_list = self.nodes[index as usize].parent;
            self.nodes[index as usize].parent = NULL_NODE;
            self.nodes[index as usize].children = [NULL_NODE, NULL_NODE];
            self.nodes[index as usize].height = 0;
            index
        } else {
            let index = self.nodes.len() as i32;
            self.nodes.push(TreeNode {
                aabb: Aabb::INVALID,
                user_data: None,
                parent: NULL_NODE,
                children: [NULL_NODE, NULL_NODE],
                height: 0,
            });
            index
        }
    }

    fn deallocate_node(&mut self, index: i32) {
        debug_assert!(index != NULL_NODE);
        self.nodes[index as usize].parent = self.free_list;
        self.nodes[index as usize].user_data = None;
        self.free_list = index;
    }

    // --- Balancing (AVL-style single rotation) ---

    fn balance(&mut self, i_a: i32) -> i32 {
        debug_assert!(i_a != NULL_NODE);

        let node_a = &self.nodes[i_a as usize];
        if node_a.is_leaf() || node_a.height < 2 {
            return i_a;
        }

        let i_b = node_a.children[0];
        let i_c = node_a.children[1];

        let balance = self.nodes[i_c as usize].height - self.nodes[i_b as usize].height;

        if balance > 1 {
            return self.rotate(i_a, i_c, 1);
        }
        if balance < -1 {
            return self.rotate(i_a, i_b, 0);
        }

        i_a
    }

    /// Rotates `i_up`'s subtree up to replace `i_a`. `up_child_slot` is
    /// which of `i_a`'s children `i_up` was (1 for the right child "C", 0
    /// for the left child "B"), which selects which of `i_a`'s slots gets
    /// backfilled by `i_up`'s displaced grandchild.
    fn rotate(&mut self, i_a: i32, i_up: i32, up_child_slot: usize) -> i32 {
        let i_f = self.nodes[i_up as usize].children[0];
        let i_g = self.nodes[i_up as usize].children[1];

        self.nodes[i_up as usize].children[0] = i_a;
        self.nodes[i_up as usize].parent = self.nodes[i_a as usize].parent;
        self.nodes[i_a as usize].parent = i_up;

        if self.nodes[i_up as usize].parent != NULL_NODE {
            let p = self.nodes[i_up as usize].parent;
            if self.nodes[p as usize].children[0] == i_a {
                self.nodes[p as usize].children[0] = i_up;
            } else {
                self.nodes[p as usize].children[1] = i_up;
            }
        } else {
            self.root = i_up;
        }

        let vacated_a_slot = up_child_slot;
        if self.nodes[i_f as usize].height > self.nodes[i_g as usize].height {
            self.nodes[i_up as usize].children[1] = i_f;
            self.nodes[i_a as usize].children[vacated_a_slot] = i_g;
            self.nodes[i_g as usize].parent = i_a;
        } else {
            self.nodes[i_up as usize].children[1] = i_g;
            self.nodes[i_a as usize].children[vacated_a_slot] = i_f;
            self.nodes[i_f as usize].parent = i_a;
        }

        self.update_node_meta(i_a);
        self.update_node_meta(i_up);

        i_up
    }

    fn update_node_meta(&mut self, index: i32) {
        let child1 = self.nodes[index as usize].children[0];
        let child2 = self.nodes[index as usize].children[1];
        self.nodes[index as usize].aabb = self.nodes[child1 as usize]
            .aabb
            .merge(&self.nodes[child2 as usize].aabb);
        self.nodes[index as usize].height =
            1 + self.nodes[child1 as usize].height.max(self.nodes[child2 as usize].height);
    }
}

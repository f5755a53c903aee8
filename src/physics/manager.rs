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

//! The broad-phase manager: lifecycle and query entry points over a
//! [`DynamicTree`] plus its [`ObjectTable`].

use crate::math::{AffineTransform, Aabb, Vec3};
use crate::physics::config::BroadphaseConfig;
use crate::physics::error::BroadphaseError;
use crate::physics::grid::OccupancyGrid;
use crate::physics::object::{CollisionObject, GeometryKind};
use crate::physics::table::ObjectTable;
use crate::physics::tree::DynamicTree;

fn fatten(aabb: Aabb, margin: f32) -> Aabb {
    let extension = Vec3::ONE * margin;
    Aabb {
        min: aabb.min - extension,
        max: aabb.max + extension,
    }
}

/// A dynamic AABB tree broad-phase collision manager.
///
/// Owns a [`DynamicTree`] keyed by object identity through an
/// [`ObjectTable`], and exposes the registration, update, and query surface
/// applications drive per frame. `T` is the caller's opaque leaf payload —
/// typically a small `Copy`/`Clone` handle into the caller's own object
/// storage, not the full narrow-phase geometry itself.
#[derive(Debug, Clone)]
pub struct BroadphaseManager<T: CollisionObject> {
    tree: DynamicTree<T>,
    table: ObjectTable<T>,
    config: BroadphaseConfig,
    /// Tracks whether `setup()` has already run since the last mutation, so
    /// a caller invoking it more than once per frame doesn't pay for a
    /// repeated balance-strategy pass.
    setup_done: bool,
}

impl<T: CollisionObject> Default for BroadphaseManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CollisionObject> BroadphaseManager<T> {
    /// Creates an empty manager with the default tunables.
    pub fn new() -> Self {
        Self::with_config(BroadphaseConfig::default())
    }

    /// Creates an empty manager with the given tunables.
    pub fn with_config(config: BroadphaseConfig) -> Self {
        Self {
            tree: DynamicTree::new(),
            table: ObjectTable::new(),
            config,
            setup_done: true,
        }
    }

    /// Returns the manager's current tunables.
    pub fn config(&self) -> &BroadphaseConfig {
        &self.config
    }

    /// Returns a mutable handle to the manager's tunables.
    pub fn config_mut(&mut self) -> &mut BroadphaseConfig {
        &mut self.config
    }

    /// Returns the number of objects currently tracked.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if no objects are tracked.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the underlying tree's current height.
    pub fn tree_height(&self) -> i32 {
        self.tree.height()
    }

    /// Registers a single object, fattening its current AABB by
    /// `fat_aabb_margin`.
    ///
    /// Returns [`BroadphaseError::DuplicateObject`] if `object` is already
    /// tracked; the manager is left unchanged in that case.
    pub fn register_object(&mut self, object: T) -> Result<(), BroadphaseError> {
        if self.table.contains(&object) {
            log::warn!("register_object called with an already-registered object; ignoring");
            return Err(BroadphaseError::DuplicateObject);
        }
        let fat = fatten(object.aabb(), self.config.fat_aabb_margin);
        let node = self.tree.insert(fat, object.clone());
        self.table.insert(object, node);
        self.setup_done = false;
        Ok(())
    }

    /// Registers many objects at once, then immediately rebuilds the tree
    /// top-down. For a fresh batch this produces a well-balanced tree in one
    /// pass instead of paying for the incremental rotations that repeated
    /// `register_object` calls would trigger.
    ///
    /// When the manager is empty beforehand, the rebuild is capped at
    /// `tree_init_level`: this initial construction favors a shallower tree
    /// over recursing all the way down to `tree_topdown_balance_threshold`,
    /// since an empty manager has no existing shape to preserve and a
    /// shallower tree builds faster.
    pub fn register_objects<I: IntoIterator<Item = T>>(&mut self, objects: I) {
        let is_initial_batch = self.tree.is_empty();
        for object in objects {
            if self.table.contains(&object) {
                log::warn!("register_objects skipped an already-registered object");
                continue;
            }
            let fat = fatten(object.aabb(), self.config.fat_aabb_margin);
            let node = self.tree.insert(fat, object.clone());
            self.table.insert(object, node);
        }
        if is_initial_batch {
            self.tree.rebuild_top_down_at_level(
                self.config.tree_topdown_balance_threshold,
                self.config.tree_topdown_level,
                self.config.tree_init_level,
            );
        } else {
            self.tree.rebuild_top_down(
                self.config.tree_topdown_balance_threshold,
                self.config.tree_topdown_level,
            );
        }
        self.setup_done = true;
    }

    /// Removes `object` from the manager. A no-op if it isn't tracked.
    pub fn unregister_object(&mut self, object: &T) {
        match self.table.remove(object) {
            Some(node) => {
                self.tree.remove(node);
                self.setup_done = false;
            }
            None => {
                log::debug!("unregister_object called for an object that isn't tracked; ignoring");
            }
        }
    }

    /// Refreshes a tracked object's position, re-fattening its AABB only if
    /// its tight AABB has escaped the current fat AABB. A no-op if `object`
    /// isn't tracked.
    ///
    /// Returns `true` if the tree was actually touched.
    pub fn update_object(&mut self, object: &T) -> bool {
        let node = match self.table.get(object) {
            Some(node) => node,
            None => {
                log::debug!("update_object called for an object that isn't tracked; ignoring");
                return false;
            }
        };

        let new_aabb = object.aabb();
        let old_center = self.tree.leaf_aabb(node).center();
        let displacement = new_aabb.center() - old_center;

        self.tree.set_payload(node, object.clone());
        let touched = self.tree.update(
            node,
            new_aabb,
            displacement,
            self.config.fat_aabb_margin,
            self.config.displacement_multiplier,
            false,
        );
        if touched {
            self.setup_done = false;
        }
        touched
    }

    /// Refreshes every object in `objects` in turn with no rebalance in
    /// between, then re-evaluates the tree's balance once.
    pub fn update_objects<'a, I: IntoIterator<Item = &'a T>>(&mut self, objects: I)
    where
        T: 'a,
    {
        for object in objects {
            self.update_object(object);
        }
        self.setup_done = false;
        self.setup();
    }

    /// Copies every tracked object's current AABB directly into its leaf
    /// (no fattening margin, no reinsertion), refits every ancestor bound in
    /// one bottom-up pass, then re-evaluates the tree's balance.
    ///
    /// Cheaper than [`Self::update_objects`] for a frame where every object
    /// moved: a single `O(n)` refit instead of up to `n` individual
    /// remove/reinsert cycles, at the cost of leaf AABBs no longer carrying
    /// a fattening margin until the next `register_object`/`update_object`.
    pub fn update_all(&mut self) {
        for (object, &node) in self.table.iter() {
            self.tree.set_leaf_aabb(node, object.aabb());
        }
        self.tree.refit();
        self.setup_done = false;
        self.setup();
    }

    /// Re-evaluates the tree's overall balance and either performs a handful
    /// of incremental refit passes or a full top-down rebuild, depending on
    /// how far `height - log2(len)` has drifted from zero.
    ///
    /// A no-op if no mutation has occurred since the last call, so callers
    /// that invoke this more than once per frame don't pay for a repeated
    /// balance-strategy pass. Call this periodically (e.g. once per frame
    /// after a batch of `update_object` calls) rather than after every
    /// single update.
    pub fn setup(&mut self) {
        if self.setup_done {
            return;
        }

        let n = self.tree.len();
        if n < 2 {
            self.setup_done = true;
            return;
        }

        let height = self.tree.height() as f32;
        let ideal = (n as f32).log2();
        let imbalance = height - ideal;

        if imbalance > self.config.max_tree_nonbalanced_level as f32 {
            log::debug!(
                "broadphase: rebuilding top-down (n={n}, height={height}, imbalance={imbalance:.2})"
            );
            self.tree.rebuild_top_down(
                self.config.tree_topdown_balance_threshold,
                self.config.tree_topdown_level,
            );
        } else {
            log::debug!(
                "broadphase: incremental regime held (n={n}, height={height}, imbalance={imbalance:.2})"
            );
            self.tree.balance_incremental(self.config.tree_incremental_balance_pass);
        }
        self.setup_done = true;
    }

    /// Removes every tracked object.
    pub fn clear(&mut self) {
        self.tree = DynamicTree::new();
        self.table.clear();
        self.setup_done = true;
    }

    /// Returns a clone of every currently tracked object. The order is
    /// unspecified.
    pub fn objects(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.tree.len());
        self.tree.visit_leaves(|data| {
            out.push(data.clone());
            true
        });
        out
    }

    /// Invokes `callback` once for every pair of tracked objects whose fat
    /// AABBs overlap. `callback` returns `true` to stop the traversal
    /// immediately.
    pub fn for_each_overlapping_pair<F>(&self, callback: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.tree.query_pairs(callback);
    }

    /// Invokes `callback` once for every pair `(a, b)` with `a` from `self`
    /// and `b` from `other` whose fat AABBs overlap. Same early-stop
    /// contract as [`Self::for_each_overlapping_pair`].
    pub fn for_each_overlapping_pair_with<F>(&self, other: &Self, callback: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.tree.query_pairs_with(&other.tree, callback);
    }

    /// Invokes `callback` for every candidate pair of tracked objects in
    /// nearest-first order, seeded with `initial_min_dist`. `callback` may
    /// shrink the running `min_dist` to prune remaining pairs more
    /// aggressively and returns `true` to stop the walk immediately.
    pub fn for_each_pair_by_distance<F>(&self, initial_min_dist: f32, callback: F)
    where
        F: FnMut(&T, &T, &mut f32) -> bool,
    {
        self.tree.for_each_pair_by_distance(initial_min_dist, callback);
    }

    /// Cross-manager counterpart of [`Self::for_each_pair_by_distance`],
    /// pairing every object of `self` against every object of `other`.
    pub fn for_each_pair_by_distance_with<F>(
        &self,
        other: &Self,
        initial_min_dist: f32,
        callback: F,
    ) where
        F: FnMut(&T, &T, &mut f32) -> bool,
    {
        self.tree
            .for_each_pair_by_distance_with(&other.tree, initial_min_dist, callback);
    }

    /// Finds the closest tracked pair by AABB-to-AABB distance.
    pub fn closest_pair(&self) -> Option<(&T, &T, f32)> {
        self.tree.closest_pair()
    }

    /// Finds the closest pair between this manager's objects and `other`'s.
    pub fn closest_pair_with(&self, other: &Self) -> Option<(&T, &T, f32)> {
        self.tree.closest_pair_with(&other.tree)
    }

    /// Invokes `callback` for every tracked object whose fat AABB overlaps
    /// `aabb`; `callback` returns `false` to stop early.
    pub fn query_overlap<F>(&self, aabb: &Aabb, callback: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.tree.query(aabb, callback);
    }

    /// Same as [`Self::query_overlap`], but dispatches on `query`'s
    /// geometry kind first. When `query` reports
    /// [`GeometryKind::OccupancyGrid`] and `octree_as_geometry_collide` is
    /// `true` (the default), the grid is treated as an opaque AABB leaf, the
    /// same as a primitive. When that tunable is `false`, this returns
    /// [`BroadphaseError::ManagerKindMismatch`]: the specialized
    /// hierarchical-grid traversal needs the grid's own cell structure,
    /// which `T` doesn't expose — call [`Self::query_occupancy_grid`]
    /// directly with the grid instead.
    pub fn query_overlap_object<F>(&self, query: &T, callback: F) -> Result<(), BroadphaseError>
    where
        F: FnMut(&T) -> bool,
    {
        match query.geometry_kind() {
            GeometryKind::Primitive => {
                self.tree.query(&query.aabb(), callback);
                Ok(())
            }
            GeometryKind::OccupancyGrid if self.config.octree_as_geometry_collide => {
                self.tree.query(&query.aabb(), callback);
                Ok(())
            }
            GeometryKind::OccupancyGrid => Err(BroadphaseError::ManagerKindMismatch),
        }
    }

    /// Finds the tracked object nearest to `aabb` by AABB-to-AABB distance.
    pub fn query_nearest(&self, aabb: &Aabb) -> Option<(&T, f32)> {
        self.tree.query_nearest(aabb)
    }

    /// Same as [`Self::query_nearest`], but dispatches on `query`'s geometry
    /// kind first, gated by `octree_as_geometry_distance` (default `false`,
    /// the mirror image of the collide-side default) the same way
    /// [`Self::query_overlap_object`] is gated by `octree_as_geometry_collide`.
    pub fn query_nearest_object(&self, query: &T) -> Result<Option<(&T, f32)>, BroadphaseError> {
        match query.geometry_kind() {
            GeometryKind::Primitive => Ok(self.tree.query_nearest(&query.aabb())),
            GeometryKind::OccupancyGrid if self.config.octree_as_geometry_distance => {
                Ok(self.tree.query_nearest(&query.aabb()))
            }
            GeometryKind::OccupancyGrid => Err(BroadphaseError::ManagerKindMismatch),
        }
    }

    /// Queries an [`OccupancyGrid`] that is not itself tracked by this
    /// manager, transformed into world space by `transform`, against
    /// `query_world`. `callback` receives each solid cell's world-space
    /// bounds and returns `false` to stop early.
    pub fn query_occupancy_grid<F>(
        &self,
        grid: &OccupancyGrid,
        query_world: &Aabb,
        transform: &AffineTransform,
        callback: F,
    ) where
        F: FnMut(Aabb) -> bool,
    {
        grid.query(
            query_world,
            transform,
            self.config.octree_cost_density,
            self.config.octree_threshold_occupied,
            callback,
        );
    }

    /// Finds the solid cell of an [`OccupancyGrid`] nearest to `query_world`
    /// by AABB-to-AABB distance, the distance-query counterpart of
    /// [`Self::query_occupancy_grid`].
    pub fn query_nearest_occupancy_grid(
        &self,
        grid: &OccupancyGrid,
        query_world: &Aabb,
        transform: &AffineTransform,
    ) -> Option<(Aabb, f32)> {
        grid.nearest(query_world, transform, self.config.octree_threshold_occupied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;

    // Identity is `id` alone: the table keys objects by identity, not by
    // their (mutable) AABB, so equality/hash must ignore `aabb` or a moved
    // object becomes unreachable under its old key.
    #[derive(Debug, Clone)]
    struct Obj {
        id: u32,
        aabb: Aabb,
    }

    impl PartialEq for Obj {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl Eq for Obj {}
    impl std::hash::Hash for Obj {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl CollisionObject for Obj {
        fn aabb(&self) -> Aabb {
            self.aabb
        }
    }

    fn obj(id: u32, x: f32) -> Obj {
        Obj {
            id,
            aabb: Aabb::from_center_half_extents(Vec3::new(x, 0.0, 0.0), Vec3::new(0.5, 0.5, 0.5)),
        }
    }

    #[test]
    fn register_then_unregister_empties_manager() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        manager.register_object(obj(1, 0.0)).unwrap();
        assert_eq!(manager.len(), 1);

        manager.unregister_object(&obj(1, 0.0));
        assert!(manager.is_empty());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        manager.register_object(obj(1, 0.0)).unwrap();
        let err = manager.register_object(obj(1, 0.0)).unwrap_err();
        assert_eq!(err, BroadphaseError::DuplicateObject);
    }

    #[test]
    fn unregister_unknown_object_is_a_no_op() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        manager.unregister_object(&obj(1, 0.0));
        assert!(manager.is_empty());
    }

    #[test]
    fn overlapping_pairs_are_reported_once() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        manager.register_object(obj(1, 0.0)).unwrap();
        manager.register_object(obj(2, 0.2)).unwrap();
        manager.register_object(obj(3, 100.0)).unwrap();

        let mut pairs = Vec::new();
        manager.for_each_overlapping_pair(|a, b| {
            let mut ids = [a.id, b.id];
            ids.sort();
            pairs.push((ids[0], ids[1]));
            false
        });
        assert_eq!(pairs, vec![(1, 2)]);
    }

    #[test]
    fn update_moves_object_between_overlap_sets() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        manager.register_object(obj(1, 0.0)).unwrap();
        manager.register_object(obj(2, 0.2)).unwrap();

        let mut pairs_before = 0;
        manager.for_each_overlapping_pair(|_, _| {
            pairs_before += 1;
            false
        });
        assert_eq!(pairs_before, 1);

        manager.update_object(&obj(1, 100.0));

        let mut pairs_after = 0;
        manager.for_each_overlapping_pair(|_, _| {
            pairs_after += 1;
            false
        });
        assert_eq!(pairs_after, 0);
    }

    #[test]
    fn setup_rebuilds_without_losing_objects() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        for i in 0..50 {
            manager.register_object(obj(i, i as f32 * 3.0)).unwrap();
        }
        manager.setup();
        assert_eq!(manager.len(), 50);
    }

    #[test]
    fn clear_removes_every_object() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        manager.register_object(obj(1, 0.0)).unwrap();
        manager.register_object(obj(2, 10.0)).unwrap();
        manager.clear();
        assert!(manager.is_empty());
        assert_eq!(manager.objects().len(), 0);
    }

    // A handle-style object: identity is `id`, but `aabb()` reads live
    // position state through a shared cell rather than an embedded value,
    // matching how a real caller's handle would defer to its own object
    // storage. This is what lets `update_all` observe a pose change without
    // the manager ever being handed a new `Obj` value.
    #[derive(Debug, Clone)]
    struct Handle {
        id: u32,
        x: std::rc::Rc<std::cell::Cell<f32>>,
    }

    impl PartialEq for Handle {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl Eq for Handle {}
    impl std::hash::Hash for Handle {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }
    impl CollisionObject for Handle {
        fn aabb(&self) -> Aabb {
            Aabb::from_center_half_extents(
                Vec3::new(self.x.get(), 0.0, 0.0),
                Vec3::new(0.5, 0.5, 0.5),
            )
        }
    }

    #[test]
    fn update_all_reflects_every_moved_object() {
        let a = Handle {
            id: 1,
            x: std::rc::Rc::new(std::cell::Cell::new(0.0)),
        };
        let b = Handle {
            id: 2,
            x: std::rc::Rc::new(std::cell::Cell::new(10.0)),
        };

        let mut manager: BroadphaseManager<Handle> = BroadphaseManager::new();
        manager.register_object(a.clone()).unwrap();
        manager.register_object(b.clone()).unwrap();

        let mut pairs = 0;
        manager.for_each_overlapping_pair(|_, _| {
            pairs += 1;
            false
        });
        assert_eq!(pairs, 0);

        b.x.set(0.1);
        manager.update_all();

        pairs = 0;
        manager.for_each_overlapping_pair(|_, _| {
            pairs += 1;
            false
        });
        assert_eq!(pairs, 1);
    }

    #[test]
    fn setup_is_a_no_op_without_intervening_mutation() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        for i in 0..20 {
            manager.register_object(obj(i, i as f32 * 3.0)).unwrap();
        }
        manager.setup();
        let height_after_first_setup = manager.tree_height();
        // Calling setup() again with no mutation in between must be a no-op;
        // the tree shape (and therefore height) cannot have changed.
        manager.setup();
        assert_eq!(manager.tree_height(), height_after_first_setup);
    }

    #[test]
    fn distance_finds_nearest_pair() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        manager.register_object(obj(1, 0.0)).unwrap();
        manager.register_object(obj(2, 5.0)).unwrap();
        manager.register_object(obj(3, 5.5)).unwrap();

        let (a, b, _) = manager.closest_pair().unwrap();
        let mut ids = [a.id, b.id];
        ids.sort();
        assert_eq!(ids, [2, 3]);
    }

    #[test]
    fn overlapping_pair_callback_stops_the_walk_immediately() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        for i in 0..20 {
            manager.register_object(obj(i, i as f32 * 0.1)).unwrap();
        }

        let mut invocations = 0;
        manager.for_each_overlapping_pair(|_, _| {
            invocations += 1;
            true
        });
        assert_eq!(invocations, 1);
    }

    #[test]
    fn for_each_pair_by_distance_narrows_min_dist_and_can_stop_early() {
        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        manager.register_object(obj(1, 0.0)).unwrap();
        manager.register_object(obj(2, 5.0)).unwrap();
        manager.register_object(obj(3, 5.5)).unwrap();

        let mut invocations = 0;
        manager.for_each_pair_by_distance(f32::INFINITY, |_, _, _| {
            invocations += 1;
            true
        });
        assert_eq!(invocations, 1);
    }

    #[test]
    fn for_each_pair_by_distance_with_pairs_across_two_managers() {
        let mut a: BroadphaseManager<Obj> = BroadphaseManager::new();
        a.register_object(obj(1, 0.0)).unwrap();
        a.register_object(obj(2, 100.0)).unwrap();

        let mut b: BroadphaseManager<Obj> = BroadphaseManager::new();
        b.register_object(obj(10, 0.3)).unwrap();
        b.register_object(obj(20, 200.0)).unwrap();

        let mut best_ids = None;
        let mut best = f32::INFINITY;
        a.for_each_pair_by_distance_with(&b, f32::INFINITY, |x, y, min_dist| {
            let d = x.aabb.distance_aabb(&y.aabb);
            if d < best {
                best = d;
                best_ids = Some((x.id, y.id));
            }
            if d < *min_dist {
                *min_dist = d;
            }
            false
        });

        assert_eq!(best_ids, Some((1, 10)));
    }

    // Repeated update()+distance() on the same two overlapping objects must
    // keep reporting the same unordered pair each time, even though which
    // side of the pair lands in `a` vs `b` may flip across updates.
    #[test]
    fn repeated_update_then_distance_reports_the_same_pair_every_time() {
        let sphere0 = Obj {
            id: 0,
            aabb: Aabb::from_center_half_extents(
                Vec3::new(0.1, 0.2, 0.3),
                Vec3::new(0.1, 0.1, 0.1),
            ),
        };
        let sphere1 = Obj {
            id: 1,
            aabb: Aabb::from_center_half_extents(
                Vec3::new(0.11, 0.21, 0.31),
                Vec3::new(0.2, 0.2, 0.2),
            ),
        };

        let mut manager: BroadphaseManager<Obj> = BroadphaseManager::new();
        manager.register_object(sphere0).unwrap();
        manager.register_object(sphere1).unwrap();

        for _ in 0..8 {
            manager.update_all();

            let mut reported = Vec::new();
            manager.for_each_pair_by_distance(f32::INFINITY, |a, b, _| {
                let mut ids = [a.id, b.id];
                ids.sort();
                reported.push((ids[0], ids[1]));
                false
            });
            assert_eq!(reported, vec![(0, 1)]);
        }
    }
}

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

//! Leaf payload contract for objects tracked by a [`crate::physics::BroadphaseManager`].

use std::hash::Hash;

use crate::math::{AffineTransform, Aabb};

/// Discriminates the narrow-phase geometry kind of a tracked object or query.
///
/// The manager dispatches single-query traversals on this tag rather than
/// downcasting a type-erased pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// An ordinary convex or compound narrow-phase shape, represented to the
    /// broad phase purely by its current AABB.
    Primitive,
    /// A hierarchical occupancy grid (octree), queryable either as an opaque
    /// AABB leaf or via the specialized grid traversal.
    OccupancyGrid,
}

/// The opaque, caller-owned leaf payload the tree stores at its leaves.
///
/// A capability set exposing exactly what the broad phase needs (current
/// AABB, current transform, narrow-phase geometry discriminator) without the
/// tree ever inspecting the concrete type. `T` also serves as its own table
/// key for the object→node lookup, so implementors should make
/// equality/hash cheap (e.g. wrap a stable id).
pub trait CollisionObject: Clone + Eq + Hash {
    /// Returns the object's current axis-aligned bounding box in world space.
    fn aabb(&self) -> Aabb;

    /// Returns the object's current world transform.
    ///
    /// Only consulted by the hierarchical-grid traversal, which needs to
    /// know whether the query carries a pure translation. Primitive
    /// objects that never participate in grid queries may leave this at the
    /// identity transform.
    fn transform(&self) -> AffineTransform {
        AffineTransform::IDENTITY
    }

    /// Returns this object's narrow-phase geometry discriminator.
    fn geometry_kind(&self) -> GeometryKind {
        GeometryKind::Primitive
    }
}

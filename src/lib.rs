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

//! # Khora Broadphase
//!
//! A dynamic AABB tree broad-phase collision manager: a spatial index over a
//! mutable set of collision objects supporting pairwise overlap enumeration,
//! nearest-pair distance queries, single-query overlap/distance, and
//! continuous insertion, removal, and pose updates.

#![warn(missing_docs)]

pub mod math;
pub mod physics;

pub use physics::{
    BroadphaseConfig, BroadphaseError, BroadphaseManager, CollisionObject, DynamicTree,
    GeometryKind, OccupancyGrid,
};

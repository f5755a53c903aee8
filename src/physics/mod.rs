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

//! Dynamic AABB tree broad-phase collision manager.
//!
//! This module is a spatial index over a mutable set of caller-owned
//! collision objects. It answers "which pairs of objects might be touching"
//! and "what is the nearest object to this point/region" far cheaper than
//! any narrow-phase exact test could, by pruning on enlarged axis-aligned
//! bounding boxes instead. Narrow-phase geometry tests themselves are out of
//! scope here; the manager only ever hands pairs of caller data back through
//! a callback.

pub mod config;
pub mod error;
pub mod grid;
pub mod manager;
pub mod object;
pub mod table;
pub mod tree;

pub use config::BroadphaseConfig;
pub use error::BroadphaseError;
pub use grid::OccupancyGrid;
pub use manager::BroadphaseManager;
pub use object::{CollisionObject, GeometryKind};
pub use table::ObjectTable;
pub use tree::DynamicTree;

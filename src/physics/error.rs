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

//! Error types returned by [`crate::physics::BroadphaseManager`] operations.

use std::fmt;

/// Failure modes surfaced by the broad-phase manager.
///
/// Most manager operations (`unregister_object`, `update`) treat an unknown
/// object id as a permissive no-op rather than an error. This enum only
/// covers the operations that are genuinely fallible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadphaseError {
    /// Returned by `register_object` when the object is already tracked by
    /// this manager.
    DuplicateObject,
    /// Returned when a query mixes a self-contained occupancy-grid traversal
    /// with a manager configured for plain AABB leaves, or vice versa.
    ManagerKindMismatch,
}

impl fmt::Display for BroadphaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadphaseError::DuplicateObject => {
                write!(f, "object is already registered with this manager")
            }
            BroadphaseError::ManagerKindMismatch => {
                write!(f, "query geometry kind does not match the manager's configured kind")
            }
        }
    }
}

impl std::error::Error for BroadphaseError {}

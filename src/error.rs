// Copyright 2025 The sparse_ecs Authors
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

//! Error types

use std::fmt;

/// ECS error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Operation targeted a dead or out-of-range entity
    EntityNotAlive,

    /// Component already attached (double add)
    ComponentAlreadyPresent(&'static str),

    /// Component not attached
    ComponentMissing(&'static str),

    /// Pool id does not name a registered component table
    UnknownPool(usize),

    /// Filter mask declared no include components
    FilterWithoutInclude,

    /// Filter mask lists the same component as include and exclude
    FilterIncludeExcludeOverlap(&'static str),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::EntityNotAlive => write!(f, "Entity is not alive"),
            EcsError::ComponentAlreadyPresent(name) => {
                write!(f, "Component already present: {name}")
            }
            EcsError::ComponentMissing(name) => write!(f, "Component missing: {name}"),
            EcsError::UnknownPool(id) => write!(f, "Unknown component pool: {id}"),
            EcsError::FilterWithoutInclude => {
                write!(f, "Filter must include at least one component")
            }
            EcsError::FilterIncludeExcludeOverlap(name) => {
                write!(f, "Filter both includes and excludes: {name}")
            }
        }
    }
}

impl std::error::Error for EcsError {}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;

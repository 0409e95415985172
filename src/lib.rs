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

//! Sparse ECS - entity component storage kernel
//!
//! Entity identity with generational recycling, dense per-type component
//! tables, reactively maintained include/exclude filters, and a deferred
//! command buffer for structural changes scheduled while the world is being
//! iterated.
//!
//! ```
//! use sparse_ecs::prelude::*;
//!
//! #[derive(Debug, Default, Clone)]
//! struct Health(u32);
//! impl Component for Health {}
//!
//! # fn main() -> Result<()> {
//! let mut world = World::new();
//! let hero = world.create_entity();
//! world.add_component::<Health>(hero)?.0 = 100;
//!
//! let wounded = world.build_filter().with::<Health>().build()?;
//! assert_eq!(world.filter_entities(wounded), &[hero]);
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod command;
pub mod component;
pub mod entity;
pub mod error;
pub mod filter;
pub mod observer;
pub mod pool;
pub mod prelude;
pub mod world;

#[cfg(test)]
mod tests;

pub use buffer::Buffer;
pub use command::*;
pub use component::*;
pub use entity::*;
pub use error::*;
pub use filter::*;
pub use observer::*;
pub use pool::*;
pub use world::*;

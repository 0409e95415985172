//! Convenient re-exports of commonly used types.
//!
//! The prelude can be imported with:
//! ```
//! use sparse_ecs::prelude::*;
//! ```

pub use crate::buffer::Buffer;
pub use crate::command::CommandBuffer;
pub use crate::component::Component;
pub use crate::entity::{EntityId, PackedEntity};
pub use crate::error::{EcsError, Result};
pub use crate::filter::Filter;
pub use crate::pool::{PoolId, Table};
pub use crate::world::{World, WorldConfig};

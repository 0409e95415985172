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

//! Component trait
//!
//! Components are plain data attached to entities and stored in per-type
//! tables. A type opts in explicitly:
//!
//! ```
//! use sparse_ecs::Component;
//!
//! #[derive(Default, Clone)]
//! struct Health(u32);
//!
//! impl Component for Health {}
//! ```

/// Plain-data component stored in a per-type table.
///
/// `Default` is the type's zero value (written into detached slots),
/// `Clone` backs the raw slot copies used by entity copying and command
/// playback.
///
/// The two hooks let a component recycle internal resources across
/// attach/detach cycles instead of discarding them; the default behavior is
/// zero-value reset with no dispatch cost. See [`Buffer`](crate::Buffer)
/// for a component that overrides both.
pub trait Component: Default + Clone + 'static {
    /// Invoked right after the component is attached with its default
    /// payload. May replace parts of the payload with pooled resources.
    fn on_attach(&mut self) {}

    /// Invoked when the component is detached, instead of a plain zeroing.
    /// Overriders must leave `self` in a state that is safe to drop and
    /// holds no entity references.
    fn on_detach(&mut self) {
        *self = Self::default();
    }
}

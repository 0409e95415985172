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

//! Reusable list components
//!
//! [`Buffer<T>`] wraps a growable sequence as a component. Detaching it
//! pushes the backing vector onto a process-wide free-list pool keyed by
//! element type instead of discarding it; re-attaching pops from that pool,
//! so iteration-heavy components stop churning the allocator.
//!
//! Pools live for the whole process and are never torn down; they only ever
//! hold empty containers, never entity-referencing data.

use std::any::{Any, TypeId};
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::component::Component;

type PoolMap = AHashMap<TypeId, Vec<Box<dyn Any + Send>>>;

fn pools() -> &'static Mutex<PoolMap> {
    static POOLS: OnceLock<Mutex<PoolMap>> = OnceLock::new();
    POOLS.get_or_init(|| Mutex::new(PoolMap::new()))
}

/// Pop a pooled vector for element type `T`, or allocate an empty one.
pub fn acquire<T: Send + 'static>() -> Vec<T> {
    let mut map = pools().lock();
    match map.get_mut(&TypeId::of::<T>()).and_then(|stack| stack.pop()) {
        Some(boxed) => match boxed.downcast::<Vec<T>>() {
            Ok(list) => *list,
            // Pools are keyed by element TypeId; a mismatch cannot happen.
            Err(_) => Vec::new(),
        },
        None => Vec::new(),
    }
}

/// Return a vector to the pool for reuse. The contents are cleared first;
/// capacity is retained.
pub fn release<T: Send + 'static>(mut list: Vec<T>) {
    list.clear();
    pools()
        .lock()
        .entry(TypeId::of::<T>())
        .or_default()
        .push(Box::new(list));
}

/// Number of vectors currently pooled for element type `T`.
pub fn pooled<T: Send + 'static>() -> usize {
    pools()
        .lock()
        .get(&TypeId::of::<T>())
        .map(Vec::len)
        .unwrap_or(0)
}

/// Growable sequence stored as a component.
///
/// Dereferences to its backing `Vec<T>`. The attach hook acquires a pooled
/// vector and the detach (auto-reset) hook releases it back. The component
/// has no identity beyond "currently attached to entity X".
#[derive(Debug)]
pub struct Buffer<T: Send + 'static> {
    values: Vec<T>,
}

impl<T: Send + 'static> Default for Buffer<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T: Send + Clone + 'static> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
        }
    }
}

impl<T: Send + 'static> Deref for Buffer<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.values
    }
}

impl<T: Send + 'static> DerefMut for Buffer<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.values
    }
}

impl<T: Send + Clone + 'static> Component for Buffer<T> {
    fn on_attach(&mut self) {
        self.values = acquire::<T>();
    }

    fn on_detach(&mut self) {
        release(std::mem::take(&mut self.values));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_round_trip_retains_capacity() {
        // Local element type keeps this test's pool isolated.
        #[derive(Debug, Clone)]
        struct Item(u64);

        assert_eq!(pooled::<Item>(), 0);
        let mut list = acquire::<Item>();
        list.reserve(32);
        let capacity = list.capacity();
        release(list);
        assert_eq!(pooled::<Item>(), 1);

        let list = acquire::<Item>();
        assert!(list.is_empty());
        assert!(list.capacity() >= capacity);
        assert_eq!(pooled::<Item>(), 0);
    }

    #[test]
    fn release_clears_contents() {
        #[derive(Debug, Clone)]
        struct Entry(u8);

        let mut list = acquire::<Entry>();
        list.push(Entry(1));
        list.push(Entry(2));
        release(list);
        let list = acquire::<Entry>();
        assert!(list.is_empty());
    }

    #[test]
    fn detach_hook_pools_the_vector() {
        #[derive(Debug, Clone, PartialEq)]
        struct Sample(u16);

        let mut buffer = Buffer::<Sample>::default();
        buffer.on_attach();
        buffer.push(Sample(7));
        buffer.push(Sample(9));
        buffer.on_detach();

        assert!(buffer.is_empty());
        assert_eq!(pooled::<Sample>(), 1);

        let mut again = Buffer::<Sample>::default();
        again.on_attach();
        assert_eq!(pooled::<Sample>(), 0);
        assert!(again.is_empty());
        again.on_detach();
    }
}

//! Command-ID allocator.
//!
//! Assigns a dense, stable integer ID to each command name the first
//! time it is asked for; later calls for the same name return the same
//! ID. IDs are never reused. Mirrors the role of Redis's
//! `populateCommandTable`/`commandId` pairing, generalized here into an
//! explicit value instead of process-global state (see DESIGN.md).

use std::collections::HashMap;

/// Dense, stable, per-process command identifiers.
#[derive(Debug, Default)]
pub struct CommandIdAllocator {
    ids: HashMap<String, u64>,
    next: u64,
}

impl CommandIdAllocator {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            next: 0,
        }
    }

    /// Return the ID for `name`, assigning a fresh one if this is the
    /// first time `name` has been seen. Matching is case-sensitive.
    pub fn id_of(&mut self, name: &str) -> u64 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.next;
        self.next += 1;
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Look up a previously assigned ID without allocating a new one.
    pub fn existing_id_of(&self, name: &str) -> Option<u64> {
        self.ids.get(name).copied()
    }

    /// Number of distinct command names seen so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

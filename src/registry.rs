//! Liveness tracking for spawned entities.

use std::collections::BTreeSet;

use crate::entities::EntityHandle;
use crate::world::World;

/// Set of handles the encounter is waiting on.
///
/// The only ways in are `register` and `prune`; nothing else may mutate the
/// set, so emptiness always means "everything registered has since died".
#[derive(Clone, Debug, Default)]
pub struct LivenessRegistry {
    handles: BTreeSet<EntityHandle>,
}

impl LivenessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: EntityHandle) {
        self.handles.insert(handle);
    }

    /// Drop every handle the world no longer knows.  Returns how many went.
    pub fn prune(&mut self, world: &dyn World) -> usize {
        let before = self.handles.len();
        self.handles.retain(|h| world.is_alive(*h));
        before - self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.handles.contains(&handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.handles.iter().copied()
    }
}

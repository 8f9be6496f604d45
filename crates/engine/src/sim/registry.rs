use std::collections::HashMap;

use super::{Naut, NautId, Vec2};

#[derive(Debug, Default)]
struct NautIdAllocator {
    next: u64,
}

impl NautIdAllocator {
    fn allocate(&mut self) -> NautId {
        let id = NautId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Owns every live naut. Spawns and despawns are queued and only take effect in
/// [`NautRegistry::apply_pending`], so membership is stable while a tick iterates.
#[derive(Debug, Default)]
pub struct NautRegistry {
    allocator: NautIdAllocator,
    nauts: Vec<Naut>,
    index_by_id: HashMap<NautId, usize>,
    pending_spawns: Vec<Naut>,
    pending_despawns: Vec<NautId>,
}

impl NautRegistry {
    pub fn spawn(&mut self, position: Vec2) -> NautId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Naut::new(id, position));
        id
    }

    /// Queues removal. Returns false when the id is neither live nor pending.
    pub fn despawn(&mut self, id: NautId) -> bool {
        let live = self.index_by_id.contains_key(&id);
        let pending = self.pending_spawns.iter().any(|naut| naut.id == id);
        if !live && !pending {
            return false;
        }
        if !self.pending_despawns.contains(&id) {
            self.pending_despawns.push(id);
        }
        true
    }

    pub fn apply_pending(&mut self) {
        for id in std::mem::take(&mut self.pending_despawns) {
            if let Some(position) = self.pending_spawns.iter().position(|naut| naut.id == id) {
                let _ = self.pending_spawns.swap_remove(position);
                continue;
            }
            self.remove_live(id);
        }

        for naut in self.pending_spawns.drain(..) {
            let _ = self.index_by_id.insert(naut.id, self.nauts.len());
            self.nauts.push(naut);
        }
    }

    fn remove_live(&mut self, id: NautId) {
        let Some(index) = self.index_by_id.remove(&id) else {
            return;
        };
        let _ = self.nauts.swap_remove(index);
        if let Some(moved) = self.nauts.get(index) {
            let _ = self.index_by_id.insert(moved.id, index);
        }
    }

    pub fn len(&self) -> usize {
        self.nauts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nauts.is_empty()
    }

    pub fn contains(&self, id: NautId) -> bool {
        self.index_by_id.contains_key(&id)
    }

    pub fn get(&self, id: NautId) -> Option<&Naut> {
        self.index_by_id
            .get(&id)
            .and_then(|&index| self.nauts.get(index))
    }

    pub fn get_mut(&mut self, id: NautId) -> Option<&mut Naut> {
        let index = *self.index_by_id.get(&id)?;
        self.nauts.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Naut> {
        self.nauts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Naut> {
        self.nauts.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn spawned_naut_is_live_after_apply() {
        let mut registry = NautRegistry::default();
        let id = registry.spawn(Vec2::new(1.0, 2.0));

        assert!(registry.get(id).is_none());
        registry.apply_pending();

        let naut = registry.get(id).expect("naut");
        assert_eq!(naut.position, Vec2::new(1.0, 2.0));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ids_are_unique_and_never_reused() {
        let mut registry = NautRegistry::default();
        let a = registry.spawn(Vec2::ZERO);
        registry.apply_pending();
        assert!(registry.despawn(a));
        registry.apply_pending();
        let b = registry.spawn(Vec2::ZERO);

        assert_ne!(a, b);
    }

    #[test]
    fn swap_remove_keeps_index_consistent() {
        let mut registry = NautRegistry::default();
        let ids: Vec<NautId> = (0..5)
            .map(|i| registry.spawn(Vec2::new(i as f32, 0.0)))
            .collect();
        registry.apply_pending();

        assert!(registry.despawn(ids[1]));
        registry.apply_pending();

        assert_eq!(registry.len(), 4);
        assert!(!registry.contains(ids[1]));
        for (i, id) in ids.iter().enumerate() {
            if i == 1 {
                continue;
            }
            let naut = registry.get(*id).expect("live naut");
            assert_eq!(naut.position.x, i as f32);
        }
    }

    #[test]
    fn iteration_visits_each_live_naut_once() {
        let mut registry = NautRegistry::default();
        let ids: Vec<NautId> = (0..6).map(|_| registry.spawn(Vec2::ZERO)).collect();
        registry.apply_pending();
        registry.despawn(ids[0]);
        registry.despawn(ids[4]);
        registry.apply_pending();

        let visited: Vec<NautId> = registry.iter().map(|naut| naut.id).collect();
        let unique: HashSet<NautId> = visited.iter().copied().collect();
        assert_eq!(visited.len(), 4);
        assert_eq!(unique.len(), 4);
        assert!(!unique.contains(&ids[0]));
        assert!(!unique.contains(&ids[4]));
    }

    #[test]
    fn despawn_is_deferred_until_apply() {
        let mut registry = NautRegistry::default();
        let id = registry.spawn(Vec2::ZERO);
        registry.apply_pending();

        assert!(registry.despawn(id));
        assert!(registry.contains(id));
        registry.apply_pending();
        assert!(!registry.contains(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn despawn_of_pending_spawn_cancels_it() {
        let mut registry = NautRegistry::default();
        let id = registry.spawn(Vec2::ZERO);
        assert!(registry.despawn(id));
        registry.apply_pending();

        assert!(registry.is_empty());
    }

    #[test]
    fn despawn_unknown_id_is_rejected() {
        let mut registry = NautRegistry::default();
        assert!(!registry.despawn(NautId(42)));
    }

    #[test]
    fn get_mut_updates_live_naut() {
        let mut registry = NautRegistry::default();
        let id = registry.spawn(Vec2::ZERO);
        registry.apply_pending();

        registry.get_mut(id).expect("naut").velocity = Vec2::new(0.05, 0.0);
        assert_eq!(registry.get(id).expect("naut").velocity.x, 0.05);
        assert_eq!(registry.iter_mut().count(), 1);
    }
}

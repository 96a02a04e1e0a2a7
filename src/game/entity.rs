use glam::Vec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Non-owning handle into the external combat-participant table.
///
/// The rhythm engine only ever asks the table whether a handle is still
/// alive, where it stands and how hard it hits; it never keeps an entity
/// alive or destroys one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

pub trait EntityTable {
    fn is_alive(&self, id: EntityId) -> bool;
    fn position(&self, id: EntityId) -> Option<Vec2>;
    /// Penalty applied when the player mis-parries one of this entity's beats.
    fn standard_penalty(&self, id: EntityId) -> Option<f32>;
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub position: Vec2,
    pub damage: f32,
    pub hp: i32,
}

impl EntityRecord {
    #[inline(always)]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// Minimal entity table keyed by handle; used by the simulation binary and tests.
#[derive(Clone, Debug, Default)]
pub struct EntityRoster {
    entries: FxHashMap<EntityId, EntityRecord>,
    next_id: u32,
}

impl EntityRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, position: Vec2, damage: f32, hp: i32) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, EntityRecord { position, damage, hp });
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entries.get(&id)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec2) {
        if let Some(e) = self.entries.get_mut(&id) {
            e.position = position;
        }
    }

    /// Applies damage and reports whether this hit defeated the entity.
    pub fn damage(&mut self, id: EntityId, amount: i32) -> bool {
        let Some(e) = self.entries.get_mut(&id) else {
            return false;
        };
        if !e.is_alive() {
            return false;
        }
        e.hp = (e.hp - amount).max(0);
        !e.is_alive()
    }

    pub fn remove(&mut self, id: EntityId) -> Option<EntityRecord> {
        self.entries.remove(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.keys().copied()
    }

    pub fn alive_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_alive()).count()
    }
}

impl EntityTable for EntityRoster {
    fn is_alive(&self, id: EntityId) -> bool {
        self.entries.get(&id).is_some_and(EntityRecord::is_alive)
    }

    fn position(&self, id: EntityId) -> Option<Vec2> {
        self.entries.get(&id).map(|e| e.position)
    }

    fn standard_penalty(&self, id: EntityId) -> Option<f32> {
        self.entries.get(&id).map(|e| e.damage)
    }
}

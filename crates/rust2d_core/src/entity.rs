//! Entities and the overlap scan
//!
//! An [`EntityWorld`] owns entities under generational keys. Each tick it:
//!
//! 1. ticks every entity in insertion order
//! 2. tests every unordered pair of live entities for overlap and notifies
//!    both sides of each overlapping pair
//! 3. applies the spawns and despawns requested during 1 and 2, then reaps
//!    entities that report themselves dead
//!
//! Entities never touch the world directly; they request changes through
//! [`EntityCommands`], so the scan never sees the set change under it.

use rust2d_physics::{BoundingVolume, CollisionFilter};
use rust2d_render::BatchRenderer;
use slotmap::{new_key_type, SlotMap};

use crate::state::StateResult;

new_key_type! {
    /// Generational key to an entity in an [`EntityWorld`]
    pub struct EntityKey;
}

/// Something that lives in an [`EntityWorld`]
pub trait Entity {
    /// Volume used by the overlap scan; `None` opts out
    fn bounding_volume(&self) -> Option<BoundingVolume> {
        None
    }

    /// Which other entities this one is tested against
    fn collision_filter(&self) -> CollisionFilter {
        CollisionFilter::default()
    }

    /// Dead entities are skipped by the scan and removed at the end of the tick
    fn is_dead(&self) -> bool {
        false
    }

    /// Advance one fixed step
    fn tick(&mut self, _cmds: &mut EntityCommands) {}

    /// Called once for each other entity overlapping this one during a tick
    fn on_overlap(&mut self, _other: &dyn Entity, _cmds: &mut EntityCommands) {}

    fn render(&self, _g: &mut BatchRenderer, _interpolation: f64) -> StateResult {
        Ok(())
    }

    /// Called when the world reaps this entity after it died
    fn on_death(&mut self) {}
}

/// Structural changes requested while the world is ticking
#[derive(Default)]
pub struct EntityCommands {
    spawns: Vec<Box<dyn Entity>>,
    despawns: Vec<EntityKey>,
    current: Option<EntityKey>,
}

impl EntityCommands {
    /// Add an entity at the end of the tick
    pub fn spawn(&mut self, entity: impl Entity + 'static) {
        self.spawns.push(Box::new(entity));
    }

    /// Remove an entity at the end of the tick
    pub fn despawn(&mut self, key: EntityKey) {
        if !self.despawns.contains(&key) {
            self.despawns.push(key);
        }
    }

    /// Remove the entity being called at the end of the tick
    pub fn despawn_self(&mut self) {
        if let Some(key) = self.current {
            self.despawn(key);
        }
    }

    /// Key of the entity being called
    pub fn current(&self) -> Option<EntityKey> {
        self.current
    }

    fn is_despawning(&self, key: EntityKey) -> bool {
        self.despawns.contains(&key)
    }
}

/// What happened during one [`EntityWorld::tick`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Overlapping pairs found
    pub overlaps: usize,
    pub spawned: usize,
    /// Despawned or reaped
    pub removed: usize,
}

type Observer = Box<dyn FnMut(EntityKey, &dyn Entity)>;

/// Container for entities
pub struct EntityWorld {
    entities: SlotMap<EntityKey, Box<dyn Entity>>,
    /// Keys in insertion order
    order: Vec<EntityKey>,
    commands: EntityCommands,
    collision: bool,
    on_add: Vec<Observer>,
    on_remove: Vec<Observer>,
}

impl Default for EntityWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityWorld {
    /// Create an empty world with the overlap scan enabled
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            order: Vec::new(),
            commands: EntityCommands::default(),
            collision: true,
            on_add: Vec::new(),
            on_remove: Vec::new(),
        }
    }

    /// Enable or disable the overlap scan
    pub fn with_collision(mut self, enabled: bool) -> Self {
        self.collision = enabled;
        self
    }

    pub fn set_collision(&mut self, enabled: bool) {
        self.collision = enabled;
    }

    pub fn collision_enabled(&self) -> bool {
        self.collision
    }

    /// Add an entity now, returning its key
    pub fn add(&mut self, entity: impl Entity + 'static) -> EntityKey {
        self.insert(Box::new(entity))
    }

    fn insert(&mut self, entity: Box<dyn Entity>) -> EntityKey {
        let key = self.entities.insert(entity);
        self.order.push(key);
        if let Some(e) = self.entities.get(key) {
            for observer in &mut self.on_add {
                observer(key, e.as_ref());
            }
        }
        key
    }

    fn detach(&mut self, key: EntityKey) -> Option<Box<dyn Entity>> {
        let entity = self.entities.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(entity)
    }

    fn notify_removed(&mut self, key: EntityKey, entity: &dyn Entity) {
        for observer in &mut self.on_remove {
            observer(key, entity);
        }
    }

    /// Remove an entity now
    pub fn remove(&mut self, key: EntityKey) -> Option<Box<dyn Entity>> {
        let entity = self.detach(key)?;
        self.notify_removed(key, entity.as_ref());
        Some(entity)
    }

    pub fn get(&self, key: EntityKey) -> Option<&dyn Entity> {
        self.entities.get(key).map(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut Box<dyn Entity>> {
        self.entities.get_mut(key)
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    /// Observe additions (immediate or at the end of a tick)
    pub fn on_add(&mut self, observer: impl FnMut(EntityKey, &dyn Entity) + 'static) {
        self.on_add.push(Box::new(observer));
    }

    /// Observe removals, including reaped dead entities
    pub fn on_remove(&mut self, observer: impl FnMut(EntityKey, &dyn Entity) + 'static) {
        self.on_remove.push(Box::new(observer));
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.order.iter().copied()
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &dyn Entity)> {
        self.order
            .iter()
            .filter_map(|k| self.entities.get(*k).map(|e| (*k, e.as_ref())))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Remove every entity, notifying remove observers
    pub fn clear(&mut self) {
        let keys = std::mem::take(&mut self.order);
        for key in keys {
            if let Some(entity) = self.entities.remove(key) {
                self.notify_removed(key, entity.as_ref());
            }
        }
    }

    /// Run one fixed step: entity ticks, the overlap scan, then deferred changes
    pub fn tick(&mut self) -> TickSummary {
        let keys = self.order.clone();

        for &key in &keys {
            if let Some(entity) = self.entities.get_mut(key) {
                self.commands.current = Some(key);
                entity.tick(&mut self.commands);
            }
        }

        let overlaps = if self.collision { self.scan(&keys) } else { 0 };
        self.commands.current = None;

        let (spawned, removed) = self.apply_commands();
        TickSummary {
            overlaps,
            spawned,
            removed,
        }
    }

    /// O(n²) pass over unordered pairs
    fn scan(&mut self, keys: &[EntityKey]) -> usize {
        let mut overlaps = 0;
        for (i, &ka) in keys.iter().enumerate() {
            for &kb in &keys[i + 1..] {
                if self.commands.is_despawning(ka) || self.commands.is_despawning(kb) {
                    continue;
                }
                let Some([a, b]) = self.entities.get_disjoint_mut([ka, kb]) else {
                    continue;
                };
                // Checked per pair: an entity killed earlier in the scan stops colliding
                if a.is_dead() || b.is_dead() {
                    continue;
                }
                if !a.collision_filter().collides_with(&b.collision_filter()) {
                    continue;
                }
                let (Some(va), Some(vb)) = (a.bounding_volume(), b.bounding_volume()) else {
                    continue;
                };
                if !va.intersects(&vb) {
                    continue;
                }

                overlaps += 1;
                self.commands.current = Some(ka);
                a.on_overlap(&**b, &mut self.commands);
                self.commands.current = Some(kb);
                b.on_overlap(&**a, &mut self.commands);
            }
        }
        overlaps
    }

    fn apply_commands(&mut self) -> (usize, usize) {
        let mut removed = 0;
        for key in std::mem::take(&mut self.commands.despawns) {
            if self.remove(key).is_some() {
                removed += 1;
            }
        }

        let dead: Vec<EntityKey> = self
            .order
            .iter()
            .copied()
            .filter(|k| self.entities.get(*k).is_some_and(|e| e.is_dead()))
            .collect();
        for key in dead {
            if let Some(mut entity) = self.detach(key) {
                entity.on_death();
                self.notify_removed(key, entity.as_ref());
                removed += 1;
            }
        }

        let spawns = std::mem::take(&mut self.commands.spawns);
        let spawned = spawns.len();
        for entity in spawns {
            self.insert(entity);
        }

        (spawned, removed)
    }

    /// Render every entity in insertion order
    pub fn render(&self, g: &mut BatchRenderer, interpolation: f64) -> StateResult {
        for (_, entity) in self.iter() {
            entity.render(g, interpolation)?;
        }
        Ok(())
    }
}

//! Id-keyed registries
//!
//! A [`Registry`] owns values that carry their own string id. Entries keep
//! insertion order. Observers registered with [`Registry::on_add`] and
//! [`Registry::on_remove`] run synchronously on every structural change.
//!
//! Code iterating a registry cannot remove from it; it queues the removal
//! with [`Registry::defer_remove`] and the owner applies the queue with
//! [`Registry::apply_deferred`] once iteration is over.

use thiserror::Error;

/// Something that can be stored in a [`Registry`]
pub trait Indexable {
    /// Unique id within its registry
    fn registry_id(&self) -> &str;
}

impl<T: Indexable + ?Sized> Indexable for Box<T> {
    fn registry_id(&self) -> &str {
        (**self).registry_id()
    }
}

impl Indexable for rust2d_render::Texture {
    fn registry_id(&self) -> &str {
        self.name()
    }
}

impl Indexable for rust2d_render::Font {
    fn registry_id(&self) -> &str {
        self.name()
    }
}

impl Indexable for rust2d_render::Animation {
    fn registry_id(&self) -> &str {
        self.name()
    }
}

impl Indexable for rust2d_render::TileMap {
    fn registry_id(&self) -> &str {
        self.name()
    }
}

/// Errors from registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{registry}: '{id}' is already registered")]
    Duplicate { registry: String, id: String },
    #[error("{registry}: already registered: {}", .ids.join(", "))]
    Duplicates { registry: String, ids: Vec<String> },
    #[error("{registry}: nothing registered as '{id}'")]
    NotFound { registry: String, id: String },
}

type Observer<T> = Box<dyn FnMut(&T)>;

/// An owning, ordered collection keyed by [`Indexable::registry_id`]
pub struct Registry<T: Indexable> {
    name: String,
    entries: Vec<T>,
    pending_removals: Vec<String>,
    on_add: Vec<Observer<T>>,
    on_remove: Vec<Observer<T>>,
}

impl<T: Indexable> Registry<T> {
    /// Create an empty registry; `name` appears in errors and logs
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            pending_removals: Vec::new(),
            on_add: Vec::new(),
            on_remove: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.registry_id() == id)
    }

    fn not_found(&self, id: &str) -> RegistryError {
        RegistryError::NotFound {
            registry: self.name.clone(),
            id: id.to_string(),
        }
    }

    /// Add an entry; fails if its id is taken
    pub fn register(&mut self, item: T) -> Result<(), RegistryError> {
        if self.contains(item.registry_id()) {
            return Err(RegistryError::Duplicate {
                registry: self.name.clone(),
                id: item.registry_id().to_string(),
            });
        }
        log::debug!("{}: registered '{}'", self.name, item.registry_id());
        for observer in &mut self.on_add {
            observer(&item);
        }
        self.entries.push(item);
        Ok(())
    }

    /// Add several entries
    ///
    /// Entries with free ids are registered even when others collide; the
    /// error lists every colliding id.
    pub fn register_all(&mut self, items: impl IntoIterator<Item = T>) -> Result<(), RegistryError> {
        let mut duplicates = Vec::new();
        for item in items {
            if let Err(RegistryError::Duplicate { id, .. }) = self.register(item) {
                duplicates.push(id);
            }
        }
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::Duplicates {
                registry: self.name.clone(),
                ids: duplicates,
            })
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Result<&T, RegistryError> {
        match self.position(id) {
            Some(i) => Ok(&self.entries[i]),
            None => Err(self.not_found(id)),
        }
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut T, RegistryError> {
        match self.position(id) {
            Some(i) => Ok(&mut self.entries[i]),
            None => Err(self.not_found(id)),
        }
    }

    /// Remove and return an entry
    pub fn remove(&mut self, id: &str) -> Result<T, RegistryError> {
        let i = self.position(id).ok_or_else(|| self.not_found(id))?;
        let item = self.entries.remove(i);
        log::debug!("{}: removed '{}'", self.name, id);
        for observer in &mut self.on_remove {
            observer(&item);
        }
        Ok(item)
    }

    /// Queue a removal for the next [`apply_deferred`](Self::apply_deferred)
    pub fn defer_remove(&mut self, id: impl Into<String>) {
        self.pending_removals.push(id.into());
    }

    /// Apply queued removals; returns the removed entries in queue order
    ///
    /// Ids that are no longer present are skipped.
    pub fn apply_deferred(&mut self) -> Vec<T> {
        let pending = std::mem::take(&mut self.pending_removals);
        pending
            .iter()
            .filter_map(|id| self.remove(id).ok())
            .collect()
    }

    /// Remove every entry, notifying remove observers for each
    pub fn clear(&mut self) {
        drop(self.drain());
    }

    /// Remove every entry, newest first, notifying remove observers
    pub fn drain(&mut self) -> Vec<T> {
        let mut drained = Vec::with_capacity(self.entries.len());
        while let Some(item) = self.entries.pop() {
            for observer in &mut self.on_remove {
                observer(&item);
            }
            drained.push(item);
        }
        self.pending_removals.clear();
        drained
    }

    /// Observe additions
    pub fn on_add(&mut self, observer: impl FnMut(&T) + 'static) {
        self.on_add.push(Box::new(observer));
    }

    /// Observe removals
    pub fn on_remove(&mut self, observer: impl FnMut(&T) + 'static) {
        self.on_remove.push(Box::new(observer));
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.registry_id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

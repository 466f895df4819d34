use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::model::{Block, Page, Site, Snapshot};

/// Entities read while rendering: class name to identifiers
pub type CacheKeys = BTreeMap<String, BTreeSet<String>>;

type Accessor = Box<dyn Fn(&dyn Any) -> Option<String> + Send + Sync>;

/// Maps entity types to a cache class and an identifier accessor
pub struct IdentityRegistry {
    entries: HashMap<TypeId, (String, Accessor)>,
}

impl IdentityRegistry {
    /// Registry with no types
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register<T: Any>(&mut self, class: &str, accessor: fn(&T) -> String) {
        let erased: Accessor = Box::new(move |entity: &dyn Any| {
            entity.downcast_ref::<T>().map(accessor)
        });
        self.entries
            .insert(TypeId::of::<T>(), (class.to_string(), erased));
    }

    /// `(class, identifier)` of an entity, `None` for unregistered types
    pub fn identify<T: Any>(&self, entity: &T) -> Option<(String, String)> {
        let (class, accessor) = self.entries.get(&TypeId::of::<T>())?;
        accessor(entity as &dyn Any).map(|id| (class.clone(), id))
    }

    pub fn is_registered<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }
}

impl Default for IdentityRegistry {
    /// Site, Page, Block and Snapshot keyed by their ids
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register::<Site>("site", |s| s.id.clone());
        registry.register::<Page>("page", |p| p.id.clone());
        registry.register::<Block>("block", |b| b.id.clone());
        registry.register::<Snapshot>("snapshot", |s| s.id.clone());
        registry
    }
}

impl std::fmt::Debug for IdentityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut classes: Vec<&str> = self.entries.values().map(|(c, _)| c.as_str()).collect();
        classes.sort_unstable();
        f.debug_struct("IdentityRegistry")
            .field("classes", &classes)
            .finish()
    }
}

/// Stack of read-tracking frames
///
/// Rendering a nested fragment pushes a frame; popping it hands back what
/// that fragment read and merges the same keys into the enclosing frame, so
/// an outer page depends on everything its fragments depend on.
#[derive(Debug, Clone)]
pub struct Recorder {
    registry: Arc<IdentityRegistry>,
    frames: Vec<CacheKeys>,
}

impl Recorder {
    pub fn new(registry: Arc<IdentityRegistry>) -> Self {
        Self {
            registry,
            frames: vec![CacheKeys::new()],
        }
    }

    /// Record an entity; returns false for unregistered types
    pub fn add<T: Any>(&mut self, entity: &T) -> bool {
        match self.registry.identify(entity) {
            Some((class, id)) => {
                self.add_key(&class, &id);
                true
            }
            None => false,
        }
    }

    pub fn add_key(&mut self, class: &str, id: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame
                .entry(class.to_string())
                .or_default()
                .insert(id.to_string());
        }
    }

    pub fn push(&mut self) {
        self.frames.push(CacheKeys::new());
    }

    /// Close the current frame, merging it into its parent
    ///
    /// Popping the root frame returns a copy and leaves it in place.
    pub fn pop(&mut self) -> CacheKeys {
        if self.frames.len() <= 1 {
            return self.get().clone();
        }
        let frame = self.frames.pop().unwrap_or_default();
        if let Some(parent) = self.frames.last_mut() {
            for (class, ids) in &frame {
                parent
                    .entry(class.clone())
                    .or_default()
                    .extend(ids.iter().cloned());
            }
        }
        frame
    }

    /// Keys of the current frame
    pub fn get(&self) -> &CacheKeys {
        static EMPTY: CacheKeys = CacheKeys::new();
        self.frames.last().unwrap_or(&EMPTY)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop every frame and every tracked class
    pub fn reset(&mut self) {
        self.frames = vec![CacheKeys::new()];
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(Arc::new(IdentityRegistry::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_deduplicates_per_class() {
        let mut recorder = Recorder::default();
        let page = Page::new("p1", "s1", "Home", "homepage");
        assert!(recorder.add(&page));
        assert!(recorder.add(&page));
        recorder.add(&Block::new("b1", "p1", "folio.block.text"));

        let keys = recorder.get();
        assert_eq!(keys["page"].len(), 1);
        assert!(keys["block"].contains("b1"));
    }

    #[test]
    fn test_unregistered_type_is_ignored() {
        let mut recorder = Recorder::default();
        assert!(!recorder.add(&42u32));
        assert!(recorder.get().is_empty());
    }

    #[test]
    fn test_pop_merges_into_parent() {
        let mut recorder = Recorder::default();
        recorder.add_key("page", "p1");
        recorder.push();
        recorder.add_key("block", "b1");
        assert_eq!(recorder.depth(), 2);

        let inner = recorder.pop();
        assert_eq!(inner.len(), 1);
        assert!(inner["block"].contains("b1"));
        assert!(recorder.get()["block"].contains("b1"));
        assert!(recorder.get()["page"].contains("p1"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut recorder = Recorder::default();
        recorder.add_key("page", "p1");
        recorder.push();
        recorder.add_key("site", "s1");
        recorder.reset();
        assert_eq!(recorder.depth(), 1);
        assert!(recorder.get().is_empty());
    }

    #[test]
    fn test_custom_registration() {
        struct Menu {
            code: String,
        }
        let mut registry = IdentityRegistry::empty();
        registry.register::<Menu>("menu", |m| m.code.clone());
        assert!(!registry.is_registered::<Page>());

        let mut recorder = Recorder::new(Arc::new(registry));
        recorder.add(&Menu {
            code: "main".to_string(),
        });
        assert!(recorder.get()["menu"].contains("main"));
    }
}

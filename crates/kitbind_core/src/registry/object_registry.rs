//! In-process named object registry.

use crate::model::bound_object::BoundObject;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Capability set exported to other extensions and the scripting layer.
///
/// None of these operations fail: absence is `None`, and mutations on a
/// missing id are no-ops.
pub trait NamedRegistry<T: ?Sized + BoundObject>: Send + Sync {
    /// Registers `object` under its id, replacing any previous entry.
    fn register(&self, object: Arc<T>);

    /// Removes the entry stored under `object.id()`.
    ///
    /// Matching is by id only: a different object that shares the id is
    /// removed as well. Use [`ObjectRegistry::deregister_exact`] to match by
    /// identity.
    fn deregister(&self, object: &T);

    /// Returns the object registered under `id`.
    fn find(&self, id: &str) -> Option<Arc<T>>;
}

/// Mutex-guarded id -> object map.
pub struct ObjectRegistry<T: ?Sized + BoundObject = dyn BoundObject> {
    objects: Mutex<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized + BoundObject> Default for ObjectRegistry<T> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: ?Sized + BoundObject> ObjectRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the entry under `object.id()` only if it is this allocation.
    ///
    /// Returns whether an entry was removed.
    pub fn deregister_exact(&self, object: &Arc<T>) -> bool {
        let removed = {
            let mut objects = self.lock();
            let matches = objects
                .get(object.id())
                .is_some_and(|current| Arc::ptr_eq(current, object));
            if matches {
                objects.remove(object.id())
            } else {
                None
            }
        };
        let Some(removed) = removed else {
            return false;
        };
        debug!(
            "event=bound_object_deregister module=registry status=ok id={} exact=true",
            object.id()
        );
        drop(removed);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns sorted registered ids.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drops every registry-held reference.
    pub fn clear(&self) {
        let released = {
            let mut objects = self.lock();
            std::mem::take(&mut *objects)
        };
        if !released.is_empty() {
            debug!(
                "event=bound_registry_clear module=registry status=ok released={}",
                released.len()
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<T>>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: ?Sized + BoundObject> NamedRegistry<T> for ObjectRegistry<T> {
    // Displaced entries are dropped only after the guard is released: their
    // `Drop` may call back into this registry.
    fn register(&self, object: Arc<T>) {
        let id = object.id().to_string();
        let previous = {
            let mut objects = self.lock();
            objects.insert(id.clone(), object)
        };
        debug!(
            "event=bound_object_register module=registry status=ok id={id} replaced={}",
            previous.is_some()
        );
        drop(previous);
    }

    fn deregister(&self, object: &T) {
        let removed = {
            let mut objects = self.lock();
            objects.remove(object.id())
        };
        if removed.is_some() {
            debug!(
                "event=bound_object_deregister module=registry status=ok id={}",
                object.id()
            );
        }
        drop(removed);
    }

    fn find(&self, id: &str) -> Option<Arc<T>> {
        self.lock().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{NamedRegistry, ObjectRegistry};
    use crate::model::bound_object::{BoundObject, ExampleBoundObject};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::{Arc, Weak};
    use std::thread;
    use std::time::Duration;

    struct PlainObject {
        id: String,
    }

    impl BoundObject for PlainObject {
        fn id(&self) -> &str {
            &self.id
        }
    }

    /// Reads its registry while being dropped.
    struct ReentrantObject {
        id: String,
        registry: Weak<ObjectRegistry<ReentrantObject>>,
        drops: Arc<AtomicUsize>,
    }

    impl BoundObject for ReentrantObject {
        fn id(&self) -> &str {
            &self.id
        }
    }

    impl Drop for ReentrantObject {
        fn drop(&mut self) {
            if let Some(registry) = self.registry.upgrade() {
                let _ = registry.len();
            }
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn reentrant(
        registry: &Arc<ObjectRegistry<ReentrantObject>>,
        id: &str,
        drops: &Arc<AtomicUsize>,
    ) -> Arc<ReentrantObject> {
        Arc::new(ReentrantObject {
            id: id.to_string(),
            registry: Arc::downgrade(registry),
            drops: drops.clone(),
        })
    }

    #[test]
    fn displaced_objects_may_reenter_registry_on_drop() {
        let registry = Arc::new(ObjectRegistry::<ReentrantObject>::new());
        let drops = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = mpsc::channel();

        let worker = {
            let registry = registry.clone();
            let drops = drops.clone();
            thread::spawn(move || {
                registry.register(reentrant(&registry, "reentrant", &drops));
                // Overwrite drops the last reference to the first object.
                registry.register(reentrant(&registry, "reentrant", &drops));

                let current = registry.find("reentrant").expect("replacement registered");
                registry.deregister(&current);
                drop(current);

                let exact = reentrant(&registry, "exact", &drops);
                registry.register(exact.clone());
                assert!(registry.deregister_exact(&exact));
                drop(exact);

                done_tx.send(()).expect("report completion");
            })
        };

        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("registry mutations must not deadlock on reentrant drop");
        worker.join().expect("worker thread");
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn stores_trait_objects_by_default() {
        let registry: ObjectRegistry = ObjectRegistry::new();
        let object: Arc<dyn BoundObject> = Arc::new(PlainObject {
            id: "plain".to_string(),
        });
        registry.register(object.clone());

        let found = registry.find("plain").expect("plain object registered");
        assert!(Arc::ptr_eq(&found, &object));
    }

    #[test]
    fn registry_holds_one_extra_reference() {
        let registry = ObjectRegistry::<ExampleBoundObject>::new();
        let object = Arc::new(ExampleBoundObject::new("counted"));
        assert_eq!(Arc::strong_count(&object), 1);

        registry.register(object.clone());
        assert_eq!(Arc::strong_count(&object), 2);

        registry.deregister(&object);
        assert_eq!(Arc::strong_count(&object), 1);
    }

    #[test]
    fn deregister_exact_ignores_different_object_with_same_id() {
        let registry = ObjectRegistry::<ExampleBoundObject>::new();
        let current = Arc::new(ExampleBoundObject::new("shared"));
        let stale = Arc::new(ExampleBoundObject::new("shared"));
        registry.register(current.clone());

        assert!(!registry.deregister_exact(&stale));
        assert!(registry.find("shared").is_some());

        assert!(registry.deregister_exact(&current));
        assert!(registry.find("shared").is_none());
    }

    #[test]
    fn clear_releases_all_references() {
        let registry = ObjectRegistry::<ExampleBoundObject>::new();
        let a = Arc::new(ExampleBoundObject::new("a"));
        let b = Arc::new(ExampleBoundObject::new("b"));
        registry.register(a.clone());
        registry.register(b.clone());
        assert_eq!(registry.ids(), vec!["a".to_string(), "b".to_string()]);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(Arc::strong_count(&a), 1);
        assert_eq!(Arc::strong_count(&b), 1);
    }

    #[test]
    fn concurrent_register_and_find_are_safe() {
        let registry = Arc::new(ObjectRegistry::<ExampleBoundObject>::new());
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("w{worker}-{i}");
                        registry.register(Arc::new(ExampleBoundObject::new(id.as_str())));
                        assert!(registry.find(&id).is_some());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker thread");
        }
        assert_eq!(registry.len(), 400);
    }
}

//! Instance caches for singleton and scoped services.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::di::error::DiResult;
use crate::di::service::TypeKey;

type Erased = Box<dyn Any + Send + Sync>;

/// Cached instances keyed by interface.
///
/// `one` holds the main instance (`Arc<I>`); `all` holds the sealed list of
/// every implementation (`Vec<Arc<I>>`) once it has been built.
#[derive(Default)]
pub struct ServicesContainer {
    one: HashMap<TypeKey, Erased>,
    all: HashMap<TypeKey, Erased>,
}

impl ServicesContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
        self.one
            .get(&TypeKey::of::<I>())
            .and_then(|erased| erased.downcast_ref::<Arc<I>>())
            .cloned()
    }

    /// Insert unless present; returns the instance that ends up cached.
    pub fn insert<I: ?Sized + Send + Sync + 'static>(&mut self, instance: Arc<I>) -> Arc<I> {
        let erased = self
            .one
            .entry(TypeKey::of::<I>())
            .or_insert_with(|| Box::new(instance.clone()));
        erased.downcast_ref::<Arc<I>>().cloned().unwrap_or(instance)
    }

    pub fn get_all<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Vec<Arc<I>>> {
        self.all
            .get(&TypeKey::of::<I>())
            .and_then(|erased| erased.downcast_ref::<Vec<Arc<I>>>())
            .cloned()
    }

    /// Seal the full list unless already sealed; returns the cached list.
    pub fn insert_all<I: ?Sized + Send + Sync + 'static>(
        &mut self,
        instances: Vec<Arc<I>>,
    ) -> Vec<Arc<I>> {
        let erased = self
            .all
            .entry(TypeKey::of::<I>())
            .or_insert_with(|| Box::new(instances.clone()));
        erased
            .downcast_ref::<Vec<Arc<I>>>()
            .cloned()
            .unwrap_or(instances)
    }

    pub fn len(&self) -> usize {
        self.one.len()
    }

    pub fn is_empty(&self) -> bool {
        self.one.is_empty()
    }
}

/// Process-wide singleton cache shared by the root provider and every scope.
///
/// Reads go through the `RwLock`. Construction is serialized by a re-entrant
/// lock so a singleton is built at most once, while a singleton's factory can
/// still resolve other singletons on the same thread.
#[derive(Default)]
pub struct SingletonContainer {
    services: RwLock<ServicesContainer>,
    construction: ReentrantMutex<()>,
}

impl SingletonContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
        self.services.read().get::<I>()
    }

    pub fn get_all<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Vec<Arc<I>>> {
        self.services.read().get_all::<I>()
    }

    pub fn get_or_create<I, F>(&self, create: F) -> DiResult<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> DiResult<Arc<I>>,
    {
        if let Some(instance) = self.get::<I>() {
            return Ok(instance);
        }
        let _construction = self.construction.lock();
        if let Some(instance) = self.get::<I>() {
            return Ok(instance);
        }
        let instance = create()?;
        Ok(self.services.write().insert(instance))
    }

    pub fn get_or_create_all<I, F>(&self, create: F) -> DiResult<Vec<Arc<I>>>
    where
        I: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> DiResult<Vec<Arc<I>>>,
    {
        if let Some(instances) = self.get_all::<I>() {
            return Ok(instances);
        }
        let _construction = self.construction.lock();
        if let Some(instances) = self.get_all::<I>() {
            return Ok(instances);
        }
        let instances = create()?;
        Ok(self.services.write().insert_all(instances))
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

/// Per-scope cache. The lock is never held while a service is constructed.
#[derive(Default)]
pub struct ScopedContainer {
    services: Mutex<ServicesContainer>,
}

impl ScopedContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
        self.services.lock().get::<I>()
    }

    pub fn insert<I: ?Sized + Send + Sync + 'static>(&self, instance: Arc<I>) -> Arc<I> {
        self.services.lock().insert(instance)
    }

    pub fn get_all<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Vec<Arc<I>>> {
        self.services.lock().get_all::<I>()
    }

    pub fn insert_all<I: ?Sized + Send + Sync + 'static>(&self, instances: Vec<Arc<I>>) -> Vec<Arc<I>> {
        self.services.lock().insert_all(instances)
    }

    pub fn len(&self) -> usize {
        self.services.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct A;

    impl Named for A {
        fn name(&self) -> &str {
            "a"
        }
    }

    #[test]
    fn test_first_insert_wins() {
        let mut container = ServicesContainer::new();
        let first: Arc<dyn Named> = Arc::new(A);
        let second: Arc<dyn Named> = Arc::new(A);

        let cached = container.insert(first.clone());
        assert!(Arc::ptr_eq(&cached, &first));
        let cached = container.insert(second);
        assert!(Arc::ptr_eq(&cached, &first));
        assert_eq!(container.get::<dyn Named>().unwrap().name(), "a");
    }

    #[test]
    fn test_singleton_created_once() {
        let container = SingletonContainer::new();
        let mut calls = 0;
        for _ in 0..3 {
            container
                .get_or_create::<String, _>(|| {
                    calls += 1;
                    Ok(Arc::new("value".to_string()))
                })
                .unwrap();
        }
        assert_eq!(calls, 1);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_singleton_factory_can_resolve_nested_singleton() {
        let container = SingletonContainer::new();
        let outer = container
            .get_or_create::<String, _>(|| {
                let inner = container.get_or_create::<u32, _>(|| Ok(Arc::new(7)))?;
                Ok(Arc::new(format!("outer-{}", inner)))
            })
            .unwrap();
        assert_eq!(outer.as_str(), "outer-7");
        assert_eq!(container.len(), 2);
    }
}

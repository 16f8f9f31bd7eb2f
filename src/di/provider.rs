//! Service resolution.
//!
//! # Responsibilities
//! - Resolve shared instances (singleton / scoped) and cache them
//! - Create caller-owned transient instances
//! - Create request scopes that share the singleton cache
//! - Build singletons eagerly at startup
//!
//! # Resolution Order
//! ```text
//! get_service::<I>()
//!     → singleton cache hit?        return
//!     → scoped cache hit?           return
//!     → no registration?            None
//!     → transient registration?     TransientForbidden
//!     → guard.enter(service)        CircularDependency on re-entry
//!     → factory(provider)
//!     → cache in singleton / scoped container
//! ```

use std::sync::Arc;

use crate::di::collection::{ServiceCollection, ServiceGroup};
use crate::di::container::{ScopedContainer, SingletonContainer};
use crate::di::error::{DiError, DiResult};
use crate::di::guard::CircularDependencyGuard;
use crate::di::service::{Scope, ServiceDescriptor, TypeKey};

/// Root or request-scoped service resolver.
pub struct ServiceProvider {
    collection: Arc<ServiceCollection>,
    singletons: Arc<SingletonContainer>,
    scoped: ScopedContainer,
    guard: CircularDependencyGuard,
}

impl ServiceProvider {
    /// Create the root provider. The collection is frozen from here on.
    pub fn new(collection: ServiceCollection) -> Self {
        Self {
            collection: Arc::new(collection),
            singletons: Arc::new(SingletonContainer::new()),
            scoped: ScopedContainer::new(),
            guard: CircularDependencyGuard::new(),
        }
    }

    /// New scope sharing the collection and singletons, with empty scoped cache.
    pub fn create_scoped(&self) -> ServiceProvider {
        Self {
            collection: Arc::clone(&self.collection),
            singletons: Arc::clone(&self.singletons),
            scoped: ScopedContainer::new(),
            guard: CircularDependencyGuard::new(),
        }
    }

    pub fn collection(&self) -> &ServiceCollection {
        &self.collection
    }

    /// Shared instance of `I`, or `None` if nothing is registered.
    pub fn get_service<I: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<I>>> {
        if let Some(instance) = self.singletons.get::<I>() {
            return Ok(Some(instance));
        }
        if let Some(instance) = self.scoped.get::<I>() {
            return Ok(Some(instance));
        }
        let Some(group) = self.collection.group::<I>() else {
            return Ok(None);
        };
        let Some(main) = group.main() else {
            return Ok(None);
        };

        match group.scope() {
            Scope::Transient => Err(DiError::TransientForbidden {
                interface: group.interface().name(),
                service: main.service().name(),
            }),
            Scope::Singleton => self
                .singletons
                .get_or_create(|| self.construct::<I>(main).map(Arc::from))
                .map(Some),
            Scope::Scoped => {
                let instance: Arc<I> = Arc::from(self.construct::<I>(main)?);
                Ok(Some(self.scoped.insert(instance)))
            }
        }
    }

    /// Shared instance of `I`; fails with `NotRegistered` if absent.
    pub fn get_required_service<I: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<I>> {
        self.get_service::<I>()?.ok_or_else(|| DiError::NotRegistered {
            interface: TypeKey::of::<I>().name(),
        })
    }

    /// Every implementation of `I`: main first, then newest to oldest.
    ///
    /// The list is built once and sealed in the cache.
    pub fn get_services<I: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<I>>> {
        if let Some(instances) = self.singletons.get_all::<I>() {
            return Ok(instances);
        }
        if let Some(instances) = self.scoped.get_all::<I>() {
            return Ok(instances);
        }
        let Some(group) = self.collection.group::<I>() else {
            return Ok(Vec::new());
        };

        match group.scope() {
            Scope::Transient => Err(DiError::TransientForbidden {
                interface: group.interface().name(),
                service: group.main().map(|d| d.service().name()).unwrap_or_default(),
            }),
            Scope::Singleton => self
                .singletons
                .get_or_create_all(|| self.build_all::<I>(group)),
            Scope::Scoped => {
                let instances = self.build_all::<I>(group)?;
                Ok(self.scoped.insert_all(instances))
            }
        }
    }

    /// Fresh caller-owned instance of a transient `I`.
    pub fn create_service<I: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Box<I>>> {
        let Some(group) = self.transient_group::<I>()? else {
            return Ok(None);
        };
        match group.main() {
            Some(main) => self.construct::<I>(main).map(Some),
            None => Ok(None),
        }
    }

    pub fn create_required_service<I: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Box<I>> {
        self.create_service::<I>()?.ok_or_else(|| DiError::NotRegistered {
            interface: TypeKey::of::<I>().name(),
        })
    }

    /// Fresh instances of every transient implementation: main first.
    pub fn create_services<I: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Box<I>>> {
        let Some(group) = self.transient_group::<I>()? else {
            return Ok(Vec::new());
        };
        group
            .descriptors()
            .iter()
            .rev()
            .map(|descriptor| self.construct::<I>(descriptor))
            .collect()
    }

    /// Construct every singleton now so failures abort startup.
    pub fn prebuild_singletons(&self) -> DiResult<()> {
        let singletons: Vec<&ServiceGroup> = self
            .collection
            .groups()
            .filter(|g| g.scope() == Scope::Singleton)
            .collect();

        for group in &singletons {
            (group.prebuild())(self)?;
        }
        tracing::debug!(count = singletons.len(), "Singletons prebuilt");
        Ok(())
    }

    fn transient_group<I: ?Sized + 'static>(&self) -> DiResult<Option<&ServiceGroup>> {
        let Some(group) = self.collection.group::<I>() else {
            return Ok(None);
        };
        if group.scope() != Scope::Transient {
            return Err(DiError::NotTransient {
                interface: group.interface().name(),
                scope: group.scope(),
            });
        }
        Ok(Some(group))
    }

    fn build_all<I: ?Sized + Send + Sync + 'static>(
        &self,
        group: &ServiceGroup,
    ) -> DiResult<Vec<Arc<I>>> {
        let Some(main) = self.get_service::<I>()? else {
            return Ok(Vec::new());
        };

        let mut instances = Vec::with_capacity(group.descriptors().len());
        instances.push(main);
        for descriptor in group.descriptors().iter().rev().skip(1) {
            instances.push(Arc::from(self.construct::<I>(descriptor)?));
        }
        Ok(instances)
    }

    fn construct<I: ?Sized + Send + Sync + 'static>(
        &self,
        descriptor: &ServiceDescriptor,
    ) -> DiResult<Box<I>> {
        let _entered = self.guard.enter(descriptor.service())?;
        let factory = descriptor.factory::<I>().ok_or_else(|| {
            DiError::construction::<I>(format!(
                "registered creator for '{}' does not produce this interface",
                descriptor.service()
            ))
        })?;

        tracing::trace!(
            interface = %descriptor.interface(),
            service = %descriptor.service(),
            scope = %descriptor.scope(),
            "Constructing service"
        );
        factory(self)
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("interfaces", &self.collection.len())
            .field("singletons", &self.singletons.len())
            .field("scoped", &self.scoped.len())
            .finish()
    }
}

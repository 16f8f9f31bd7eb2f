//! Service registration.
//!
//! # Responsibilities
//! - Group service creators by interface
//! - Enforce a single lifetime per interface
//! - Reject duplicate (interface, implementation) pairs
//! - Merge sub-registries without dropping either side

use std::collections::HashMap;

use crate::di::error::{DiError, DiResult};
use crate::di::provider::ServiceProvider;
use crate::di::service::{Factory, Implements, Injectable, Scope, ServiceDescriptor, TypeKey};

/// Eagerly builds every implementation of one interface.
pub(crate) type Prebuild = fn(&ServiceProvider) -> DiResult<()>;

/// All implementations registered for one interface.
#[derive(Clone, Debug)]
pub struct ServiceGroup {
    interface: TypeKey,
    scope: Scope,
    descriptors: Vec<ServiceDescriptor>,
    prebuild: Prebuild,
}

impl ServiceGroup {
    pub fn interface(&self) -> TypeKey {
        self.interface
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Registration order, oldest first.
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// The last registered implementation.
    pub fn main(&self) -> Option<&ServiceDescriptor> {
        self.descriptors.last()
    }

    pub(crate) fn prebuild(&self) -> Prebuild {
        self.prebuild
    }
}

/// Registry of service creators, keyed by interface.
#[derive(Clone, Debug, Default)]
pub struct ServiceCollection {
    groups: HashMap<TypeKey, ServiceGroup>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` as a process-wide singleton behind `I`.
    pub fn add_singleton<I, T>(&mut self) -> DiResult<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<I>,
    {
        self.add::<I, T>(Scope::Singleton, injectable_factory::<I, T>())
    }

    /// Register `T` as one instance per request scope behind `I`.
    pub fn add_scoped<I, T>(&mut self) -> DiResult<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<I>,
    {
        self.add::<I, T>(Scope::Scoped, injectable_factory::<I, T>())
    }

    /// Register `T` as a new instance per resolution behind `I`.
    pub fn add_transient<I, T>(&mut self) -> DiResult<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Implements<I>,
    {
        self.add::<I, T>(Scope::Transient, injectable_factory::<I, T>())
    }

    pub fn add_singleton_with<I, T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Implements<I>,
        F: Fn(&ServiceProvider) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add::<I, T>(Scope::Singleton, closure_factory::<I, T, F>(factory))
    }

    pub fn add_scoped_with<I, T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Implements<I>,
        F: Fn(&ServiceProvider) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add::<I, T>(Scope::Scoped, closure_factory::<I, T, F>(factory))
    }

    pub fn add_transient_with<I, T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Implements<I>,
        F: Fn(&ServiceProvider) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add::<I, T>(Scope::Transient, closure_factory::<I, T, F>(factory))
    }

    fn add<I, T>(&mut self, scope: Scope, factory: Factory<I>) -> DiResult<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Implements<I>,
    {
        let interface = TypeKey::of::<I>();
        let service = TypeKey::of::<T>();

        let group = self.groups.entry(interface).or_insert_with(|| ServiceGroup {
            interface,
            scope,
            descriptors: Vec::new(),
            prebuild: prebuild::<I>,
        });

        if group.descriptors.iter().any(|d| d.service() == service) {
            return Err(DiError::AlreadyRegistered {
                interface: interface.name(),
                service: service.name(),
            });
        }
        if group.scope != scope {
            return Err(DiError::ScopeMismatch {
                interface: interface.name(),
                service: service.name(),
                scope,
                existing: group.scope,
            });
        }

        group
            .descriptors
            .push(ServiceDescriptor::new::<I>(service, scope, factory));

        tracing::debug!(
            interface = %interface,
            service = %service,
            scope = %scope,
            "Service registered"
        );
        Ok(self)
    }

    /// Remove every implementation of `I`. Returns true if any were removed.
    pub fn remove_all<I: ?Sized + 'static>(&mut self) -> bool {
        self.groups.remove(&TypeKey::of::<I>()).is_some()
    }

    /// Remove implementation `T` of `I`; drops the interface once empty.
    pub fn remove<I: ?Sized + 'static, T: ?Sized + 'static>(&mut self) -> bool {
        let interface = TypeKey::of::<I>();
        let service = TypeKey::of::<T>();
        let Some(group) = self.groups.get_mut(&interface) else {
            return false;
        };

        let before = group.descriptors.len();
        group.descriptors.retain(|d| d.service() != service);
        let removed = group.descriptors.len() != before;
        if group.descriptors.is_empty() {
            self.groups.remove(&interface);
        }
        removed
    }

    pub fn contains<I: ?Sized + 'static>(&self) -> bool {
        self.groups.contains_key(&TypeKey::of::<I>())
    }

    pub fn contains_service<I: ?Sized + 'static, T: ?Sized + 'static>(&self) -> bool {
        let service = TypeKey::of::<T>();
        self.groups
            .get(&TypeKey::of::<I>())
            .is_some_and(|g| g.descriptors.iter().any(|d| d.service() == service))
    }

    /// Fold another collection into this one.
    ///
    /// Fails with [`DiError::MergeConflict`] if both sides register the same
    /// interface; in that case neither collection is modified.
    pub fn merge(&mut self, other: ServiceCollection) -> DiResult<&mut Self> {
        if let Some(conflict) = other.groups.keys().find(|k| self.groups.contains_key(k)) {
            return Err(DiError::MergeConflict {
                interface: conflict.name(),
            });
        }
        self.groups.extend(other.groups);
        Ok(self)
    }

    pub fn group<I: ?Sized + 'static>(&self) -> Option<&ServiceGroup> {
        self.groups.get(&TypeKey::of::<I>())
    }

    pub fn groups(&self) -> impl Iterator<Item = &ServiceGroup> {
        self.groups.values()
    }

    /// Number of registered interfaces.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn injectable_factory<I, T>() -> Factory<I>
where
    I: ?Sized + Send + Sync + 'static,
    T: Injectable + Implements<I>,
{
    Box::new(|provider| T::inject(provider).map(|service| <T as Implements<I>>::upcast(Box::new(service))))
}

fn closure_factory<I, T, F>(factory: F) -> Factory<I>
where
    I: ?Sized + Send + Sync + 'static,
    T: Implements<I>,
    F: Fn(&ServiceProvider) -> DiResult<T> + Send + Sync + 'static,
{
    Box::new(move |provider| {
        factory(provider).map(|service| <T as Implements<I>>::upcast(Box::new(service)))
    })
}

fn prebuild<I: ?Sized + Send + Sync + 'static>(provider: &ServiceProvider) -> DiResult<()> {
    provider.get_services::<I>().map(|_| ())
}

//! Service descriptors: type identity, lifetimes, and construction.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::di::error::DiResult;
use crate::di::provider::ServiceProvider;

/// Type identity with a readable name for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Service lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One instance for the whole process.
    Singleton,
    /// One instance per request scope.
    Scoped,
    /// A new instance on every resolution, owned by the caller.
    Transient,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => write!(f, "singleton"),
            Scope::Scoped => write!(f, "scoped"),
            Scope::Transient => write!(f, "transient"),
        }
    }
}

/// Constructor-based registration: the type declares how it is built from
/// its dependencies.
///
/// ```ignore
/// impl Injectable for UserService {
///     fn inject(provider: &ServiceProvider) -> DiResult<Self> {
///         Ok(Self { repo: provider.get_required_service::<dyn UserRepository>()? })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    fn inject(provider: &ServiceProvider) -> DiResult<Self>;
}

/// Declares that `Self` can be served as interface `I`.
///
/// Every type implements itself; use [`implements!`](crate::implements) to
/// expose a type as a trait object.
pub trait Implements<I: ?Sized>: Send + Sync + 'static {
    fn upcast(self: Box<Self>) -> Box<I>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Box<Self>) -> Box<T> {
        self
    }
}

/// Expose a concrete type as one or more trait-object interfaces.
///
/// ```ignore
/// implements!(EnglishGreeter => dyn Greeter);
/// ```
#[macro_export]
macro_rules! implements {
    ($ty:ty => $($iface:ty),+ $(,)?) => {
        $(
            impl $crate::di::Implements<$iface> for $ty {
                fn upcast(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<$iface> {
                    self
                }
            }
        )+
    };
}

/// Typed constructor stored behind the erased descriptor.
pub(crate) type Factory<I> = Box<dyn Fn(&ServiceProvider) -> DiResult<Box<I>> + Send + Sync>;

/// One registered implementation of an interface.
#[derive(Clone)]
pub struct ServiceDescriptor {
    interface: TypeKey,
    service: TypeKey,
    scope: Scope,
    factory: Arc<dyn Any + Send + Sync>,
}

impl ServiceDescriptor {
    pub(crate) fn new<I: ?Sized + 'static>(
        service: TypeKey,
        scope: Scope,
        factory: Factory<I>,
    ) -> Self {
        Self {
            interface: TypeKey::of::<I>(),
            service,
            scope,
            factory: Arc::new(factory),
        }
    }

    pub fn interface(&self) -> TypeKey {
        self.interface
    }

    pub fn service(&self) -> TypeKey {
        self.service
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub(crate) fn factory<I: ?Sized + 'static>(&self) -> Option<&Factory<I>> {
        self.factory.downcast_ref::<Factory<I>>()
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("interface", &self.interface)
            .field("service", &self.service)
            .field("scope", &self.scope)
            .finish()
    }
}

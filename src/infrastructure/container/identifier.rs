//! 服务与容器标识符
//!
//! Identifiers are opaque to the hooks: they are only hashed, compared and
//! printed.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Key under which a value is registered in a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceIdentifier {
    /// Unique token; two tokens are never equal unless one is a clone of the other.
    Token { id: Uuid, name: Option<Arc<str>> },
    /// Plain string key.
    Name(Arc<str>),
    /// Keyed by the Rust type itself.
    Type { id: TypeId, name: &'static str },
}

impl ServiceIdentifier {
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        ServiceIdentifier::Name(name.into())
    }

    pub fn of_type<T: 'static>() -> Self {
        ServiceIdentifier::Type {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

impl fmt::Display for ServiceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceIdentifier::Token { name: Some(name), .. } => write!(f, "Token({})", name),
            ServiceIdentifier::Token { id, name: None } => write!(f, "Token({})", id),
            ServiceIdentifier::Name(name) => write!(f, "{:?}", name),
            ServiceIdentifier::Type { name, .. } => write!(f, "{}", name),
        }
    }
}

impl From<&str> for ServiceIdentifier {
    fn from(name: &str) -> Self {
        ServiceIdentifier::Name(name.into())
    }
}

impl From<String> for ServiceIdentifier {
    fn from(name: String) -> Self {
        ServiceIdentifier::Name(name.into())
    }
}

/// Typed token. The type parameter only drives inference at the call site;
/// the container stores values type-erased.
pub struct Token<T> {
    id: ServiceIdentifier,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Token<T> {
    pub fn new() -> Self {
        Self {
            id: ServiceIdentifier::Token {
                id: Uuid::new_v4(),
                name: None,
            },
            _marker: PhantomData,
        }
    }

    /// Token carrying a name for diagnostics. Still unique.
    pub fn named(name: &str) -> Self {
        Self {
            id: ServiceIdentifier::Token {
                id: Uuid::new_v4(),
                name: Some(name.into()),
            },
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> &ServiceIdentifier {
        &self.id
    }
}

impl<T> Default for Token<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Token<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<&Token<T>> for ServiceIdentifier {
    fn from(token: &Token<T>) -> Self {
        token.id.clone()
    }
}

/// Identifier for values registered under their own type.
pub struct TypeKey<T>(PhantomData<fn() -> T>);

impl<T> TypeKey<T> {
    pub const fn new() -> Self {
        TypeKey(PhantomData)
    }
}

impl<T> Default for TypeKey<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything that names a service resolving to `T`.
///
/// `Token<T>` and `TypeKey<T>` fix `T`; untyped keys (strings, raw
/// identifiers) leave it to the caller.
pub trait ServiceKey<T> {
    fn service_id(&self) -> ServiceIdentifier;
}

impl<T> ServiceKey<T> for Token<T> {
    fn service_id(&self) -> ServiceIdentifier {
        self.id.clone()
    }
}

impl<T: 'static> ServiceKey<T> for TypeKey<T> {
    fn service_id(&self) -> ServiceIdentifier {
        ServiceIdentifier::of_type::<T>()
    }
}

impl<T> ServiceKey<T> for ServiceIdentifier {
    fn service_id(&self) -> ServiceIdentifier {
        self.clone()
    }
}

impl<T> ServiceKey<T> for str {
    fn service_id(&self) -> ServiceIdentifier {
        ServiceIdentifier::Name(self.into())
    }
}

impl<T> ServiceKey<T> for String {
    fn service_id(&self) -> ServiceIdentifier {
        ServiceIdentifier::Name(self.as_str().into())
    }
}

/// Key under which a container is registered in the process-wide registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerIdentifier {
    /// The process-wide default container.
    Default,
    Name(Arc<str>),
    /// Symbol-like identifier that never collides with another.
    Unique(Uuid),
}

impl ContainerIdentifier {
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        ContainerIdentifier::Name(name.into())
    }

    pub fn unique() -> Self {
        ContainerIdentifier::Unique(Uuid::new_v4())
    }
}

impl fmt::Display for ContainerIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerIdentifier::Default => write!(f, "default"),
            ContainerIdentifier::Name(name) => write!(f, "{:?}", name),
            ContainerIdentifier::Unique(id) => write!(f, "Symbol({})", id),
        }
    }
}

impl From<&str> for ContainerIdentifier {
    fn from(name: &str) -> Self {
        ContainerIdentifier::Name(name.into())
    }
}

impl From<String> for ContainerIdentifier {
    fn from(name: String) -> Self {
        ContainerIdentifier::Name(name.into())
    }
}

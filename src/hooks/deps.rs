//! Dependency lists
//!
//! A `DepList` is compared element by element. Plain values compare by value;
//! handles (`Arc`s) compare by pointer identity. Identity keys hold a clone of
//! the handle so an address cannot be reused while the key is cached.

use crate::infrastructure::container::{ContainerRef, ServiceIdentifier, VisitorRef};
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Clone)]
pub enum DepKey {
    Unit,
    Bool(bool),
    Int(i128),
    Str(Arc<str>),
    Service(ServiceIdentifier),
    Identity(IdentityKey),
    Value(ValueKey),
}

impl DepKey {
    /// Key compared by pointer identity of `handle`.
    pub fn identity<P: ?Sized + 'static>(handle: &Arc<P>) -> Self {
        DepKey::Identity(IdentityKey {
            addr: Arc::as_ptr(handle) as *const () as usize,
            _owner: Rc::new(handle.clone()),
        })
    }

    /// Key compared with `T`'s `PartialEq`.
    pub fn value<T: PartialEq + fmt::Debug + 'static>(value: T) -> Self {
        DepKey::Value(ValueKey(Rc::new(value)))
    }
}

impl PartialEq for DepKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DepKey::Unit, DepKey::Unit) => true,
            (DepKey::Bool(a), DepKey::Bool(b)) => a == b,
            (DepKey::Int(a), DepKey::Int(b)) => a == b,
            (DepKey::Str(a), DepKey::Str(b)) => a == b,
            (DepKey::Service(a), DepKey::Service(b)) => a == b,
            (DepKey::Identity(a), DepKey::Identity(b)) => a.addr == b.addr,
            (DepKey::Value(a), DepKey::Value(b)) => a.0.eq_dyn(b.0.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Debug for DepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepKey::Unit => write!(f, "()"),
            DepKey::Bool(b) => write!(f, "{}", b),
            DepKey::Int(i) => write!(f, "{}", i),
            DepKey::Str(s) => write!(f, "{:?}", s),
            DepKey::Service(id) => write!(f, "{}", id),
            DepKey::Identity(key) => write!(f, "&{:#x}", key.addr),
            DepKey::Value(value) => write!(f, "{:?}", value.0),
        }
    }
}

#[derive(Clone)]
pub struct IdentityKey {
    addr: usize,
    _owner: Rc<dyn Any>,
}

#[derive(Clone)]
pub struct ValueKey(Rc<dyn DynValue>);

trait DynValue: fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn eq_dyn(&self, other: &dyn DynValue) -> bool;
}

impl<T: PartialEq + fmt::Debug + 'static> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_dyn(&self, other: &dyn DynValue) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|other| other == self)
    }
}

impl From<()> for DepKey {
    fn from(_: ()) -> Self {
        DepKey::Unit
    }
}

impl From<bool> for DepKey {
    fn from(value: bool) -> Self {
        DepKey::Bool(value)
    }
}

macro_rules! int_dep_key {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for DepKey {
                fn from(value: $ty) -> Self {
                    DepKey::Int(value as i128)
                }
            }
        )*
    };
}

int_dep_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<&str> for DepKey {
    fn from(value: &str) -> Self {
        DepKey::Str(value.into())
    }
}

impl From<String> for DepKey {
    fn from(value: String) -> Self {
        DepKey::Str(value.into())
    }
}

impl From<ServiceIdentifier> for DepKey {
    fn from(id: ServiceIdentifier) -> Self {
        DepKey::Service(id)
    }
}

impl From<&ServiceIdentifier> for DepKey {
    fn from(id: &ServiceIdentifier) -> Self {
        DepKey::Service(id.clone())
    }
}

impl From<&ContainerRef> for DepKey {
    fn from(container: &ContainerRef) -> Self {
        DepKey::identity(container)
    }
}

impl From<&VisitorRef> for DepKey {
    fn from(visitor: &VisitorRef) -> Self {
        DepKey::identity(visitor)
    }
}

/// Ordered dependency list of one hook call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DepList(Vec<DepKey>);

impl DepList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<DepKey>) {
        self.0.push(key.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `[id, container, ...extra]`, the key every container lookup hook uses.
    pub(crate) fn lookup_key(id: &ServiceIdentifier, container: &ContainerRef, extra: DepList) -> Self {
        let mut keys = Vec::with_capacity(extra.len() + 2);
        keys.push(DepKey::from(id));
        keys.push(DepKey::from(container));
        keys.extend(extra.0);
        Self(keys)
    }
}

impl From<Vec<DepKey>> for DepList {
    fn from(keys: Vec<DepKey>) -> Self {
        Self(keys)
    }
}

impl Extend<DepKey> for DepList {
    fn extend<I: IntoIterator<Item = DepKey>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// Build a `DepList` from values convertible into `DepKey`.
///
/// ```
/// use inject_hooks::deps;
/// let page = 3u32;
/// let list = deps![page, "users", true];
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        $crate::hooks::DepList::new()
    };
    ($($dep:expr),+ $(,)?) => {
        $crate::hooks::DepList::from(vec![$($crate::hooks::DepKey::from($dep)),+])
    };
}

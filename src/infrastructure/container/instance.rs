//! 容器实例
//!
//! A small registry of type-erased values keyed by `ServiceIdentifier`, with:
//! - parent fallback on lookup
//! - single and `multiple` registrations
//! - lazily created factory values (created once per registration)
//! - tree visitor notifications

use super::identifier::{ContainerIdentifier, ServiceIdentifier, ServiceKey};
use super::options::CreateContainerOptions;
use super::registry::{registry, ContainerParent};
use super::visitor::{same_visitor, VisitorRef};
use crate::errors::ContainerError;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

pub type ContainerRef = Arc<ContainerInstance>;

/// Type-erased registered value.
pub type ServiceValue = Arc<dyn Any + Send + Sync>;

/// 服务工厂trait
pub trait ServiceFactory: Send + Sync {
    /// 创建服务实例
    fn create(&self, container: &ContainerInstance) -> Result<ServiceValue, String>;

    /// 获取服务类型名称（用于错误信息）
    fn service_type_name(&self) -> &'static str;
}

/// 函数式服务工厂
pub struct FnServiceFactory<F, T> {
    factory_fn: F,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<F, T> FnServiceFactory<F, T> {
    pub fn new(factory_fn: F) -> Self {
        Self {
            factory_fn,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, T> ServiceFactory for FnServiceFactory<F, T>
where
    F: Fn(&ContainerInstance) -> Result<T, Box<dyn std::error::Error + Send + Sync>> + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    fn create(&self, container: &ContainerInstance) -> Result<ServiceValue, String> {
        let service = (self.factory_fn)(container).map_err(|e| e.to_string())?;
        Ok(Arc::new(service))
    }

    fn service_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// One registration. Values are stored pre-initialized; factories fill the
/// cell on first resolution.
struct ServiceEntry {
    factory: Option<Box<dyn ServiceFactory>>,
    instance: OnceLock<ServiceValue>,
}

impl ServiceEntry {
    fn resolve(&self, container: &ContainerInstance, id: &ServiceIdentifier) -> Result<ServiceValue, ContainerError> {
        if let Some(value) = self.instance.get() {
            return Ok(value.clone());
        }
        let Some(factory) = &self.factory else {
            return Err(ContainerError::NotFound { id: id.clone() });
        };

        let _guard = ResolutionGuard::enter(self as *const ServiceEntry as usize)
            .ok_or_else(|| ContainerError::CircularDependency { id: id.clone() })?;

        tracing::trace!(service = %id, r#type = factory.service_type_name(), "Creating service from factory");
        let created = factory
            .create(container)
            .map_err(|message| ContainerError::CreationFailed {
                id: id.clone(),
                message,
            })?;

        // A concurrent resolution may have won; the first stored value is canonical.
        let _ = self.instance.set(created.clone());
        Ok(self.instance.get().cloned().unwrap_or(created))
    }
}

thread_local! {
    static RESOLVING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a factory as in-flight on this thread for the guard's lifetime.
struct ResolutionGuard(usize);

impl ResolutionGuard {
    fn enter(key: usize) -> Option<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                None
            } else {
                stack.push(key);
                Some(ResolutionGuard(key))
            }
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| stack.borrow_mut().retain(|key| *key != self.0));
    }
}

/// Value passed to `ContainerInstance::set`.
pub struct Registration {
    id: ServiceIdentifier,
    entry: ServiceEntry,
    multiple: bool,
}

impl Registration {
    pub fn value<T: Send + Sync + 'static>(id: impl Into<ServiceIdentifier>, value: T) -> Self {
        let value: ServiceValue = Arc::new(value);
        Self {
            id: id.into(),
            entry: ServiceEntry {
                factory: None,
                instance: OnceLock::from(value),
            },
            multiple: false,
        }
    }

    pub fn factory<T, F>(id: impl Into<ServiceIdentifier>, factory: F) -> Self
    where
        F: Fn(&ContainerInstance) -> Result<T, Box<dyn std::error::Error + Send + Sync>> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            entry: ServiceEntry {
                factory: Some(Box::new(FnServiceFactory::<F, T>::new(factory))),
                instance: OnceLock::new(),
            },
            multiple: false,
        }
    }

    /// Register alongside other values under the same id instead of replacing.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
struct InnerStats {
    lookups: AtomicUsize,
    found: AtomicUsize,
    missing: AtomicUsize,
}

/// 容器统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStats {
    pub lookups: usize,
    pub found: usize,
    pub missing: usize,
}

impl ContainerStats {
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.found as f64 / self.lookups as f64
        }
    }
}

pub struct ContainerInstance {
    id: ContainerIdentifier,
    parent: Option<ContainerRef>,
    singles: DashMap<ServiceIdentifier, Arc<ServiceEntry>>,
    many: DashMap<ServiceIdentifier, Vec<Arc<ServiceEntry>>>,
    visitors: RwLock<Vec<VisitorRef>>,
    stats: InnerStats,
}

impl ContainerInstance {
    pub(crate) fn create(id: ContainerIdentifier, parent: Option<ContainerRef>) -> ContainerRef {
        Arc::new(Self {
            id,
            parent,
            singles: DashMap::new(),
            many: DashMap::new(),
            visitors: RwLock::new(Vec::new()),
            stats: InnerStats::default(),
        })
    }

    /// Container that is not entered in the process-wide registry and has no
    /// parent. Useful wherever shared default state must be avoided.
    pub fn standalone(id: impl Into<ContainerIdentifier>) -> ContainerRef {
        Self::create(id.into(), None)
    }

    /// Get the container registered under `id`, creating it against `parent`
    /// as `options` allow.
    pub fn of(
        id: impl Into<ContainerIdentifier>,
        parent: impl Into<ContainerParent>,
        options: Option<&CreateContainerOptions>,
    ) -> Result<Option<ContainerRef>, ContainerError> {
        registry().provision(id.into(), &parent.into(), options)
    }

    /// `of` with this container as the parent and default options.
    pub fn of_child(self: &Arc<Self>, id: impl Into<ContainerIdentifier>) -> Result<Option<ContainerRef>, ContainerError> {
        registry().provision(id.into(), &ContainerParent::Explicit(self.clone()), None)
    }

    pub fn id(&self) -> &ContainerIdentifier {
        &self.id
    }

    pub fn parent(&self) -> Option<&ContainerRef> {
        self.parent.as_ref()
    }

    // --- registration ---

    pub fn set(&self, registration: Registration) {
        let Registration { id, entry, multiple } = registration;
        let entry = Arc::new(entry);
        if multiple {
            self.many.entry(id.clone()).or_default().push(entry);
        } else {
            self.singles.insert(id.clone(), entry);
        }
        tracing::trace!(container = %self.id, service = %id, multiple, "Service registered");

        for visitor in self.visitors_snapshot() {
            visitor.visit_new_service(self, &id);
        }
    }

    pub fn set_value<T: Send + Sync + 'static>(&self, id: impl Into<ServiceIdentifier>, value: T) {
        self.set(Registration::value(id, value));
    }

    /// Whether this container (not its parents) holds a registration for `key`.
    pub fn has<T, K: ServiceKey<T> + ?Sized>(&self, key: &K) -> bool {
        let id = key.service_id();
        self.singles.contains_key(&id) || self.many.get(&id).is_some_and(|entries| !entries.is_empty())
    }

    /// Drop every registration for `key` in this container. Returns whether
    /// anything was removed.
    pub fn remove<T, K: ServiceKey<T> + ?Sized>(&self, key: &K) -> bool {
        let id = key.service_id();
        let single = self.singles.remove(&id).is_some();
        let many = self.many.remove(&id).is_some();
        single || many
    }

    // --- lookup ---

    pub fn get<T: Send + Sync + 'static, K: ServiceKey<T> + ?Sized>(&self, key: &K) -> Result<Arc<T>, ContainerError> {
        let id = key.service_id();
        match self.lookup_single(&id)? {
            Some(value) => downcast::<T>(&id, value),
            None => Err(ContainerError::NotFound { id }),
        }
    }

    pub fn get_or_none<T: Send + Sync + 'static, K: ServiceKey<T> + ?Sized>(
        &self,
        key: &K,
    ) -> Result<Option<Arc<T>>, ContainerError> {
        let id = key.service_id();
        self.lookup_single(&id)?
            .map(|value| downcast::<T>(&id, value))
            .transpose()
    }

    /// All values registered as `multiple` under `key`, in registration order.
    pub fn get_many<T: Send + Sync + 'static, K: ServiceKey<T> + ?Sized>(
        &self,
        key: &K,
    ) -> Result<Vec<Arc<T>>, ContainerError> {
        let id = key.service_id();
        match self.lookup_many(&id)? {
            Some(values) => values.into_iter().map(|value| downcast::<T>(&id, value)).collect(),
            None => Err(ContainerError::NotFound { id }),
        }
    }

    pub fn get_many_or_none<T: Send + Sync + 'static, K: ServiceKey<T> + ?Sized>(
        &self,
        key: &K,
    ) -> Result<Option<Vec<Arc<T>>>, ContainerError> {
        let id = key.service_id();
        self.lookup_many(&id)?
            .map(|values| {
                values
                    .into_iter()
                    .map(|value| downcast::<T>(&id, value))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
    }

    fn lookup_single(&self, id: &ServiceIdentifier) -> Result<Option<ServiceValue>, ContainerError> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);
        let found = self.find_single(id)?;
        self.record_outcome(found.is_some());
        Ok(found)
    }

    fn lookup_many(&self, id: &ServiceIdentifier) -> Result<Option<Vec<ServiceValue>>, ContainerError> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);
        let found = self.find_many(id)?;
        self.record_outcome(found.is_some());
        Ok(found)
    }

    fn find_single(&self, id: &ServiceIdentifier) -> Result<Option<ServiceValue>, ContainerError> {
        // Clone the entry out so the map guard is released before a factory runs.
        let entry = self.singles.get(id).map(|entry| entry.value().clone());
        match entry {
            Some(entry) => entry.resolve(self, id).map(Some),
            None => match &self.parent {
                Some(parent) => parent.find_single(id),
                None => Ok(None),
            },
        }
    }

    fn find_many(&self, id: &ServiceIdentifier) -> Result<Option<Vec<ServiceValue>>, ContainerError> {
        let entries = self
            .many
            .get(id)
            .map(|entries| entries.value().clone())
            .filter(|entries| !entries.is_empty());
        match entries {
            Some(entries) => entries
                .iter()
                .map(|entry| entry.resolve(self, id))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            None => match &self.parent {
                Some(parent) => parent.find_many(id),
                None => Ok(None),
            },
        }
    }

    fn record_outcome(&self, found: bool) {
        let counter = if found { &self.stats.found } else { &self.stats.missing };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取容器统计信息
    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            lookups: self.stats.lookups.load(Ordering::Relaxed),
            found: self.stats.found.load(Ordering::Relaxed),
            missing: self.stats.missing.load(Ordering::Relaxed),
        }
    }

    // --- tree visitors ---

    /// Offer `visitor` to this container. Returns whether it is now attached;
    /// a visitor that is already attached, or that refuses in
    /// `visit_container`, is not.
    pub fn accept_tree_visitor(&self, visitor: VisitorRef) -> bool {
        if self.is_visitor_attached(&visitor) {
            return false;
        }
        if !visitor.visit_container(self) {
            tracing::debug!(container = %self.id, "Tree visitor refused attachment");
            return false;
        }

        let mut visitors = self.visitors.write();
        if visitors.iter().any(|existing| same_visitor(existing, &visitor)) {
            return false;
        }
        visitors.push(visitor);
        tracing::debug!(container = %self.id, attached = visitors.len(), "Tree visitor attached");
        true
    }

    /// Detach `visitor` and dispose it. Returns `false` if it was not attached.
    pub fn detach_tree_visitor(&self, visitor: &VisitorRef) -> bool {
        let removed = {
            let mut visitors = self.visitors.write();
            let before = visitors.len();
            visitors.retain(|existing| !same_visitor(existing, visitor));
            before != visitors.len()
        };
        if removed {
            tracing::debug!(container = %self.id, "Tree visitor detached");
            visitor.dispose();
        }
        removed
    }

    pub fn is_visitor_attached(&self, visitor: &VisitorRef) -> bool {
        self.visitors.read().iter().any(|existing| same_visitor(existing, visitor))
    }

    /// Visitors are called without the lock held so they may re-enter.
    pub(crate) fn visitors_snapshot(&self) -> Vec<VisitorRef> {
        self.visitors.read().clone()
    }
}

impl fmt::Debug for ContainerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerInstance")
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().map(|parent| parent.id()))
            .field("services", &(self.singles.len() + self.many.len()))
            .finish()
    }
}

fn downcast<T: Send + Sync + 'static>(id: &ServiceIdentifier, value: ServiceValue) -> Result<Arc<T>, ContainerError> {
    value.downcast::<T>().map_err(|_| ContainerError::TypeCastFailed {
        id: id.clone(),
        expected: std::any::type_name::<T>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::container::identifier::Token;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone)]
    struct TestService {
        id: usize,
    }

    #[test]
    fn test_factory_runs_once() {
        let container = ContainerInstance::standalone("factory");
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        let token = Token::<TestService>::new();

        container.set(Registration::factory(&token, move |_| {
            let id = counter_clone.fetch_add(1, Ordering::SeqCst);
            Ok(TestService { id })
        }));

        let first = container.get(&token).unwrap();
        let second = container.get(&token).unwrap();
        assert_eq!(first.id, second.id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_factory_reports_creation_error() {
        let container = ContainerInstance::standalone("failing");
        let token = Token::<TestService>::named("broken");
        container.set(Registration::factory::<TestService, _>(&token, |_| Err("boom".into())));

        let err = container.get(&token).unwrap_err();
        assert!(matches!(err, ContainerError::CreationFailed { ref message, .. } if message == "boom"));
    }

    #[test]
    fn test_self_dependent_factory_is_detected() {
        let container = ContainerInstance::standalone("cycle");
        let token = Token::<TestService>::named("cyclic");
        let inner = token.clone();
        container.set(Registration::factory(&token, move |c| {
            let other = c.get(&inner)?;
            Ok(TestService { id: other.id + 1 })
        }));

        let err = container.get(&token).unwrap_err();
        // The inner failure is wrapped by the outer factory.
        assert!(matches!(err, ContainerError::CreationFailed { .. }));
        assert!(err.to_string().contains("depends on itself"));
    }

    #[test]
    fn test_type_mismatch() {
        let container = ContainerInstance::standalone("types");
        container.set_value("port", 8080u16);

        let err = container.get::<String, _>("port").unwrap_err();
        assert!(matches!(err, ContainerError::TypeCastFailed { .. }));
        assert_eq!(*container.get::<u16, _>("port").unwrap(), 8080);
    }

    #[test]
    fn test_parent_fallback() {
        let parent = ContainerInstance::standalone("parent");
        let child = ContainerInstance::create(ContainerIdentifier::unique(), Some(parent.clone()));
        parent.set_value("greeting", "hello".to_string());

        assert_eq!(*child.get::<String, _>("greeting").unwrap(), "hello");
        assert!(!child.has::<String, _>("greeting"));

        child.set_value("greeting", "hi".to_string());
        assert_eq!(*child.get::<String, _>("greeting").unwrap(), "hi");
        assert_eq!(*parent.get::<String, _>("greeting").unwrap(), "hello");
    }

    #[test]
    fn test_many_keeps_registration_order() {
        let container = ContainerInstance::standalone("many");
        let token = Token::<&'static str>::new();
        for name in ["a", "b", "c"] {
            container.set(Registration::value(&token, name).multiple());
        }

        let values: Vec<_> = container.get_many(&token).unwrap().iter().map(|v| **v).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
        // Multiple registrations are not visible to single lookups.
        assert!(container.get_or_none(&token).unwrap().is_none());
    }

    #[test]
    fn test_stats_count_lookups() {
        let container = ContainerInstance::standalone("stats");
        container.set_value("x", 1i32);

        for _ in 0..3 {
            container.get::<i32, _>("x").unwrap();
        }
        assert!(container.get_or_none::<i32, _>("y").unwrap().is_none());

        let stats = container.stats();
        assert_eq!(stats.lookups, 4);
        assert_eq!(stats.found, 3);
        assert_eq!(stats.missing, 1);
        assert!(stats.hit_rate() > 0.7);
    }
}

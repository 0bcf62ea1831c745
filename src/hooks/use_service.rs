//! Single-value resolver hooks.

use super::deps::DepList;
use super::host::RenderContext;
use super::primitives::try_use_memo;
use crate::errors::ContainerError;
use crate::infrastructure::container::{default_container, ContainerRef, ServiceKey};
use std::sync::Arc;

/// Get the service registered under `id`.
///
/// `container` defaults to the default container. The lookup re-runs only
/// when `id`, the container or any element of `deps` changes; otherwise the
/// previous `Arc` is returned.
///
/// # Errors
///
/// `ContainerError::NotFound` when nothing is registered under `id`, or any
/// other error the container reports.
///
/// ```
/// use inject_hooks::hooks::{use_service, ComponentHost};
/// use inject_hooks::infrastructure::container::{ContainerInstance, Token};
/// use inject_hooks::deps;
///
/// let greeting = Token::<String>::new();
/// let container = ContainerInstance::standalone("docs");
/// container.set_value(&greeting, "hello".to_string());
///
/// let mut host = ComponentHost::new("greeter");
/// let value = host.render(|cx| use_service(cx, &greeting, Some(&container), deps![])).unwrap();
/// assert_eq!(*value, "hello");
/// ```
pub fn use_service<T, K>(
    cx: &mut RenderContext<'_>,
    id: &K,
    container: Option<&ContainerRef>,
    deps: DepList,
) -> Result<Arc<T>, ContainerError>
where
    T: Send + Sync + 'static,
    K: ServiceKey<T> + ?Sized,
{
    let id = id.service_id();
    let container = container.cloned().unwrap_or_else(default_container);
    let key = DepList::lookup_key(&id, &container, deps);
    try_use_memo(cx, key, || container.get::<T, _>(&id))
}

/// Like [`use_service`], but an unregistered `id` yields `Ok(None)`.
pub fn use_service_or_none<T, K>(
    cx: &mut RenderContext<'_>,
    id: &K,
    container: Option<&ContainerRef>,
    deps: DepList,
) -> Result<Option<Arc<T>>, ContainerError>
where
    T: Send + Sync + 'static,
    K: ServiceKey<T> + ?Sized,
{
    let id = id.service_id();
    let container = container.cloned().unwrap_or_else(default_container);
    let key = DepList::lookup_key(&id, &container, deps);
    try_use_memo(cx, key, || container.get_or_none::<T, _>(&id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;
    use crate::hooks::harness::render_hook;
    use crate::infrastructure::container::{ContainerInstance, Token};

    #[test]
    fn test_unchanged_inputs_skip_lookup() {
        let container = ContainerInstance::standalone("svc");
        let token = Token::<String>::new();
        container.set_value(&token, "Joanna".to_string());

        let mut hook = render_hook((), |cx, _| use_service(cx, &token, Some(&container), deps![]));
        let first = hook.current().cloned().unwrap();
        hook.rerender();
        hook.rerender();

        assert!(Arc::ptr_eq(&first, hook.current().unwrap()));
        assert_eq!(container.stats().lookups, 1);
    }

    #[test]
    fn test_dep_change_triggers_one_lookup() {
        let container = ContainerInstance::standalone("svc");
        let token = Token::<u32>::new();
        container.set_value(&token, 7u32);

        let mut hook = render_hook(1u32, |cx, page| use_service(cx, &token, Some(&container), deps![*page]));
        hook.rerender_with(2);
        hook.rerender_with(2);

        assert_eq!(**hook.current().unwrap(), 7);
        assert_eq!(container.stats().lookups, 2);
    }

    #[test]
    fn test_or_none_leaves_container_untouched() {
        let container = ContainerInstance::standalone("svc");
        let missing = Token::<String>::new();

        let hook = render_hook((), |cx, _| use_service_or_none(cx, &missing, Some(&container), deps![]));
        assert!(hook.current().unwrap().is_none());
        assert!(!container.has(&missing));

        let hook = render_hook((), |cx, _| use_service(cx, &missing, Some(&container), deps![]));
        assert!(hook.error().unwrap().is_not_found());
        assert!(!container.has(&missing));
    }

    #[test]
    fn test_or_none_still_reports_type_mismatch() {
        let container = ContainerInstance::standalone("svc");
        container.set_value("port", 80u16);

        let hook = render_hook((), |cx, _| use_service_or_none::<String, _>(cx, "port", Some(&container), deps![]));
        assert!(matches!(hook.error(), Some(ContainerError::TypeCastFailed { .. })));
    }
}

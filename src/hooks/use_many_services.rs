//! Multi-value resolver hooks.

use super::deps::DepList;
use super::host::RenderContext;
use super::primitives::try_use_memo;
use crate::errors::ContainerError;
use crate::infrastructure::container::{default_container, ContainerRef, ServiceKey};
use std::sync::Arc;

/// Every value registered as `multiple` under `id`, in registration order.
///
/// `deps` only decides when the lookup re-runs; it is never passed to the
/// container.
///
/// # Errors
///
/// `ContainerError::NotFound` when no `multiple` registration exists.
pub fn use_many_services<T, K>(
    cx: &mut RenderContext<'_>,
    id: &K,
    container: Option<&ContainerRef>,
    deps: DepList,
) -> Result<Arc<[Arc<T>]>, ContainerError>
where
    T: Send + Sync + 'static,
    K: ServiceKey<T> + ?Sized,
{
    let id = id.service_id();
    let container = container.cloned().unwrap_or_else(default_container);
    let key = DepList::lookup_key(&id, &container, deps);
    try_use_memo(cx, key, || container.get_many::<T, _>(&id).map(Arc::from))
}

/// Like [`use_many_services`], but zero registrations yield `Ok(None)`.
pub fn use_many_services_or_none<T, K>(
    cx: &mut RenderContext<'_>,
    id: &K,
    container: Option<&ContainerRef>,
    deps: DepList,
) -> Result<Option<Arc<[Arc<T>]>>, ContainerError>
where
    T: Send + Sync + 'static,
    K: ServiceKey<T> + ?Sized,
{
    let id = id.service_id();
    let container = container.cloned().unwrap_or_else(default_container);
    let key = DepList::lookup_key(&id, &container, deps);
    try_use_memo(cx, key, || {
        container
            .get_many_or_none::<T, _>(&id)
            .map(|values| values.map(Arc::from))
    })
}

//! Container provisioner hook.

use super::deps::{DepKey, DepList};
use super::host::RenderContext;
use super::primitives::try_use_memo;
use crate::errors::ContainerError;
use crate::infrastructure::container::{ContainerIdentifier, ContainerInstance, ContainerParent, ContainerRef, CreateContainerOptions};

/// Get or create the container registered under `id`.
///
/// If the container already exists, its instance is returned; otherwise a
/// new one is created against `parent`. `options` decide what happens when
/// the id is free or taken by an incompatible container, including policies
/// that yield `Ok(None)`; `None` falls back to the registry's default
/// options.
///
/// Re-runs only when `id`, `parent` or `options` change. Options compare by
/// value and an `Explicit` parent by pointer, so passing a freshly built
/// `CreateContainerOptions` on every render does not reprovision.
///
/// Creating the container registers it process-wide: this is not a pure read.
pub fn use_container(
    cx: &mut RenderContext<'_>,
    id: impl Into<ContainerIdentifier>,
    parent: ContainerParent,
    options: Option<&CreateContainerOptions>,
) -> Result<Option<ContainerRef>, ContainerError> {
    let id = id.into();
    let options = options.copied();
    let key = DepList::from(vec![
        DepKey::value(id.clone()),
        DepKey::value(parent.clone()),
        DepKey::value(options),
    ]);
    try_use_memo(cx, key, || ContainerInstance::of(id, parent, options.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::harness::render_hook;
    use crate::infrastructure::container::{default_container, registry, OnFree};
    use std::sync::Arc;

    #[test]
    fn test_same_container_across_renders() {
        let id = ContainerIdentifier::unique();
        let mut hook = render_hook((), |cx, _| use_container(cx, id.clone(), ContainerParent::Default, None));
        let first = hook.current().cloned().flatten().unwrap();
        hook.rerender();
        let second = hook.current().cloned().flatten().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(first.parent().unwrap(), &default_container()));
        assert_eq!(first.id(), &id);
    }

    #[test]
    fn test_options_change_reprovisions() {
        let id = ContainerIdentifier::unique();
        let null = CreateContainerOptions::default().on_free(OnFree::Null);

        let mut hook = render_hook(Some(null), |cx, options| {
            use_container(cx, id.clone(), ContainerParent::Orphaned, options.as_ref())
        });
        assert!(hook.current().unwrap().is_none());

        hook.rerender_with(None);
        let created = hook.current().cloned().flatten().unwrap();
        assert!(created.parent().is_none());
    }

    #[test]
    fn test_fresh_equal_options_do_not_reprovision() {
        let id = ContainerIdentifier::unique();
        let mut hook = render_hook((), |cx, _| {
            let options = CreateContainerOptions::default().on_free(OnFree::ReturnNew);
            use_container(cx, id.clone(), ContainerParent::Default, Some(&options))
        });
        let first = hook.current().cloned().flatten().unwrap();

        // A re-run would provision a new container under the freed id.
        registry().remove(&id);
        hook.rerender();
        let second = hook.current().cloned().flatten().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}

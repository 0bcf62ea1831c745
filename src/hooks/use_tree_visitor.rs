//! Visitor attachment hook.

use super::host::{Cleanup, RenderContext};
use super::primitives::{use_effect, use_memo, MutableRef};
use crate::deps;
use crate::infrastructure::container::{default_container, ContainerRef, VisitorRef};
use std::rc::Rc;

/// Detaches one `(visitor, container)` attachment made by `use_tree_visitor`.
///
/// Cloning yields a handle to the same attachment. Detaching twice, or
/// after the component already cleaned up, never reaches the container.
#[derive(Clone)]
pub struct DetachHandle(Rc<Attachment>);

struct Attachment {
    attached: MutableRef<bool>,
    visitor: VisitorRef,
    container: ContainerRef,
}

impl DetachHandle {
    pub fn detach(&self) {
        // Only detach if we *think* it's attached; the container may have refused it.
        if self.0.attached.replace(false) {
            self.0.container.detach_tree_visitor(&self.0.visitor);
        }
    }

    /// Live view of the attachment flag.
    pub fn is_attached(&self) -> bool {
        self.0.attached.get()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn attach(&self) -> bool {
        let accepted = self.0.container.accept_tree_visitor(self.0.visitor.clone());
        self.0.attached.set(accepted);
        accepted
    }
}

impl std::fmt::Debug for DetachHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetachHandle")
            .field("container", self.0.container.id())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Attach `visitor` to `container` (default container when `None`) for as
/// long as the component stays mounted.
///
/// Attachment happens when the render commits, and again whenever the
/// `(visitor, container)` pair changes, after the previous pair has been
/// detached. Every pair gets its own handle and flag, so a handle kept from
/// an earlier pair only ever detaches that pair. Returns the handle and its
/// attachment flag as read during this render; the first render of a pair
/// therefore reports `false`.
pub fn use_tree_visitor(
    cx: &mut RenderContext<'_>,
    visitor: &VisitorRef,
    container: Option<&ContainerRef>,
) -> (DetachHandle, bool) {
    let container = container.cloned().unwrap_or_else(default_container);

    let handle = use_memo(cx, deps![visitor, &container], || {
        DetachHandle(Rc::new(Attachment {
            attached: MutableRef::new(false),
            visitor: visitor.clone(),
            container: container.clone(),
        }))
    });
    let currently_attached = handle.is_attached();

    let effect_handle = handle.clone();
    use_effect(cx, deps![visitor, &container], move || {
        if !effect_handle.attach() {
            tracing::debug!(container = %effect_handle.0.container.id(), "Tree visitor was not attached");
        }
        Some(Box::new(move || effect_handle.detach()) as Cleanup)
    });

    (handle, currently_attached)
}

//! Component host
//!
//! Owns the hook slots of one component instance and drives the
//! render → commit → unmount lifecycle. Hooks are identified by call order:
//! the n-th hook call of a render uses the n-th slot.

use super::deps::DepList;
use std::any::Any;

/// Cleanup returned by an effect. Runs before the effect re-runs and on unmount.
pub type Cleanup = Box<dyn FnOnce()>;

pub(crate) type Effect = Box<dyn FnOnce() -> Option<Cleanup>>;

/// Per-call-site state stored in a slot.
pub(crate) trait HookState: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Release whatever the state holds; called when the slot is dropped.
    fn teardown(&mut self) {}
}

/// State of one `use_effect` call site.
#[derive(Default)]
pub(crate) struct EffectState {
    pub(crate) deps: Option<DepList>,
    pub(crate) cleanup: Option<Cleanup>,
}

impl HookState for EffectState {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn teardown(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// Placeholder while a slot's state is lent out to a hook.
struct Vacant;

impl HookState for Vacant {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

pub(crate) struct PendingEffect {
    pub(crate) slot: usize,
    pub(crate) deps: DepList,
    pub(crate) effect: Effect,
}

/// Handed to hooks during one render pass.
pub struct RenderContext<'a> {
    slots: &'a mut Vec<Box<dyn HookState>>,
    cursor: usize,
    pending: Vec<PendingEffect>,
}

impl<'a> RenderContext<'a> {
    /// Run `f` on the state of the next hook call, created with `init` on
    /// first use. A slot holding a different kind of state means hook order
    /// changed between renders; the old state is torn down and the call site
    /// starts fresh.
    pub(crate) fn with_slot<S: HookState, R>(&mut self, init: impl FnOnce() -> S, f: impl FnOnce(usize, &mut S) -> R) -> R {
        let index = self.cursor;
        self.cursor += 1;
        if index == self.slots.len() {
            self.slots.push(Box::new(Vacant));
        }

        let mut existing = std::mem::replace(&mut self.slots[index], Box::new(Vacant));
        let mut state: Box<S> = if existing.as_any_mut().is::<S>() {
            match existing.into_any().downcast::<S>() {
                Ok(state) => state,
                Err(_) => Box::new(init()),
            }
        } else {
            if !existing.as_any_mut().is::<Vacant>() {
                tracing::warn!(slot = index, "Hook order changed between renders; resetting slot");
                existing.teardown();
            }
            Box::new(init())
        };

        let output = f(index, &mut state);
        self.slots[index] = state as Box<dyn HookState>;
        output
    }

    pub(crate) fn schedule_effect(&mut self, effect: PendingEffect) {
        self.pending.push(effect);
    }

    /// Number of hooks called so far in this render.
    pub fn hook_count(&self) -> usize {
        self.cursor
    }
}

/// One mounted component instance.
pub struct ComponentHost {
    name: &'static str,
    slots: Vec<Box<dyn HookState>>,
    mounted: bool,
    render_count: u64,
}

impl ComponentHost {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Vec::new(),
            mounted: false,
            render_count: 0,
        }
    }

    /// Run one render pass and commit it.
    ///
    /// On `Ok` the queued effects run in call order, each after the cleanup
    /// of its previous run. On `Err` the component is unmounted (every
    /// cleanup runs) and the error is returned; the next render mounts fresh.
    pub fn render<R, E>(&mut self, render: impl FnOnce(&mut RenderContext<'_>) -> Result<R, E>) -> Result<R, E> {
        let mut cx = RenderContext {
            slots: &mut self.slots,
            cursor: 0,
            pending: Vec::new(),
        };

        match render(&mut cx) {
            Ok(output) => {
                let RenderContext { cursor, pending, .. } = cx;
                self.truncate_slots(cursor);
                self.commit(pending);
                self.mounted = true;
                self.render_count += 1;
                tracing::trace!(component = self.name, render = self.render_count, hooks = cursor, "Render committed");
                Ok(output)
            }
            Err(err) => {
                drop(cx);
                tracing::debug!(component = self.name, "Render failed; unmounting");
                self.unmount();
                Err(err)
            }
        }
    }

    fn truncate_slots(&mut self, used: usize) {
        if used < self.slots.len() {
            tracing::warn!(
                component = self.name,
                expected = self.slots.len(),
                rendered = used,
                "Rendered fewer hooks than the previous render"
            );
            for mut slot in self.slots.drain(used..) {
                slot.teardown();
            }
        }
    }

    fn commit(&mut self, pending: Vec<PendingEffect>) {
        for effect in &pending {
            if let Some(state) = self.effect_state(effect.slot) {
                if let Some(cleanup) = state.cleanup.take() {
                    cleanup();
                }
            }
        }
        for PendingEffect { slot, deps, effect } in pending {
            let cleanup = effect();
            if let Some(state) = self.effect_state(slot) {
                state.deps = Some(deps);
                state.cleanup = cleanup;
            }
        }
    }

    fn effect_state(&mut self, slot: usize) -> Option<&mut EffectState> {
        self.slots
            .get_mut(slot)
            .and_then(|state| state.as_any_mut().downcast_mut::<EffectState>())
    }

    /// Tear down every slot in call order. Safe to call more than once.
    pub fn unmount(&mut self) {
        if self.slots.is_empty() && !self.mounted {
            return;
        }
        for mut slot in self.slots.drain(..) {
            slot.teardown();
        }
        self.mounted = false;
        tracing::trace!(component = self.name, "Component unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Committed renders since creation, across remounts.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Default for ComponentHost {
    fn default() -> Self {
        Self::new("component")
    }
}

impl Drop for ComponentHost {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;
    use crate::hooks::primitives::{use_effect, use_memo};
    use std::cell::Cell;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[test]
    fn test_reordered_slot_tears_down_previous_state() {
        let cleaned = Rc::new(Cell::new(false));
        let mut host = ComponentHost::new("reorder");
        let flag = cleaned.clone();
        host.render(|cx| {
            use_effect(cx, deps![], move || Some(Box::new(move || flag.set(true)) as Cleanup));
            Ok::<_, Infallible>(())
        })
        .unwrap();

        let value = host
            .render(|cx| Ok::<_, Infallible>(use_memo(cx, deps![], || 7u8)))
            .unwrap();
        assert_eq!(value, 7);
        assert!(cleaned.get());
        assert!(host.is_mounted());
    }

    #[test]
    fn test_slots_survive_between_renders() {
        let mut host = ComponentHost::new("slots");
        let calls = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let calls = calls.clone();
            let count = host
                .render(|cx| {
                    use_memo(cx, deps![], move || calls.set(calls.get() + 1));
                    Ok::<_, Infallible>(cx.hook_count())
                })
                .unwrap();
            assert_eq!(count, 1);
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(host.render_count(), 3);
    }
}

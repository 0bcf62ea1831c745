//! Host primitives: memoization, mount effects and persistent cells.

use super::deps::DepList;
use super::host::{Cleanup, EffectState, HookState, PendingEffect, RenderContext};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

struct MemoState<T> {
    entry: Option<(DepList, T)>,
}

impl<T: 'static> HookState for MemoState<T> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Return the cached value for this call site, running `compute` only on the
/// first render or when `deps` differs from the cached list.
pub fn use_memo<T: Clone + 'static>(cx: &mut RenderContext<'_>, deps: DepList, compute: impl FnOnce() -> T) -> T {
    match try_use_memo(cx, deps, || Ok::<T, std::convert::Infallible>(compute())) {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Fallible `use_memo`. An `Err` is returned as-is and leaves the cache
/// untouched, so the next render with the same deps runs `compute` again.
pub fn try_use_memo<T: Clone + 'static, E>(
    cx: &mut RenderContext<'_>,
    deps: DepList,
    compute: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    cx.with_slot(
        || MemoState::<T> { entry: None },
        |slot, state| {
            if let Some((cached, value)) = &state.entry {
                if *cached == deps {
                    tracing::trace!(slot, "Memo hit");
                    return Ok(value.clone());
                }
            }

            tracing::trace!(slot, deps = ?deps, "Memo miss; recomputing");
            let value = compute()?;
            state.entry = Some((deps, value.clone()));
            Ok(value)
        },
    )
}

/// Schedule `effect` to run at commit when `deps` changed since its last run.
/// The returned cleanup runs before the next run and on unmount.
pub fn use_effect<F>(cx: &mut RenderContext<'_>, deps: DepList, effect: F)
where
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    let (slot, unchanged) = cx.with_slot(EffectState::default, |slot, state| (slot, state.deps.as_ref() == Some(&deps)));
    if unchanged {
        return;
    }
    cx.schedule_effect(PendingEffect {
        slot,
        deps,
        effect: Box::new(effect),
    });
}

/// Mutable cell that survives re-renders. Writing to it never triggers a
/// render; readers see the new value the next time they look.
pub struct MutableRef<T>(Rc<RefCell<T>>);

impl<T> MutableRef<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> MutableRef<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T> Clone for MutableRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for MutableRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MutableRef").field(&self.0.borrow()).finish()
    }
}

struct RefState<T>(MutableRef<T>);

impl<T: 'static> HookState for RefState<T> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Persistent cell for this call site, initialized with `init` on mount.
pub fn use_ref<T: 'static>(cx: &mut RenderContext<'_>, init: impl FnOnce() -> T) -> MutableRef<T> {
    cx.with_slot(|| RefState(MutableRef::new(init())), |_, state| state.0.clone())
}

//! Render a single hook outside of a real component tree.
//!
//! Mirrors the `renderHook` helper from UI testing libraries: the callback
//! is rendered once on creation and again on every `rerender`, and the
//! latest outcome stays inspectable.

use super::host::{ComponentHost, RenderContext};

pub struct RenderHook<P, R, E, F>
where
    F: FnMut(&mut RenderContext<'_>, &P) -> Result<R, E>,
{
    host: ComponentHost,
    callback: F,
    props: P,
    last: Result<R, E>,
}

/// Mount `callback` with `props` and render it once.
pub fn render_hook<P, R, E, F>(props: P, mut callback: F) -> RenderHook<P, R, E, F>
where
    F: FnMut(&mut RenderContext<'_>, &P) -> Result<R, E>,
{
    let mut host = ComponentHost::new("render_hook");
    let last = host.render(|cx| callback(cx, &props));
    RenderHook {
        host,
        callback,
        props,
        last,
    }
}

impl<P, R, E, F> RenderHook<P, R, E, F>
where
    F: FnMut(&mut RenderContext<'_>, &P) -> Result<R, E>,
{
    /// Render again with the current props.
    pub fn rerender(&mut self) -> &Result<R, E> {
        let callback = &mut self.callback;
        let props = &self.props;
        self.last = self.host.render(|cx| callback(cx, props));
        &self.last
    }

    /// Replace the props, then render.
    pub fn rerender_with(&mut self, props: P) -> &Result<R, E> {
        self.props = props;
        self.rerender()
    }

    pub fn unmount(&mut self) {
        self.host.unmount();
    }

    /// Outcome of the latest render.
    pub fn result(&self) -> &Result<R, E> {
        &self.last
    }

    pub fn current(&self) -> Option<&R> {
        self.last.as_ref().ok()
    }

    pub fn error(&self) -> Option<&E> {
        self.last.as_ref().err()
    }

    pub fn host(&self) -> &ComponentHost {
        &self.host
    }
}

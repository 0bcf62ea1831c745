//! Container-bound hooks
//!
//! Each accessor is a memoized call into the container, keyed on
//! `[id, container, ...deps]` (or `[id, parent, options]` for
//! provisioning). `use_tree_visitor` ties a visitor's attachment to the
//! component's mount lifecycle.

pub mod deps;
pub mod harness;
pub mod host;
pub mod primitives;
pub mod use_container;
pub mod use_many_services;
pub mod use_service;
pub mod use_tree_visitor;

pub use deps::{DepKey, DepList};
pub use harness::{render_hook, RenderHook};
pub use host::{Cleanup, ComponentHost, RenderContext};
pub use primitives::{try_use_memo, use_effect, use_memo, use_ref, MutableRef};
pub use use_container::use_container;
pub use use_many_services::{use_many_services, use_many_services_or_none};
pub use use_service::{use_service, use_service_or_none};
pub use use_tree_visitor::{use_tree_visitor, DetachHandle};

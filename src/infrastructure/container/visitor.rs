//! 容器树访问者
//!
//! A visitor is attached to one container and is told about changes in the
//! tree below it until it is detached.

use super::identifier::ServiceIdentifier;
use super::instance::ContainerInstance;
use std::sync::Arc;

pub trait ContainerTreeVisitor: Send + Sync {
    /// Called once when the visitor is offered to a container. Returning
    /// `false` refuses the attachment.
    fn visit_container(&self, container: &ContainerInstance) -> bool;

    /// A child container was created under the visited container.
    fn visit_child_container(&self, _child: &ContainerInstance) {}

    /// A container with no parent was created. Only visitors attached to the
    /// default container receive this.
    fn visit_orphaned_container(&self, _container: &ContainerInstance) {}

    /// A registration was added to the visited container.
    fn visit_new_service(&self, _container: &ContainerInstance, _id: &ServiceIdentifier) {}

    /// The visitor was detached.
    fn dispose(&self) {}
}

pub type VisitorRef = Arc<dyn ContainerTreeVisitor>;

/// Identity comparison of two visitor handles.
pub fn same_visitor(a: &VisitorRef, b: &VisitorRef) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

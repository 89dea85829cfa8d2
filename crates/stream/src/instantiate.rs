use cellstream_common::{Handle, TemplateId};
use glam::Vec2;

use crate::error::InstantiateError;

/// Host capability that turns descriptors into live entities.
///
/// Calls are synchronous and made from the thread that drives the streamer.
pub trait Instantiator {
    /// Create an instance of `template` at `position`. Each success must return
    /// a handle distinct from every other live handle.
    fn instantiate(&mut self, template: TemplateId, position: Vec2) -> Result<Handle, InstantiateError>;

    /// Destroy an instance previously returned by [`Instantiator::instantiate`].
    fn destroy(&mut self, handle: Handle);
}

impl<T: Instantiator + ?Sized> Instantiator for &mut T {
    fn instantiate(&mut self, template: TemplateId, position: Vec2) -> Result<Handle, InstantiateError> {
        (**self).instantiate(template, position)
    }

    fn destroy(&mut self, handle: Handle) {
        (**self).destroy(handle)
    }
}

impl<T: Instantiator + ?Sized> Instantiator for Box<T> {
    fn instantiate(&mut self, template: TemplateId, position: Vec2) -> Result<Handle, InstantiateError> {
        (**self).instantiate(template, position)
    }

    fn destroy(&mut self, handle: Handle) {
        (**self).destroy(handle)
    }
}

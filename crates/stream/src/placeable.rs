use std::fmt;
use std::sync::Arc;

use cellstream_common::{Handle, PlaceableId, TemplateId};
use glam::Vec2;

use crate::grid::CellCoord;

/// Setup hook run right after the descriptor is instantiated.
pub type SpawnHook = Arc<dyn Fn(PlaceableId, Handle) + Send + Sync>;
/// Teardown hook run right before the descriptor's instance is destroyed.
pub type DestroyHook = Arc<dyn Fn(PlaceableId) + Send + Sync>;

/// Streamable definition of one entity: what to spawn and where.
///
/// Template and position are fixed at construction. The lifecycle handle is
/// only ever written by the streamer: present while the descriptor is active,
/// absent otherwise.
#[derive(Clone)]
pub struct Placeable {
    id: PlaceableId,
    template: TemplateId,
    position: Vec2,
    handle: Option<Handle>,
    on_spawn: Option<SpawnHook>,
    on_destroy: Option<DestroyHook>,
}

impl Placeable {
    pub fn new(template: TemplateId, position: Vec2) -> Self {
        Self::with_id(PlaceableId::new(), template, position)
    }

    /// Build a descriptor with a caller-chosen identity.
    pub fn with_id(id: PlaceableId, template: TemplateId, position: Vec2) -> Self {
        Self {
            id,
            template,
            position,
            handle: None,
            on_spawn: None,
            on_destroy: None,
        }
    }

    /// Attach a setup hook, e.g. to add components to the spawned instance.
    pub fn on_spawn(mut self, hook: impl Fn(PlaceableId, Handle) + Send + Sync + 'static) -> Self {
        self.on_spawn = Some(Arc::new(hook));
        self
    }

    /// Attach a teardown hook. Teardown is notification only: no handle is passed.
    pub fn on_destroy(mut self, hook: impl Fn(PlaceableId) + Send + Sync + 'static) -> Self {
        self.on_destroy = Some(Arc::new(hook));
        self
    }

    pub fn id(&self) -> PlaceableId {
        self.id
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// The registry cell this descriptor belongs to, or `None` when its
    /// position is not finite or lies outside the cell grid.
    pub fn cell(&self) -> Option<CellCoord> {
        CellCoord::from_position(self.position)
    }

    /// Handle of the live instance, if spawned.
    pub fn handle(&self) -> Option<Handle> {
        self.handle
    }

    pub fn is_spawned(&self) -> bool {
        self.handle.is_some()
    }

    /// Store the instance handle and run the setup hook.
    pub(crate) fn attach(&mut self, handle: Handle) {
        self.handle = Some(handle);
        if let Some(hook) = &self.on_spawn {
            hook(self.id, handle);
        }
    }

    /// Run the teardown hook and give back the handle for destruction.
    pub(crate) fn detach(&mut self) -> Option<Handle> {
        if let Some(hook) = &self.on_destroy {
            hook(self.id);
        }
        self.handle.take()
    }

    /// Drop lifecycle state so a copy handed back by the host starts inactive.
    pub(crate) fn reset_lifecycle(&mut self) {
        self.handle = None;
    }
}

impl fmt::Debug for Placeable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placeable")
            .field("id", &self.id)
            .field("template", &self.template)
            .field("position", &self.position)
            .field("handle", &self.handle)
            .field("on_spawn", &self.on_spawn.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}

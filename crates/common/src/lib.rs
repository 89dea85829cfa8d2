//! Shared identity types: placeable ids, template references, generational handles.

mod types;

pub use types::{Handle, HandleAllocator, PlaceableId, TemplateId};

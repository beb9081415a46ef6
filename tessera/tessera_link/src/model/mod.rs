//! Link definitions and capability descriptors.

pub mod capability;
mod definition;

pub use capability::{
    binding, permission, Binding, CapabilityDescriptor, Permission, BINDING, PERMISSION,
};
pub use definition::LinkDefinition;

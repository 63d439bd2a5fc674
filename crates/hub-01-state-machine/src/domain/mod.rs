pub mod diff;
pub mod errors;
pub mod registry;
pub mod store;

pub use diff::diff;
pub use errors::*;
pub use registry::{
    ActionDescriptor, ActionModule, ActionRegistry, ActionRegistryBuilder, Mutator, Validator,
};
pub use store::{Commit, StateStore};

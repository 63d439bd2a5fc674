//! Built-in domain modules.
//!
//! Domain modules own one top-level state key each and contribute their
//! actions to the registry at startup.

pub mod notifications;

use hub_01_state_machine::{ActionModule, ActionRegistryBuilder, RegistryError};

pub use notifications::NotificationsModule;

/// Modules compiled into the hub.
pub fn builtin_modules() -> Vec<Box<dyn ActionModule>> {
    vec![Box::new(NotificationsModule)]
}

/// Register every module in `modules`.
pub fn register_all(
    builder: &mut ActionRegistryBuilder,
    modules: &[Box<dyn ActionModule>],
) -> Result<(), RegistryError> {
    for module in modules {
        builder.with_module(module.as_ref())?;
    }
    Ok(())
}

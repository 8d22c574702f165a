//! Shipped port policies.
//!
//! Each policy module exposes a `Policy` implementation, a serde-friendly
//! parameter struct, and a registerable `init_port` function. Loadable
//! policies register themselves at load time and unregister by function
//! identity at unload; [`register_builtin`] does the same for the policies
//! that ship with the crate.

pub mod longest_first;
pub mod tos_bands;

use crate::error::SchedError;
use crate::registry::PolicyRegistry;

/// Register every built-in policy with `registry`.
pub fn register_builtin(registry: &PolicyRegistry) -> Result<(), SchedError> {
    registry.register(longest_first::NAME, longest_first::init_port)?;
    registry.register(tos_bands::NAME, tos_bands::init_port)?;
    Ok(())
}

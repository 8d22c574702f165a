//! Process-wide policy registry.
//!
//! Maps port-policy names to their `init_port` functions. Multi-reader /
//! single-writer: registration and removal are rare and take the write lock;
//! lookup takes the read lock for the lookup itself, never for the duration
//! of `init_port`. Ports already bound to a removed policy keep operating;
//! the registry only gates new bindings.

use std::ptr;
use std::sync::{OnceLock, RwLock};

use compact_str::CompactString;
use tracing::debug;

use crate::error::SchedError;
use crate::policy::InitPortFn;
use crate::port::truncate_name;

struct RegistryEntry {
    name: CompactString,
    init: InitPortFn,
}

/// Insertion-ordered name → `init_port` map. Names are unique.
pub struct PolicyRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
}

static GLOBAL: OnceLock<PolicyRegistry> = OnceLock::new();

impl PolicyRegistry {
    /// Fresh, empty registry. Embedders normally want
    /// [`PolicyRegistry::global`].
    pub fn new() -> Self {
        PolicyRegistry {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static PolicyRegistry {
        GLOBAL.get_or_init(PolicyRegistry::new)
    }

    /// Register `init` under `name` (truncated at 32 bytes). Duplicate names
    /// are rejected.
    pub fn register(&self, name: &str, init: InitPortFn) -> Result<(), SchedError> {
        let name = truncate_name(name);
        let mut entries = self.entries.write().unwrap();
        if entries.iter().any(|e| e.name == name) {
            return Err(SchedError::PolicyExists(name));
        }
        debug!(policy = %name, "registered port policy");
        entries.push(RegistryEntry { name, init });
        Ok(())
    }

    /// The `init_port` registered under `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<InitPortFn> {
        let entries = self.entries.read().unwrap();
        entries.iter().find(|e| e.name == name).map(|e| e.init)
    }

    /// Remove the entry holding `init`, matching by function identity rather
    /// than by name. Returns whether an entry was removed.
    pub fn unregister(&self, init: InitPortFn) -> bool {
        let mut entries = self.entries.write().unwrap();
        match entries.iter().position(|e| ptr::fn_addr_eq(e.init, init)) {
            Some(pos) => {
                let removed = entries.remove(pos);
                debug!(policy = %removed.name, "unregistered port policy");
                true
            }
            None => false,
        }
    }

    /// Registered policy names, in registration order.
    pub fn names(&self) -> Vec<CompactString> {
        let entries = self.entries.read().unwrap();
        entries.iter().map(|e| e.name.clone()).collect()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

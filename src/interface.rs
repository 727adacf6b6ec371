//! Player interfaces and the registry that maps type tags to them.
//!
//! Interfaces are registered once at startup and live for the whole process.
//! A lookup hands back an [`InterfaceBinding`]: an index into the registry
//! plus a copy of the parameter block registered for the type tag.

use std::collections::HashMap;
use std::error::Error;

use crate::console::Console;
use crate::filehandle::FileHandle;
use crate::module_info::{ModuleInfo, ModuleType};
use crate::players::PlayerKind;
use crate::signal::ControlSignal;

/// Contract between the playback loop and a player interface.
///
/// The loop never calls into an interface re-entrantly. After `close` the loop
/// drops its binding, so `close` is called at most once per successful `init`.
pub trait Interface {
    fn name(&self) -> &str;

    /// Prepare to play `file`. An error makes the loop fall back to the file
    /// selector instead of retrying the same file.
    fn init(
        &mut self,
        info: &ModuleInfo,
        file: &FileHandle,
        params: &InterfaceParams,
    ) -> Result<(), Box<dyn Error>>;

    /// Do one scheduling slice of work and report why control came back.
    fn run(&mut self, console: &mut dyn Console) -> ControlSignal;

    fn close(&mut self);
}

/// Interface-specific parameters registered alongside a type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceParams {
    pub player: PlayerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceBinding {
    pub interface: InterfaceId,
    pub params: InterfaceParams,
}

#[derive(Default)]
pub struct InterfaceRegistry {
    interfaces: Vec<Box<dyn Interface>>,
    types: HashMap<ModuleType, InterfaceBinding>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_interface(&mut self, interface: Box<dyn Interface>) -> InterfaceId {
        log::debug!("Registered interface {}", interface.name());
        self.interfaces.push(interface);
        InterfaceId(self.interfaces.len() - 1)
    }

    /// Route `mod_type` to a registered interface. A later registration for
    /// the same tag replaces the earlier one.
    pub fn register_type(&mut self, mod_type: ModuleType, interface: InterfaceId, params: InterfaceParams) {
        if mod_type.is_unknown() {
            log::warn!("Refusing to register an interface for the unknown type tag");
            return;
        }
        self.types.insert(mod_type, InterfaceBinding { interface, params });
    }

    pub fn find(&self, mod_type: &ModuleType) -> Option<InterfaceBinding> {
        self.types.get(mod_type).copied()
    }

    pub fn get_mut(&mut self, id: InterfaceId) -> Option<&mut (dyn Interface + 'static)> {
        match self.interfaces.get_mut(id.0) {
            Some(interface) => Some(interface.as_mut()),
            None => None,
        }
    }

    pub fn name_of(&self, id: InterfaceId) -> Option<&str> {
        self.interfaces.get(id.0).map(|i| i.name())
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl Interface for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn init(&mut self, _: &ModuleInfo, _: &FileHandle, _: &InterfaceParams) -> Result<(), Box<dyn Error>> {
            Ok(())
        }

        fn run(&mut self, _: &mut dyn Console) -> ControlSignal {
            ControlSignal::Quit
        }

        fn close(&mut self) {}
    }

    fn params() -> InterfaceParams {
        InterfaceParams { player: PlayerKind::Ay }
    }

    #[test]
    fn test_find_registered_type() {
        let mut registry = InterfaceRegistry::new();
        let id = registry.register_interface(Box::new(Silent));
        registry.register_type(ModuleType::new("AY"), id, params());

        let binding = registry.find(&ModuleType::new("AY")).unwrap();
        assert_eq!(binding.interface, id);
        assert_eq!(binding.params.player, PlayerKind::Ay);
        assert_eq!(registry.name_of(id), Some("silent"));
        assert!(registry.get_mut(id).is_some());
    }

    #[test]
    fn test_find_misses_unregistered_type() {
        let mut registry = InterfaceRegistry::new();
        let id = registry.register_interface(Box::new(Silent));
        registry.register_type(ModuleType::new("AY"), id, params());

        assert!(registry.find(&ModuleType::new("MOD")).is_none());
        assert!(registry.find(&ModuleType::unknown()).is_none());
    }

    #[test]
    fn test_unknown_tag_is_never_registered() {
        let mut registry = InterfaceRegistry::new();
        let id = registry.register_interface(Box::new(Silent));
        registry.register_type(ModuleType::unknown(), id, params());
        assert_eq!(registry.type_count(), 0);
    }
}

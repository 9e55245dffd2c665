use crate::Reflect;

/// Base for components that can be switched on and off.
///
/// Embedded by derived components through `#[reflect(base)]`, which makes
/// `enabled` an attribute of every subtype.
#[derive(Debug, Clone, PartialEq, Reflect)]
#[reflect(base, name = "Behaviour")]
pub struct Behaviour {
    pub enabled: bool,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self { enabled: true }
    }
}

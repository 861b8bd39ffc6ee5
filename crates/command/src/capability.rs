use std::collections::BTreeSet;

use crate::CommandKind;

/// The set of commands the operator may currently issue. A command without a
/// backend endpoint is never enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    enabled: BTreeSet<CommandKind>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            enabled: CommandKind::ALL
                .iter()
                .copied()
                .filter(|kind| kind.endpoint().is_some())
                .collect(),
        }
    }
}

impl Capabilities {
    pub fn without(mut self, kinds: impl IntoIterator<Item = CommandKind>) -> Self {
        for kind in kinds {
            self.enabled.remove(&kind);
        }
        self
    }

    pub fn is_enabled(&self, kind: CommandKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn enabled(&self) -> impl Iterator<Item = CommandKind> + '_ {
        self.enabled.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_disabled_by_default() {
        let caps = Capabilities::default();

        assert!(caps.is_enabled(CommandKind::SetMode));
        assert!(caps.is_enabled(CommandKind::Disarm));
        assert!(!caps.is_enabled(CommandKind::MissionStart));
        assert!(!caps.is_enabled(CommandKind::Calibration));
        assert_eq!(caps.enabled().count(), 5);
    }

    #[test]
    fn config_can_disable_more() {
        let caps = Capabilities::default().without([CommandKind::Arm, CommandKind::Disarm]);

        assert!(!caps.is_enabled(CommandKind::Arm));
        assert!(caps.is_enabled(CommandKind::JumpToWaypoint));
    }
}

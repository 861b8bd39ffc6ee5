use serde::Deserialize;

use crate::{CommandKind, LandTarget};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Used by the land command when the operator gives no location
    pub land_target: Option<LandTarget>,

    /// Commands to grey out on top of the ones the backend cannot serve
    pub disabled: Vec<CommandKind>,
}

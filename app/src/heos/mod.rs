use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::core::item::OnOff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ThingRole {
    Player,
    Group,
    Bridge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCommand {
    OnOff(OnOff),
    Refresh,
    Other(String),
}

/// Bridge state shared by all channel handlers
#[derive(Debug, Clone, Default)]
pub struct HeosBridge {
    handle_groups: Arc<AtomicBool>,
}

impl HeosBridge {
    pub fn new(handle_groups: bool) -> Self {
        Self {
            handle_groups: Arc::new(AtomicBool::new(handle_groups)),
        }
    }

    pub fn handle_groups(&self) -> bool {
        self.handle_groups.load(Ordering::SeqCst)
    }

    pub fn set_handle_groups(&self, handle_groups: bool) {
        self.handle_groups.store(handle_groups, Ordering::SeqCst);
        tracing::debug!("Dynamic group handling set to {}", handle_groups);
    }
}

pub trait ChannelHandler {
    fn handle_player(&self, command: &ChannelCommand);

    fn handle_group(&self, command: &ChannelCommand);

    fn handle_bridge(&self, command: &ChannelCommand);

    fn handle_command(&self, role: ThingRole, command: &ChannelCommand) {
        tracing::trace!("Handling command {:?} for {}", command, role);

        match role {
            ThingRole::Player => self.handle_player(command),
            ThingRole::Group => self.handle_group(command),
            ThingRole::Bridge => self.handle_bridge(command),
        }
    }
}

/// Switches the bridge's dynamic group handling on and off
pub struct DynGroupHandling {
    bridge: HeosBridge,
}

impl DynGroupHandling {
    pub fn new(bridge: HeosBridge) -> Self {
        Self { bridge }
    }
}

impl ChannelHandler for DynGroupHandling {
    fn handle_player(&self, _command: &ChannelCommand) {}

    fn handle_group(&self, _command: &ChannelCommand) {}

    fn handle_bridge(&self, command: &ChannelCommand) {
        self.bridge
            .set_handle_groups(*command == ChannelCommand::OnOff(OnOff::On));
    }
}

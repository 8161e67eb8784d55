use std::{path::PathBuf, sync::Arc};

use mist_shell_core::{
    bootstrap::BootstrapSequencer, exit_cleanup::ShutdownOrchestrator, node_process::ProcessNode,
    protocol_gate::ProtocolGate, refresh_debouncer::RefreshDebouncer,
    socket_manager::SocketManager, tab_store::TabStore, DispatchBus,
};
use serde::Serialize;
use tokio::runtime::Handle;

use crate::app_menu::TauriMenuRenderer;

pub(crate) type ShellOrchestrator = ShutdownOrchestrator<SocketManager, ProcessNode, TabStore>;
pub(crate) type ShellDebouncer = RefreshDebouncer<TabStore, TauriMenuRenderer>;
pub(crate) type ShellBootstrap =
    BootstrapSequencer<SocketManager, ProcessNode, TabStore, TauriMenuRenderer>;

/// Long-lived services managed as Tauri state once setup has built them.
pub(crate) struct ShellServices {
    pub(crate) root_dir: Option<PathBuf>,
    pub(crate) bus: Arc<DispatchBus>,
    pub(crate) tabs: Arc<TabStore>,
    pub(crate) sockets: Arc<SocketManager>,
    pub(crate) nodes: Vec<Arc<ProcessNode>>,
    pub(crate) gate: ProtocolGate,
    pub(crate) debouncer: ShellDebouncer,
    pub(crate) orchestrator: Arc<ShellOrchestrator>,
    pub(crate) auto_start_nodes: bool,
    pub(crate) runtime: Handle,
}

impl ShellServices {
    pub(crate) fn sequencer(&self) -> ShellBootstrap {
        BootstrapSequencer {
            bus: self.bus.clone(),
            storage: self.tabs.clone(),
            sockets: self.sockets.clone(),
            nodes: self.nodes.clone(),
            gate: self.gate.clone(),
            debouncer: self.debouncer.clone(),
            orchestrator: self.orchestrator.clone(),
            auto_start_nodes: self.auto_start_nodes,
            runtime: self.runtime.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BridgeResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
}

impl BridgeResult {
    pub(crate) fn from_result(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                reason: None,
            },
            Err(error) => Self {
                ok: false,
                reason: Some(error),
            },
        }
    }
}

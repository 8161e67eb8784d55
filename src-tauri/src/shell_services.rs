use std::{path::PathBuf, sync::Arc};

use mist_shell_core::{
    exit_cleanup::ShutdownOrchestrator,
    node_config,
    node_process::ProcessNode,
    protocol_gate::{GateConfig, GateMessages, ProtocolGate},
    refresh_debouncer::RefreshDebouncer,
    runtime_paths, shell_locale,
    socket_manager::SocketManager,
    tab_store::TabStore,
    DispatchBus, NodeKind, DEFAULT_ROOT_DIR_NAME, DEFAULT_SHELL_LOCALE,
};
use tauri::AppHandle;
use tokio::runtime::Handle;

use crate::{app_menu::TauriMenuRenderer, append_startup_log, ShellServices};

/// Nodes in shutdown order: the blockchain node is stopped first.
const NODE_ORDER: [NodeKind; 2] = [NodeKind::Ethereum, NodeKind::Swarm];

pub(crate) fn build_shell_services(
    app_handle: &AppHandle,
    runtime: Handle,
) -> Result<ShellServices, String> {
    let root_dir = runtime_paths::default_root_dir();
    let storage_root = root_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_DIR_NAME));
    let locale = shell_locale::resolve_shell_locale(DEFAULT_SHELL_LOCALE, root_dir.clone());
    let texts = shell_locale::shell_texts_for_locale(locale);

    let bus = Arc::new(DispatchBus::new());
    let tabs = Arc::new(TabStore::for_root(&storage_root));
    let sockets = Arc::new(SocketManager::default());

    let nodes = NODE_ORDER
        .into_iter()
        .map(|kind| {
            let plan = node_config::resolve_node_launch_plan(kind, root_dir.as_deref())?;
            append_startup_log(&format!(
                "{} launch plan: {:?} (probe {})",
                kind.as_str(),
                plan.debug_command(),
                plan.probe_addr
            ));
            Ok(Arc::new(ProcessNode::new(plan, bus.clone())))
        })
        .collect::<Result<Vec<_>, String>>()?;

    let gateway_url = node_config::resolve_swarm_gateway_url();
    let pending_timeout = node_config::resolve_swarm_pending_timeout();
    append_startup_log(&format!(
        "swarm gateway {gateway_url}, pending timeout {}",
        pending_timeout
            .map(|timeout| format!("{}ms", timeout.as_millis()))
            .unwrap_or_else(|| "disabled".to_string())
    ));
    let gate = ProtocolGate::new(
        bus.clone(),
        GateConfig::swarm(&gateway_url, pending_timeout),
        GateMessages::from_texts(&texts),
        Some(runtime.clone()),
    );

    let debouncer = RefreshDebouncer::new(
        tabs.clone(),
        Arc::new(TauriMenuRenderer::new(app_handle.clone(), root_dir.clone())),
        bus.clone(),
        node_config::resolve_tab_refresh_debounce(),
        runtime.clone(),
    );

    let orchestrator = Arc::new(ShutdownOrchestrator::new(
        bus.clone(),
        sockets.clone(),
        nodes.clone(),
        tabs.clone(),
    ));

    Ok(ShellServices {
        root_dir,
        bus,
        tabs,
        sockets,
        nodes,
        gate,
        debouncer,
        orchestrator,
        auto_start_nodes: node_config::node_auto_start_enabled(),
        runtime,
    })
}

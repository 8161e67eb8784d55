//! Process-lifecycle orchestration for the Mist desktop shell.
//!
//! The host glue (Tauri) lives in `src-tauri`; everything here runs headless:
//! the dispatch bus, the `bzz` protocol gate, the shutdown orchestrator, the
//! tab-menu refresh debouncer, and the node/storage/socket collaborators they
//! drive.

mod app_constants;
pub mod bootstrap;
pub mod dispatch_bus;
pub mod exit_cleanup;
pub mod exit_state;
pub mod logging;
pub mod menu_model;
pub mod node_config;
pub mod node_process;
pub mod node_readiness;
pub mod process_control;
pub mod protocol_gate;
pub mod refresh_debouncer;
pub mod runtime_paths;
pub mod shell_locale;
pub mod socket_manager;
pub mod tab_store;

use std::sync::{Mutex, OnceLock};

pub use app_constants::*;
pub use dispatch_bus::{Action, AppState, DispatchBus};
pub use exit_state::{DrainStage, ShutdownPhase, TerminationDecision, TerminationReason};
pub use node_readiness::{NodeKind, NodeReadinessState};

static DESKTOP_LOG_WRITE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub fn append_runtime_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Runtime, message);
}

pub fn append_startup_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Startup, message);
}

pub fn append_protocol_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Protocol, message);
}

pub fn append_menu_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Menu, message);
}

pub fn append_node_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Node, message);
}

pub fn append_shutdown_log(message: &str) {
    append_desktop_log_with_category(logging::DesktopLogCategory::Shutdown, message);
}

fn append_desktop_log_with_category(category: logging::DesktopLogCategory, message: &str) {
    // Tests never write into the user's log directory.
    if cfg!(test) {
        return;
    }

    logging::append_desktop_log(
        category,
        message,
        runtime_paths::default_root_dir(),
        DESKTOP_LOG_FILE,
        DESKTOP_LOG_MAX_BYTES,
        LOG_BACKUP_COUNT,
        &DESKTOP_LOG_WRITE_LOCK,
    )
}

use std::sync::Arc;

use mist_shell_core::{Action, AppState, DispatchBus};
use tauri::{AppHandle, Emitter};

use crate::{append_runtime_log, append_shutdown_log, ACTION_EVENT};

/// Forwards every bus action to the webview and turns the final `Quit` into
/// a real process exit.
pub(crate) fn attach(app_handle: &AppHandle, bus: &DispatchBus) {
    let app = app_handle.clone();
    bus.subscribe(Arc::new(move |action: &Action, _state: &AppState| {
        if let Err(error) = app.emit(ACTION_EVENT, action.clone()) {
            append_runtime_log(&format!(
                "failed to forward {} to webview: {error}",
                action.name()
            ));
        }

        if matches!(action, Action::Quit) {
            append_shutdown_log("drain finished, exiting desktop process");
            app.exit(0);
        }
    }));
}

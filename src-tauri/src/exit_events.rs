use mist_shell_core::{TerminationDecision, TerminationReason};
use tauri::{AppHandle, ExitRequestApi, Manager};

use crate::{append_shutdown_log, ShellServices};

/// `AppHandle::exit` carries an exit code; the runtime's own exit request
/// after the last window closes does not.
fn reason_for_exit_request(code: Option<i32>) -> TerminationReason {
    match code {
        Some(_) => TerminationReason::QuitRequested,
        None => TerminationReason::AllWindowsClosed,
    }
}

fn decide(app_handle: &AppHandle, reason: &TerminationReason) -> TerminationDecision {
    let Some(services) = app_handle.try_state::<ShellServices>() else {
        append_shutdown_log(&format!(
            "{} before services were ready; exiting without drain",
            reason.describe()
        ));
        return TerminationDecision::AllowExit;
    };

    let decision = services.orchestrator.request_termination(reason);
    if decision == TerminationDecision::BeginDrain {
        let orchestrator = services.orchestrator.clone();
        tauri::async_runtime::spawn(async move {
            if let Err(error) = orchestrator.drain().await {
                append_shutdown_log(&format!("shutdown drain refused: {error}"));
            }
        });
    }
    decision
}

pub(crate) fn handle_exit_requested(
    app_handle: &AppHandle,
    code: Option<i32>,
    api: &ExitRequestApi,
) {
    let reason = reason_for_exit_request(code);
    if decide(app_handle, &reason).should_prevent_exit() {
        api.prevent_exit();
    }
}

pub(crate) fn handle_exit_event(_app_handle: &AppHandle) {
    append_shutdown_log("desktop process exiting");
}

/// Entry point for termination signals that do not arrive as an exit request
/// (menu quit, bridge quit, OS signals, panics).
pub(crate) fn request_shutdown(app_handle: &AppHandle, reason: TerminationReason) {
    if decide(app_handle, &reason) == TerminationDecision::AllowExit {
        app_handle.exit(0);
    }
}

pub(crate) fn install_signal_handlers(app_handle: &AppHandle) {
    let ctrl_c_handle = app_handle.clone();
    tauri::async_runtime::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => request_shutdown(&ctrl_c_handle, TerminationReason::OsSignal("SIGINT")),
            Err(error) => append_shutdown_log(&format!("failed to listen for ctrl-c: {error}")),
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let sigterm_handle = app_handle.clone();
        tauri::async_runtime::spawn(async move {
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(error) => {
                    append_shutdown_log(&format!("failed to listen for SIGTERM: {error}"));
                    return;
                }
            };
            if sigterm.recv().await.is_some() {
                request_shutdown(&sigterm_handle, TerminationReason::OsSignal("SIGTERM"));
            }
        });
    }
}

pub(crate) fn install_panic_hook(app_handle: &AppHandle) {
    let panic_handle = app_handle.clone();
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_hook(info);
        append_shutdown_log(&format!("uncaught panic: {info}"));
        request_shutdown(&panic_handle, TerminationReason::FatalError(info.to_string()));
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_exit_code_is_a_quit_request() {
        assert_eq!(reason_for_exit_request(Some(0)), TerminationReason::QuitRequested);
    }

    #[test]
    fn exit_request_without_code_means_all_windows_closed() {
        assert_eq!(reason_for_exit_request(None), TerminationReason::AllWindowsClosed);
    }
}

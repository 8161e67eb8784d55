use mist_shell_core::{
    protocol_gate::GateMessages,
    shell_locale,
    tab_store::{RecordView, TabRecord},
    AppState, TerminationReason, DEFAULT_SHELL_LOCALE,
};
use tauri::{AppHandle, Manager};

use crate::{append_runtime_log, exit_events, BridgeResult, ShellServices};

const SERVICES_UNAVAILABLE: &str = "Desktop services are not initialized.";

fn with_services<F>(app_handle: &AppHandle, action: F) -> BridgeResult
where
    F: FnOnce(&ShellServices) -> Result<(), String>,
{
    match app_handle.try_state::<ShellServices>() {
        Some(services) => BridgeResult::from_result(action(&services)),
        None => BridgeResult::from_result(Err(SERVICES_UNAVAILABLE.to_string())),
    }
}

#[tauri::command]
pub(crate) fn desktop_bridge_is_desktop_runtime() -> bool {
    true
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_app_state(app_handle: AppHandle) -> Option<AppState> {
    app_handle
        .try_state::<ShellServices>()
        .map(|services| services.bus.get_state())
}

#[tauri::command]
pub(crate) fn desktop_bridge_list_tabs(app_handle: AppHandle) -> Vec<TabRecord> {
    app_handle
        .try_state::<ShellServices>()
        .map(|services| services.tabs.sorted_view())
        .unwrap_or_default()
}

#[tauri::command]
pub(crate) fn desktop_bridge_insert_tab(app_handle: AppHandle, tab: TabRecord) -> BridgeResult {
    with_services(&app_handle, |services| services.tabs.insert(tab))
}

#[tauri::command]
pub(crate) fn desktop_bridge_update_tab(app_handle: AppHandle, tab: TabRecord) -> BridgeResult {
    with_services(&app_handle, |services| services.tabs.update(tab))
}

#[tauri::command]
pub(crate) fn desktop_bridge_delete_tab(app_handle: AppHandle, id: String) -> BridgeResult {
    with_services(&app_handle, |services| services.tabs.delete(&id))
}

#[tauri::command]
pub(crate) fn desktop_bridge_set_shell_locale(
    app_handle: AppHandle,
    locale: Option<String>,
) -> BridgeResult {
    with_services(&app_handle, |services| {
        if let Err(error) =
            shell_locale::write_cached_shell_locale(locale.as_deref(), services.root_dir.as_deref())
        {
            append_runtime_log(&format!("failed to persist shell locale: {error}"));
            return Err(error);
        }
        let resolved =
            shell_locale::resolve_shell_locale(DEFAULT_SHELL_LOCALE, services.root_dir.clone());
        services
            .gate
            .set_messages(GateMessages::from_texts(&shell_locale::shell_texts_for_locale(
                resolved,
            )));
        services.debouncer.refresh_now();
        Ok(())
    })
}

#[tauri::command]
pub(crate) fn desktop_bridge_quit(app_handle: AppHandle) -> BridgeResult {
    append_runtime_log("webview requested quit");
    exit_events::request_shutdown(&app_handle, TerminationReason::QuitRequested);
    BridgeResult::from_result(Ok(()))
}

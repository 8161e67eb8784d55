use tauri::{AppHandle, Emitter, Manager};

use crate::{append_menu_log, MAIN_WINDOW_LABEL, SELECT_TAB_EVENT};

pub fn show_main_window(app_handle: &AppHandle) {
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        append_menu_log("show_main_window skipped: main window not found");
        return;
    };

    if let Err(error) = window.unminimize() {
        append_menu_log(&format!("failed to unminimize main window: {error}"));
    }
    if let Err(error) = window.show() {
        append_menu_log(&format!("failed to show main window: {error}"));
    }
    if let Err(error) = window.set_focus() {
        append_menu_log(&format!("failed to focus main window: {error}"));
    }
}

pub fn reload_main_window(app_handle: &AppHandle) {
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        append_menu_log("reload_main_window skipped: main window not found");
        return;
    };

    if let Err(error) = window.eval("window.location.reload()") {
        append_menu_log(&format!("failed to reload main window: {error}"));
    }
}

pub fn select_tab(app_handle: &AppHandle, tab_id: &str) {
    show_main_window(app_handle);
    if let Err(error) = app_handle.emit_to(MAIN_WINDOW_LABEL, SELECT_TAB_EVENT, tab_id.to_string())
    {
        append_menu_log(&format!("failed to emit tab selection for {tab_id}: {error}"));
    }
}

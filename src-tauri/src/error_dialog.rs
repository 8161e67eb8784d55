use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

use crate::append_runtime_log;

pub(crate) fn show_error_dialog(app_handle: &AppHandle, title: &str, message: &str) {
    append_runtime_log(&format!("showing error dialog: {title}: {message}"));
    app_handle
        .dialog()
        .message(message)
        .title(title)
        .kind(MessageDialogKind::Error)
        .show(|_| {});
}

/// Startup failures happen before the webview can report anything, so they
/// block until the user dismisses the dialog.
pub(crate) fn show_startup_error(app_handle: &AppHandle, message: &str) {
    append_runtime_log(&format!("startup error: {message}"));
    app_handle
        .dialog()
        .message(message)
        .title("Mist")
        .kind(MessageDialogKind::Error)
        .blocking_show();
}

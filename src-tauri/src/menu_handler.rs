use mist_shell_core::{
    menu_model::{self, AppMenuAction},
    TerminationReason,
};
use tauri::AppHandle;

use crate::{append_menu_log, exit_events, window_actions};

pub fn handle_menu_event(app_handle: &AppHandle, menu_id: &str) {
    match menu_model::action_from_menu_id(menu_id) {
        Some(AppMenuAction::ReloadWindow) => window_actions::reload_main_window(app_handle),
        Some(AppMenuAction::Quit) => {
            append_menu_log("menu quit requested");
            exit_events::request_shutdown(app_handle, TerminationReason::QuitRequested);
        }
        Some(AppMenuAction::SelectTab(tab_id)) => {
            append_menu_log(&format!("menu selected tab {tab_id}"));
            window_actions::select_tab(app_handle, &tab_id);
        }
        None => {}
    }
}

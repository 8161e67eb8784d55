use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use mist_shell_core::{
    menu_model::{self, MenuRenderer, RebuildCompletion, MENU_QUIT, MENU_RELOAD_WINDOW},
    shell_locale::{self, ShellTexts},
    tab_store::TabRecord,
    DEFAULT_SHELL_LOCALE,
};
use tauri::{
    menu::{IsMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu},
    AppHandle, Wry,
};

use crate::ui_dispatch;

pub(crate) struct TauriMenuRenderer {
    app_handle: AppHandle,
    root_dir: Option<PathBuf>,
}

impl TauriMenuRenderer {
    pub(crate) fn new(app_handle: AppHandle, root_dir: Option<PathBuf>) -> Self {
        Self {
            app_handle,
            root_dir,
        }
    }
}

impl MenuRenderer for TauriMenuRenderer {
    fn rebuild_menu(&self, tabs: &[TabRecord], done: RebuildCompletion) {
        let locale = shell_locale::resolve_shell_locale(DEFAULT_SHELL_LOCALE, self.root_dir.clone());
        let tabs = tabs.to_vec();
        // Shared with the main-thread task; a failed dispatch reports instead.
        let done = Arc::new(Mutex::new(Some(done)));
        let task_done = done.clone();
        let dispatched =
            ui_dispatch::run_on_main_thread_dispatch(&self.app_handle, "menu rebuild", move |app| {
                let texts = shell_locale::shell_texts_for_locale(locale);
                let result = build_app_menu(app, &tabs, &texts).and_then(|menu| {
                    app.set_menu(menu)
                        .map(|_| ())
                        .map_err(|error| format!("Failed to install application menu: {error}"))
                });
                finish_rebuild(&task_done, result);
            });
        if let Err(error) = dispatched {
            finish_rebuild(&done, Err(error));
        }
    }
}

fn finish_rebuild(done: &Mutex<Option<RebuildCompletion>>, result: Result<(), String>) {
    let taken = match done.lock() {
        Ok(mut guard) => guard.take(),
        Err(error) => error.into_inner().take(),
    };
    if let Some(done) = taken {
        done(result);
    }
}

fn build_app_menu(
    app_handle: &AppHandle,
    tabs: &[TabRecord],
    texts: &ShellTexts,
) -> Result<Menu<Wry>, String> {
    let reload_item = MenuItem::with_id(
        app_handle,
        MENU_RELOAD_WINDOW,
        texts.menu_reload,
        true,
        Some("CmdOrCtrl+R"),
    )
    .map_err(|error| format!("Failed to create reload menu item: {error}"))?;
    let quit_item = MenuItem::with_id(
        app_handle,
        MENU_QUIT,
        texts.menu_quit,
        true,
        Some("CmdOrCtrl+Q"),
    )
    .map_err(|error| format!("Failed to create quit menu item: {error}"))?;
    let separator = PredefinedMenuItem::separator(app_handle)
        .map_err(|error| format!("Failed to create menu separator: {error}"))?;
    let app_submenu = Submenu::with_items(
        app_handle,
        texts.menu_app,
        true,
        &[&reload_item, &separator, &quit_item],
    )
    .map_err(|error| format!("Failed to build app submenu: {error}"))?;

    let tab_items = menu_model::build_tab_menu_entries(tabs, texts)
        .into_iter()
        .map(|entry| {
            MenuItem::with_id(
                app_handle,
                entry.id.as_str(),
                entry.label.as_str(),
                entry.enabled,
                entry.accelerator.as_deref(),
            )
            .map_err(|error| format!("Failed to create tab menu item {}: {error}", entry.id))
        })
        .collect::<Result<Vec<_>, String>>()?;
    let tab_item_refs: Vec<&dyn IsMenuItem<Wry>> = tab_items
        .iter()
        .map(|item| item as &dyn IsMenuItem<Wry>)
        .collect();
    let tabs_submenu = Submenu::with_items(app_handle, texts.menu_tabs, true, &tab_item_refs)
        .map_err(|error| format!("Failed to build tabs submenu: {error}"))?;

    Menu::with_items(app_handle, &[&app_submenu, &tabs_submenu])
        .map_err(|error| format!("Failed to build application menu: {error}"))
}

use crate::{
    shell_locale::ShellTexts, tab_store::TabRecord, TAB_MENU_ACCELERATOR_LIMIT,
    TAB_MENU_LABEL_MAX_CHARS,
};

pub const MENU_RELOAD_WINDOW: &str = "menu_reload_window";
pub const MENU_QUIT: &str = "menu_quit";
pub const MENU_NO_TABS: &str = "menu_no_tabs";
pub const TAB_MENU_ID_PREFIX: &str = "tab:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMenuAction {
    ReloadWindow,
    Quit,
    SelectTab(String),
}

pub fn action_from_menu_id(menu_id: &str) -> Option<AppMenuAction> {
    match menu_id {
        MENU_RELOAD_WINDOW => Some(AppMenuAction::ReloadWindow),
        MENU_QUIT => Some(AppMenuAction::Quit),
        _ => menu_id
            .strip_prefix(TAB_MENU_ID_PREFIX)
            .filter(|tab_id| !tab_id.is_empty())
            .map(|tab_id| AppMenuAction::SelectTab(tab_id.to_string())),
    }
}

pub fn tab_menu_id(tab_id: &str) -> String {
    format!("{TAB_MENU_ID_PREFIX}{tab_id}")
}

/// Receives the outcome of a menu rebuild once the menu is installed.
pub type RebuildCompletion = Box<dyn FnOnce(Result<(), String>) + Send>;

/// Installs the application menu for the given ordered tab list.
pub trait MenuRenderer: Send + Sync {
    /// `done` runs exactly once, possibly on another thread after this call
    /// returns, when the rebuild has finished or failed.
    fn rebuild_menu(&self, tabs: &[TabRecord], done: RebuildCompletion);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabMenuEntry {
    pub id: String,
    pub label: String,
    pub accelerator: Option<String>,
    pub enabled: bool,
}

pub fn tab_menu_label(tab: &TabRecord, texts: &ShellTexts) -> String {
    let raw = tab
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .or_else(|| Some(tab.url.trim()).filter(|url| !url.is_empty()))
        .unwrap_or(texts.untitled_tab);

    if raw.chars().count() <= TAB_MENU_LABEL_MAX_CHARS {
        return raw.to_string();
    }
    let mut truncated: String = raw.chars().take(TAB_MENU_LABEL_MAX_CHARS - 1).collect();
    truncated.push('…');
    truncated
}

/// Entries for the "Tabs" submenu in the order the view supplies them. The
/// first nine tabs get `CmdOrCtrl+1..9`.
pub fn build_tab_menu_entries(tabs: &[TabRecord], texts: &ShellTexts) -> Vec<TabMenuEntry> {
    if tabs.is_empty() {
        return vec![TabMenuEntry {
            id: MENU_NO_TABS.to_string(),
            label: texts.menu_no_tabs.to_string(),
            accelerator: None,
            enabled: false,
        }];
    }

    tabs.iter()
        .enumerate()
        .map(|(index, tab)| TabMenuEntry {
            id: tab_menu_id(&tab.id),
            label: tab_menu_label(tab, texts),
            accelerator: (index < TAB_MENU_ACCELERATOR_LIMIT)
                .then(|| format!("CmdOrCtrl+{}", index + 1)),
            enabled: true,
        })
        .collect()
}

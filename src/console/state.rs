//! Module `state`
//!
//! Defines the `ConsoleState` struct holding what the launcher window used
//! to keep in its widgets: the server settings form, the visibility of the
//! settings panel and a pending close confirmation.

use crate::config::ServerSettings;

pub struct ConsoleState {
    settings: ServerSettings,
    panel_visible: bool,
    close_pending: bool,
}

impl ConsoleState {
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings,
            panel_visible: false,
            close_pending: false,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ServerSettings {
        &mut self.settings
    }

    /// Returns whether the settings panel is printed after each command.
    pub fn is_panel_visible(&self) -> bool {
        self.panel_visible
    }

    /// Returns whether a close is waiting for a yes/no answer.
    pub fn is_close_pending(&self) -> bool {
        self.close_pending
    }

    // --------------------
    // Setter methods
    // --------------------

    /// Opens the settings panel if closed, closes it if open.
    pub fn toggle_panel(&mut self) -> bool {
        self.panel_visible = !self.panel_visible;
        self.panel_visible
    }

    pub fn set_close_pending(&mut self, pending: bool) {
        self.close_pending = pending;
    }

    /// Renders the settings panel
    pub fn render_panel(&self) -> String {
        let s = &self.settings;
        format!(
            "  +- Settings ---------------------------\n  | PHP executable : {}\n  | Address        : {}\n  | Port           : {}\n  | Root directory : {}\n  | INI file       : {}\n  +---------------------------------------\n",
            s.executable_path,
            s.bind_address,
            s.port,
            s.document_root,
            s.ini_path.as_deref().unwrap_or("(none)")
        )
    }
}

//! Host shell capabilities: notices, translations and command registration.

use tracing::info;

/// Host commands exposed by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Turn the blur effect on or off.
    ToggleBlur,
    /// Open the management panel (entering selection mode).
    OpenPanel,
    /// Turn selection mode on or off.
    ToggleSelectingMode,
}

impl Command {
    /// Every command, in registration order.
    pub const ALL: [Self; 3] = [Self::ToggleBlur, Self::OpenPanel, Self::ToggleSelectingMode];

    /// Stable command id.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::ToggleBlur => "toggle-blur",
            Self::OpenPanel => "open-blur-panel",
            Self::ToggleSelectingMode => "toggle-selecting-mode",
        }
    }

    /// Translation key of the command's display name.
    #[must_use]
    pub fn name_key(self) -> &'static str {
        match self {
            Self::ToggleBlur => "command.toggle_blur",
            Self::OpenPanel => "command.open_panel",
            Self::ToggleSelectingMode => "command.toggle_selecting",
        }
    }

    /// Look a command up by id.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Built-in English text for a translation key.
#[must_use]
pub fn english(key: &str) -> Option<&'static str> {
    let text = match key {
        "notice.selection_on" => "Entered blur management mode",
        "notice.selection_off" => "Exited blur management mode",
        "notice.blur_on" => "Blur effect enabled",
        "notice.blur_off" => "Blur effect disabled",
        "notice.preset_added" => "Added element to presets",
        "notice.preset_removed" => "Removed element from presets",
        "panel.title" => "Blur management",
        "panel.tab_presets" => "CSS Selector",
        "panel.tab_keywords" => "Keywords",
        "panel.no_presets" => "No elements selected",
        "panel.no_keywords" => "No keywords added",
        "command.toggle_blur" => "Toggle blur effect",
        "command.open_panel" => "Open blur management panel",
        "command.toggle_selecting" => "Toggle selection mode",
        _ => return None,
    };
    Some(text)
}

/// Capabilities of the host shell around the document.
pub trait Shell {
    /// Show a transient notice.
    fn notify(&mut self, message: &str);

    /// Look up user-facing text. Unknown keys come back unchanged.
    fn translate(&self, key: &str) -> String {
        english(key).map_or_else(|| key.to_string(), str::to_string)
    }

    /// Register a host command under its id and translated name.
    fn register_command(&mut self, command: Command, name: &str);
}

/// A shell that records notices and registered commands.
#[derive(Debug, Default, Clone)]
pub struct RecordingShell {
    notices: Vec<String>,
    commands: Vec<(Command, String)>,
}

impl RecordingShell {
    /// Create an empty shell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices shown so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Take the recorded notices, leaving none behind.
    pub fn drain_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Registered commands with their display names.
    #[must_use]
    pub fn commands(&self) -> &[(Command, String)] {
        &self.commands
    }
}

impl Shell for RecordingShell {
    fn notify(&mut self, message: &str) {
        info!(notice = %message, "Notice");
        self.notices.push(message.to_string());
    }

    fn register_command(&mut self, command: Command, name: &str) {
        if !self.commands.iter().any(|(c, _)| *c == command) {
            self.commands.push((command, name.to_string()));
        }
    }
}

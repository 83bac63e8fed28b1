//! Plugin root.
//!
//! [`Plugin`] owns the [`Settings`] and every component, and is the only
//! place settings change. Each change is a settings transaction: mutate in
//! memory, await [`Plugin::commit`] (durable write, then observers are
//! notified), and only then refresh highlights, the panel and the effect.
//! When the write fails the in-memory settings are put back as they were.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::document::{Document, NodeId};
use crate::effects::{EffectEngine, EffectReport};
use crate::error::Result;
use crate::highlight::{HighlightState, Highlighter};
use crate::panel::{ManagementPanel, PanelAction, PanelView, Position};
use crate::regions::Regions;
use crate::selection::{ClickOutcome, SelectionModeController};
use crate::selector::{Selector, SelectorResolver};
use crate::settings::{normalize_blur_amount, Settings, Toggle};
use crate::shell::{Command, Shell};
use crate::store::SettingsStore;

/// The plugin root, generic over the host capabilities.
#[derive(Debug)]
pub struct Plugin<D, H, S> {
    document: D,
    shell: H,
    store: S,
    settings: Settings,
    selection: SelectionModeController,
    effects: EffectEngine,
    panel: ManagementPanel,
    observers: watch::Sender<Settings>,
    loaded: bool,
}

impl<D, H, S> Plugin<D, H, S>
where
    D: Document,
    H: Shell,
    S: SettingsStore,
{
    /// Wire up the components. Nothing is read or rendered until [`load`].
    ///
    /// [`load`]: Self::load
    pub fn new(config: &Config, document: D, shell: H, store: S) -> Self {
        let prefix = config.markers.reserved_prefix.as_str();
        let regions = Regions::new(&config.regions);
        let selection = SelectionModeController::new(
            SelectorResolver::new(prefix, regions.clone()),
            regions.clone(),
            Highlighter::new(prefix, regions.clone(), config.highlight.clone()),
        );
        let effects = EffectEngine::new(prefix, regions.clone());
        let panel = ManagementPanel::new(regions.panel_class(), &config.panel);
        let (observers, _) = watch::channel(Settings::default());

        Self {
            document,
            shell,
            store,
            settings: Settings::default(),
            selection,
            effects,
            panel,
            observers,
            loaded: false,
        }
    }

    // === Lifecycle ===

    /// Load the stored settings, register host commands and reapply the
    /// effect if it was active.
    ///
    /// A stored blob that needed normalizing is written back immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be loaded, decoded or written back.
    pub async fn load(&mut self) -> Result<()> {
        let blob = self.store.load().await?;
        let loaded = Settings::from_blob(blob)?;
        self.settings = loaded.settings;
        if loaded.needs_write {
            info!("Writing back normalized settings");
            self.commit().await?;
        } else {
            self.observers.send_replace(self.settings.clone());
        }

        for command in Command::ALL {
            let name = self.shell.translate(command.name_key());
            self.shell.register_command(command, &name);
        }

        if self.settings.is_blur_active {
            self.effects.apply_effects(&mut self.document, &self.settings);
        }
        self.loaded = true;
        info!(
            presets = self.settings.presets.len(),
            keywords = self.settings.keywords.len(),
            blur_active = self.settings.is_blur_active,
            "Plugin loaded"
        );
        Ok(())
    }

    /// Remove every visual trace of the plugin. Settings are left as stored.
    pub fn unload(&mut self) {
        self.effects.remove_effects(&mut self.document);
        if !self.selection.deactivate(&mut self.document) {
            self.selection.clear_highlights(&mut self.document);
        }
        self.panel.close(&mut self.document);
        self.loaded = false;
        info!("Plugin unloaded");
    }

    /// Persist the current settings, then publish them to observers.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; observers are not notified then.
    pub async fn commit(&mut self) -> Result<()> {
        let blob = self.settings.to_blob()?;
        self.store.save(&blob).await?;
        self.observers.send_replace(self.settings.clone());
        debug!("Settings committed");
        Ok(())
    }

    /// Observe committed settings.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.observers.subscribe()
    }

    // === Accessors ===

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The host document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// The host document, for hosts that mutate it between events.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// The host shell.
    pub fn shell(&self) -> &H {
        &self.shell
    }

    /// The host shell, mutably.
    pub fn shell_mut(&mut self) -> &mut H {
        &mut self.shell
    }

    /// The settings store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The management panel.
    pub fn panel(&self) -> &ManagementPanel {
        &self.panel
    }

    /// Whether [`load`](Self::load) has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether selection mode is on.
    pub fn is_selecting(&self) -> bool {
        self.selection.is_active()
    }

    /// Highlight state of `node`.
    pub fn highlight(&self, node: NodeId) -> HighlightState {
        self.selection.highlight(node)
    }

    /// Selector the resolver derives for `node`.
    pub fn resolve_selector(&self, node: NodeId) -> Option<String> {
        self.selection.resolver().resolve(&self.document, node)
    }

    /// Give the document back, dropping the plugin.
    pub fn into_document(self) -> D {
        self.document
    }

    // === Host commands ===

    /// Run a host command by id. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the command's settings transaction fails.
    pub async fn run_command(&mut self, id: &str) -> Result<()> {
        match Command::from_id(id) {
            Some(Command::ToggleBlur) => self.toggle_blur_active().await,
            Some(Command::OpenPanel) => self.open_management_panel().await,
            Some(Command::ToggleSelectingMode) => self.toggle_selecting_mode().await,
            None => {
                warn!(id, "Unknown command");
                Ok(())
            }
        }
    }

    /// Turn selection mode on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn toggle_selecting_mode(&mut self) -> Result<()> {
        let on = !self.selection.is_active();
        self.set_selecting_mode(on).await
    }

    /// Turn the blur effect on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn toggle_blur_active(&mut self) -> Result<()> {
        let active = !self.settings.is_blur_active;
        self.set_blur_active(active).await
    }

    /// Open the management panel, entering selection mode. Does nothing if
    /// the panel is already open.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn open_management_panel(&mut self) -> Result<()> {
        if self.panel.is_open() {
            return Ok(());
        }
        if self.selection.is_active() {
            self.panel.open(
                &mut self.document,
                &self.shell,
                &self.settings.presets,
                &self.settings.keywords,
            );
            return Ok(());
        }
        self.set_selecting_mode(true).await
    }

    /// Close the management panel, leaving selection mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn close_panel(&mut self) -> Result<()> {
        if !self.panel.is_open() {
            return Ok(());
        }
        if self.selection.is_active() {
            return self.set_selecting_mode(false).await;
        }
        self.panel.close(&mut self.document);
        self.selection.clear_highlights(&mut self.document);
        Ok(())
    }

    /// Enter or leave selection mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn set_selecting_mode(&mut self, on: bool) -> Result<()> {
        if self.selection.is_active() == on {
            return Ok(());
        }
        let previous = self.settings.clone();
        self.settings.is_selecting_mode = on;
        self.commit_or_restore(previous).await?;

        if on {
            self.selection
                .activate(&mut self.document, &self.settings.presets);
            self.panel.open(
                &mut self.document,
                &self.shell,
                &self.settings.presets,
                &self.settings.keywords,
            );
            self.notify("notice.selection_on");
        } else {
            self.selection.deactivate(&mut self.document);
            self.panel.close(&mut self.document);
            self.notify("notice.selection_off");
        }
        Ok(())
    }

    /// Turn the blur effect on or off and persist the choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn set_blur_active(&mut self, active: bool) -> Result<()> {
        let previous = self.settings.clone();
        self.settings.is_blur_active = active;
        self.commit_or_restore(previous).await?;

        if active {
            self.effects.remove_effects(&mut self.document);
            self.effects
                .apply_effects(&mut self.document, &self.settings);
            self.notify("notice.blur_on");
        } else {
            self.effects.remove_effects(&mut self.document);
            self.notify("notice.blur_off");
        }
        Ok(())
    }

    /// Apply the effect once without persisting anything.
    pub fn apply_effects(&mut self) -> EffectReport {
        self.effects.apply_effects(&mut self.document, &self.settings)
    }

    /// Remove the effect once without persisting anything.
    pub fn remove_effects(&mut self) -> usize {
        self.effects.remove_effects(&mut self.document)
    }

    // === Pointer events ===

    /// Pointer entered `node`. Preset list items get the panel hover, any
    /// other element is handled by selection mode.
    pub fn on_pointer_enter(&mut self, node: NodeId) {
        if let Some(index) = self.panel.preset_index(node) {
            self.hover_preset_item(index, true);
        } else {
            self.selection
                .pointer_enter(&mut self.document, &self.settings.presets, node);
        }
    }

    /// Pointer left `node`.
    pub fn on_pointer_leave(&mut self, node: NodeId) {
        if let Some(index) = self.panel.preset_index(node) {
            self.hover_preset_item(index, false);
        } else {
            self.selection.pointer_leave(&mut self.document, node);
        }
    }

    /// Click on `node`. Panel controls run their action; elsewhere, in
    /// selection mode, the element's selector is toggled in the presets.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn on_click(&mut self, node: NodeId) -> Result<Option<ClickOutcome>> {
        if self.panel.contains(&self.document, node) {
            if let Some(action) = self.panel.action_for(&self.document, node) {
                self.run_panel_action(action).await?;
            }
            return Ok(None);
        }

        let previous = self.settings.clone();
        let Some(outcome) =
            self.selection
                .click(&mut self.document, &mut self.settings.presets, node)
        else {
            return Ok(None);
        };
        if let Err(e) = self.commit_or_restore(previous).await {
            self.selection
                .pointer_enter(&mut self.document, &self.settings.presets, node);
            self.selection
                .sync_presets(&mut self.document, &self.settings.presets);
            return Err(e);
        }
        self.panel
            .render_presets(&mut self.document, &self.shell, &self.settings.presets);
        self.refresh_effects();
        self.notify(match outcome.toggle {
            Toggle::Added => "notice.preset_added",
            Toggle::Removed => "notice.preset_removed",
        });
        Ok(Some(outcome))
    }

    /// Pointer pressed at `pointer` over `node`; starts a panel drag when
    /// `node` is on the panel handle.
    pub fn on_pointer_down(&mut self, node: NodeId, pointer: Position) {
        if self.panel.is_drag_handle(&self.document, node) {
            self.panel.begin_drag(pointer);
        }
    }

    /// Pointer moved to `pointer`.
    pub fn on_pointer_move(&mut self, pointer: Position) {
        self.panel.drag_to(&mut self.document, pointer);
    }

    /// Pointer released.
    pub fn on_pointer_up(&mut self) {
        self.panel.end_drag();
    }

    // === Panel ===

    /// Run a panel control's action.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn run_panel_action(&mut self, action: PanelAction) -> Result<()> {
        debug!(?action, "Panel action");
        match action {
            PanelAction::Close => self.close_panel().await,
            PanelAction::ShowView(view) => {
                self.switch_panel_view(view);
                Ok(())
            }
            PanelAction::DeletePreset(index) => self.delete_preset_at(index).await.map(|_| ()),
            PanelAction::DeleteKeyword(index) => self.delete_keyword_at(index).await.map(|_| ()),
            PanelAction::AddKeyword => self.add_keyword_from_panel().await.map(|_| ()),
        }
    }

    /// Show the preset or keyword view.
    pub fn switch_panel_view(&mut self, view: PanelView) {
        self.panel.switch_view(&mut self.document, view);
    }

    /// Set or clear the hover highlight for the preset at `index`.
    pub fn hover_preset_item(&mut self, index: usize, hovered: bool) {
        if let Some(selector) = self.settings.presets.get(index) {
            self.selection
                .set_preset_hovered(&mut self.document, selector, hovered);
        }
    }

    /// Delete the preset at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn delete_preset_at(&mut self, index: usize) -> Result<Option<String>> {
        let previous = self.settings.clone();
        let Some(selector) = self.settings.presets.remove_at(index) else {
            return Ok(None);
        };
        self.commit_or_restore(previous).await?;
        self.selection
            .set_preset_hovered(&mut self.document, &selector, false);
        self.after_presets_changed();
        info!(selector = %selector, "Preset deleted");
        Ok(Some(selector))
    }

    /// Delete the keyword at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn delete_keyword_at(&mut self, index: usize) -> Result<Option<String>> {
        let previous = self.settings.clone();
        let Some(keyword) = self.settings.keywords.remove_at(index) else {
            return Ok(None);
        };
        self.commit_or_restore(previous).await?;
        self.after_keywords_changed();
        info!(keyword = %keyword, "Keyword deleted");
        Ok(Some(keyword))
    }

    // === Settings operations ===

    /// Store a new blur amount and refresh the effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn set_blur_amount(&mut self, amount: &str) -> Result<()> {
        let amount = normalize_blur_amount(amount.trim());
        if amount.is_empty() {
            warn!("Ignoring empty blur amount");
            return Ok(());
        }
        let previous = self.settings.clone();
        self.settings.blur_amount = amount;
        self.commit_or_restore(previous).await?;
        self.refresh_effects();
        Ok(())
    }

    /// Turn diagnostic logging on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn set_debug_mode(&mut self, on: bool) -> Result<()> {
        let previous = self.settings.clone();
        self.settings.is_debug_mode = on;
        self.commit_or_restore(previous).await
    }

    /// Store a selector. Returns `false` if it was empty or already stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn add_preset(&mut self, selector: &str) -> Result<bool> {
        let selector = selector.trim();
        if Selector::parse(selector).is_none() {
            warn!(selector, "Selector will never match an element");
        }
        let previous = self.settings.clone();
        if !self.settings.presets.add(selector) {
            return Ok(false);
        }
        self.commit_or_restore(previous).await?;
        self.after_presets_changed();
        Ok(true)
    }

    /// Remove a stored selector. Returns `false` if it was not stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn remove_preset(&mut self, selector: &str) -> Result<bool> {
        let previous = self.settings.clone();
        if !self.settings.presets.remove(selector.trim()) {
            return Ok(false);
        }
        self.commit_or_restore(previous).await?;
        self.after_presets_changed();
        Ok(true)
    }

    /// Remove every stored selector, returning them.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn clear_presets(&mut self) -> Result<Vec<String>> {
        let previous = self.settings.clone();
        let removed = self.settings.presets.clear();
        self.commit_or_restore(previous).await?;
        self.selection.clear_highlights(&mut self.document);
        self.after_presets_changed();
        Ok(removed)
    }

    /// Store a keyword. Returns `false` if it was blank or already stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn add_keyword(&mut self, keyword: &str) -> Result<bool> {
        let previous = self.settings.clone();
        if let Err(rejection) = self.settings.keywords.add(keyword) {
            warn!(keyword, ?rejection, "Keyword not added");
            return Ok(false);
        }
        self.commit_or_restore(previous).await?;
        self.after_keywords_changed();
        Ok(true)
    }

    /// Store the keyword typed into the panel input, emptying the input
    /// once it is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn add_keyword_from_panel(&mut self) -> Result<bool> {
        let Some(draft) = self.panel.keyword_draft(&self.document) else {
            return Ok(false);
        };
        if !self.add_keyword(&draft).await? {
            return Ok(false);
        }
        self.panel.clear_keyword_input(&mut self.document);
        Ok(true)
    }

    /// Remove a stored keyword. Returns `false` if it was not stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted.
    pub async fn remove_keyword(&mut self, keyword: &str) -> Result<bool> {
        let previous = self.settings.clone();
        if !self.settings.keywords.remove(keyword.trim()) {
            return Ok(false);
        }
        self.commit_or_restore(previous).await?;
        self.after_keywords_changed();
        Ok(true)
    }

    // === Internals ===

    async fn commit_or_restore(&mut self, previous: Settings) -> Result<()> {
        if let Err(e) = self.commit().await {
            warn!(error = %e, "Settings not saved, keeping the stored values");
            self.settings = previous;
            return Err(e);
        }
        Ok(())
    }

    fn after_presets_changed(&mut self) {
        self.panel
            .render_presets(&mut self.document, &self.shell, &self.settings.presets);
        self.selection
            .sync_presets(&mut self.document, &self.settings.presets);
        self.refresh_effects();
    }

    fn after_keywords_changed(&mut self) {
        self.panel
            .render_keywords(&mut self.document, &self.shell, &self.settings.keywords);
        self.refresh_effects();
    }

    fn refresh_effects(&mut self) {
        if self.settings.is_blur_active {
            self.effects.remove_effects(&mut self.document);
            self.effects
                .apply_effects(&mut self.document, &self.settings);
        }
    }

    fn notify(&mut self, key: &str) {
        let message = self.shell.translate(key);
        self.shell.notify(&message);
    }
}

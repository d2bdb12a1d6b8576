// FilesPage - The drive workspace: folders, uploads, selection, view modes
//
// Folder creation is the representative flow and is tracked as a small state
// machine:
//
//   Closed -> MenuOpen -> DialogOpen -> NameEntered -> Submitted -> Closed
//                                            \-> Error (name rejected)
//
// The confirm control is only enabled for names free of forbidden characters.
// attempt_invalid_folder asserts that it is disabled rather than assuming it.
//
// Submitting an existing name does not fail: the application adds a sibling
// named "<name> (1)". Callers that need the new entry must ask for the
// disambiguated name.

use super::{PageObject, Section, ViewMode};
use crate::driver::ElementState;
use crate::error::{Error, Result};
use crate::interaction::Interactions;
use crate::locator::Locator;
use crate::testdata::{OperationTimeouts, TestData, ViewLabels};
use crate::wait::{Backoff, poll_until};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Attributes a view toggle may use to report itself active.
const ACTIVE_ATTRIBUTES: [&str; 4] = [
    "aria-pressed",
    "aria-checked",
    "aria-selected",
    "data-active",
];

/// Where the folder-creation flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderDialogState {
    Closed,
    MenuOpen,
    DialogOpen,
    NameEntered,
    Submitted,
    /// The dialog is open and refuses the entered name
    Error,
}

/// Every locator FilesPage uses, declared once.
///
/// Parameterized locators (one item, one upload row) are methods.
#[derive(Debug, Clone)]
pub struct FilesLocators {
    pub add_button: Locator,
    pub new_folder_option: Locator,
    pub upload_option: Locator,
    pub folder_dialog: Locator,
    pub folder_name_input: Locator,
    pub folder_confirm: Locator,
    pub folder_cancel: Locator,
    pub folder_error: Locator,
    pub file_input: Locator,
    pub upload_progress: Locator,
    pub item_cards: Locator,
    pub item_checkboxes: Locator,
    pub selection_menu: Locator,
    pub select_all_option: Locator,
    pub select_none_option: Locator,
    pub view_buttons: [(ViewMode, Locator); 3],
    pub delete_button: Locator,
    pub copy_button: Locator,
    pub cut_button: Locator,
    pub paste_button: Locator,
    pub rename_button: Locator,
    pub download_button: Locator,
    pub confirm_dialog: Locator,
    pub confirm_delete: Locator,
    pub rename_dialog: Locator,
    pub rename_input: Locator,
    pub rename_confirm: Locator,
    pub search_box: Locator,
    pub empty_state: Locator,
    pub breadcrumb_items: Locator,
}

impl FilesLocators {
    pub fn new(labels: &ViewLabels) -> Self {
        let folder_dialog = Locator::role_named("dialog", "New folder");
        let confirm_dialog = Locator::role("alertdialog");
        let rename_dialog = Locator::role_named("dialog", "Rename");
        let item_cards = Locator::test_id("item-card");
        let toolbar = |name: &str| {
            Locator::role_named("toolbar", "Selection")
                .locator(&Locator::role_exact("button", name))
        };

        Self {
            add_button: Locator::role_exact("button", "New"),
            new_folder_option: Locator::role_exact("menuitem", "Folder"),
            upload_option: Locator::role_exact("menuitem", "Upload files"),
            folder_name_input: folder_dialog.locator(&Locator::label("Folder name")),
            folder_confirm: folder_dialog.locator(&Locator::role_exact("button", "Create")),
            folder_cancel: folder_dialog.locator(&Locator::role_exact("button", "Cancel")),
            folder_error: folder_dialog.locator(&Locator::role("alert")),
            folder_dialog,
            file_input: Locator::css("input[type=file]"),
            upload_progress: Locator::test_id("upload-progress"),
            item_checkboxes: item_cards.locator(&Locator::role("checkbox")),
            item_cards,
            selection_menu: Locator::role_named("button", "Selection options"),
            select_all_option: Locator::role_exact("menuitem", "Select all"),
            select_none_option: Locator::role_exact("menuitem", "Select none"),
            view_buttons: [
                (ViewMode::Grid, Locator::role_exact("button", &labels.grid)),
                (ViewMode::List, Locator::role_exact("button", &labels.list)),
                (ViewMode::Card, Locator::role_exact("button", &labels.card)),
            ],
            delete_button: toolbar("Delete"),
            copy_button: toolbar("Copy"),
            cut_button: toolbar("Cut"),
            paste_button: Locator::role_exact("button", "Paste"),
            rename_button: toolbar("Rename"),
            download_button: toolbar("Download"),
            confirm_delete: confirm_dialog.locator(&Locator::role_exact("button", "Delete")),
            confirm_dialog,
            rename_input: rename_dialog.locator(&Locator::role("textbox")),
            rename_confirm: rename_dialog.locator(&Locator::role_exact("button", "Save")),
            rename_dialog,
            search_box: Locator::role("searchbox"),
            empty_state: Locator::test_id("empty-state"),
            breadcrumb_items: Locator::role_named("navigation", "Breadcrumb")
                .locator(&Locator::role("listitem")),
        }
    }

    /// The card of the item whose name is exactly `name`.
    pub fn item(&self, name: &str) -> Locator {
        self.item_cards.has(&Locator::exact_text(name))
    }

    pub fn item_checkbox(&self, name: &str) -> Locator {
        self.item(name).locator(&Locator::role("checkbox"))
    }

    /// Success marker of one file in the upload panel.
    pub fn upload_success(&self, file_name: &str) -> Locator {
        Locator::test_id("upload-item")
            .has(&Locator::exact_text(file_name))
            .locator(&Locator::test_id("upload-success"))
    }

    pub fn view_button(&self, mode: ViewMode) -> Option<&Locator> {
        self.view_buttons
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, locator)| locator)
    }

    pub fn section_link(&self, section: Section) -> Locator {
        Locator::role_exact("link", section.label())
    }

    pub fn section_heading(&self, section: Section) -> Locator {
        Locator::role_exact("heading", section.label())
    }
}

/// Page object for the drive workspace.
pub struct FilesPage {
    ui: Interactions,
    locators: FilesLocators,
    timeouts: OperationTimeouts,
    dialog_state: Mutex<FolderDialogState>,
}

impl FilesPage {
    pub const PATH: &'static str = "/drive";

    pub fn new(ui: Interactions, data: &TestData) -> Self {
        Self {
            ui,
            locators: FilesLocators::new(&data.view_modes),
            timeouts: data.timeouts,
            dialog_state: Mutex::new(FolderDialogState::Closed),
        }
    }

    pub fn locators(&self) -> &FilesLocators {
        &self.locators
    }

    pub fn folder_dialog_state(&self) -> FolderDialogState {
        *self.dialog_state.lock()
    }

    fn set_state(&self, state: FolderDialogState) {
        let previous = std::mem::replace(&mut *self.dialog_state.lock(), state);
        tracing::trace!(?previous, ?state, "folder dialog");
    }

    fn folder_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.folder_ms)
    }

    // Folder creation, atomic steps

    pub async fn open_add_menu(&self) -> Result<()> {
        self.ui.click(&self.locators.add_button).await?;
        self.ui.wait_for_visible(&self.locators.new_folder_option).await?;
        self.set_state(FolderDialogState::MenuOpen);
        Ok(())
    }

    pub async fn choose_new_folder(&self) -> Result<()> {
        self.ui.click(&self.locators.new_folder_option).await?;
        self.ui.wait_for_visible(&self.locators.folder_dialog).await?;
        self.set_state(FolderDialogState::DialogOpen);
        Ok(())
    }

    pub async fn type_folder_name(&self, name: &str) -> Result<()> {
        self.ui.fill(&self.locators.folder_name_input, name).await?;
        self.set_state(FolderDialogState::NameEntered);
        Ok(())
    }

    pub async fn is_confirm_enabled(&self) -> Result<bool> {
        self.ui.is_enabled(&self.locators.folder_confirm).await
    }

    pub async fn confirm_folder(&self) -> Result<()> {
        self.ui.click(&self.locators.folder_confirm).await?;
        self.set_state(FolderDialogState::Submitted);
        Ok(())
    }

    pub async fn cancel_folder(&self) -> Result<()> {
        self.ui.click(&self.locators.folder_cancel).await?;
        self.ui.wait_for_hidden(&self.locators.folder_dialog).await?;
        self.set_state(FolderDialogState::Closed);
        Ok(())
    }

    /// Validation message shown inside the folder dialog, if any.
    pub async fn dialog_error(&self) -> Option<String> {
        if !self.ui.is_visible(&self.locators.folder_error).await {
            return None;
        }
        self.ui.get_text(&self.locators.folder_error).await.ok()
    }

    // Folder creation, flows

    /// Runs the dialog up to submission and waits for it to close.
    async fn submit_folder(&self, name: &str) -> Result<()> {
        self.open_add_menu().await?;
        self.choose_new_folder().await?;
        self.type_folder_name(name).await?;
        self.confirm_folder().await?;
        self.ui
            .wait_for_within(
                &self.locators.folder_dialog,
                ElementState::Hidden,
                self.folder_timeout(),
            )
            .await?;
        self.set_state(FolderDialogState::Closed);
        Ok(())
    }

    /// Creates a folder and waits until it is listed under `name`.
    pub async fn create_folder(&self, name: &str) -> Result<()> {
        tracing::info!(name, "creating folder");
        self.submit_folder(name).await?;
        self.wait_for_item(name).await
    }

    /// Enters a name the application must refuse.
    ///
    /// Fails with [`Error::Assertion`] if the confirm control is enabled. On
    /// success the dialog is left open in [`FolderDialogState::Error`] and the
    /// validation message, if the application shows one, is returned.
    pub async fn attempt_invalid_folder(&self, name: &str) -> Result<Option<String>> {
        tracing::info!(name, "attempting forbidden folder name");
        self.open_add_menu().await?;
        self.choose_new_folder().await?;
        self.type_folder_name(name).await?;

        self.ui
            .expect_disabled(&self.locators.folder_confirm)
            .await
            .map_err(|_| {
                Error::Assertion(format!(
                    "Expected the Create button to stay disabled for '{name}', but it was enabled"
                ))
            })?;
        self.ui.expect_visible(&self.locators.folder_dialog).await?;
        self.set_state(FolderDialogState::Error);
        Ok(self.dialog_error().await)
    }

    /// Name the application gives the `n`th duplicate of `name`.
    pub fn disambiguated_name(name: &str, n: u32) -> String {
        format!("{name} ({n})")
    }

    /// Creates a folder whose name already exists and returns the name the
    /// application gave the new entry.
    pub async fn create_duplicate_folder(&self, name: &str) -> Result<String> {
        let duplicate = Self::disambiguated_name(name, 1);
        tracing::info!(name, %duplicate, "creating duplicate folder");
        self.submit_folder(name).await?;
        self.wait_for_item(&duplicate).await?;
        Ok(duplicate)
    }

    // Upload

    /// Attaches files to the upload control.
    pub async fn select_files(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Err(Error::Usage("select_files needs at least one file".to_string()));
        }
        self.ui.attach_files(&self.locators.file_input, paths).await
    }

    /// Uploads files and waits for every file's own success marker.
    pub async fn upload_files(&self, paths: &[PathBuf]) -> Result<()> {
        let names = file_names(paths)?;
        tracing::info!(count = names.len(), "uploading files");
        self.select_files(paths).await?;

        let timeout = Duration::from_millis(self.timeouts.upload_ms);
        for name in &names {
            self.ui
                .wait_for_within(
                    &self.locators.upload_success(name),
                    ElementState::Visible,
                    timeout,
                )
                .await?;
            tracing::debug!(file = %name, "upload finished");
        }
        Ok(())
    }

    /// Uploads files and polls with `backoff` until the progress indicator is
    /// gone and every file is listed. Returns the attempts used.
    ///
    /// For builds of the application that show no per-file success marker.
    pub async fn upload_files_polling(&self, paths: &[PathBuf], backoff: &Backoff) -> Result<u32> {
        let names = file_names(paths)?;
        self.select_files(paths).await?;

        let driver = self.ui.driver();
        let progress = self.locators.upload_progress.selector();
        let items: Vec<String> = names.iter().map(|n| self.locators.item(n).selector()).collect();
        let (progress, items) = (progress.as_str(), items.as_slice());
        backoff
            .retry(move || async move {
                if driver.is_visible(progress).await? {
                    return Ok(false);
                }
                for item in items {
                    if driver.count(item).await? == 0 {
                        return Ok(false);
                    }
                }
                Ok(true)
            })
            .await
    }

    // Selection

    /// Hovers the item's card, then checks its checkbox.
    ///
    /// The checkbox only becomes interactable while the card is hovered.
    pub async fn select_item(&self, name: &str) -> Result<()> {
        self.ui.hover(&self.locators.item(name)).await?;
        self.ui.check(&self.locators.item_checkbox(name)).await
    }

    pub async fn deselect_item(&self, name: &str) -> Result<()> {
        self.ui.hover(&self.locators.item(name)).await?;
        self.ui.uncheck(&self.locators.item_checkbox(name)).await
    }

    pub async fn select_all(&self) -> Result<()> {
        self.choose_selection_option(&self.locators.select_all_option)
            .await
    }

    pub async fn select_none(&self) -> Result<()> {
        self.choose_selection_option(&self.locators.select_none_option)
            .await
    }

    async fn choose_selection_option(&self, option: &Locator) -> Result<()> {
        self.ui.click(&self.locators.selection_menu).await?;
        self.ui.wait_for_visible(option).await?;
        self.ui.click(option).await
    }

    pub async fn is_item_selected(&self, name: &str) -> Result<bool> {
        self.ui.is_checked(&self.locators.item_checkbox(name)).await
    }

    /// Checked state of every listed item, in listing order.
    async fn checked_states(&self) -> Result<Vec<bool>> {
        let total = self.ui.count(&self.locators.item_checkboxes).await?;
        let mut states = Vec::with_capacity(total);
        for index in 0..total {
            let checkbox = self.locators.item_checkboxes.nth(index as i32);
            states.push(self.ui.is_checked(&checkbox).await?);
        }
        Ok(states)
    }

    pub async fn selected_count(&self) -> Result<usize> {
        Ok(self.checked_states().await?.into_iter().filter(|c| *c).count())
    }

    /// True if there is at least one item and every item is checked.
    pub async fn all_items_checked(&self) -> Result<bool> {
        let states = self.checked_states().await?;
        Ok(!states.is_empty() && states.iter().all(|c| *c))
    }

    /// True if there is at least one item and no item is checked.
    pub async fn all_items_unchecked(&self) -> Result<bool> {
        let states = self.checked_states().await?;
        Ok(!states.is_empty() && states.iter().all(|c| !*c))
    }

    // View mode

    /// Switches the listing layout and waits until the toggle reports it.
    pub async fn switch_view(&self, mode: ViewMode) -> Result<()> {
        let button = self
            .locators
            .view_button(mode)
            .ok_or_else(|| Error::Usage("cannot switch to the unknown view mode".to_string()))?;
        tracing::info!(%mode, "switching view");
        self.ui.click(button).await?;

        let what = format!("{mode} view to become active");
        let interval = self.ui.driver().poll_interval();
        let page = self;
        poll_until(&what, self.ui.timeouts().expect, interval, move || async move {
            Ok(page.current_view().await == mode)
        })
        .await
    }

    /// First view toggle reporting itself active; [`ViewMode::Unknown`] if
    /// none does. Never fails.
    pub async fn current_view(&self) -> ViewMode {
        for (mode, button) in &self.locators.view_buttons {
            if self.is_toggle_active(button).await {
                return *mode;
            }
        }
        ViewMode::Unknown
    }

    async fn is_toggle_active(&self, toggle: &Locator) -> bool {
        let selector = toggle.selector();
        let driver = self.ui.driver();
        // Attribute reads wait for the element, so never read from one that
        // is not rendered.
        if !matches!(driver.count(&selector).await, Ok(n) if n > 0) {
            return false;
        }
        for attribute in ACTIVE_ATTRIBUTES {
            if let Ok(Some(value)) = driver.get_attribute(&selector, attribute).await
                && value == "true"
            {
                return true;
            }
        }
        false
    }

    // Content

    /// True if an item named exactly `name` becomes visible within the expect
    /// timeout. Never fails.
    pub async fn item_exists(&self, name: &str) -> bool {
        self.ui.is_visible(&self.locators.item(name)).await
    }

    pub async fn wait_for_item(&self, name: &str) -> Result<()> {
        self.ui
            .wait_for_within(
                &self.locators.item(name),
                ElementState::Visible,
                self.folder_timeout(),
            )
            .await
    }

    pub async fn wait_for_item_gone(&self, name: &str) -> Result<()> {
        self.ui
            .wait_for_within(
                &self.locators.item(name),
                ElementState::Hidden,
                self.folder_timeout(),
            )
            .await
    }

    pub async fn item_count(&self) -> Result<usize> {
        self.ui.count(&self.locators.item_cards).await
    }

    /// Names of the listed items, in listing order.
    pub async fn item_names(&self) -> Result<Vec<String>> {
        let total = self.item_count().await?;
        let mut names = Vec::with_capacity(total);
        for index in 0..total {
            let name = self
                .locators
                .item_cards
                .nth(index as i32)
                .locator(&Locator::test_id("item-name"));
            names.push(self.ui.get_text(&name).await?);
        }
        Ok(names)
    }

    /// Deletes the current selection, confirming the prompt.
    pub async fn delete_selected(&self) -> Result<()> {
        self.ui.click(&self.locators.delete_button).await?;
        self.ui.wait_for_visible(&self.locators.confirm_dialog).await?;
        self.ui.click(&self.locators.confirm_delete).await?;
        self.ui.wait_for_hidden(&self.locators.confirm_dialog).await
    }

    /// Selects and deletes one item, then waits for it to disappear.
    pub async fn delete_item(&self, name: &str) -> Result<()> {
        tracing::info!(name, "deleting item");
        self.select_item(name).await?;
        self.delete_selected().await?;
        self.wait_for_item_gone(name).await
    }

    pub async fn copy_selected(&self) -> Result<()> {
        self.ui.click(&self.locators.copy_button).await
    }

    pub async fn cut_selected(&self) -> Result<()> {
        self.ui.click(&self.locators.cut_button).await
    }

    /// Opens `folder` and pastes the clipboard into it.
    pub async fn paste_into(&self, folder: &str) -> Result<()> {
        self.open_folder(folder).await?;
        self.ui.click(&self.locators.paste_button).await
    }

    pub async fn rename_item(&self, old: &str, new: &str) -> Result<()> {
        tracing::info!(old, new, "renaming item");
        self.select_item(old).await?;
        self.ui.click(&self.locators.rename_button).await?;
        self.ui.wait_for_visible(&self.locators.rename_dialog).await?;
        self.ui.fill(&self.locators.rename_input, new).await?;
        self.ui.click(&self.locators.rename_confirm).await?;
        self.ui.wait_for_hidden(&self.locators.rename_dialog).await?;
        self.wait_for_item(new).await
    }

    /// Downloads one item into `dest_dir`, returning the saved file.
    pub async fn download_item(&self, name: &str, dest_dir: &Path) -> Result<PathBuf> {
        self.select_item(name).await?;
        self.ui.download(&self.locators.download_button, dest_dir).await
    }

    /// Runs a search and waits for either results or the empty state.
    pub async fn search(&self, term: &str) -> Result<()> {
        tracing::info!(term, "searching");
        self.ui.fill(&self.locators.search_box, term).await?;
        self.ui.press(&self.locators.search_box, "Enter").await?;

        let driver = self.ui.driver();
        let cards = self.locators.item_cards.selector();
        let empty = self.locators.empty_state.selector();
        let (cards, empty) = (cards.as_str(), empty.as_str());
        poll_until(
            &format!("results for '{term}'"),
            Duration::from_millis(self.timeouts.search_ms),
            driver.poll_interval(),
            move || async move { Ok(driver.count(cards).await? > 0 || driver.is_visible(empty).await?) },
        )
        .await
    }

    pub async fn clear_search(&self) -> Result<()> {
        self.ui.fill(&self.locators.search_box, "").await?;
        self.ui.press(&self.locators.search_box, "Enter").await
    }

    /// True if the listing shows its empty-state placeholder. Never fails.
    pub async fn is_empty(&self) -> bool {
        self.ui.is_visible(&self.locators.empty_state).await
    }

    // Navigation

    pub async fn open_section(&self, section: Section) -> Result<()> {
        self.ui.click(&self.locators.section_link(section)).await?;
        self.ui
            .wait_for_visible(&self.locators.section_heading(section))
            .await
    }

    /// Opens a folder by double-clicking it and waits for the breadcrumb.
    pub async fn open_folder(&self, name: &str) -> Result<()> {
        self.ui.double_click(&self.locators.item(name)).await?;
        self.ui
            .wait_for_visible(&self.locators.breadcrumb_items.has(&Locator::exact_text(name)))
            .await
    }

    /// Breadcrumb trail from the root to the current folder.
    pub async fn breadcrumb(&self) -> Result<Vec<String>> {
        let total = self.ui.count(&self.locators.breadcrumb_items).await?;
        let mut trail = Vec::with_capacity(total);
        for index in 0..total {
            trail.push(self.ui.get_text(&self.locators.breadcrumb_items.nth(index as i32)).await?);
        }
        Ok(trail)
    }
}

#[async_trait]
impl PageObject for FilesPage {
    fn path(&self) -> &str {
        Self::PATH
    }

    fn interactions(&self) -> &Interactions {
        &self.ui
    }

    fn page_name(&self) -> &str {
        "FilesPage"
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_visible(&self.locators.add_button).await
    }
}

fn file_names(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| Error::Usage(format!("'{}' has no file name", path.display())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::driver::fake::{Action, FakeApp, FakeDriver, FakeElement};
    use crate::testdata::SAMPLE;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct Item {
        name: String,
        checked: bool,
    }

    /// Model of the drive UI, rendered through the same locators FilesPage uses.
    struct FakeDrive {
        loc: FilesLocators,
        forbidden: String,
        items: Vec<Item>,
        hovered: Option<String>,
        add_menu: bool,
        selection_menu: bool,
        dialog: bool,
        typed: String,
        confirm_prompt: bool,
        view: ViewMode,
        /// Toggle left out of the toolbar
        missing_toggle: Option<ViewMode>,
        uploaded: Vec<String>,
    }

    impl FakeDrive {
        fn new(data: &TestData, names: &[&str]) -> Self {
            Self {
                loc: FilesLocators::new(&data.view_modes),
                forbidden: data.folder_naming.forbidden_characters.clone(),
                items: names
                    .iter()
                    .map(|n| Item { name: n.to_string(), checked: false })
                    .collect(),
                hovered: None,
                add_menu: false,
                selection_menu: false,
                dialog: false,
                typed: String::new(),
                confirm_prompt: false,
                view: ViewMode::Grid,
                missing_toggle: None,
                uploaded: Vec::new(),
            }
        }

        fn name_is_valid(&self) -> bool {
            !self.typed.is_empty() && !self.typed.chars().any(|c| self.forbidden.contains(c))
        }

        fn render(&self) -> HashMap<String, FakeElement> {
            let loc = &self.loc;
            let shown = |visible: bool| if visible { FakeElement::visible() } else { FakeElement::hidden() };
            let mut ui = HashMap::new();
            let mut put = |locator: &Locator, element: FakeElement| {
                ui.insert(locator.selector(), element);
            };

            put(&loc.add_button, FakeElement::visible());
            put(&loc.new_folder_option, shown(self.add_menu));
            put(&loc.upload_option, shown(self.add_menu));
            put(&loc.folder_dialog, shown(self.dialog));
            put(&loc.folder_name_input, shown(self.dialog));
            put(&loc.folder_cancel, shown(self.dialog));
            let confirm = shown(self.dialog);
            put(
                &loc.folder_confirm,
                if self.name_is_valid() { confirm } else { confirm.disabled() },
            );
            if self.dialog && !self.typed.is_empty() && !self.name_is_valid() {
                put(
                    &loc.folder_error,
                    FakeElement::visible().with_text("Name contains invalid characters"),
                );
            }
            put(&loc.file_input, FakeElement::hidden());
            put(&loc.selection_menu, FakeElement::visible());
            put(&loc.select_all_option, shown(self.selection_menu));
            put(&loc.select_none_option, shown(self.selection_menu));
            put(&loc.delete_button, FakeElement::visible());
            put(&loc.confirm_dialog, shown(self.confirm_prompt));
            put(&loc.confirm_delete, shown(self.confirm_prompt));

            for (mode, button) in &loc.view_buttons {
                if self.missing_toggle == Some(*mode) {
                    continue;
                }
                let pressed = if *mode == self.view { "true" } else { "false" };
                put(button, FakeElement::visible().with_attribute("aria-pressed", pressed));
            }

            put(&loc.item_cards, FakeElement::visible().with_count(self.items.len()));
            put(&loc.item_checkboxes, FakeElement::hidden().with_count(self.items.len()));
            for (index, item) in self.items.iter().enumerate() {
                let hovered = self.hovered.as_deref() == Some(item.name.as_str());
                let checkbox = shown(hovered || item.checked).checked(item.checked);
                put(&loc.item(&item.name), FakeElement::visible());
                put(&loc.item_checkbox(&item.name), checkbox.clone());
                put(&loc.item_checkboxes.nth(index as i32), checkbox);
                put(
                    &loc.item_cards
                        .nth(index as i32)
                        .locator(&Locator::test_id("item-name")),
                    FakeElement::visible().with_text(&item.name),
                );
            }
            for name in &self.uploaded {
                put(&loc.upload_success(name), FakeElement::visible());
            }
            ui
        }

        fn add_folder(&mut self) {
            let name = if self.items.iter().any(|i| i.name == self.typed) {
                FilesPage::disambiguated_name(&self.typed, 1)
            } else {
                self.typed.clone()
            };
            self.items.push(Item { name, checked: false });
        }
    }

    impl FakeApp for FakeDrive {
        fn element(&self, selector: &str) -> Option<FakeElement> {
            self.render().remove(selector)
        }

        fn perform(&mut self, action: &Action) -> Result<()> {
            let loc = self.loc.clone();
            let is = |locator: &Locator, selector: &str| locator.selector() == selector;
            match action {
                Action::Click(s) if is(&loc.add_button, s) => self.add_menu = true,
                Action::Click(s) if is(&loc.new_folder_option, s) => {
                    self.add_menu = false;
                    self.dialog = true;
                    self.typed.clear();
                }
                Action::Fill(s, value) if is(&loc.folder_name_input, s) => {
                    self.typed = value.clone();
                }
                Action::Click(s) if is(&loc.folder_confirm, s) => {
                    self.add_folder();
                    self.dialog = false;
                }
                Action::Click(s) if is(&loc.folder_cancel, s) => self.dialog = false,
                Action::Click(s) if is(&loc.selection_menu, s) => self.selection_menu = true,
                Action::Click(s) if is(&loc.select_all_option, s) || is(&loc.select_none_option, s) => {
                    let all = is(&loc.select_all_option, s);
                    self.items.iter_mut().for_each(|i| i.checked = all);
                    self.selection_menu = false;
                }
                Action::Click(s) if is(&loc.delete_button, s) => self.confirm_prompt = true,
                Action::Click(s) if is(&loc.confirm_delete, s) => {
                    self.items.retain(|i| !i.checked);
                    self.confirm_prompt = false;
                }
                Action::Hover(s) => {
                    self.hovered = self
                        .items
                        .iter()
                        .find(|i| is(&loc.item(&i.name), s))
                        .map(|i| i.name.clone());
                }
                Action::SetChecked(s, checked) => {
                    if let Some(item) = self.items.iter_mut().find(|i| is(&loc.item_checkbox(&i.name), s)) {
                        item.checked = *checked;
                    }
                }
                Action::SetFiles(_, files) => {
                    for file in files {
                        let name = file.file_name().unwrap().to_string_lossy().into_owned();
                        self.items.push(Item { name: name.clone(), checked: false });
                        self.uploaded.push(name);
                    }
                }
                Action::Click(s) => {
                    if let Some((mode, _)) = loc.view_buttons.iter().find(|(_, b)| is(b, s)) {
                        self.view = *mode;
                    }
                }
                _ => {}
            }
            Ok(())
        }
    }

    fn files_page(names: &[&str]) -> (Arc<FakeDriver<FakeDrive>>, FilesPage) {
        let data = TestData::parse(SAMPLE).unwrap();
        let driver = Arc::new(FakeDriver::new(FakeDrive::new(&data, names)));
        let timeouts = Timeouts {
            action: Duration::from_millis(500),
            expect: Duration::from_millis(100),
            ..Timeouts::default()
        };
        let page = FilesPage::new(Interactions::new(driver.clone(), timeouts), &data);
        (driver, page)
    }

    #[tokio::test(start_paused = true)]
    async fn create_folder_walks_the_dialog_states() {
        let (_, files) = files_page(&[]);
        assert_eq!(files.folder_dialog_state(), FolderDialogState::Closed);

        files.open_add_menu().await.unwrap();
        assert_eq!(files.folder_dialog_state(), FolderDialogState::MenuOpen);
        files.choose_new_folder().await.unwrap();
        assert_eq!(files.folder_dialog_state(), FolderDialogState::DialogOpen);
        files.type_folder_name("Reports").await.unwrap();
        assert_eq!(files.folder_dialog_state(), FolderDialogState::NameEntered);
        assert!(files.is_confirm_enabled().await.unwrap());
        files.cancel_folder().await.unwrap();
        assert_eq!(files.folder_dialog_state(), FolderDialogState::Closed);

        files.create_folder("Reports").await.unwrap();
        assert_eq!(files.folder_dialog_state(), FolderDialogState::Closed);
        assert!(files.item_exists("Reports").await);
        assert_eq!(files.item_names().await.unwrap(), vec!["Reports"]);
    }

    #[tokio::test(start_paused = true)]
    async fn forbidden_names_leave_the_dialog_in_error() {
        let (driver, files) = files_page(&[]);

        let message = files.attempt_invalid_folder("bad/name").await.unwrap();
        assert_eq!(message.as_deref(), Some("Name contains invalid characters"));
        assert_eq!(files.folder_dialog_state(), FolderDialogState::Error);
        assert_eq!(files.item_count().await.unwrap(), 0);
        assert!(
            driver
                .position(&Action::Click(files.locators().folder_confirm.selector()))
                .is_none()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_names_fail_the_invalid_name_assertion() {
        let (_, files) = files_page(&[]);

        let err = files.attempt_invalid_folder("fine").await.unwrap_err();
        assert!(matches!(err, Error::Assertion(_)), "{err}");
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_folder_gets_a_numbered_sibling() {
        let (_, files) = files_page(&["Reports"]);

        let name = files.create_duplicate_folder("Reports").await.unwrap();
        assert_eq!(name, "Reports (1)");
        let names = files.item_names().await.unwrap();
        assert_eq!(names, vec!["Reports", "Reports (1)"]);
    }

    #[tokio::test(start_paused = true)]
    async fn upload_waits_for_each_file() {
        let (_, files) = files_page(&["Existing"]);
        let paths = vec![PathBuf::from("fixtures/a.txt"), PathBuf::from("fixtures/b.txt")];

        files.upload_files(&paths).await.unwrap();
        assert_eq!(files.item_count().await.unwrap(), 3);
        assert!(files.item_exists("b.txt").await);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_upload_succeeds_on_first_settled_attempt() {
        let (_, files) = files_page(&[]);
        let backoff = Backoff::new(4, Duration::from_millis(10)).with_description("upload");

        let attempts = files
            .upload_files_polling(&[PathBuf::from("c.txt")], &backoff)
            .await
            .unwrap();
        assert_eq!(attempts, 1);
        assert!(files.select_files(&[]).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn select_item_hovers_before_checking() {
        let (driver, files) = files_page(&["Reports", "Notes"]);

        files.select_item("Notes").await.unwrap();
        let loc = files.locators();
        let hover = driver.position(&Action::Hover(loc.item("Notes").selector())).unwrap();
        let check = driver
            .position(&Action::SetChecked(loc.item_checkbox("Notes").selector(), true))
            .unwrap();
        assert!(hover < check);
        assert!(files.is_item_selected("Notes").await.unwrap());
        assert!(!files.is_item_selected("Reports").await.unwrap());
        assert_eq!(files.selected_count().await.unwrap(), 1);

        files.deselect_item("Notes").await.unwrap();
        assert_eq!(files.selected_count().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn select_all_then_none() {
        let (driver, files) = files_page(&["a", "b", "c"]);

        files.select_all().await.unwrap();
        assert!(files.all_items_checked().await.unwrap());
        let menu = driver
            .position(&Action::Click(files.locators().selection_menu.selector()))
            .unwrap();
        let option = driver
            .position(&Action::Click(files.locators().select_all_option.selector()))
            .unwrap();
        assert!(menu < option);

        files.select_none().await.unwrap();
        assert!(files.all_items_unchecked().await.unwrap());
        assert!(!files.all_items_checked().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_listing_is_neither_all_checked_nor_all_unchecked() {
        let (_, files) = files_page(&[]);
        assert!(!files.all_items_checked().await.unwrap());
        assert!(!files.all_items_unchecked().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn view_mode_follows_each_switch() {
        let (_, files) = files_page(&["a"]);
        assert_eq!(files.current_view().await, ViewMode::Grid);

        for mode in [ViewMode::Grid, ViewMode::List, ViewMode::Card] {
            files.switch_view(mode).await.unwrap();
            assert_eq!(files.current_view().await, mode);
        }
        assert!(matches!(
            files.switch_view(ViewMode::Unknown).await,
            Err(Error::Usage(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_view_when_no_toggle_is_active() {
        let (driver, files) = files_page(&[]);
        driver.with_app(|app| app.view = ViewMode::Unknown);
        assert_eq!(files.current_view().await, ViewMode::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_toggle_does_not_stall_view_detection() {
        let (driver, files) = files_page(&["a"]);
        driver.with_app(|app| {
            app.missing_toggle = Some(ViewMode::Grid);
            app.view = ViewMode::List;
        });

        let started = tokio::time::Instant::now();
        assert_eq!(files.current_view().await, ViewMode::List);
        files.switch_view(ViewMode::Card).await.unwrap();
        assert!(started.elapsed() < crate::driver::fake::READ_AUTO_WAIT);

        driver.with_app(|app| app.view = ViewMode::Grid);
        let started = tokio::time::Instant::now();
        assert_eq!(files.current_view().await, ViewMode::Unknown);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn deleted_items_no_longer_exist() {
        let (_, files) = files_page(&["Keep", "Drop"]);

        files.delete_item("Drop").await.unwrap();
        assert!(!files.item_exists("Drop").await);
        assert!(files.item_exists("Keep").await);
        assert_eq!(files.item_count().await.unwrap(), 1);
    }

    #[test]
    fn item_locators_match_names_exactly() {
        let loc = FilesLocators::new(&ViewLabels::default());
        assert_ne!(loc.item("Reports").selector(), loc.item("Reports (1)").selector());
        assert!(
            loc.item("Reports")
                .selector()
                .ends_with(r#"internal:has="internal:text=\"Reports\"s""#)
        );
        assert!(loc.view_button(ViewMode::Unknown).is_none());
        assert_eq!(FilesPage::disambiguated_name("Reports", 2), "Reports (2)");
    }

    #[test]
    fn file_names_come_from_the_last_path_component() {
        let names = file_names(&[PathBuf::from("/tmp/x/a.txt"), PathBuf::from("b.bin")]).unwrap();
        assert_eq!(names, vec!["a.txt", "b.bin"]);
        assert!(file_names(&[PathBuf::from("/")]).is_err());
    }
}

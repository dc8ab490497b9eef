/// Sidebar state machine
///
/// `SidebarState::apply` turns a user action into a new state plus the side
/// effects the UI must run (saving, downloading). The state itself never
/// talks to storage.

use crate::client::LinkStore;
use crate::error::SidebarError;
use crate::links::{add_link, move_link, remove_link};
use crate::retry::RetryPolicy;
use crate::transfer::{ExportDocument, import_links};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenu {
    pub url: String,
    pub x: i32,
    pub y: i32,
}

/// Dismissible message shown above the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Loaded { links: Vec<String>, collapsed: bool },
    LoadFailed(String),
    ToggleVisibility,
    OpenAddModal,
    CloseAddModal,
    EditAddInput(String),
    SubmitAdd,
    OpenSettings,
    CloseSettings,
    OpenContextMenu { url: String, x: i32, y: i32 },
    CloseContextMenu,
    RequestDelete,
    CancelDelete,
    ConfirmDelete,
    DragStart(usize),
    DragEnd,
    Drop(usize),
    Export { date: String },
    Import(String),
    RejectFiles(SidebarError),
    SaveFailed(String),
    DismissBanner,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SaveLinks(Vec<String>),
    SaveVisibility(bool),
    Download { file_name: String, contents: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SidebarState,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SidebarState {
    pub phase: Phase,
    pub links: Vec<String>,
    pub collapsed: bool,
    pub add_modal_open: bool,
    pub add_input: String,
    pub add_error: Option<String>,
    pub settings_open: bool,
    pub context_menu: Option<ContextMenu>,
    pub pending_delete: Option<String>,
    pub drag_source: Option<usize>,
    pub banner: Option<Banner>,
}

impl Default for SidebarState {
    fn default() -> Self {
        SidebarState::new()
    }
}

impl SidebarState {
    pub fn new() -> Self {
        SidebarState {
            phase: Phase::Loading,
            links: Vec::new(),
            collapsed: false,
            add_modal_open: false,
            add_input: String::new(),
            add_error: None,
            settings_open: false,
            context_menu: None,
            pending_delete: None,
            drag_source: None,
            banner: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn apply(&self, command: Command) -> Transition {
        let mut next = self.clone();
        let mut effects = Vec::new();

        if !self.is_ready() && command.waits_for_load() {
            log::debug!("Ignoring {:?} while loading", command);
            return Transition { state: next, effects };
        }

        match command {
            Command::Loaded { links, collapsed } => {
                log::info!("Loaded {} links", links.len());
                next.phase = Phase::Ready;
                next.links = links;
                next.collapsed = collapsed;
            }
            Command::LoadFailed(reason) => {
                log::error!("Giving up loading links: {}", reason);
                next.phase = Phase::Ready;
                next.links = Vec::new();
            }
            Command::ToggleVisibility => {
                next.collapsed = !self.collapsed;
                effects.push(Effect::SaveVisibility(next.collapsed));
            }
            Command::OpenAddModal => {
                next.add_modal_open = true;
                next.add_input.clear();
                next.add_error = None;
            }
            Command::CloseAddModal => {
                next.add_modal_open = false;
                next.add_input.clear();
                next.add_error = None;
            }
            Command::EditAddInput(value) => {
                next.add_input = value;
                next.add_error = None;
            }
            Command::SubmitAdd => match add_link(&self.links, &self.add_input) {
                Ok(links) => {
                    log::debug!("Added {}", self.add_input.trim());
                    next.links = links;
                    next.add_modal_open = false;
                    next.add_input.clear();
                    next.add_error = None;
                    effects.push(Effect::SaveLinks(next.links.clone()));
                }
                Err(e) => {
                    next.add_error = Some(e.to_string());
                }
            },
            Command::OpenSettings => {
                next.settings_open = true;
            }
            Command::CloseSettings => {
                next.settings_open = false;
            }
            Command::OpenContextMenu { url, x, y } => {
                next.context_menu = Some(ContextMenu { url, x, y });
            }
            Command::CloseContextMenu => {
                next.context_menu = None;
            }
            Command::RequestDelete => {
                if let Some(menu) = next.context_menu.take() {
                    next.pending_delete = Some(menu.url);
                }
            }
            Command::CancelDelete => {
                next.pending_delete = None;
            }
            Command::ConfirmDelete => {
                if let Some(url) = next.pending_delete.take() {
                    if let Some(links) = remove_link(&self.links, &url) {
                        log::debug!("Deleted {}", url);
                        next.links = links;
                        effects.push(Effect::SaveLinks(next.links.clone()));
                    }
                }
            }
            Command::DragStart(index) => {
                next.drag_source = (index < self.links.len()).then_some(index);
            }
            Command::DragEnd => {
                next.drag_source = None;
            }
            Command::Drop(to) => {
                if let Some(from) = next.drag_source.take() {
                    if let Some(links) = move_link(&self.links, from, to) {
                        log::debug!("Moved link {} -> {}", from, to);
                        next.links = links;
                        effects.push(Effect::SaveLinks(next.links.clone()));
                    }
                }
            }
            Command::Export { date } => {
                let document = ExportDocument::new(&self.links, &date);
                match document.to_json() {
                    Ok(contents) => effects.push(Effect::Download {
                        file_name: document.file_name(),
                        contents,
                    }),
                    Err(e) => next.banner = Some(Banner::Error(e.to_string())),
                }
            }
            Command::Import(text) => match import_links(&self.links, &text) {
                Ok((links, report)) => {
                    log::info!(
                        "Import: {} added, {} invalid, {} duplicate",
                        report.imported,
                        report.skipped_invalid,
                        report.skipped_duplicate
                    );
                    if report.imported > 0 {
                        next.links = links;
                        effects.push(Effect::SaveLinks(next.links.clone()));
                    }
                    next.banner = Some(Banner::Info(report.summary()));
                }
                Err(e) => {
                    log::warn!("Import rejected: {}", e);
                    next.banner = Some(Banner::Error(e.to_string()));
                }
            },
            Command::RejectFiles(e) => {
                next.banner = Some(Banner::Error(e.to_string()));
            }
            Command::SaveFailed(reason) => {
                log::error!("Failed to persist sidebar: {}", reason);
                next.banner = Some(Banner::Error(format!("Changes could not be saved: {}", reason)));
            }
            Command::DismissBanner => {
                next.banner = None;
            }
        }

        Transition { state: next, effects }
    }
}

impl Command {
    /// Commands that touch loaded state and wait for the initial load
    ///
    /// The visibility toggle is included: `Loaded` carries the stored flag,
    /// so an earlier toggle would be overwritten while its save still lands.
    fn waits_for_load(&self) -> bool {
        matches!(
            self,
            Command::ToggleVisibility
                | Command::SubmitAdd
                | Command::RequestDelete
                | Command::ConfirmDelete
                | Command::DragStart(_)
                | Command::Drop(_)
                | Command::Export { .. }
                | Command::Import(_)
        )
    }
}

/// Load the stored sidebar, retrying the link list with backoff
///
/// Always resolves to a command: `Loaded` on success, `LoadFailed` once the
/// retry budget is spent. A failing visibility read falls back to visible.
pub async fn load_sidebar<S, Sleep, SleepFut>(store: &S, policy: &RetryPolicy, sleep: Sleep) -> Command
where
    S: LinkStore,
    Sleep: FnMut(u32) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    let links = match policy.run(|_| store.load_links(), sleep).await {
        Ok(links) => links,
        Err(e) => return Command::LoadFailed(e.to_string()),
    };

    let collapsed = store.load_visibility().await.unwrap_or_else(|e| {
        log::warn!("Failed to load sidebar visibility: {}", e);
        false
    });

    Command::Loaded { links, collapsed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    fn links(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    fn ready(urls: &[&str]) -> SidebarState {
        SidebarState::new()
            .apply(Command::Loaded {
                links: links(urls),
                collapsed: false,
            })
            .state
    }

    fn run(state: &SidebarState, commands: Vec<Command>) -> (SidebarState, Vec<Effect>) {
        commands.into_iter().fold((state.clone(), Vec::new()), |(state, mut effects), command| {
            let transition = state.apply(command);
            effects.extend(transition.effects);
            (transition.state, effects)
        })
    }

    /// Store with a scripted number of failing link loads
    struct FlakyStore {
        failures_left: Cell<u32>,
        load_calls: Cell<u32>,
        saved: RefCell<Vec<Vec<String>>>,
        visibility_fails: bool,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            FlakyStore {
                failures_left: Cell::new(failures),
                load_calls: Cell::new(0),
                saved: RefCell::new(Vec::new()),
                visibility_fails: false,
            }
        }
    }

    impl LinkStore for FlakyStore {
        async fn load_links(&self) -> Result<Vec<String>, SidebarError> {
            self.load_calls.set(self.load_calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(SidebarError::Storage("backend offline".to_string()));
            }
            Ok(vec!["https://a.com".to_string()])
        }

        async fn save_links(&self, links: &[String]) -> Result<(), SidebarError> {
            self.saved.borrow_mut().push(links.to_vec());
            Ok(())
        }

        async fn load_visibility(&self) -> Result<bool, SidebarError> {
            if self.visibility_fails {
                Err(SidebarError::Storage("backend offline".to_string()))
            } else {
                Ok(true)
            }
        }

        async fn save_visibility(&self, _hidden: bool) -> Result<(), SidebarError> {
            Ok(())
        }
    }

    #[test]
    fn test_starts_loading() {
        let state = SidebarState::new();
        assert_eq!(state.phase, Phase::Loading);
        assert!(state.links.is_empty());
    }

    #[test]
    fn test_loaded_enters_ready() {
        let state = ready(&["https://a.com"]);
        assert!(state.is_ready());
        assert_eq!(state.links, links(&["https://a.com"]));
    }

    #[test]
    fn test_ignores_list_commands_while_loading() {
        let state = SidebarState {
            add_input: "https://a.com".to_string(),
            ..SidebarState::new()
        };

        let transition = state.apply(Command::SubmitAdd);

        assert!(transition.effects.is_empty());
        assert!(transition.state.links.is_empty());
    }

    #[test]
    fn test_add_appends_and_saves() {
        let state = ready(&["https://a.com"]);

        let (state, effects) = run(
            &state,
            vec![
                Command::OpenAddModal,
                Command::EditAddInput("https://b.com".to_string()),
                Command::SubmitAdd,
            ],
        );

        assert_eq!(state.links, links(&["https://a.com", "https://b.com"]));
        assert!(!state.add_modal_open);
        assert_eq!(effects, vec![Effect::SaveLinks(links(&["https://a.com", "https://b.com"]))]);
    }

    #[test]
    fn test_add_duplicate_shows_inline_error() {
        let state = ready(&["https://a.com"]);

        let (state, effects) = run(
            &state,
            vec![
                Command::OpenAddModal,
                Command::EditAddInput("https://a.com".to_string()),
                Command::SubmitAdd,
            ],
        );

        assert_eq!(state.links, links(&["https://a.com"]));
        assert!(state.add_modal_open);
        assert_eq!(state.add_error, Some(SidebarError::Duplicate.to_string()));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_add_invalid_then_edit_clears_error() {
        let state = ready(&[]);

        let (state, effects) = run(
            &state,
            vec![
                Command::OpenAddModal,
                Command::EditAddInput("not a url".to_string()),
                Command::SubmitAdd,
            ],
        );
        assert!(state.add_error.is_some());
        assert!(effects.is_empty());

        let state = state.apply(Command::EditAddInput("https://".to_string())).state;
        assert_eq!(state.add_error, None);
    }

    #[test]
    fn test_delete_flow() {
        let state = ready(&["https://a.com", "https://b.com"]);

        let (state, effects) = run(
            &state,
            vec![
                Command::OpenContextMenu {
                    url: "https://a.com".to_string(),
                    x: 10,
                    y: 20,
                },
                Command::RequestDelete,
            ],
        );
        assert_eq!(state.context_menu, None);
        assert_eq!(state.pending_delete, Some("https://a.com".to_string()));
        assert!(effects.is_empty());

        let transition = state.apply(Command::ConfirmDelete);
        assert_eq!(transition.state.links, links(&["https://b.com"]));
        assert_eq!(transition.state.pending_delete, None);
        assert_eq!(transition.effects, vec![Effect::SaveLinks(links(&["https://b.com"]))]);
    }

    #[test]
    fn test_delete_cancel_leaves_list() {
        let state = ready(&["https://a.com"]);
        let menu = Command::OpenContextMenu {
            url: "https://a.com".to_string(),
            x: 0,
            y: 0,
        };

        let (cancelled, effects) = run(
            &state,
            vec![menu.clone(), Command::RequestDelete, Command::CancelDelete, Command::ConfirmDelete],
        );
        assert_eq!(cancelled.links, state.links);
        assert!(effects.is_empty());

        let (closed, effects) = run(&state, vec![menu, Command::CloseContextMenu, Command::RequestDelete]);
        assert_eq!(closed.pending_delete, None);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_reorder_scenario() {
        let state = ready(&["https://a.com", "https://b.com"]);

        let (state, effects) = run(&state, vec![Command::DragStart(0), Command::Drop(1)]);

        assert_eq!(state.links, links(&["https://b.com", "https://a.com"]));
        assert_eq!(state.drag_source, None);
        assert_eq!(effects, vec![Effect::SaveLinks(links(&["https://b.com", "https://a.com"]))]);
    }

    #[test]
    fn test_reorder_onto_self_is_noop() {
        let state = ready(&["https://a.com", "https://b.com"]);

        let (next, effects) = run(&state, vec![Command::DragStart(1), Command::Drop(1)]);

        assert_eq!(next.links, state.links);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_drop_without_drag_is_noop() {
        let state = ready(&["https://a.com", "https://b.com"]);

        let (next, effects) = run(&state, vec![Command::DragStart(0), Command::DragEnd, Command::Drop(1)]);

        assert_eq!(next.links, state.links);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_export_is_pure_read() {
        let state = ready(&["https://a.com"]);

        let transition = state.apply(Command::Export {
            date: "2024-10-28T10:30:00.000Z".to_string(),
        });

        assert_eq!(transition.state, state);
        match &transition.effects[..] {
            [Effect::Download { file_name, contents }] => {
                assert_eq!(file_name, "sidebar-links-2024-10-28.json");
                assert!(contents.contains("\"exportDate\": \"2024-10-28T10:30:00.000Z\""));
            }
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let source = ready(&["https://b.com", "https://a.com"]);
        let exported = source.apply(Command::Export {
            date: "2024-10-28T10:30:00.000Z".to_string(),
        });
        let contents = match &exported.effects[0] {
            Effect::Download { contents, .. } => contents.clone(),
            other => panic!("unexpected effect: {:?}", other),
        };

        let imported = ready(&[]).apply(Command::Import(contents));

        assert_eq!(imported.state.links, source.links);
        assert_eq!(imported.effects, vec![Effect::SaveLinks(source.links.clone())]);
    }

    #[test]
    fn test_import_scenario_no_additions() {
        let state = ready(&["https://a.com"]);

        let transition = state.apply(Command::Import(
            r#"{"urls": ["https://a.com", "not-a-url", "https://a.com"]}"#.to_string(),
        ));

        assert_eq!(transition.state.links, links(&["https://a.com"]));
        assert!(transition.effects.is_empty());
        assert_eq!(
            transition.state.banner,
            Some(Banner::Info("No new links to import (1 invalid, 1 already saved)".to_string()))
        );
    }

    #[test]
    fn test_import_format_error_banner() {
        let state = ready(&["https://a.com"]);

        let transition = state.apply(Command::Import("{\"links\": []}".to_string()));

        assert_eq!(transition.state.links, state.links);
        assert!(matches!(transition.state.banner, Some(Banner::Error(_))));

        let dismissed = transition.state.apply(Command::DismissBanner);
        assert_eq!(dismissed.state.banner, None);
    }

    #[test]
    fn test_rejected_files_show_banner() {
        let state = ready(&[]);

        let transition = state.apply(Command::RejectFiles(SidebarError::Format(
            "Please drop a single file to import".to_string(),
        )));

        assert_eq!(
            transition.state.banner,
            Some(Banner::Error("Please drop a single file to import".to_string()))
        );
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn test_toggle_visibility_keeps_links() {
        let state = ready(&["https://a.com"]);

        let transition = state.apply(Command::ToggleVisibility);

        assert!(transition.state.collapsed);
        assert_eq!(transition.state.links, state.links);
        assert_eq!(transition.effects, vec![Effect::SaveVisibility(true)]);
    }

    #[test]
    fn test_toggle_waits_for_load() {
        let loading = SidebarState::new();

        let early = loading.apply(Command::ToggleVisibility);
        assert!(early.effects.is_empty());
        assert!(!early.state.collapsed);

        let loaded = early.state.apply(Command::Loaded {
            links: links(&["https://a.com"]),
            collapsed: true,
        });
        assert!(loaded.state.collapsed);

        let shown = loaded.state.apply(Command::ToggleVisibility);
        assert!(!shown.state.collapsed);
        assert_eq!(shown.effects, vec![Effect::SaveVisibility(false)]);
    }

    #[test]
    fn test_overlays_are_independent() {
        let state = ready(&["https://a.com"]);

        let (state, _) = run(
            &state,
            vec![
                Command::OpenSettings,
                Command::OpenAddModal,
                Command::OpenContextMenu {
                    url: "https://a.com".to_string(),
                    x: 1,
                    y: 2,
                },
            ],
        );

        assert!(state.is_ready());
        assert!(state.settings_open);
        assert!(state.add_modal_open);
        assert!(state.context_menu.is_some());
    }

    #[test]
    fn test_save_failure_keeps_working_list() {
        let state = ready(&["https://a.com"]);

        let transition = state.apply(Command::SaveFailed("quota".to_string()));

        assert_eq!(transition.state.links, state.links);
        assert!(matches!(transition.state.banner, Some(Banner::Error(_))));
    }

    #[test]
    fn test_load_sidebar_succeeds() {
        let store = FlakyStore::new(0);

        let command = block_on(load_sidebar(&store, &RetryPolicy::default(), |_| async {}));

        assert_eq!(
            command,
            Command::Loaded {
                links: links(&["https://a.com"]),
                collapsed: true,
            }
        );
        assert_eq!(store.load_calls.get(), 1);
        assert!(store.saved.borrow().is_empty());
    }

    #[test]
    fn test_load_sidebar_retries_with_backoff() {
        let store = FlakyStore::new(2);
        let delays = RefCell::new(Vec::new());

        let command = block_on(load_sidebar(&store, &RetryPolicy::default(), |ms| {
            delays.borrow_mut().push(ms);
            async {}
        }));

        assert!(matches!(command, Command::Loaded { .. }));
        assert_eq!(store.load_calls.get(), 3);
        assert_eq!(*delays.borrow(), vec![500, 750]);
    }

    #[test]
    fn test_three_failed_loads_end_ready_and_empty() {
        let store = FlakyStore::new(3);

        let command = block_on(load_sidebar(&store, &RetryPolicy::default(), |_| async {}));
        assert!(matches!(command, Command::LoadFailed(_)));
        assert_eq!(store.load_calls.get(), 3);

        let state = SidebarState::new().apply(command).state;
        assert_eq!(state.phase, Phase::Ready);
        assert!(state.links.is_empty());

        // Still usable afterwards
        let (state, effects) = run(
            &state,
            vec![
                Command::EditAddInput("https://new.com".to_string()),
                Command::SubmitAdd,
            ],
        );
        assert_eq!(state.links, links(&["https://new.com"]));
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_visibility_failure_defaults_to_visible() {
        let store = FlakyStore {
            visibility_fails: true,
            ..FlakyStore::new(0)
        };

        let command = block_on(load_sidebar(&store, &RetryPolicy::default(), |_| async {}));

        assert_eq!(
            command,
            Command::Loaded {
                links: links(&["https://a.com"]),
                collapsed: false,
            }
        );
    }
}

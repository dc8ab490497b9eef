/// Sidebar panel injected into every page

use crate::client::{LinkStore, SidebarStore};
use crate::config::SidebarConfig;
use crate::controller::{Banner, Command, Effect, SidebarState, load_sidebar};
use crate::error::SidebarError;
use crate::favicon::FaviconCache;
use crate::retry::sleep_ms;
use crate::transfer::{FileMeta, check_import_files};
use crate::ui::components::{ConfirmDialog, ContextMenuView, Favicon, Modal};
use patternfly_yew::prelude::*;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{DragEvent, File, FileList, HtmlInputElement};
use yew::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/sidebar.js")]
extern "C" {
    fn downloadFile(contents: &str, file_name: &str);
}

const PANEL_WIDTH_PX: u32 = 56;

/// Reducer state: the controller state plus effects waiting to run
struct SidebarModel {
    state: SidebarState,
    generation: u64,
    outbox: Rc<RefCell<VecDeque<Effect>>>,
}

impl Default for SidebarModel {
    fn default() -> Self {
        SidebarModel {
            state: SidebarState::new(),
            generation: 0,
            outbox: Rc::new(RefCell::new(VecDeque::new())),
        }
    }
}

impl Reducible for SidebarModel {
    type Action = Command;

    fn reduce(self: Rc<Self>, command: Command) -> Rc<Self> {
        let transition = self.state.apply(command);
        self.outbox.borrow_mut().extend(transition.effects);

        Rc::new(SidebarModel {
            state: transition.state,
            generation: self.generation + 1,
            outbox: self.outbox.clone(),
        })
    }
}

#[derive(Properties, PartialEq)]
pub struct SidebarProps {
    pub store: SidebarStore,
    pub config: SidebarConfig,
}

#[function_component(Sidebar)]
pub fn sidebar(props: &SidebarProps) -> Html {
    let model = use_reducer(SidebarModel::default);
    let favicons = use_mut_ref(|| FaviconCache::new(&props.config.favicon_service, props.config.favicon_size));
    let file_drag_active = use_state(|| false);

    // Load links on mount
    {
        let dispatcher = model.dispatcher();
        let store = props.store.clone();
        let policy = props.config.retry;

        use_effect_with((), move |_| {
            spawn_local(async move {
                let command = load_sidebar(&store, &policy, sleep_ms).await;
                dispatcher.dispatch(command);
            });
            || ()
        });
    }

    // Run effects queued by accepted transitions, in issue order
    {
        let outbox = model.outbox.clone();
        let dispatcher = model.dispatcher();
        let store = props.store.clone();

        use_effect_with(model.generation, move |_| {
            let pending: Vec<Effect> = outbox.borrow_mut().drain(..).collect();
            for effect in pending {
                run_effect(effect, store.clone(), dispatcher.clone());
            }
            || ()
        });
    }

    // Shift the page so the panel does not cover it, and give the host page
    // its own margin back once the panel goes away
    let host_margin = use_memo((), |_| read_page_margin());
    {
        let host_margin = host_margin.clone();
        use_effect_with((), move |_| move || write_page_margin(&host_margin));
    }
    use_effect_with(model.state.collapsed, move |collapsed| {
        write_page_margin(&page_margin(*collapsed, &host_margin));
        || ()
    });

    let state = &model.state;
    let send = {
        let dispatcher = model.dispatcher();
        move |command: Command| {
            let dispatcher = dispatcher.clone();
            Callback::from(move |_: MouseEvent| dispatcher.dispatch(command.clone()))
        }
    };
    // Same, for component callbacks that carry no event
    let on = {
        let dispatcher = model.dispatcher();
        move |command: Command| {
            let dispatcher = dispatcher.clone();
            Callback::from(move |_: ()| dispatcher.dispatch(command.clone()))
        }
    };

    let on_add_input = {
        let dispatcher = model.dispatcher();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                dispatcher.dispatch(Command::EditAddInput(input.value()));
            }
        })
    };

    let on_add_keydown = {
        let dispatcher = model.dispatcher();
        Callback::from(move |e: KeyboardEvent| match e.key().as_str() {
            "Enter" => dispatcher.dispatch(Command::SubmitAdd),
            "Escape" => dispatcher.dispatch(Command::CloseAddModal),
            _ => {}
        })
    };

    let on_export = {
        let dispatcher = model.dispatcher();
        Callback::from(move |_: MouseEvent| {
            let date: String = js_sys::Date::new_0().to_iso_string().into();
            dispatcher.dispatch(Command::Export { date });
        })
    };

    let on_file_picked = {
        let dispatcher = model.dispatcher();
        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                import_files(input.files(), dispatcher.clone());
                input.set_value("");
            }
        })
    };

    let on_panel_dragover = {
        let file_drag_active = file_drag_active.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            let files = carries_files(&e);
            if files != *file_drag_active {
                file_drag_active.set(files);
            }
        })
    };

    let on_panel_dragleave = {
        let file_drag_active = file_drag_active.clone();
        Callback::from(move |_: DragEvent| file_drag_active.set(false))
    };

    let on_panel_drop = {
        let dispatcher = model.dispatcher();
        let file_drag_active = file_drag_active.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            file_drag_active.set(false);
            match e.data_transfer().and_then(|dt| dt.files()) {
                Some(files) if files.length() > 0 => import_files(Some(files), dispatcher.clone()),
                _ => dispatcher.dispatch(Command::DragEnd),
            }
        })
    };

    let link_items = state.links.iter().enumerate().map(|(index, url)| {
        let icon = favicons.borrow_mut().resolve(url);
        let dispatcher = model.dispatcher();

        let ondragstart = {
            let dispatcher = dispatcher.clone();
            let url = url.clone();
            Callback::from(move |e: DragEvent| {
                // Firefox only starts a drag when data is attached
                if let Some(dt) = e.data_transfer() {
                    let _ = dt.set_data("text/plain", &url);
                }
                dispatcher.dispatch(Command::DragStart(index));
            })
        };
        let ondragover = Callback::from(|e: DragEvent| e.prevent_default());
        let ondrop = {
            let dispatcher = dispatcher.clone();
            Callback::from(move |e: DragEvent| {
                // Files dropped on an entry bubble up to the panel import
                if carries_files(&e) {
                    return;
                }
                e.prevent_default();
                e.stop_propagation();
                dispatcher.dispatch(Command::Drop(index));
            })
        };
        let ondragend = {
            let dispatcher = dispatcher.clone();
            Callback::from(move |_: DragEvent| dispatcher.dispatch(Command::DragEnd))
        };
        let oncontextmenu = {
            let dispatcher = dispatcher.clone();
            let url = url.clone();
            Callback::from(move |e: MouseEvent| {
                e.prevent_default();
                dispatcher.dispatch(Command::OpenContextMenu {
                    url: url.clone(),
                    x: e.client_x(),
                    y: e.client_y(),
                });
            })
        };
        let class = if state.drag_source == Some(index) {
            "sidebar-link dragging"
        } else {
            "sidebar-link"
        };

        html! {
            <li key={url.clone()} {class} draggable="true"
                {ondragstart} {ondragover} {ondrop} {ondragend} {oncontextmenu}
            >
                <a href={url.clone()} title={url.clone()} target="_blank" rel="noopener noreferrer">
                    <Favicon src={icon} />
                </a>
            </li>
        }
    });

    let panel_class = classes!(
        "sidebar-panel",
        state.collapsed.then_some("collapsed"),
        (*file_drag_active).then_some("file-drag"),
    );

    html! {
        <div class={panel_class}
            ondragover={on_panel_dragover}
            ondragleave={on_panel_dragleave}
            ondrop={on_panel_drop}
        >
            <button class="sidebar-toggle" onclick={send(Command::ToggleVisibility)}
                disabled={!state.is_ready()}
                title={if state.collapsed { "Show sidebar" } else { "Hide sidebar" }}
            >
                {if state.collapsed { "◀" } else { "▶" }}
            </button>

            if !state.collapsed {
                if !state.is_ready() {
                    <div class="loading-text-center">
                        <Spinner />
                    </div>
                } else {
                    <ul class="sidebar-links">
                        {for link_items}
                    </ul>

                    <div class="sidebar-actions">
                        <Button onclick={send(Command::OpenAddModal)} variant={ButtonVariant::Plain}>
                            {"➕"}
                        </Button>
                        <Button onclick={send(Command::OpenSettings)} variant={ButtonVariant::Plain}>
                            {"⚙️"}
                        </Button>
                    </div>
                }
            }

            if let Some(banner) = &state.banner {
                <div class="sidebar-banner">
                    {match banner {
                        Banner::Info(message) => html! {
                            <Alert r#type={AlertType::Info} title={message.clone()} inline={true}>
                                <Button onclick={send(Command::DismissBanner)} variant={ButtonVariant::Link}>
                                    {"Dismiss"}
                                </Button>
                            </Alert>
                        },
                        Banner::Error(message) => html! {
                            <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                                <p class="message-paragraph">{message.clone()}</p>
                                <Button onclick={send(Command::DismissBanner)} variant={ButtonVariant::Link}>
                                    {"Dismiss"}
                                </Button>
                            </Alert>
                        },
                    }}
                </div>
            }

            if state.add_modal_open {
                <Modal title="Add link" on_close={on(Command::CloseAddModal)}>
                    <input
                        type="url"
                        class="sidebar-input"
                        placeholder="https://example.com"
                        value={state.add_input.clone()}
                        oninput={on_add_input}
                        onkeydown={on_add_keydown}
                    />
                    if let Some(error) = &state.add_error {
                        <p class="sidebar-inline-error">{error.clone()}</p>
                    }
                    <div class="sidebar-modal-actions">
                        <Button onclick={send(Command::CloseAddModal)} variant={ButtonVariant::Secondary}>
                            {"Cancel"}
                        </Button>
                        <Button onclick={send(Command::SubmitAdd)}>
                            {"Add"}
                        </Button>
                    </div>
                </Modal>
            }

            if state.settings_open {
                <Modal title="Settings" on_close={on(Command::CloseSettings)}>
                    <div class="flex-column-gap">
                        <Button onclick={on_export} variant={ButtonVariant::Secondary} block={true}>
                            {"📥 Export links"}
                        </Button>
                        <label class="sidebar-file-label">
                            {"📤 Import links"}
                            <input type="file" accept=".json,application/json" onchange={on_file_picked} />
                        </label>
                        <p class="footer-popup">
                            {format!("{} links saved", state.links.len())}
                        </p>
                    </div>
                </Modal>
            }

            if let Some(menu) = &state.context_menu {
                <ContextMenuView
                    x={menu.x}
                    y={menu.y}
                    on_delete={on(Command::RequestDelete)}
                    on_close={on(Command::CloseContextMenu)}
                />
            }

            if let Some(url) = &state.pending_delete {
                <ConfirmDialog
                    message={format!("Remove {} from the sidebar?", url)}
                    on_confirm={on(Command::ConfirmDelete)}
                    on_cancel={on(Command::CancelDelete)}
                />
            }
        </div>
    }
}

// Helper functions

fn run_effect(effect: Effect, store: SidebarStore, dispatcher: UseReducerDispatcher<SidebarModel>) {
    match effect {
        Effect::SaveLinks(links) => spawn_local(async move {
            if let Err(e) = store.save_links(&links).await {
                dispatcher.dispatch(Command::SaveFailed(e.to_string()));
            }
        }),
        Effect::SaveVisibility(hidden) => spawn_local(async move {
            if let Err(e) = store.save_visibility(hidden).await {
                dispatcher.dispatch(Command::SaveFailed(e.to_string()));
            }
        }),
        Effect::Download { file_name, contents } => downloadFile(&contents, &file_name),
    }
}

/// Validate the selected files, then read and import the single JSON file
fn import_files(files: Option<FileList>, dispatcher: UseReducerDispatcher<SidebarModel>) {
    let files: Vec<File> = match files {
        Some(list) => (0..list.length()).filter_map(|i| list.get(i)).collect(),
        None => return,
    };

    let metas: Vec<FileMeta> = files
        .iter()
        .map(|file| FileMeta {
            name: file.name(),
            mime_type: file.type_(),
        })
        .collect();

    match check_import_files(&metas) {
        Ok(Some(_)) => {
            let file = files[0].clone();
            spawn_local(async move {
                let command = match JsFuture::from(file.text()).await {
                    Ok(text) => match text.as_string() {
                        Some(text) => Command::Import(text),
                        None => Command::RejectFiles(SidebarError::Format("Import file is empty".to_string())),
                    },
                    Err(e) => Command::RejectFiles(SidebarError::Format(format!(
                        "Failed to read {}: {:?}",
                        file.name(),
                        e
                    ))),
                };
                dispatcher.dispatch(command);
            });
        }
        Ok(None) => {}
        Err(e) => dispatcher.dispatch(Command::RejectFiles(e)),
    }
}

fn carries_files(e: &DragEvent) -> bool {
    e.data_transfer()
        .map(|dt| dt.types().includes(&JsValue::from_str("Files"), 0))
        .unwrap_or(false)
}

fn page_body() -> Option<web_sys::HtmlElement> {
    web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.body())
}

/// Inline `margin-right` the host page had before the panel was mounted
fn read_page_margin() -> String {
    page_body()
        .and_then(|body| body.style().get_property_value("margin-right").ok())
        .unwrap_or_default()
}

/// Margin the page needs for the panel's current visibility
fn page_margin(collapsed: bool, host_margin: &str) -> String {
    if collapsed {
        host_margin.to_string()
    } else {
        format!("{}px", PANEL_WIDTH_PX)
    }
}

fn write_page_margin(value: &str) {
    let Some(body) = page_body() else {
        return;
    };

    let style = body.style();
    let result = if value.is_empty() {
        style.remove_property("margin-right").map(|_| ())
    } else {
        style.set_property("margin-right", value)
    };
    if let Err(e) = result {
        log::warn!("Failed to set page margin: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_margin_makes_room_when_shown() {
        assert_eq!(page_margin(false, ""), "56px");
        assert_eq!(page_margin(false, "12px"), "56px");
    }

    #[test]
    fn test_page_margin_restores_host_value_when_collapsed() {
        assert_eq!(page_margin(true, "12px"), "12px");
        assert_eq!(page_margin(true, ""), "");
    }
}

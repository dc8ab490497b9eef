/// Reusable UI components

use patternfly_yew::prelude::*;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct FaviconProps {
    /// Icon-service URL; nothing is rendered when absent
    pub src: Option<String>,
}

/// Site icon that disappears when the image fails to load
#[function_component(Favicon)]
pub fn favicon(props: &FaviconProps) -> Html {
    let broken = use_state(|| false);

    {
        let broken = broken.clone();
        use_effect_with(props.src.clone(), move |_| {
            broken.set(false);
            || ()
        });
    }

    let onerror = {
        let broken = broken.clone();
        Callback::from(move |_: Event| broken.set(true))
    };

    match &props.src {
        Some(src) if !*broken => html! {
            <img class="sidebar-favicon" src={src.clone()} alt="" width="20" height="20" {onerror} />
        },
        _ => html! {},
    }
}

#[derive(Properties, PartialEq)]
pub struct ModalProps {
    pub title: AttrValue,
    pub on_close: Callback<()>,
    pub children: Children,
}

#[function_component(Modal)]
pub fn modal(props: &ModalProps) -> Html {
    let on_backdrop = props.on_close.reform(|_: MouseEvent| ());
    let stop = Callback::from(|e: MouseEvent| e.stop_propagation());

    html! {
        <div class="sidebar-modal-backdrop" onclick={on_backdrop}>
            <div class="sidebar-modal" role="dialog" onclick={stop}>
                <div class="sidebar-modal-header">
                    <h2 class="sidebar-modal-title">{props.title.clone()}</h2>
                    <Button variant={ButtonVariant::Plain} onclick={props.on_close.reform(|_: MouseEvent| ())}>
                        {"✗"}
                    </Button>
                </div>
                <div class="sidebar-modal-body">
                    {props.children.clone()}
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ConfirmDialogProps {
    pub message: String,
    pub on_confirm: Callback<()>,
    pub on_cancel: Callback<()>,
}

#[function_component(ConfirmDialog)]
pub fn confirm_dialog(props: &ConfirmDialogProps) -> Html {
    html! {
        <Modal title="Delete link?" on_close={props.on_cancel.clone()}>
            <p class="message-paragraph">{&props.message}</p>
            <div class="sidebar-modal-actions">
                <Button onclick={props.on_cancel.reform(|_: MouseEvent| ())} variant={ButtonVariant::Secondary}>
                    {"Cancel"}
                </Button>
                <Button onclick={props.on_confirm.reform(|_: MouseEvent| ())} variant={ButtonVariant::Danger}>
                    {"Delete"}
                </Button>
            </div>
        </Modal>
    }
}

#[derive(Properties, PartialEq)]
pub struct ContextMenuProps {
    pub x: i32,
    pub y: i32,
    pub on_delete: Callback<()>,
    pub on_close: Callback<()>,
}

/// Right-click menu for a single link
#[function_component(ContextMenuView)]
pub fn context_menu_view(props: &ContextMenuProps) -> Html {
    let on_backdrop = {
        let on_close = props.on_close.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            on_close.emit(());
        })
    };
    let on_delete = {
        let on_delete = props.on_delete.clone();
        Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            on_delete.emit(());
        })
    };

    html! {
        <div class="sidebar-context-backdrop" onclick={on_backdrop.clone()} oncontextmenu={on_backdrop}>
            <ul
                class="sidebar-context-menu"
                style={format!("position: fixed; left: {}px; top: {}px;", props.x, props.y)}
            >
                <li class="sidebar-context-item" onclick={on_delete}>{"🗑️ Delete"}</li>
            </ul>
        </div>
    }
}

//! Toy editor plugins.
//!
//! ```text
//! editor-state ──STATE_READY──────┐
//!                                 ├──▶ editor-view ──COMPLETE──▶ slash
//! node-view ────NODE_VIEW_READY───┘
//! ```

use std::sync::LazyLock;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};
use weft::prelude::*;

// ============================================================================
// Slots and signals
// ============================================================================

#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub editable: bool,
    pub default_value: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            editable: true,
            default_value: String::from("# Hello weft"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditorState {
    pub doc: Vec<String>,
    pub cursor: usize,
}

#[derive(Debug, Clone)]
pub struct EditorView {
    pub root: String,
    pub editable: bool,
    pub lines: Vec<String>,
    pub cursor: usize,
    pub node_views: Vec<String>,
    pub widgets: Vec<String>,
}

pub static EDITOR_OPTIONS: LazyLock<Slot<EditorOptions>> =
    LazyLock::new(|| Slot::new("editor-options", EditorOptions::default()));
pub static EDITOR_STATE: LazyLock<Slot<Option<EditorState>>> =
    LazyLock::new(|| Slot::new("editor-state", None));
pub static NODE_VIEWS: LazyLock<Slot<Vec<String>>> =
    LazyLock::new(|| Slot::new("node-views", Vec::new()));
pub static ROOT: LazyLock<Slot<String>> =
    LazyLock::new(|| Slot::new("root", String::from("#editor")));
pub static EDITOR_VIEW: LazyLock<Slot<Option<EditorView>>> =
    LazyLock::new(|| Slot::new("editor-view", None));
pub static SLASH_ITEMS: LazyLock<Slot<Vec<String>>> =
    LazyLock::new(|| Slot::new("slash-items", Vec::new()));

pub static STATE_READY: LazyLock<SignalKey> = LazyLock::new(|| SignalKey::new("state-ready"));
pub static NODE_VIEW_READY: LazyLock<SignalKey> =
    LazyLock::new(|| SignalKey::new("node-view-ready"));
pub static COMPLETE: LazyLock<SignalKey> = LazyLock::new(|| SignalKey::new("complete"));

// ============================================================================
// Plugins
// ============================================================================

/// The plugins every editor needs.
pub fn preset() -> Vec<Plugin> {
    vec![editor_view(), editor_state(), node_view()]
}

/// Parses the configured default value into a document.
pub fn editor_state() -> Plugin {
    define_plugin("editor-state", |pre| {
        pre.inject(&EDITOR_OPTIONS)
            .inject(&EDITOR_STATE)
            .record(&STATE_READY);
        Ok(Setup::new(|ctx| async move {
            let options = ctx.get(&EDITOR_OPTIONS)?;
            let doc: Vec<String> = options.default_value.lines().map(str::to_owned).collect();
            let cursor = doc.last().map_or(0, String::len);
            debug!(lines = doc.len(), "Document parsed");
            ctx.set(&EDITOR_STATE, Some(EditorState { doc, cursor }))?;
            ctx.done(&STATE_READY);
            Ok(())
        }))
    })
}

/// Registers node renderers.  Slower than the state on purpose, so the view
/// has something to wait for.
pub fn node_view() -> Plugin {
    define_plugin("node-view", |pre| {
        pre.inject(&NODE_VIEWS).record(&NODE_VIEW_READY);
        Ok(Setup::new(|ctx| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            ctx.update(&NODE_VIEWS, |mut views| {
                views.extend(["heading", "paragraph", "code-block"].map(String::from));
                views
            })?;
            ctx.done(&NODE_VIEW_READY);
            Ok(())
        }))
    })
}

/// Builds the view once state and node views exist.
pub fn editor_view() -> Plugin {
    define_plugin("editor-view", |pre| {
        pre.inject(&ROOT).inject(&EDITOR_VIEW).record(&COMPLETE);
        Ok(Setup::new(|ctx| async move {
            ctx.wait_all(&[&*STATE_READY, &*NODE_VIEW_READY]).await;

            let state = ctx
                .get(&EDITOR_STATE)?
                .ok_or("editor state missing after state-ready")?;
            let view = EditorView {
                root: ctx.get(&ROOT)?,
                editable: ctx.get(&EDITOR_OPTIONS)?.editable,
                lines: state.doc,
                cursor: state.cursor,
                node_views: ctx.get(&NODE_VIEWS)?,
                widgets: Vec::new(),
            };
            info!(root = %view.root, editable = view.editable, "Editor view mounted");
            ctx.set(&EDITOR_VIEW, Some(view))?;

            let root = ctx.get(&ROOT)?;
            ctx.on_dispose(move || {
                let root = root.clone();
                async move { info!(root = %root, "Editor view destroyed") }
            })?;

            ctx.done(&COMPLETE);
            Ok(())
        }))
    })
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SlashOptions {
    items: Vec<String>,
}

impl Default for SlashOptions {
    fn default() -> Self {
        Self {
            items: ["heading", "bullet-list", "code-block", "quote"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Slash command menu, attached to the view once it is complete.
pub fn slash() -> Plugin {
    define_plugin("slash", |pre| {
        let options: SlashOptions = pre.config()?;
        pre.inject_with(&SLASH_ITEMS, options.items);
        Ok(Setup::new(|ctx| async move {
            ctx.wait(&COMPLETE).await;
            let items = ctx.get(&SLASH_ITEMS)?;
            ctx.update(&EDITOR_VIEW, |view| {
                view.map(|mut view| {
                    view.widgets.push(format!("slash({})", items.join(", ")));
                    view
                })
            })?;
            debug!(items = items.len(), "Slash menu attached");
            Ok(())
        }))
    })
}

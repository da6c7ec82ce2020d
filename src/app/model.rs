//! Application model: `App` owns the screens and the collaborators they use.
//!
//! All state transitions happen on the UI thread through `App` methods. The
//! catalog store, search client and share target are handed in at
//! construction and passed down to the components that need them.

use std::fmt::Display;
use std::sync::mpsc::Receiver;

use tracing::{debug, info, warn};

use crate::browser::{Browser, Navigation};
use crate::catalog::{CatalogEvent, CatalogStore, Record, RecordId};
use crate::compose::{ComposeFlow, ComposePhase, DraftField, DraftTarget};
use crate::config::UiSettings;
use crate::detail::{DetailError, DetailView, Overlay, ShareTarget};
use crate::search::SearchClient;

/// The screen currently shown.
#[derive(Debug, Clone)]
pub enum Screen {
    Browser,
    Compose {
        flow: ComposeFlow,
        /// Detail screen to go back to when editing an existing record.
        return_to: Option<RecordId>,
    },
    Detail(DetailView),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Compose { .. } => "compose",
            Self::Detail(_) => "detail",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A one-line message for the status bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// The main application model.
pub struct App {
    store: CatalogStore,
    search: SearchClient,
    share: Box<dyn ShareTarget>,
    catalog_events: Receiver<CatalogEvent>,

    pub browser: Browser,
    pub screen: Screen,
    pub notice: Option<Notice>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        store: CatalogStore,
        search: SearchClient,
        share: Box<dyn ShareTarget>,
        ui: &UiSettings,
    ) -> Self {
        let catalog_events = store.subscribe();
        let mut browser = Browser::new(ui.spin_frames_min, ui.spin_frames_max);
        browser.refresh(&store);

        Self {
            store,
            search,
            share,
            catalog_events,
            browser,
            screen: Screen::Browser,
            notice: None,
            should_quit: false,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    fn inform(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        });
    }

    fn fail(&mut self, context: &str, err: impl Display) {
        warn!(screen = self.screen.name(), "{context}: {err}");
        self.notice = Some(Notice {
            level: NoticeLevel::Error,
            text: format!("{context}: {err}"),
        });
    }

    /// Pull catalog notifications and search outcomes into the model.
    pub fn sync(&mut self) {
        let mut changed = false;
        while let Ok(event) = self.catalog_events.try_recv() {
            debug!(?event, "catalog changed");
            changed = true;
        }
        if changed || self.browser.is_stale(&self.store) {
            self.browser.refresh(&self.store);
        }

        while let Some(event) = self.search.poll() {
            if let Screen::Compose { flow, .. } = &mut self.screen {
                flow.on_search_event(event);
            }
        }

        if let Screen::Detail(view) = &self.screen {
            if let Err(e) = view.view(&self.store) {
                self.screen = Screen::Browser;
                self.fail("record unavailable", e);
            }
        }
    }

    /// Advance frame-driven animations by one frame.
    pub fn tick(&mut self) {
        if !matches!(self.screen, Screen::Browser) {
            return;
        }
        if let Some(Navigation::Detail(id)) = self.browser.tick() {
            debug!(%id, "opening record");
            self.screen = Screen::Detail(DetailView::new(id));
        }
    }

    // Browser

    pub fn browse_next(&mut self) {
        self.browser.next();
    }

    pub fn browse_prev(&mut self) {
        self.browser.prev();
    }

    pub fn open_focused(&mut self) {
        if !self.browser.begin_open() && self.browser.is_empty() {
            self.inform("no records yet, press n to add one");
        }
    }

    pub fn start_compose(&mut self) {
        self.browser.cancel_open();
        self.screen = Screen::Compose {
            flow: ComposeFlow::new(),
            return_to: None,
        };
    }

    // Compose

    fn compose_flow(&mut self) -> Option<&mut ComposeFlow> {
        match &mut self.screen {
            Screen::Compose { flow, .. } => Some(flow),
            _ => None,
        }
    }

    /// Typed text goes to the query box, or to the focused draft field once
    /// a candidate is picked.
    pub fn compose_input(&mut self, c: char) {
        let search = &self.search;
        let Screen::Compose { flow, .. } = &mut self.screen else {
            return;
        };
        if let Some(draft) = flow.draft_mut() {
            draft.push_char(c);
            return;
        }
        if let Err(e) = flow.push_query_char(c, search) {
            self.fail("search", e);
        }
    }

    pub fn compose_backspace(&mut self) {
        let search = &self.search;
        let Screen::Compose { flow, .. } = &mut self.screen else {
            return;
        };
        if let Some(draft) = flow.draft_mut() {
            draft.pop_char();
            return;
        }
        if let Err(e) = flow.pop_query_char(search) {
            self.fail("search", e);
        }
    }

    pub fn compose_clear_query(&mut self) {
        let search = &self.search;
        let Screen::Compose { flow, .. } = &mut self.screen else {
            return;
        };
        if flow.draft().is_none() {
            if let Err(e) = flow.clear_query(search) {
                self.fail("search", e);
            }
        }
    }

    pub fn compose_next(&mut self) {
        if let Some(flow) = self.compose_flow() {
            flow.next_result();
        }
    }

    pub fn compose_prev(&mut self) {
        if let Some(flow) = self.compose_flow() {
            flow.prev_result();
        }
    }

    pub fn compose_next_field(&mut self) {
        if let Some(draft) = self.compose_flow().and_then(|f| f.draft_mut()) {
            draft.focus_next();
        }
    }

    /// Enter: pick the highlighted result, load the typed photo path, or
    /// start a new line in lyrics/story.
    pub fn compose_enter(&mut self) {
        let Some(flow) = self.compose_flow() else {
            return;
        };
        if *flow.phase() == ComposePhase::ResultsShown {
            if let Err(e) = flow.select_current().map(|_| ()) {
                self.fail("select", e);
            }
            return;
        }
        let Some(draft) = flow.draft_mut() else {
            return;
        };
        if draft.focus != DraftField::Photo {
            draft.push_char('\n');
            return;
        }
        match draft.load_photo() {
            Ok(bytes) => self.inform(format!("photo attached ({bytes} bytes)")),
            Err(e) => self.fail("photo", e),
        }
    }

    pub fn compose_clear_photo(&mut self) {
        if let Some(draft) = self.compose_flow().and_then(|f| f.draft_mut()) {
            draft.clear_photo();
        }
    }

    /// Save the draft. New records get browser focus; edits return to the
    /// record's detail screen.
    pub fn compose_commit(&mut self) {
        let store = &self.store;
        let Screen::Compose { flow, return_to } = &mut self.screen else {
            return;
        };
        let return_to = *return_to;
        let record = match flow.commit(store) {
            Ok(record) => record,
            Err(e) => {
                self.fail("save", e);
                return;
            }
        };
        info!(id = %record.id, "record saved");
        self.inform(format!("saved {}", record.title_line()));

        match return_to {
            Some(id) => self.screen = Screen::Detail(DetailView::new(id)),
            None => {
                self.screen = Screen::Browser;
                self.browser.refresh(&self.store);
                self.browser.focus_record(record.id);
            }
        }
    }

    /// Esc: step back one level. A new draft returns to the results; an
    /// edit or the search box leaves the flow and discards the draft.
    pub fn compose_back(&mut self) {
        let Screen::Compose { flow, return_to } = &mut self.screen else {
            return;
        };
        let is_new_draft = flow
            .draft()
            .is_some_and(|d| d.target == DraftTarget::New);
        if is_new_draft && flow.back_to_results().is_ok() {
            return;
        }
        let return_to = *return_to;
        self.search.invalidate();
        self.screen = match return_to {
            Some(id) => Screen::Detail(DetailView::new(id)),
            None => Screen::Browser,
        };
    }

    // Detail

    fn detail_view(&mut self) -> Option<&mut DetailView> {
        match &mut self.screen {
            Screen::Detail(view) => Some(view),
            _ => None,
        }
    }

    /// The record on the detail screen, if it still exists.
    pub fn detail_record(&self) -> Option<Record> {
        match &self.screen {
            Screen::Detail(view) => view.view(&self.store).ok(),
            _ => None,
        }
    }

    pub fn detail_edit(&mut self) {
        let Screen::Detail(view) = &self.screen else {
            return;
        };
        let id = view.id();
        match view.edit(&self.store) {
            Ok(flow) => {
                self.screen = Screen::Compose {
                    flow,
                    return_to: Some(id),
                }
            }
            Err(e) => self.fail("edit", e),
        }
    }

    pub fn detail_request_delete(&mut self) {
        if let Some(view) = self.detail_view() {
            view.request_delete();
        }
    }

    pub fn detail_cancel_delete(&mut self) {
        if let Some(view) = self.detail_view() {
            view.cancel_delete();
        }
    }

    pub fn detail_confirm_delete(&mut self) {
        let store = &self.store;
        let Screen::Detail(view) = &mut self.screen else {
            return;
        };
        match view.confirm_delete(store) {
            Ok(true) => {
                self.screen = Screen::Browser;
                self.browser.refresh(&self.store);
                self.inform("record deleted");
            }
            Ok(false) => {}
            Err(e) => self.fail("delete", e),
        }
    }

    pub fn detail_toggle(&mut self, overlay: Overlay) {
        let Some(record) = self.detail_record() else {
            return;
        };
        let Some(view) = self.detail_view() else {
            return;
        };
        if view.is_confirming_delete() {
            return;
        }
        if !view.toggle_overlay(overlay, &record) && !has(&record, overlay) {
            let what = match overlay {
                Overlay::Photo => "photo",
                Overlay::Story => "story",
            };
            self.inform(format!("no {what} on this record"));
        }
    }

    pub fn detail_export(&mut self) {
        let Screen::Detail(view) = &self.screen else {
            return;
        };
        let result = view
            .view(&self.store)
            .map_err(DetailError::from)
            .and_then(|record| view.export_snapshot(&record, self.share.as_ref()));
        match result {
            Ok(location) => self.inform(format!("exported to {location}")),
            Err(e) => self.fail("export", e),
        }
    }

    /// Esc on the detail screen: close the overlay or the confirmation
    /// first, then go back to the browser.
    pub fn detail_back(&mut self) {
        let Some(view) = self.detail_view() else {
            return;
        };
        if view.overlay().is_some() {
            view.close_overlay();
        } else if view.is_confirming_delete() {
            view.cancel_delete();
        } else {
            self.screen = Screen::Browser;
        }
    }
}

fn has(record: &Record, overlay: Overlay) -> bool {
    match overlay {
        Overlay::Photo => record.photo.is_some(),
        Overlay::Story => record.story.is_some(),
    }
}

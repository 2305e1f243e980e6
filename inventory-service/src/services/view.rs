//! Per-module view state for a dashboard session.
//!
//! A view owns the list of annotated records it last loaded and whether its
//! entry form is open. Fetches run on spawned tasks; once the view is closed
//! no fetch that was still in flight may touch its state.

use crate::models::{AnnotatedRecord, ModuleKind};
use crate::services::inventory::InventoryService;
use crate::services::store::SortOrder;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Commands a parent view sends to a module view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleCommand {
    /// One-shot request to open the add-record form.
    OpenEntryForm,
    CloseEntryForm,
    Refresh,
    SetSortOrder(SortOrder),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub records: Vec<AnnotatedRecord>,
    pub entry_form_open: bool,
    pub loaded: bool,
    pub last_error: Option<String>,
}

pub struct ModuleView {
    module: ModuleKind,
    order: SortOrder,
    service: InventoryService,
    state: Arc<RwLock<ViewSnapshot>>,
    token: CancellationToken,
}

impl ModuleView {
    pub fn new(service: InventoryService, module: ModuleKind) -> Self {
        Self {
            module,
            order: SortOrder::default(),
            service,
            state: Arc::new(RwLock::new(ViewSnapshot::default())),
            token: CancellationToken::new(),
        }
    }

    pub fn module(&self) -> ModuleKind {
        self.module
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.state.read().await.clone()
    }

    /// Apply a command. Commands that fetch return the handle of the
    /// spawned fetch. A closed view ignores every command.
    pub async fn dispatch(&mut self, command: ModuleCommand) -> Option<JoinHandle<()>> {
        if self.is_closed() {
            tracing::debug!(module = %self.module, ?command, "Command ignored by closed view");
            return None;
        }

        match command {
            ModuleCommand::OpenEntryForm => {
                self.state.write().await.entry_form_open = true;
                None
            }
            ModuleCommand::CloseEntryForm => {
                self.state.write().await.entry_form_open = false;
                None
            }
            ModuleCommand::Refresh => Some(self.refresh()),
            ModuleCommand::SetSortOrder(order) => {
                self.order = order;
                Some(self.refresh())
            }
        }
    }

    /// Read and clear the open-form request.
    pub async fn take_open_intent(&self) -> bool {
        std::mem::take(&mut self.state.write().await.entry_form_open)
    }

    /// Load the module's records on a background task.
    pub fn refresh(&self) -> JoinHandle<()> {
        let service = self.service.clone();
        let state = self.state.clone();
        let token = self.token.clone();
        let (module, order) = (self.module, self.order);

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(module = %module, "Fetch abandoned, view closed");
                    return;
                }
                result = service.list_records(module, order) => result,
            };

            let mut state = state.write().await;
            // close() takes the write lock before cancelling.
            if token.is_cancelled() {
                return;
            }
            match result {
                Ok(records) => {
                    state.records = records;
                    state.loaded = true;
                    state.last_error = None;
                }
                Err(e) => {
                    tracing::warn!(module = %module, error = %e, "Failed to load records");
                    state.last_error = Some(e.to_string());
                }
            }
        })
    }

    /// Tear the view down. No fetch writes to the view once this returns.
    pub async fn close(&self) {
        let _guard = self.state.write().await;
        self.token.cancel();
    }
}

impl Drop for ModuleView {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

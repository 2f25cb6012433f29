//! Controller layer: events, reducer-like state transitions and request orchestration.

pub mod events;
pub mod orchestration;
pub mod reducer;

use std::{sync::Arc, time::Duration};

use client_core::RemoteService;
use image::DynamicImage;
use shared::{
    domain::{Category, NewProduct, Product},
    error::ErrorCode,
};
use storage::LocalStore;
use tokio::{runtime::Handle, sync::watch, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    capture::CapturedImage,
    state::{ErrorInfo, Snapshot},
};
use events::{ControllerEvent, OperationKind};
use orchestration::{OrderingPolicy, RequestSequencer, TaskTracker, Ticket};

pub const DEFAULT_MIN_LOADING_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Shortest time the companies spinner stays visible.
    pub min_loading_delay: Duration,
    pub ordering: OrderingPolicy,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            min_loading_delay: DEFAULT_MIN_LOADING_DELAY,
            ordering: OrderingPolicy::default(),
        }
    }
}

struct ControllerInner {
    state_tx: watch::Sender<Snapshot>,
    remote: Arc<dyn RemoteService>,
    store: Arc<dyn LocalStore>,
    sequencer: RequestSequencer,
    options: ControllerOptions,
}

/// State holder behind the add-product screen.
///
/// Methods return immediately; remote calls and image work run on the tokio
/// runtime that was current when the controller was built. Dropping the
/// controller aborts whatever is still in flight.
pub struct ScreenController {
    inner: Arc<ControllerInner>,
    runtime: Handle,
    tasks: TaskTracker,
}

impl ScreenController {
    /// Seeds the snapshot from `store`.
    ///
    /// Must be awaited inside a tokio runtime: the current runtime handle is
    /// captured here and all background work is spawned on it.
    pub async fn new(
        remote: Arc<dyn RemoteService>,
        store: Arc<dyn LocalStore>,
        options: ControllerOptions,
    ) -> Self {
        let categories = load_categories(store.as_ref()).await;
        let (state_tx, _) = watch::channel(Snapshot::initial(categories));
        Self {
            inner: Arc::new(ControllerInner {
                state_tx,
                remote,
                store,
                sequencer: RequestSequencer::new(options.ordering),
                options,
            }),
            runtime: Handle::current(),
            tasks: TaskTracker::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.state_tx.borrow().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.in_flight()
    }

    /// Back to the initial snapshot with categories re-read from the store.
    /// Responses to requests issued before the reset are dropped.
    pub async fn reset(&self) {
        let categories = load_categories(self.inner.store.as_ref()).await;
        let inner = &self.inner;
        inner.state_tx.send_modify(|snapshot| {
            inner.sequencer.invalidate_all();
            let current = std::mem::take(snapshot);
            *snapshot = current.reduce(ControllerEvent::Reset { categories });
        });
        info!("add-product screen reset");
    }

    pub fn set_captured_image(&self, image: Option<DynamicImage>) {
        let Some(frame) = image else {
            debug!("no image captured; snapshot unchanged");
            return;
        };

        let ticket = self.inner.sequencer.issue(OperationKind::CaptureImage);
        let inner = Arc::clone(&self.inner);
        self.tasks.spawn(&self.runtime, async move {
            match tokio::task::spawn_blocking(move || CapturedImage::from_camera_frame(frame)).await
            {
                Ok(captured) => {
                    let (width, height) = captured.dimensions();
                    debug!(width, height, "captured image rotated");
                    inner.complete(&ticket, ControllerEvent::ImageCaptured(captured));
                }
                Err(err) => warn!(error = %err, "image rotation task failed"),
            }
        });
    }

    pub fn submit_new_product(&self, input: NewProduct) {
        let ticket = self.inner.begin(OperationKind::Submit, ControllerEvent::SubmitStarted);

        if input.name.trim().is_empty() {
            warn!(seq = ticket.seq(), "rejecting product without a name");
            let error =
                ErrorInfo::new(ErrorCode::InvalidProductModel).with_context("field", "name");
            self.inner
                .complete(&ticket, ControllerEvent::SubmitFailed(error));
            return;
        }

        info!(seq = ticket.seq(), name = %input.name, "submitting new product");
        let inner = Arc::clone(&self.inner);
        self.tasks.spawn(&self.runtime, async move {
            inner.run_submit(ticket, input).await;
        });
    }

    pub fn load_companies(&self) {
        let ticket = self
            .inner
            .begin(OperationKind::LoadCompanies, ControllerEvent::CompaniesRequested);
        info!(seq = ticket.seq(), "loading companies");
        let inner = Arc::clone(&self.inner);
        self.tasks.spawn(&self.runtime, async move {
            inner.run_load_companies(ticket).await;
        });
    }

    pub fn dismiss_error(&self) {
        self.inner.publish(ControllerEvent::ErrorDismissed);
    }

    /// Aborts every in-flight request. The last published snapshot stays.
    pub fn shutdown(&self) {
        self.tasks.abort_all();
    }
}

impl ControllerInner {
    fn publish(&self, event: ControllerEvent) {
        let name = event.name();
        self.state_tx.send_modify(|snapshot| {
            let current = std::mem::take(snapshot);
            *snapshot = current.reduce(event);
        });
        debug!(event = name, "snapshot published");
    }

    fn begin(&self, kind: OperationKind, event: ControllerEvent) -> Ticket {
        let ticket = self.sequencer.issue(kind);
        self.publish(event);
        ticket
    }

    fn complete(&self, ticket: &Ticket, event: ControllerEvent) -> bool {
        let name = event.name();
        let applied = self.state_tx.send_if_modified(|snapshot| {
            if !self.sequencer.is_current(ticket) {
                return false;
            }
            let current = std::mem::take(snapshot);
            *snapshot = current.reduce(event);
            true
        });
        if applied {
            debug!(event = name, "snapshot published");
        } else {
            debug!(
                event = name,
                operation = ticket.kind().name(),
                seq = ticket.seq(),
                "discarding superseded response"
            );
        }
        applied
    }

    async fn run_submit(&self, ticket: Ticket, input: NewProduct) {
        let event = match self.remote.create_product(&input).await {
            Ok(created) => {
                let product = Product::from(created);
                info!(seq = ticket.seq(), product_id = %product.id, "product created");
                if let Err(err) = self.store.save_product(&product).await {
                    warn!(
                        product_id = %product.id,
                        error = %err,
                        "failed to persist created product"
                    );
                }
                ControllerEvent::ProductCreated(product)
            }
            Err(err) => {
                warn!(
                    seq = ticket.seq(),
                    rejected = err.is_service_rejection(),
                    error = %err,
                    "product creation failed"
                );
                ControllerEvent::SubmitFailed(ErrorInfo::unknown())
            }
        };
        self.complete(&ticket, event);
    }

    async fn run_load_companies(&self, ticket: Ticket) {
        let started = Instant::now();
        let event = match self.remote.list_companies().await {
            Ok(companies) => {
                info!(seq = ticket.seq(), count = companies.len(), "companies loaded");
                ControllerEvent::CompaniesLoaded(companies)
            }
            Err(err) if err.is_service_rejection() => {
                warn!(seq = ticket.seq(), error = %err, "companies request rejected");
                ControllerEvent::CompaniesRejected
            }
            Err(err) => {
                warn!(seq = ticket.seq(), error = %err, "companies request failed");
                ControllerEvent::CompaniesFailed(ErrorInfo::unknown())
            }
        };
        tokio::time::sleep_until(started + self.options.min_loading_delay).await;
        self.complete(&ticket, event);
    }
}

async fn load_categories(store: &dyn LocalStore) -> Vec<Category> {
    match store.load_categories().await {
        Ok(categories) => categories,
        Err(err) => {
            warn!(error = %err, "failed to load categories; starting with none");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

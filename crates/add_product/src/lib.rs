//! Presentation-layer state holder for the add-product screen.
//!
//! [`ScreenController`] owns the current [`Snapshot`], publishes it through a
//! `watch` channel and drives the remote calls behind the form.

pub mod capture;
pub mod controller;
pub mod state;

pub use capture::CapturedImage;
pub use controller::{
    events::{ControllerEvent, OperationKind},
    orchestration::OrderingPolicy,
    ControllerOptions, ScreenController, DEFAULT_MIN_LOADING_DELAY,
};
pub use state::{AddProcess, ErrorInfo, FormData, LifecycleState, Snapshot};

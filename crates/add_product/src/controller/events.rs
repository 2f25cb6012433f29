//! Events reduced into the screen snapshot.

use shared::domain::{Category, Company, Product};

use crate::{capture::CapturedImage, state::ErrorInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Submit,
    LoadCompanies,
    CaptureImage,
}

impl OperationKind {
    pub const COUNT: usize = 3;

    pub(crate) fn index(self) -> usize {
        match self {
            OperationKind::Submit => 0,
            OperationKind::LoadCompanies => 1,
            OperationKind::CaptureImage => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Submit => "submit",
            OperationKind::LoadCompanies => "load_companies",
            OperationKind::CaptureImage => "capture_image",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Reset { categories: Vec<Category> },
    ImageCaptured(CapturedImage),
    SubmitStarted,
    ProductCreated(Product),
    SubmitFailed(ErrorInfo),
    CompaniesRequested,
    CompaniesLoaded(Vec<Company>),
    /// Backend answered with an error list; logged, not shown.
    CompaniesRejected,
    CompaniesFailed(ErrorInfo),
    ErrorDismissed,
}

impl ControllerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerEvent::Reset { .. } => "reset",
            ControllerEvent::ImageCaptured(_) => "image_captured",
            ControllerEvent::SubmitStarted => "submit_started",
            ControllerEvent::ProductCreated(_) => "product_created",
            ControllerEvent::SubmitFailed(_) => "submit_failed",
            ControllerEvent::CompaniesRequested => "companies_requested",
            ControllerEvent::CompaniesLoaded(_) => "companies_loaded",
            ControllerEvent::CompaniesRejected => "companies_rejected",
            ControllerEvent::CompaniesFailed(_) => "companies_failed",
            ControllerEvent::ErrorDismissed => "error_dismissed",
        }
    }
}

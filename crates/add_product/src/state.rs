use std::collections::BTreeMap;

use shared::{
    domain::{Category, Company, Product},
    error::ErrorCode,
};

use crate::capture::CapturedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Start,
    Loading,
    Done,
}

/// Progress of the action the user started on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddProcess {
    #[default]
    LoadInitialData,
    Adding,
    DoneAdding,
}

impl AddProcess {
    pub fn lifecycle(self) -> LifecycleState {
        match self {
            AddProcess::LoadInitialData => LifecycleState::Start,
            AddProcess::Adding => LifecycleState::Loading,
            AddProcess::DoneAdding => LifecycleState::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormData {
    pub categories: Vec<Category>,
    pub captured_image: Option<CapturedImage>,
    pub last_created: Option<Product>,
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub context: BTreeMap<String, String>,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            context: BTreeMap::new(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(ErrorCode::UnknownException)
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Entire observable state of the screen at one point in time.
///
/// Transitions consume the old value and return a new one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub lifecycle: LifecycleState,
    pub process: AddProcess,
    pub data: FormData,
    pub error: Option<ErrorInfo>,
}

impl Snapshot {
    pub fn initial(categories: Vec<Category>) -> Self {
        Self {
            data: FormData {
                categories,
                ..FormData::default()
            },
            ..Self::default()
        }
    }

    pub fn is_busy(&self) -> bool {
        self.process == AddProcess::Adding
    }

    /// Starting a new attempt also clears any pending error.
    pub fn as_adding(self) -> Self {
        self.with_process(AddProcess::Adding).with_error(None)
    }

    pub fn as_done_adding(self) -> Self {
        self.with_process(AddProcess::DoneAdding)
    }

    pub fn with_data(self, data: FormData) -> Self {
        Self { data, ..self }
    }

    pub fn with_error(self, error: Option<ErrorInfo>) -> Self {
        Self { error, ..self }
    }

    fn with_process(self, process: AddProcess) -> Self {
        Self {
            lifecycle: process.lifecycle(),
            process,
            ..self
        }
    }
}

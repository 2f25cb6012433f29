//! Pure snapshot transitions.

use crate::{
    controller::events::ControllerEvent,
    state::{FormData, Snapshot},
};

impl Snapshot {
    pub fn reduce(self, event: ControllerEvent) -> Snapshot {
        match event {
            ControllerEvent::Reset { categories } => Snapshot::initial(categories),
            ControllerEvent::ImageCaptured(image) => Snapshot {
                data: FormData {
                    captured_image: Some(image),
                    ..self.data
                },
                ..self
            },
            ControllerEvent::SubmitStarted | ControllerEvent::CompaniesRequested => {
                self.as_adding()
            }
            ControllerEvent::ProductCreated(product) => Snapshot {
                data: FormData {
                    last_created: Some(product),
                    ..self.data
                },
                ..self
            }
            .as_done_adding(),
            ControllerEvent::CompaniesLoaded(companies) => Snapshot {
                data: FormData {
                    companies,
                    ..self.data
                },
                ..self
            }
            .as_done_adding(),
            ControllerEvent::CompaniesRejected => self.as_done_adding(),
            ControllerEvent::SubmitFailed(error) | ControllerEvent::CompaniesFailed(error) => {
                self.as_done_adding().with_error(Some(error))
            }
            ControllerEvent::ErrorDismissed => self.with_error(None),
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;

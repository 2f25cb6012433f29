//! Terminal rendering of screen snapshots.

use add_product::{AddProcess, ErrorInfo, LifecycleState, Snapshot};
use shared::error::ErrorCode;

/// Resource key the screen shows for each failure kind.
pub fn message_key(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Http422 => "error_code_422",
        ErrorCode::UnknownException => "unknown_exception",
        ErrorCode::ConnectionException => "connection_exception",
        ErrorCode::TimeOutException => "timeout_exception",
        ErrorCode::InvalidProductModel => "invalid_product_model",
    }
}

pub fn message_text(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Http422 => "The server could not process the product data.",
        ErrorCode::UnknownException => "Something went wrong. Please try again.",
        ErrorCode::ConnectionException => "Could not reach the server. Check your connection.",
        ErrorCode::TimeOutException => "The server took too long to answer.",
        ErrorCode::InvalidProductModel => "Some product fields are missing or invalid.",
    }
}

pub fn render_error(error: &ErrorInfo) -> String {
    let mut line = format!("{} [{}]", message_text(error.code), message_key(error.code));
    for (key, value) in &error.context {
        line.push_str(&format!(" {key}={value}"));
    }
    line
}

pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let lifecycle = match snapshot.lifecycle {
        LifecycleState::Start => "start",
        LifecycleState::Loading => "loading",
        LifecycleState::Done => "done",
    };
    let process = match snapshot.process {
        AddProcess::LoadInitialData => "load_initial_data",
        AddProcess::Adding => "adding",
        AddProcess::DoneAdding => "done_adding",
    };

    let mut line = format!(
        "[{lifecycle}/{process}] categories={}",
        snapshot.data.categories.len()
    );
    if let Some((width, height)) = snapshot.data.captured_image.as_ref().map(|i| i.dimensions()) {
        line.push_str(&format!(" image={width}x{height}"));
    }
    if !snapshot.data.companies.is_empty() {
        line.push_str(&format!(" companies={}", snapshot.data.companies.len()));
    }
    if let Some(product) = &snapshot.data.last_created {
        line.push_str(&format!(" last_created={} ({})", product.id, product.name));
    }
    if let Some(error) = &snapshot.error {
        line.push_str(&format!(" error: {}", render_error(error)));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{Category, CategoryId, Product, ProductId};

    #[test]
    fn every_error_code_has_a_distinct_key() {
        let mut keys: Vec<_> = ErrorCode::ALL.iter().map(|c| message_key(*c)).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ErrorCode::ALL.len());
    }

    #[test]
    fn renders_error_context() {
        let error = ErrorInfo::new(ErrorCode::InvalidProductModel).with_context("field", "name");
        assert_eq!(
            render_error(&error),
            "Some product fields are missing or invalid. [invalid_product_model] field=name"
        );
    }

    #[test]
    fn renders_finished_snapshot() {
        let mut snapshot = Snapshot::initial(vec![Category::new("a", "A")]).as_done_adding();
        snapshot.data.last_created = Some(Product {
            id: ProductId::new("p-1"),
            name: "Rice".into(),
            image_logo: None,
            category_id: CategoryId::new("a"),
            brand: String::new(),
            supplier: String::new(),
        });
        assert_eq!(
            render_snapshot(&snapshot),
            "[done/done_adding] categories=1 last_created=p-1 (Rice)"
        );
    }

    #[test]
    fn renders_unknown_error_with_generic_text() {
        let snapshot = Snapshot::initial(Vec::new())
            .as_done_adding()
            .with_error(Some(ErrorInfo::unknown()));
        assert!(render_snapshot(&snapshot)
            .ends_with("error: Something went wrong. Please try again. [unknown_exception]"));
    }
}

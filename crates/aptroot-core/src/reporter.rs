//! Reporter trait for dependency injection
//!
//! This trait allows the pipeline to report progress and failures without
//! being coupled to a specific console format.

pub trait Reporter: Send + Sync {
    /// Indicates a new step has started (e.g. "Updating apt caches").
    fn step(&self, title: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Relay the captured output of an external command verbatim.
    fn output(&self, captured: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn step(&self, title: &str) {
        (**self).step(title);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn output(&self, captured: &str) {
        (**self).output(captured);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn step(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn output(&self, _: &str) {}
}

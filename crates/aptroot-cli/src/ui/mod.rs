//! Console output for staging logs.

pub mod output;
pub mod theme;

pub use output::ConsoleReporter;
pub use theme::ColorScheme;

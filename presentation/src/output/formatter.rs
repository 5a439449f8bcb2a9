//! Output formatter trait

use crate::output::rotation_table::RotationTable;
use dialogos_domain::SessionView;

/// Trait for rendering session views and rotation tables
pub trait OutputFormatter {
    /// Render one participant's view of a session
    fn format_view(&self, view: &SessionView) -> String;

    /// Render a full rotation table
    fn format_rotation(&self, table: &RotationTable) -> String;

    /// Render a section heading between views (empty for machine output)
    fn format_heading(&self, title: &str) -> String;
}

/// Formatter for the given output format.
pub fn formatter_for(format: dialogos_domain::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        dialogos_domain::OutputFormat::Text => Box::new(crate::output::console::ConsoleFormatter),
        dialogos_domain::OutputFormat::Json => Box::new(crate::output::json::JsonFormatter),
    }
}

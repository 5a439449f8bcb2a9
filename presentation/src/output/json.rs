//! JSON output formatter

use crate::output::formatter::OutputFormatter;
use crate::output::rotation_table::RotationTable;
use dialogos_domain::SessionView;
use serde::Serialize;

/// Formats output as one compact JSON document per item
pub struct JsonFormatter;

impl JsonFormatter {
    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_view(&self, view: &SessionView) -> String {
        Self::to_json(view)
    }

    fn format_rotation(&self, table: &RotationTable) -> String {
        Self::to_json(table)
    }

    fn format_heading(&self, _title: &str) -> String {
        String::new()
    }
}

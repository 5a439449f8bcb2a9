pub mod console;
pub mod formatter;
pub mod json;
pub mod rotation_table;

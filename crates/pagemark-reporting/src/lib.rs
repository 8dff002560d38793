pub mod clean;
pub mod workbook;

pub use clean::sanitize_cell;
pub use workbook::{write_report, ReportError};

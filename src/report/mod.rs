pub mod console;
pub mod csv_export;
pub mod report_model;
pub mod xlsx_export;

// Spreadsheet and CSV reading

pub mod csv;
pub mod error;
pub mod table;
pub mod xlsx;

pub use error::IoError;
pub use table::{excel_serial_to_datetime, Cell, RawTable};

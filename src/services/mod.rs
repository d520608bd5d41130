// Service exports
pub mod tables;

pub use tables::{align_tables, load_request, parse_request, write_json, TableError};

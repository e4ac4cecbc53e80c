//! Concrete adapter implementations of the ports.

pub mod csv_data_adapter;
pub mod csv_store_adapter;
pub mod csv_table;
pub mod file_config_adapter;

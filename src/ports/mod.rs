//! Port traits for the scanner's external collaborators.

pub mod config_port;
pub mod data_port;
pub mod report_port;
pub mod universe_port;

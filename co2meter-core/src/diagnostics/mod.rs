//! Bring-up diagnostics

pub mod scan;

pub use scan::{device_name, scan, ScanReport, FIRST_ADDRESS, LAST_ADDRESS};

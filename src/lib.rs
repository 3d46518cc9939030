
pub mod binning;
pub mod conditional;
pub mod metric;

pub mod observations;
pub mod window;

pub mod qc;
pub mod ranking;
pub mod scan;
pub mod windrose;

pub mod error;
pub mod parameters;

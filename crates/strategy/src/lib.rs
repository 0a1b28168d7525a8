pub mod correlator;
pub mod indicators;
pub mod stats;

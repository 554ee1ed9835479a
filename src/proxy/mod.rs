pub mod classifier;
pub mod correlator;
pub mod handler;
pub mod upstream;

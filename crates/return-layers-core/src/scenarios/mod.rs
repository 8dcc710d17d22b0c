pub mod sensitivity;

pub use sensitivity::{sweep_global, SweepOutput};

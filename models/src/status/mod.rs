pub mod delta;
pub mod snapshot;

pub mod snapshot;
pub mod tick;

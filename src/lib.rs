pub mod app;
pub mod bootstrap;
pub mod core;
pub mod native;

pub use bootstrap::{BootstrapConfig, bootstrap, run};

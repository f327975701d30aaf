mod api;
mod bridge;

pub use api::ApiClient;
pub use bridge::{NativeCore, ProbePolicy, spawn_native_bridge};

pub mod client;
pub mod config;
pub mod rows;
pub mod watch;

#[cfg(not(target_arch = "wasm32"))]
pub use client::run_poller;
pub use client::RestStore;
pub use config::RestStoreConfig;
pub use watch::diff_snapshots;

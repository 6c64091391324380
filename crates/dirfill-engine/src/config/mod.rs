pub mod loader;

pub use loader::{FileSettingsStore, SettingsLoader, StoreError};

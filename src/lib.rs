pub mod cli;
pub mod config;
pub mod model;
pub mod night;
pub mod seed;
pub mod storage;

pub use config::{AppConfig, ConfigLoader, ConfigPaths, Locale};
pub use model::{Quality, SleepDraft, SleepPatch, SleepRecord, SleepType};
pub use storage::{SleepStore, StoreHandle};

//! Configuration for trail: on-disk locations, the per-user JSON config
//! (active session pointer and token) and the optional TOML settings file.

pub mod atomic;
pub mod paths;
pub mod settings;
pub mod user;

pub use atomic::atomic_write;
pub use settings::{AiSettings, DetectionSettings, RemoteSettings, Settings, debug_enabled};
pub use user::UserConfig;

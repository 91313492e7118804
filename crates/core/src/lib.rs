pub mod config;
pub mod config_loader;
pub mod notification;

pub use config::{AppConfig, Network, NotificationConfig, SimulatorConfig, WalletConfig};
pub use config_loader::ConfigLoader;
pub use notification::{Notification, NotificationBoard, NotificationKind};

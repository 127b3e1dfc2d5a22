mod config_cmd;
mod item;
mod render;
mod watch;

pub use config_cmd::ConfigCommand;
pub use item::ItemSubcommand;
pub use watch::WatchCommand;

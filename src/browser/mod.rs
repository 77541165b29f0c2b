pub mod connection;
pub mod engine;
pub mod headless;
pub mod tab;

pub use connection::connect_to_browser;
pub use engine::{ChromeEngine, ChromeLauncher};
pub use headless::launch_headless_browser;
pub use tab::PrintTab;

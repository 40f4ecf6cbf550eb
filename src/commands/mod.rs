pub mod devices;
pub mod locate;
pub mod serve;
pub mod weather;

// Re-export command functions for convenience
pub use devices::{add_device, list_devices, remove_device, show_device};
pub use locate::{locate, locate_all};
pub use serve::serve;
pub use weather::weather;

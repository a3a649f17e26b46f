//! Headless stand-ins for the well-known modules the bridge resolves by name.
//!
//! They carry the bookkeeping the bridge and host loop rely on (tick
//! requests, load progress, dev flags) without any rendering backend.

mod dev_tools;
mod event_dispatcher;
mod image_loader;
mod ui_manager;

pub use dev_tools::{DevLoadingView, DevSettings};
pub use event_dispatcher::{EventDispatcher, RECEIVE_EVENT};
pub use image_loader::{ImageLoader, E_UNSUPPORTED};
pub use ui_manager::UiManager;

//! Host entry point: composes the module set, starts the worker and drives
//! frames.

pub mod demo;
mod instance;

pub use instance::{builtin_native_modules, Instance, InstanceOptions, ROOT_TAG};

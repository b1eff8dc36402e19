//! Layered configuration: defaults, user config file, environment.

mod global;
mod loader;
mod structs;

pub use global::{get_config, init_config, init_config_from};
pub use loader::{get_config_dir, get_config_path, load_config, load_config_from};
pub use structs::*;

#[cfg(test)]
mod tests;

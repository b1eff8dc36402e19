mod app;
mod generation;
mod network;
mod providers;
mod server;
mod validation;

pub use app::AppConfig;
pub use generation::GenerationConfig;
pub use network::NetworkConfig;
pub use providers::ProvidersConfig;
pub use server::{ClientConfig, ServerConfig};
pub use validation::ValidationConfig;

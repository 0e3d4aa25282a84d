pub mod policy;
pub mod settings;

pub use policy::{Policy, Role};
pub use settings::{ConfigError, GatewayConfig};

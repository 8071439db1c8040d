mod server;

pub use server::{BillingConfig, LifecycleConfig, ServerConfig};

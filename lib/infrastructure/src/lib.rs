mod bus;
mod http;
mod monitoring;

pub use bus::{EventBus, EventEmitter, EventListener};
pub use http::HttpClientConfig;
pub use monitoring::{EnvFilterConfig, MonitoringConfig};

pub mod config_service;
pub mod http_transport;
pub mod paths;
pub mod preference_store;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::http_transport::HttpTransport;
pub use crate::preference_store::TomlPreferenceStore;

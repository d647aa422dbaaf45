mod settings;

pub use settings::{
    credentials_from, LoggingConfig, ModelSettings, PageSettings, Settings, StoreConfig,
    StoreSettings, ViewSettings, API_KEY_VAR, BASE_URL_VAR, DEFAULT_API_KEY, DEFAULT_BASE_URL,
};

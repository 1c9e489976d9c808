use std::sync::Arc;

use chat_client::ChatClient;
use chat_client_mock::{MockClient, MOCK_CLIENT_ID};

use crate::config::{AppConfig, ConfigError};

pub fn client_from_config(config: &AppConfig) -> Result<Arc<dyn ChatClient>, ConfigError> {
    client_for_id(&config.client_id, config.mock_paired)
}

pub fn client_for_id(client_id: &str, paired: bool) -> Result<Arc<dyn ChatClient>, ConfigError> {
    match client_id {
        MOCK_CLIENT_ID => Ok(Arc::new(MockClient::default().paired(paired))),
        unknown => Err(ConfigError::UnknownClient {
            id: unknown.to_string(),
            available: MOCK_CLIENT_ID,
        }),
    }
}

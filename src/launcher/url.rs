//! Browser URL for a running server

use crate::launcher::ServerConfig;

/// Port browsers assume for plain http URLs
const DEFAULT_HTTP_PORT: u16 = 80;

/// Build the URL handed to the desktop's default browser
pub fn build_browser_url(config: &ServerConfig) -> String {
    if config.port == DEFAULT_HTTP_PORT {
        format!("http://{}/", config.bind_address)
    } else {
        format!("http://{}:{}/", config.bind_address, config.port)
    }
}

//! Opening the server in the desktop's default browser

use log::{info, warn};

/// Hands a URL to whatever handles http URLs on this desktop
pub trait UriOpener {
    fn open(&self, url: &str);
}

/// The OS default browser. Failures are logged and otherwise ignored.
pub struct SystemBrowser;

impl UriOpener for SystemBrowser {
    fn open(&self, url: &str) {
        info!("Opening {} in the default browser", url);
        if let Err(e) = webbrowser::open(url) {
            warn!("Failed to open browser for {}: {}", url, e);
        }
    }
}

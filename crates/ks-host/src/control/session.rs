use crate::control::{ControlError, ControlResult};
use crate::server::{APP_KEY_COOKIE, ServerData};

use std::panic::Location;

use error_location::ErrorLocation;
use reqwest::Url;
use serde::Serialize;
use tracing::info;

const DEFAULT_PATH: &str = "/";

/// What the browser surface must do once server data is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUpdate {
    /// URL the cookie is scoped to
    pub cookie_url: String,
    /// `app_key_cookie=<key>`
    pub cookie: String,
    pub navigate_to: String,
}

/// Browser-side session state that survives rebinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSession {
    last_path: String,
}

impl Default for BrowserSession {
    fn default() -> Self {
        Self {
            last_path: String::from(DEFAULT_PATH),
        }
    }
}

impl BrowserSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_path(&self) -> &str {
        &self.last_path
    }

    /// Remember path and fragment of the page being left.
    ///
    /// Unparsable URLs leave the previous path in place.
    pub fn remember(&mut self, current_url: &str) {
        let Ok(url) = Url::parse(current_url) else {
            return;
        };

        self.last_path = match url.fragment() {
            Some(fragment) => format!("{}#{fragment}", url.path()),
            None => url.path().to_string(),
        };

        info!("Set last URL path to {}", self.last_path);
    }

    /// Cookie and navigation target for `data`.
    #[track_caller]
    pub fn update_for(&self, data: &ServerData) -> ControlResult<SessionUpdate> {
        let url = Url::parse(&data.server_url).map_err(|e| ControlError::InvalidServerUrl {
            url: data.server_url.clone(),
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ControlError::InvalidServerUrl {
                url: data.server_url.clone(),
                message: String::from("URL has no authority"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if data.app_key.is_empty() {
            return Err(ControlError::EmptyAppKey {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(SessionUpdate {
            cookie_url: data.server_url.clone(),
            cookie: format!("{APP_KEY_COOKIE}={}", data.app_key),
            navigate_to: format!("{}://{}{}", url.scheme(), url.authority(), self.last_path),
        })
    }
}

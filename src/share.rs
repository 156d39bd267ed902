//! Social share hand-off.
//!
//! The gallery never talks to a sharing service directly. It builds a fixed feed
//! payload and gives it to a [`ShareSdk`]. [`BrowserShare`] opens the provider's web
//! share page with the payload encoded into the query string.

use serde::Serialize;

use crate::{config::ShareConfig, error::ShareError};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedLink {
    pub mobile_web_url: String,
    pub web_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedContent {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub link: FeedLink,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedButton {
    pub title: String,
    pub link: FeedLink,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPayload {
    pub object_type: String,
    pub content: FeedContent,
    pub buttons: Vec<FeedButton>,
}

impl FeedPayload {
    pub fn from_config(config: &ShareConfig) -> Self {
        let link = FeedLink {
            mobile_web_url: config.link.clone(),
            web_url: config.link.clone(),
        };
        Self {
            object_type: "feed".to_string(),
            content: FeedContent {
                title: config.title.clone(),
                description: config.description.clone(),
                image_url: config.image_url.clone(),
                link: link.clone(),
            },
            buttons: vec![FeedButton {
                title: config.button_title.clone(),
                link,
            }],
        }
    }
}

/// The platform sharing API.
pub trait ShareSdk {
    fn send_default(&mut self, payload: &FeedPayload) -> Result<(), ShareError>;
}

/// Opens the share page of the provider in the default browser.
#[derive(Clone, Debug)]
pub struct BrowserShare {
    endpoint: String,
    app_key_env: String,
}

impl BrowserShare {
    pub fn new(config: &ShareConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            app_key_env: config.app_key_env.clone(),
        }
    }

    /// The hand-off URL for `payload`, signed with `app_key`.
    pub fn share_url(&self, app_key: &str, payload: &FeedPayload) -> Result<String, ShareError> {
        let template = serde_json::to_string(payload)?;
        Ok(format!(
            "{}?app_key={}&template_json={}",
            self.endpoint,
            urlencoding::encode(app_key),
            urlencoding::encode(&template)
        ))
    }

    fn app_key(&self) -> Result<String, ShareError> {
        match std::env::var(&self.app_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ShareError::MissingAppKey(self.app_key_env.clone())),
        }
    }
}

impl ShareSdk for BrowserShare {
    fn send_default(&mut self, payload: &FeedPayload) -> Result<(), ShareError> {
        let key = self.app_key()?;
        let url = self.share_url(&key, payload)?;
        log::debug!("Opening share page {}", self.endpoint);
        webbrowser::open(&url)?;
        Ok(())
    }
}

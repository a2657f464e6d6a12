//! Social graph API client, used only for the profile card.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{Profile, describe_error, normalize_base_url};
use crate::config::schema::GraphConfig;

#[derive(Debug, Clone)]
pub struct GraphClient {
    base_url: String,
    picture_size: u32,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    birthday: Option<String>,
    gender: Option<String>,
    picture: Option<PictureEdge>,
}

#[derive(Debug, Deserialize)]
struct PictureEdge {
    data: Option<PictureData>,
}

#[derive(Debug, Deserialize)]
struct PictureData {
    url: Option<String>,
}

impl From<MeResponse> for Profile {
    fn from(me: MeResponse) -> Self {
        Self {
            id: me.id,
            name: me.name,
            birthday: me.birthday,
            gender: me.gender,
            picture_url: me.picture.and_then(|p| p.data).and_then(|d| d.url),
        }
    }
}

impl GraphClient {
    pub fn from_config(config: &GraphConfig) -> Self {
        Self {
            base_url: normalize_base_url(&config.base_url),
            picture_size: config.picture_size,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// `fields` parameter for `/me`.
    fn fields(&self) -> String {
        let size = self.picture_size;
        format!("id,name,birthday,gender,picture.width({size}).height({size})")
    }

    /// Fetch the signed-in user's profile.
    pub fn fetch_profile(&self, token: &str) -> Result<Profile> {
        let url = format!("{}/me", self.base_url);
        let resp = ureq::get(&url)
            .timeout(self.timeout)
            .query("fields", &self.fields())
            .query("access_token", token)
            .call()
            .map_err(|e| describe_error("profile lookup", e))?;

        let me: MeResponse = resp
            .into_json()
            .context("failed to parse profile response")?;

        Ok(me.into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

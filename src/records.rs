//! Model records and where they come from.
//!
//! The gallery reads one table of model metadata. [`RestRecordSource`] queries a
//! PostgREST-style endpoint (`GET {url}/rest/v1/{table}?select=*`), and
//! [`StaticRecordSource`] serves a fixed list (demo data, tests).
//!
//! Access keys are never part of the configuration file. They are either issued by a
//! token endpoint at request time or read from an environment variable.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{config::RecordsConfig, error::FetchError};

/// Optional per-record styling, resolved when the record is defined.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleVariant {
    #[default]
    Original,
    /// Overwrites the base colour of every material of the model.
    Recolor { color: [f32; 3] },
}

/// Metadata of one model as stored in the remote table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AssetRecord {
    #[serde(alias = "model_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(rename = "file_path")]
    pub asset_path: String,
    #[serde(rename = "style_variant", default, deserialize_with = "nullable_style")]
    pub style: StyleVariant,
}

impl AssetRecord {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        asset_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: String::new(),
            asset_path: asset_path.into(),
            style: StyleVariant::Original,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_style(mut self, style: StyleVariant) -> Self {
        self.style = style;
        self
    }

    /// One line summary as shown in the record listing.
    pub fn summary(&self) -> String {
        let description = if self.description.is_empty() {
            "-"
        } else {
            &self.description
        };
        format!("[{}] {}: {}", self.id, self.display_name, description)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_style<'de, D>(deserializer: D) -> Result<StyleVariant, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StyleVariant>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses the JSON array returned by the table endpoint.
pub fn parse_records(body: &str) -> Result<Vec<AssetRecord>, FetchError> {
    Ok(serde_json::from_str(body)?)
}

/// Something that can list the model records, read-only.
pub trait RecordSource {
    fn fetch(&self) -> impl Future<Output = Result<Vec<AssetRecord>, FetchError>> + Send;
}

/// Fixed record list.
#[derive(Clone, Debug, Default)]
pub struct StaticRecordSource {
    records: Vec<AssetRecord>,
}

impl StaticRecordSource {
    pub fn new(records: Vec<AssetRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticRecordSource {
    async fn fetch(&self) -> Result<Vec<AssetRecord>, FetchError> {
        Ok(self.records.clone())
    }
}

#[derive(Deserialize)]
struct IssuedToken {
    access_token: String,
}

/// Reads the `models` table of a hosted PostgREST backend.
#[derive(Clone, Debug)]
pub struct RestRecordSource {
    client: reqwest::Client,
    config: RecordsConfig,
}

impl RestRecordSource {
    pub fn new(config: RecordsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/rest/v1/{}?select=*",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }

    async fn credential(&self) -> Result<String, FetchError> {
        if let Some(token_endpoint) = &self.config.token_endpoint {
            let response = self.client.get(token_endpoint).send().await?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            let token: IssuedToken = serde_json::from_str(&body)?;
            return Ok(token.access_token);
        }
        std::env::var(&self.config.key_env).map_err(|_| {
            FetchError::Credential(format!(
                "neither a token endpoint nor the {} environment variable is set",
                self.config.key_env
            ))
        })
    }
}

impl RecordSource for RestRecordSource {
    async fn fetch(&self) -> Result<Vec<AssetRecord>, FetchError> {
        let key = self.credential().await?;
        let url = self.endpoint();
        log::info!("Fetching model records from {url}");
        let response = self
            .client
            .get(&url)
            .header("apikey", &key)
            .header("Authorization", format!("Bearer {key}"))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let records = parse_records(&body)?;
        log::info!("Fetched {} model records", records.len());
        Ok(records)
    }
}

/// Demo record set shipped with the assets directory.
///
/// The second model carries a recolour style.
pub fn demo_records() -> Vec<AssetRecord> {
    vec![
        AssetRecord::new("1", "Cube", "cube.gltf").with_description("Unit cube"),
        AssetRecord::new("2", "Tinted cube", "cube.gltf")
            .with_description("Same cube, recoloured")
            .with_style(StyleVariant::Recolor {
                color: [0.96, 0.55, 0.71],
            }),
        AssetRecord::new("3", "Tall box", "tall_box.gltf"),
    ]
}

/// Placeholder shown when the table has no rows.
pub const NO_MODELS: &str = "No models available.";

/// Listing lines for `records`, or the [`NO_MODELS`] placeholder when there are none.
pub fn listing(records: &[AssetRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec![NO_MODELS.to_string()];
    }
    records.iter().map(AssetRecord::summary).collect()
}

/// Queries the configured backend, or returns [`demo_records`] when no URL is set.
pub async fn fetch_configured(config: &RecordsConfig) -> Result<Vec<AssetRecord>, FetchError> {
    if config.url.trim().is_empty() {
        log::info!("No record backend configured, using the demo records");
        return Ok(demo_records());
    }
    RestRecordSource::new(config.clone()).fetch().await
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies the charm content a unit runs, e.g. `cs:trusty/mysql-42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharmUrl(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CharmUrlError {
    #[error("charm URL {0:?} has no schema")]
    MissingSchema(String),

    #[error("charm URL {url:?} has unsupported schema {schema:?}")]
    UnsupportedSchema { url: String, schema: String },

    #[error("charm URL {0:?} has an empty name")]
    EmptyName(String),
}

impl CharmUrl {
    pub fn parse(url: &str) -> Result<Self, CharmUrlError> {
        let (schema, path) = url
            .split_once(':')
            .ok_or_else(|| CharmUrlError::MissingSchema(url.to_string()))?;
        if schema != "cs" && schema != "local" {
            return Err(CharmUrlError::UnsupportedSchema {
                url: url.to_string(),
                schema: schema.to_string(),
            });
        }
        let name = path.rsplit('/').next().unwrap_or_default();
        if name.is_empty() {
            return Err(CharmUrlError::EmptyName(url.to_string()));
        }
        Ok(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn schema(&self) -> &str {
        self.0.split_once(':').map_or("", |(schema, _)| schema)
    }

    /// Trailing `-<n>` revision, if the URL carries one.
    pub fn revision(&self) -> Option<u32> {
        let name = self.0.rsplit(['/', ':']).next()?;
        let (_, rev) = name.rsplit_once('-')?;
        rev.parse().ok()
    }
}

impl fmt::Display for CharmUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CharmUrl {
    type Err = CharmUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CharmUrl {
    type Error = CharmUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CharmUrl> for String {
    fn from(url: CharmUrl) -> Self {
        url.0
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use sheba_core::ProfessionKey;
use sheba_core::model::{FixtureDocument, Level};
use tracing::{info, warn};

use crate::error::FixtureError;

/// Where the curriculum document comes from.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    /// Fetch and parse the whole document.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError` if the document cannot be read or parsed.
    async fn fetch(&self) -> Result<FixtureDocument, FixtureError>;
}

/// Curriculum JSON on the local filesystem.
#[derive(Clone, Debug)]
pub struct FileFixtureSource {
    path: PathBuf,
}

impl FileFixtureSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FixtureSource for FileFixtureSource {
    async fn fetch(&self) -> Result<FixtureDocument, FixtureError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Curriculum JSON served over HTTP, e.g. the SPA's `/learningData.json`.
#[derive(Clone)]
pub struct HttpFixtureSource {
    client: Client,
    url: String,
}

impl HttpFixtureSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl FixtureSource for HttpFixtureSource {
    async fn fetch(&self) -> Result<FixtureDocument, FixtureError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(FixtureError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

/// A document held in memory; used by tests and embedded setups.
#[derive(Clone, Debug, Default)]
pub struct StaticFixtureSource {
    document: FixtureDocument,
}

impl StaticFixtureSource {
    #[must_use]
    pub fn new(document: FixtureDocument) -> Self {
        Self { document }
    }

    /// Parse a JSON string up front.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::Parse` if `json` is not a valid document.
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }
}

#[async_trait]
impl FixtureSource for StaticFixtureSource {
    async fn fetch(&self) -> Result<FixtureDocument, FixtureError> {
        Ok(self.document.clone())
    }
}

/// Pick a source from a location string: `http(s)://` URLs go over the
/// network, anything else is a file path.
#[must_use]
pub fn source_for(location: &str) -> Arc<dyn FixtureSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Arc::new(HttpFixtureSource::new(location))
    } else {
        Arc::new(FileFixtureSource::new(location))
    }
}

/// Resolves a profession's level list from a [`FixtureSource`].
#[derive(Clone)]
pub struct FixtureLoader {
    source: Arc<dyn FixtureSource>,
}

impl FixtureLoader {
    #[must_use]
    pub fn new(source: Arc<dyn FixtureSource>) -> Self {
        Self { source }
    }

    /// Levels for `profession`, falling back to the default profession.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError` if the document cannot be fetched.
    pub async fn levels_for(&self, profession: &ProfessionKey) -> Result<Vec<Level>, FixtureError> {
        let document = self.source.fetch().await?;
        if !document.has_profession(profession) {
            info!(
                %profession,
                fallback = ProfessionKey::DEFAULT,
                "no curriculum for profession, using default"
            );
        }
        Ok(document.levels_for(profession))
    }

    /// Like [`FixtureLoader::levels_for`] but degrades to an empty list.
    pub async fn levels_or_empty(&self, profession: &ProfessionKey) -> Vec<Level> {
        match self.levels_for(profession).await {
            Ok(levels) => levels,
            Err(err) => {
                warn!(%profession, error = %err, "error loading learning data");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"professions":{"electrician":[{"id":1,"name_en":"Basics","modules":[]}],
        "plumber":[{"id":1,"name_en":"Pipes","modules":[]},{"id":2,"name_en":"Leaks","modules":[]}]}}"#;

    #[tokio::test]
    async fn loader_selects_and_falls_back() {
        let loader = FixtureLoader::new(Arc::new(StaticFixtureSource::from_json(DOC).unwrap()));
        let plumber = loader
            .levels_for(&ProfessionKey::normalize("Plumber"))
            .await
            .unwrap();
        assert_eq!(plumber.len(), 2);

        let carpenter = loader
            .levels_for(&ProfessionKey::normalize("Carpenter"))
            .await
            .unwrap();
        assert_eq!(carpenter[0].name().en, "Basics");
    }

    #[tokio::test]
    async fn missing_file_degrades_to_empty() {
        let loader = FixtureLoader::new(Arc::new(FileFixtureSource::new(
            "/definitely/not/here/learningData.json",
        )));
        let key = ProfessionKey::default();
        assert!(matches!(
            loader.levels_for(&key).await.unwrap_err(),
            FixtureError::Io(_)
        ));
        assert!(loader.levels_or_empty(&key).await.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            StaticFixtureSource::from_json("{").unwrap_err(),
            FixtureError::Parse(_)
        ));
    }
}

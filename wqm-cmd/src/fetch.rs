//! HTTP and filesystem fetcher for published resources.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use std::{io::ErrorKind, time::Duration};
use wqm_core::config::Config;
use wqm_store::{FetchError, Fetcher, Resource};

/// True for locations served over HTTP; anything else is a file path.
pub fn is_http(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Reads each resource from its location under the configured data or image
/// base, over HTTP or from disk.
#[derive(Debug, Clone)]
pub struct CliFetcher {
    client: Client,
    config: Config,
}

impl CliFetcher {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn get(&self, url: String) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound(url)),
            status if !status.is_success() => Err(FetchError::Status {
                status: status.as_u16(),
                location: url,
            }),
            _ => response
                .text()
                .await
                .map_err(|e| FetchError::Transport(e.to_string())),
        }
    }

    async fn read(&self, path: String) -> Result<String, FetchError> {
        debug!("read {}", path);
        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound(path.clone()),
            _ => FetchError::Transport(format!("{}: {}", path, e)),
        })
    }
}

#[async_trait(?Send)]
impl Fetcher for CliFetcher {
    async fn fetch(&self, resource: &Resource) -> Result<String, FetchError> {
        let location = resource.location(&self.config);
        if is_http(&location) {
            self.get(location).await
        } else {
            self.read(location).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_kind() {
        assert!(is_http("https://example.org/data/2024/list.json"));
        assert!(is_http("http://localhost:8080/2024.csv"));
        assert!(!is_http("./data/2024/list.json"));
        assert!(!is_http("httpdocs/2024.csv"));
    }

    #[tokio::test]
    async fn test_reads_from_data_and_image_dirs() {
        let root = std::env::temp_dir().join(format!("wqm-cmd-fetch-{}", std::process::id()));
        let data = root.join("data");
        let images = root.join("images");
        tokio::fs::create_dir_all(data.join("2024")).await.unwrap();
        tokio::fs::create_dir_all(&images).await.unwrap();
        tokio::fs::write(data.join("2024/list.json"), "[\"A\"]").await.unwrap();
        tokio::fs::write(images.join("A.svg"), "<svg/>").await.unwrap();

        let config = Config {
            data_base: data.display().to_string(),
            image_base: images.display().to_string(),
            ..Config::default()
        };
        let fetcher = CliFetcher::new(&config).unwrap();
        let list = Resource::EntityList {
            year: "2024".to_string(),
        };
        assert_eq!(fetcher.fetch(&list).await.unwrap(), "[\"A\"]");
        let graphic = Resource::Graphic {
            name: "A".to_string(),
        };
        assert_eq!(fetcher.fetch(&graphic).await.unwrap(), "<svg/>");

        let missing = Resource::Graphic {
            name: "B".to_string(),
        };
        assert!(matches!(
            fetcher.fetch(&missing).await,
            Err(FetchError::NotFound(_))
        ));

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}

//! HTTP client for the project storage collaborator.
//!
//! The backend is a plain CRUD service over named records: list, load,
//! save (replace), delete. Failures are surfaced unchanged, tagged with
//! the attempted operation; retry policy belongs to callers.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::errors::{StorageError, StorageResult};
use crate::project_io::ProjectRecord;

/// Storage collaborator contract. Implemented over HTTP by
/// `HttpProjectStore`; tests and embedders may supply their own.
#[async_trait]
pub trait ProjectStore {
    async fn list_projects(&self) -> StorageResult<Vec<String>>;
    async fn load_project(&self, name: &str) -> StorageResult<ProjectRecord>;
    async fn save_project(&self, name: &str, record: &ProjectRecord) -> StorageResult<()>;
    async fn delete_project(&self, name: &str) -> StorageResult<()>;
}

/// Project names are path segments on the backend, so they are restricted
/// to a conservative character set before any request is made.
pub fn validate_name(name: &str) -> StorageResult<()> {
    let pattern = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

pub struct HttpProjectStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpProjectStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn project_url(&self, name: &str) -> String {
        format!("{}/projects/{}", self.base_url, name)
    }

    fn check_status(op: &'static str, response: &reqwest::Response) -> StorageResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StorageError::Status {
                op,
                status: response.status(),
            })
        }
    }
}

#[async_trait]
impl ProjectStore for HttpProjectStore {
    async fn list_projects(&self) -> StorageResult<Vec<String>> {
        let op = "list projects";
        debug!("GET {}/projects", self.base_url);
        let response = self
            .client
            .get(format!("{}/projects", self.base_url))
            .send()
            .await
            .map_err(|source| StorageError::Transport { op, source })?;
        Self::check_status(op, &response)?;
        response
            .json()
            .await
            .map_err(|source| StorageError::Transport { op, source })
    }

    async fn load_project(&self, name: &str) -> StorageResult<ProjectRecord> {
        let op = "load project";
        validate_name(name)?;
        debug!("GET {}", self.project_url(name));
        let response = self
            .client
            .get(self.project_url(name))
            .send()
            .await
            .map_err(|source| StorageError::Transport { op, source })?;
        Self::check_status(op, &response)?;
        response
            .json()
            .await
            .map_err(|source| StorageError::Transport { op, source })
    }

    async fn save_project(&self, name: &str, record: &ProjectRecord) -> StorageResult<()> {
        let op = "save project";
        validate_name(name)?;
        debug!("PUT {}", self.project_url(name));
        let response = self
            .client
            .put(self.project_url(name))
            .json(record)
            .send()
            .await
            .map_err(|source| StorageError::Transport { op, source })?;
        Self::check_status(op, &response)
    }

    async fn delete_project(&self, name: &str) -> StorageResult<()> {
        let op = "delete project";
        validate_name(name)?;
        debug!("DELETE {}", self.project_url(name));
        let response = self
            .client
            .delete(self.project_url(name))
            .send()
            .await
            .map_err(|source| StorageError::Transport { op, source })?;
        Self::check_status(op, &response)
    }
}

// src/publish/mod.rs
//! Upsert of the payload file: read the current version marker, then write
//! the whole document back guarded by that marker.

pub mod github;

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::config::PublishCfg;
use crate::payload::Payload;

/// Where the document lives and who may write it.
#[derive(Clone, PartialEq, Eq)]
pub struct Destination {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: String,
    pub credential: String,
}

impl Destination {
    pub fn from_config(cfg: &PublishCfg, credential: String) -> Self {
        Self {
            owner: cfg.owner.clone(),
            repo: cfg.repo.clone(),
            path: cfg.path.clone(),
            branch: cfg.branch.clone(),
            credential,
        }
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Destination")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("branch", &self.branch)
            .field("credential", &"***")
            .finish()
    }
}

/// Current revision of the remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocumentHandle {
    pub sha: String,
    pub path: String,
    pub repository: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLookup {
    Found(RemoteDocumentHandle),
    /// 404 is the normal "create" case; anything else is logged too.
    Missing { status: u16 },
}

/// PUT body of the contents API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PutFileRequest {
    pub message: String,
    pub content: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResponse {
    pub status: u16,
    pub body: String,
}

/// Remote file store seam; GitHub in production, in-memory in tests.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_file(&self, dest: &Destination) -> Result<RemoteLookup>;
    async fn put_file(&self, dest: &Destination, req: &PutFileRequest) -> Result<WriteResponse>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Created,
    Updated,
    Failed { status: Option<u16>, body: String },
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Created | PublishOutcome::Updated)
    }

    fn label(&self) -> &'static str {
        match self {
            PublishOutcome::Created => "created",
            PublishOutcome::Updated => "updated",
            PublishOutcome::Failed { .. } => "failed",
        }
    }
}

/// `"Update Africa Green News: 01/05/2024 08:30"`
pub fn commit_message(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}: {}", prefix, now.format("%d/%m/%Y %H:%M"))
}

pub struct Publisher<'a> {
    store: &'a dyn ContentStore,
    commit_prefix: String,
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a dyn ContentStore, commit_prefix: &str) -> Self {
        Self {
            store,
            commit_prefix: commit_prefix.to_string(),
        }
    }

    /// Never retries and never returns an error; the outcome says what happened.
    pub async fn publish(&self, payload: &Payload, dest: &Destination) -> PublishOutcome {
        let outcome = self.publish_inner(payload, dest).await;
        counter!("publish_total", "outcome" => outcome.label()).increment(1);
        match &outcome {
            PublishOutcome::Created | PublishOutcome::Updated => tracing::info!(
                repo = %format!("{}/{}", dest.owner, dest.repo),
                path = %dest.path,
                branch = %dest.branch,
                outcome = outcome.label(),
                "payload published"
            ),
            PublishOutcome::Failed { status, body } => tracing::error!(
                repo = %format!("{}/{}", dest.owner, dest.repo),
                path = %dest.path,
                status = ?status,
                body = %body,
                "publish failed"
            ),
        }
        outcome
    }

    async fn publish_inner(&self, payload: &Payload, dest: &Destination) -> PublishOutcome {
        // A) current marker
        let sha = match self.store.get_file(dest).await {
            Ok(RemoteLookup::Found(handle)) => Some(handle.sha),
            Ok(RemoteLookup::Missing { status }) => {
                if status != 404 {
                    tracing::warn!(status, path = %dest.path, "unexpected status reading remote file, writing without marker");
                }
                None
            }
            Err(e) => {
                return PublishOutcome::Failed {
                    status: None,
                    body: format!("reading remote file: {e:#}"),
                }
            }
        };

        // B) encode
        let content = match payload.encode_content() {
            Ok(c) => c,
            Err(e) => {
                return PublishOutcome::Failed {
                    status: None,
                    body: format!("{e:#}"),
                }
            }
        };

        // C) write
        let req = PutFileRequest {
            message: commit_message(&self.commit_prefix, Utc::now()),
            content,
            branch: dest.branch.clone(),
            sha,
        };
        match self.store.put_file(dest, &req).await {
            Ok(WriteResponse { status: 201, .. }) => PublishOutcome::Created,
            Ok(WriteResponse { status: 200, .. }) => PublishOutcome::Updated,
            Ok(WriteResponse { status, body }) => PublishOutcome::Failed {
                status: Some(status),
                body,
            },
            Err(e) => PublishOutcome::Failed {
                status: None,
                body: format!("writing remote file: {e:#}"),
            },
        }
    }
}

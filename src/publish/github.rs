// src/publish/github.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::{ContentStore, Destination, PutFileRequest, RemoteDocumentHandle, RemoteLookup, WriteResponse};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// The part of a contents API file response we rely on.
#[derive(Debug, Deserialize)]
struct ContentsMetadata {
    sha: String,
    #[serde(default)]
    path: Option<String>,
}

/// `GET/PUT {api_base}/repos/{owner}/{repo}/contents/{path}`
pub struct GitHubContentStore {
    client: Client,
    api_base: String,
}

impl GitHubContentStore {
    pub fn new(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn contents_url(&self, dest: &Destination) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            dest.owner,
            dest.repo,
            dest.path.trim_start_matches('/')
        )
    }

    fn authed(&self, rb: RequestBuilder, dest: &Destination) -> RequestBuilder {
        rb.bearer_auth(&dest.credential)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    async fn get_file(&self, dest: &Destination) -> Result<RemoteLookup> {
        let url = self.contents_url(dest);
        let resp = self
            .authed(self.client.get(&url), dest)
            .query(&[("ref", dest.branch.as_str())])
            .send()
            .await
            .with_context(|| format!("contents http get {url}"))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Ok(RemoteLookup::Missing { status });
        }
        let meta: ContentsMetadata = resp
            .json()
            .await
            .context("contents metadata: expected a file object with `sha`")?;
        Ok(RemoteLookup::Found(RemoteDocumentHandle {
            sha: meta.sha,
            path: meta.path.unwrap_or_else(|| dest.path.clone()),
            repository: format!("{}/{}", dest.owner, dest.repo),
        }))
    }

    async fn put_file(&self, dest: &Destination, req: &PutFileRequest) -> Result<WriteResponse> {
        let url = self.contents_url(dest);
        let resp = self
            .authed(self.client.put(&url), dest)
            .json(req)
            .send()
            .await
            .with_context(|| format!("contents http put {url}"))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(WriteResponse { status, body })
    }
}

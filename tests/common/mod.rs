// tests/common/mod.rs
// Shared doubles: scripted feed fetcher, in-memory contents store, local HTTP servers.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use africa_green_data::ingest::types::FeedFetcher;
use africa_green_data::publish::{
    ContentStore, Destination, PutFileRequest, RemoteDocumentHandle, RemoteLookup, WriteResponse,
};

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|_| panic!("missing tests/fixtures/{name}"))
}

/// Feed fetcher answering from a url -> body table; unknown urls fail.
#[derive(Clone, Default)]
pub struct ScriptedFeeds {
    bodies: Arc<HashMap<String, String>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFeeds {
    pub fn new(pairs: &[(&str, String)]) -> Self {
        Self {
            bodies: Arc::new(
                pairs
                    .iter()
                    .map(|(u, b)| (u.to_string(), b.clone()))
                    .collect(),
            ),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFeeds {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {url}"))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[derive(Default)]
pub struct StoreState {
    /// (sha, base64 content)
    pub file: Option<(String, String)>,
    pub version: u64,
    pub gets: usize,
    pub puts: Vec<PutFileRequest>,
    /// Simulates another writer landing between our read and our write.
    pub interleave_writer: bool,
    pub fail_reads: bool,
}

/// Contents API semantics in memory: writes must carry the current sha.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn gets(&self) -> usize {
        self.state.lock().unwrap().gets
    }

    pub fn puts(&self) -> Vec<PutFileRequest> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn current_sha(&self) -> Option<String> {
        self.state.lock().unwrap().file.as_ref().map(|(s, _)| s.clone())
    }
}

fn next_sha(st: &mut StoreState) -> String {
    st.version += 1;
    format!("sha-{}", st.version)
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_file(&self, dest: &Destination) -> Result<RemoteLookup> {
        let mut st = self.state.lock().unwrap();
        st.gets += 1;
        if st.fail_reads {
            return Err(anyhow!("connection reset"));
        }
        let found = st.file.as_ref().map(|(sha, _)| sha.clone());
        if st.interleave_writer {
            if let Some((_, content)) = st.file.clone() {
                let sha = next_sha(&mut st);
                st.file = Some((sha, content));
            }
        }
        Ok(match found {
            Some(sha) => RemoteLookup::Found(RemoteDocumentHandle {
                sha,
                path: dest.path.clone(),
                repository: format!("{}/{}", dest.owner, dest.repo),
            }),
            None => RemoteLookup::Missing { status: 404 },
        })
    }

    async fn put_file(&self, _dest: &Destination, req: &PutFileRequest) -> Result<WriteResponse> {
        let mut st = self.state.lock().unwrap();
        st.puts.push(req.clone());
        let current = st.file.as_ref().map(|(s, _)| s.clone());
        match (current, &req.sha) {
            (None, None) => {
                let sha = next_sha(&mut st);
                st.file = Some((sha, req.content.clone()));
                Ok(WriteResponse {
                    status: 201,
                    body: "{}".into(),
                })
            }
            (Some(cur), Some(given)) if &cur == given => {
                let sha = next_sha(&mut st);
                st.file = Some((sha, req.content.clone()));
                Ok(WriteResponse {
                    status: 200,
                    body: "{}".into(),
                })
            }
            (Some(_), None) => Ok(WriteResponse {
                status: 422,
                body: r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#.into(),
            }),
            (cur, Some(given)) => Ok(WriteResponse {
                status: 409,
                body: format!(
                    r#"{{"message":"{} does not match {}"}}"#,
                    cur.unwrap_or_default(),
                    given
                ),
            }),
        }
    }
}

pub fn destination() -> Destination {
    Destination {
        owner: "octo".into(),
        repo: "africa-green-data".into(),
        path: "africa_green_data.json".into(),
        branch: "main".into(),
        credential: "t0ken".into(),
    }
}

/// Serve `app` on an ephemeral local port and return its base url.
pub async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

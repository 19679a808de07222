use async_trait::async_trait;

use crate::models::*;

/// Failure talking to the store. `Display` is the message shown to users.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("{0}")] Transport(String),
    #[error("{message}")] Remote { status: u16, message: String },
    #[error("{0}")] Decode(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Append-only access to the `sightings` table.
#[async_trait]
pub trait SightingRepo: Send + Sync {
    /// Returns the rows the store acknowledged. An empty vec means the store
    /// accepted the request but echoed nothing back.
    async fn insert(&self, new: NewSighting) -> RepoResult<Vec<Sighting>>;
    async fn select_all(&self) -> RepoResult<Vec<Sighting>>;
    async fn select_recent(&self, order: SortOrder, limit: usize) -> RepoResult<Vec<Sighting>>;
}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use std::cmp::Ordering;
    use std::sync::{Arc, RwLock};

    const SORTABLE: &[&str] = &["submit_date_time", "date_of_sighting", "id"];

    fn unknown_column(field: &str) -> RepoError {
        RepoError::Remote { status: 400, message: format!("column sightings.{field} does not exist") }
    }

    #[derive(Default)]
    struct State {
        rows: Vec<Sighting>,
        next_id: Id,
    }

    /// Process-local store for development and tests. Nothing survives a restart.
    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
    }

    impl InMemRepo {
        pub fn new() -> Self { Self::default() }

        pub fn len(&self) -> RepoResult<usize> {
            Ok(self.read()?.rows.len())
        }

        pub fn is_empty(&self) -> RepoResult<bool> {
            Ok(self.len()? == 0)
        }

        fn read(&self) -> RepoResult<std::sync::RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Transport("in-memory store poisoned".into()))
        }

        fn compare(field: &str, a: &Sighting, b: &Sighting) -> Ordering {
            match field {
                "submit_date_time" => a.record.submit_date_time.cmp(&b.record.submit_date_time),
                "date_of_sighting" => a.record.date_of_sighting.cmp(&b.record.date_of_sighting),
                "id" => a.id.cmp(&b.id),
                _ => Ordering::Equal,
            }
        }
    }

    #[async_trait]
    impl SightingRepo for InMemRepo {
        async fn insert(&self, new: NewSighting) -> RepoResult<Vec<Sighting>> {
            let mut s = self.state.write()
                .map_err(|_| RepoError::Transport("in-memory store poisoned".into()))?;
            s.next_id += 1;
            let row = Sighting { id: Some(s.next_id), record: new };
            s.rows.push(row.clone());
            Ok(vec![row])
        }

        async fn select_all(&self) -> RepoResult<Vec<Sighting>> {
            Ok(self.read()?.rows.clone())
        }

        async fn select_recent(&self, order: SortOrder, limit: usize) -> RepoResult<Vec<Sighting>> {
            if !SORTABLE.contains(&order.field) {
                return Err(unknown_column(order.field));
            }
            let mut v = self.read()?.rows.clone();
            v.sort_by(|a, b| {
                let ord = Self::compare(order.field, a, b);
                if order.descending { ord.reverse() } else { ord }
            });
            v.truncate(limit);
            Ok(v)
        }
    }
}

/// Client for the managed backend's PostgREST-style HTTPS interface.
pub mod rest {
    use super::*;
    use log::{debug, warn};
    use reqwest::{header, Client, Method, RequestBuilder, Response};

    #[derive(serde::Deserialize)]
    struct RemoteErrorBody {
        message: Option<String>,
    }

    #[derive(Clone)]
    pub struct RestRepo {
        client: Client,
        base_url: String,
        api_key: String,
        table: String,
    }

    impl RestRepo {
        pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, table: impl Into<String>) -> Self {
            Self::with_client(Client::new(), base_url, api_key, table)
        }

        pub fn with_client(
            client: Client,
            base_url: impl Into<String>,
            api_key: impl Into<String>,
            table: impl Into<String>,
        ) -> Self {
            let base_url = base_url.into().trim_end_matches('/').to_string();
            Self { client, base_url, api_key: api_key.into(), table: table.into() }
        }

        pub fn table_url(&self) -> String {
            format!("{}/rest/v1/{}", self.base_url, self.table)
        }

        fn request(&self, method: Method) -> RequestBuilder {
            self.client
                .request(method, self.table_url())
                .header("apikey", &self.api_key)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
        }

        async fn send(&self, req: RequestBuilder) -> RepoResult<Vec<Sighting>> {
            let resp = req.send().await.map_err(|e| {
                warn!("store request failed: {e}");
                RepoError::Transport(e.to_string())
            })?;
            Self::rows(resp).await
        }

        async fn rows(resp: Response) -> RepoResult<Vec<Sighting>> {
            let status = resp.status();
            let body = resp.text().await.map_err(|e| RepoError::Transport(e.to_string()))?;
            if !status.is_success() {
                let message = serde_json::from_str::<RemoteErrorBody>(&body)
                    .ok()
                    .and_then(|b| b.message)
                    .unwrap_or_else(|| if body.is_empty() { status.to_string() } else { body.clone() });
                warn!("store returned {status}: {message}");
                return Err(RepoError::Remote { status: status.as_u16(), message });
            }
            if body.trim().is_empty() {
                return Ok(Vec::new());
            }
            serde_json::from_str(&body).map_err(|e| RepoError::Decode(format!("unexpected response from store: {e}")))
        }
    }

    #[async_trait]
    impl SightingRepo for RestRepo {
        async fn insert(&self, new: NewSighting) -> RepoResult<Vec<Sighting>> {
            debug!("inserting sighting submitted at {}", new.submit_date_time);
            let req = self.request(Method::POST)
                .header("Prefer", "return=representation")
                .json(&new);
            self.send(req).await
        }

        async fn select_all(&self) -> RepoResult<Vec<Sighting>> {
            let req = self.request(Method::GET).query(&[("select", "*")]);
            self.send(req).await
        }

        async fn select_recent(&self, order: SortOrder, limit: usize) -> RepoResult<Vec<Sighting>> {
            let direction = if order.descending { "desc" } else { "asc" };
            let req = self.request(Method::GET).query(&[
                ("select", "*".to_string()),
                ("order", format!("{}.{direction}", order.field)),
                ("limit", limit.to_string()),
            ]);
            self.send(req).await
        }
    }
}

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::debug;

use crate::dao::{
    document::{
        Collection, Document, Fields, SnapshotStream, WriteBatch, WriteOp, server_now,
        sort_documents,
    },
    document_store::DocumentStore,
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsKeys, AllDocsResponse, BulkDocsRequest, BulkDocsRow, CouchDocument, DatabaseInfo,
        END_SUFFIX, collection_prefix, doc_id,
    },
};

const ALL_DOCS: &str = "_all_docs";
const BULK_DOCS: &str = "_bulk_docs";

/// Document store persisting the scoreboard collections in one CouchDB database.
///
/// Documents are namespaced as `<collection>::<id>`. `_bulk_docs` applies each document
/// independently, so a batch that fails midway may leave earlier documents written.
#[derive(Clone)]
pub struct CouchDocumentStore {
    pub(super) client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
    pub(super) changes_timeout_ms: u128,
}

impl CouchDocumentStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
            changes_timeout_ms: config.changes_timeout.as_millis(),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    /// Build a URL below the database, percent-encoding every segment (player names are ids).
    pub(super) fn url(&self, segments: &[&str]) -> CouchResult<Url> {
        let invalid = || CouchDaoError::InvalidUrl {
            url: self.base_url.to_string(),
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(&self.database)
            .extend(segments);
        Ok(url)
    }

    pub(super) fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.url(&[])?;

        let response = self
            .request(Method::GET, url.clone())
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self.request(Method::PUT, url).send().await.map_err(|source| {
                    CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    }
                })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    /// Send a request and decode a successful JSON body.
    pub(super) async fn send_json<T>(
        &self,
        builder: reqwest::RequestBuilder,
        path: &str,
    ) -> CouchResult<T>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: path.to_string(),
                status: response.status(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| CouchDaoError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    async fn get_document(&self, doc_id: &str) -> CouchResult<Option<CouchDocument>> {
        let response = self
            .request(Method::GET, self.url(&[doc_id])?)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchDocument>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::DecodeResponse {
                    path: doc_id.to_string(),
                    source,
                }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    fn parse_rows(rows: AllDocsResponse) -> CouchResult<Vec<CouchDocument>> {
        let mut documents = Vec::new();
        for row in rows.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: ALL_DOCS.to_string(),
                    source,
                })?;
                documents.push(parsed);
            }
        }
        Ok(documents)
    }

    pub(super) async fn list_collection(&self, collection: Collection) -> CouchResult<Vec<Document>> {
        let prefix = collection_prefix(collection);
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let payload: AllDocsResponse = self
            .send_json(
                self.request(Method::GET, self.url(&[ALL_DOCS])?).query(&query),
                ALL_DOCS,
            )
            .await?;

        let mut documents: Vec<Document> = Self::parse_rows(payload)?
            .into_iter()
            .map(|doc| doc.into_document(collection))
            .collect();
        sort_documents(collection, &mut documents);
        Ok(documents)
    }

    /// Load the current revision of every key that exists.
    async fn fetch_many(&self, keys: &[String]) -> CouchResult<HashMap<String, CouchDocument>> {
        let payload: AllDocsResponse = self
            .send_json(
                self.request(Method::POST, self.url(&[ALL_DOCS])?)
                    .query(&[("include_docs", "true")])
                    .json(&AllDocsKeys { keys }),
                ALL_DOCS,
            )
            .await?;

        Ok(Self::parse_rows(payload)?
            .into_iter()
            .map(|doc| (doc.id.clone(), doc))
            .collect())
    }

    pub(super) async fn update_seq(&self) -> CouchResult<String> {
        let info: DatabaseInfo = self
            .send_json(self.request(Method::GET, self.url(&[])?), &self.database)
            .await?;
        Ok(super::models::seq_token(&info.update_seq))
    }

    async fn post_bulk<T>(&self, body: &T) -> CouchResult<Vec<BulkDocsRow>>
    where
        T: ?Sized + Serialize,
    {
        self.send_json(
            self.request(Method::POST, self.url(&[BULK_DOCS])?).json(body),
            BULK_DOCS,
        )
        .await
    }

    /// Resolve the batch against current revisions, then write the final state of every
    /// touched document through `_bulk_docs`.
    async fn commit_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let now = server_now();
        let ops = batch.into_ops();
        let mut keys: Vec<String> = ops
            .iter()
            .map(|op| doc_id(op.collection(), op.id()))
            .collect();
        keys.sort();
        keys.dedup();
        let existing = self.fetch_many(&keys).await?;

        let mut staged: HashMap<Collection, BTreeMap<String, Fields>> = HashMap::new();
        for doc in existing.values() {
            for collection in Collection::ALL {
                if doc.id.starts_with(&collection_prefix(collection)) {
                    let document = doc.clone().into_document(collection);
                    staged
                        .entry(collection)
                        .or_default()
                        .insert(document.id, document.fields);
                }
            }
        }

        let mut touched: Vec<(Collection, String, bool)> = Vec::new();
        for op in ops {
            let collection = op.collection();
            let id = op.id().to_string();
            let is_create = matches!(op, WriteOp::Create { .. });
            op.apply_to(staged.entry(collection).or_default(), &now)?;
            if !touched.iter().any(|(c, i, _)| *c == collection && *i == id) {
                touched.push((collection, id, is_create));
            }
        }

        let mut docs = Vec::with_capacity(touched.len());
        for (collection, id, _) in &touched {
            let key = doc_id(*collection, id);
            let rev = existing.get(&key).and_then(|doc| doc.rev.clone());
            match staged.get(collection).and_then(|docs| docs.get(id)) {
                Some(fields) => docs.push(CouchDocument {
                    id: key,
                    rev,
                    deleted: false,
                    fields: fields.clone(),
                }),
                None if rev.is_some() => docs.push(CouchDocument {
                    id: key,
                    rev,
                    deleted: true,
                    fields: Fields::new(),
                }),
                None => {}
            }
        }

        if docs.is_empty() {
            return Ok(());
        }

        let count = docs.len();
        let rows = self.post_bulk(&BulkDocsRequest { docs }).await?;
        for row in rows {
            let Some(error) = row.error else {
                continue;
            };
            let created = touched
                .iter()
                .find(|(collection, id, _)| doc_id(*collection, id) == row.id);
            if let Some((collection, id, true)) = created {
                if error == "conflict" {
                    return Err(StorageError::AlreadyExists {
                        collection: *collection,
                        id: id.clone(),
                    });
                }
            }
            return Err(CouchDaoError::BulkRejected {
                doc_id: row.id,
                error,
                reason: row.reason.unwrap_or_default(),
            }
            .into());
        }

        debug!(documents = count, "couch batch committed");
        Ok(())
    }
}

impl DocumentStore for CouchDocumentStore {
    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let store = self.clone();
        let key = doc_id(collection, id);
        Box::pin(async move {
            let maybe_doc = store.get_document(&key).await?;
            Ok(maybe_doc.map(|doc| doc.into_document(collection)))
        })
    }

    fn list(&self, collection: Collection) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let store = self.clone();
        Box::pin(async move { store.list_collection(collection).await.map_err(Into::into) })
    }

    fn commit(&self, batch: WriteBatch) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.commit_batch(batch).await })
    }

    fn subscribe(&self, collection: Collection) -> SnapshotStream {
        super::changes::watch(self.clone(), collection)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.url(&[])?;
            let path = url.to_string();
            let response = store
                .request(Method::GET, url)
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: path.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

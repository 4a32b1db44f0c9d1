//! MongoDB-backed history store.

use super::{strip_store_fields, HistoryRecord, HistoryStore, StoreError, ID_FIELD};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::ClientOptions,
    Client as MongoClient, Collection,
};
use std::time::Duration;

pub struct MongoHistoryStore {
    client: MongoClient,
    collection: Collection<Document>,
}

impl MongoHistoryStore {
    /// Connect and ping the deployment. The driver connects lazily, so the
    /// ping is what surfaces unreachable servers or bad credentials at start-up.
    pub async fn connect(
        uri: &str,
        database: &str,
        collection: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            StoreError::Connection(e.to_string())
        })?;
        client_options.app_name = Some("skillbridge-service".to_string());
        client_options.server_selection_timeout = Some(timeout);
        client_options.connect_timeout = Some(timeout);

        let client = MongoClient::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            StoreError::Connection(e.to_string())
        })?;

        let store = Self {
            collection: client.database(database).collection(collection),
            client,
        };
        store.health_check().await?;

        tracing::info!(
            database = %database,
            collection = %collection,
            "Connected to MongoDB history store"
        );
        Ok(store)
    }
}

#[async_trait]
impl HistoryStore for MongoHistoryStore {
    fn name(&self) -> &str {
        "mongodb"
    }

    async fn persist(&self, mut record: HistoryRecord) -> Result<String, StoreError> {
        strip_store_fields(&mut record);

        let document = mongodb::bson::to_document(&record).map_err(|e| {
            tracing::error!("Failed to encode history record: {}", e);
            StoreError::Serialization(e.to_string())
        })?;

        let result = self
            .collection
            .insert_one(document, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert history record: {}", e);
                StoreError::Operation(e.to_string())
            })?;

        Ok(match result.inserted_id {
            Bson::ObjectId(id) => id.to_hex(),
            Bson::String(id) => id,
            other => other.to_string(),
        })
    }

    async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        let cursor = self.collection.find(None, None).await.map_err(|e| {
            tracing::error!("Failed to query history records: {}", e);
            StoreError::Operation(e.to_string())
        })?;

        let documents: Vec<Document> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect history records: {}", e);
            StoreError::Operation(e.to_string())
        })?;

        Ok(documents.into_iter().filter_map(document_to_record).collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::Connection(e.to_string())
            })?;
        Ok(())
    }
}

/// Strip the store-internal id and convert to plain JSON.
fn document_to_record(mut document: Document) -> Option<HistoryRecord> {
    document.remove(ID_FIELD);
    match Bson::Document(document).into_relaxed_extjson() {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

//! Document storage.
//!
//! Entries are kept as ordered JSON text so that field order survives a
//! round trip. Each row carries a version counter; [`DocumentStore::save`]
//! only succeeds against the version that was read, which keeps concurrent
//! translations of the same entry from overwriting each other.

use crate::error::StoreError;
use crate::models::Category;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{debug, info};

/// A document as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub version: i64,
    pub body: Map<String, Value>,
}

impl StoredDocument {
    pub fn scientific_name(&self) -> &str {
        scientific_name(&self.body)
    }
}

fn scientific_name(body: &Map<String, Value>) -> &str {
    body.get("scientificName")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn document_id(body: &Map<String, Value>) -> &str {
    body.get("id").and_then(Value::as_str).unwrap_or_default()
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a category, in import order.
    async fn list(&self, category: Category) -> Result<Vec<StoredDocument>, StoreError>;

    /// Case-insensitive exact match on `scientificName`.
    async fn find_by_scientific_name(
        &self,
        category: Category,
        scientific_name: &str,
    ) -> Result<Option<StoredDocument>, StoreError>;

    async fn get(&self, category: Category, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Write `document.body` if the stored version still equals
    /// `document.version`. Returns the new version.
    async fn save(&self, category: Category, document: &StoredDocument) -> Result<i64, StoreError>;

    /// Delete every document of `category` and insert `documents`, all or
    /// nothing. Returns the number inserted.
    async fn replace_all(
        &self,
        category: Category,
        documents: &[Map<String, Value>],
    ) -> Result<usize, StoreError>;
}

// ==================== PostgreSQL ====================

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

type Row = (String, i64, String);

fn decode_row((id, version, body): Row) -> Result<StoredDocument, StoreError> {
    Ok(StoredDocument {
        id,
        version,
        body: serde_json::from_str(&body)?,
    })
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(db_err.constraint().unwrap_or("unique key").to_string());
        }
    }
    StoreError::Database(err)
}

impl PgDocumentStore {
    /// Connect and create the collection tables if they are missing.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    pub async fn init(&self) -> Result<(), StoreError> {
        for category in Category::ALL {
            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    scientific_name TEXT NOT NULL UNIQUE,
                    body TEXT NOT NULL,
                    version BIGINT NOT NULL DEFAULT 1,
                    position INTEGER NOT NULL DEFAULT 0,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )",
                category.table()
            );
            sqlx::query(&sql).execute(&self.pool).await?;
        }

        info!("Document tables ready");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn list(&self, category: Category) -> Result<Vec<StoredDocument>, StoreError> {
        let sql = format!(
            "SELECT id, version, body FROM {} ORDER BY position, id",
            category.table()
        );
        let rows: Vec<Row> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(decode_row).collect()
    }

    async fn find_by_scientific_name(
        &self,
        category: Category,
        scientific_name: &str,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let sql = format!(
            "SELECT id, version, body FROM {} WHERE lower(scientific_name) = lower($1) LIMIT 1",
            category.table()
        );
        let row: Option<Row> = sqlx::query_as(&sql)
            .bind(scientific_name)
            .fetch_optional(&self.pool)
            .await?;
        row.map(decode_row).transpose()
    }

    async fn get(&self, category: Category, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let sql = format!("SELECT id, version, body FROM {} WHERE id = $1", category.table());
        let row: Option<Row> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(decode_row).transpose()
    }

    async fn save(&self, category: Category, document: &StoredDocument) -> Result<i64, StoreError> {
        let body = serde_json::to_string(&document.body)?;
        let sql = format!(
            "UPDATE {} SET body = $1, version = version + 1, updated_at = now()
             WHERE id = $2 AND version = $3
             RETURNING version",
            category.table()
        );

        let updated: Option<i64> = sqlx::query_scalar(&sql)
            .bind(&body)
            .bind(&document.id)
            .bind(document.version)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        match updated {
            Some(version) => {
                debug!("Saved {}/{} at version {}", category, document.id, version);
                Ok(version)
            }
            None => match self.get(category, &document.id).await? {
                Some(_) => Err(StoreError::VersionConflict {
                    id: document.id.clone(),
                }),
                None => Err(StoreError::NotFound {
                    id: document.id.clone(),
                }),
            },
        }
    }

    async fn replace_all(
        &self,
        category: Category,
        documents: &[Map<String, Value>],
    ) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DELETE FROM {}", category.table()))
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "INSERT INTO {} (id, scientific_name, body, version, position, updated_at)
             VALUES ($1, $2, $3, 1, $4, now())",
            category.table()
        );

        for (position, body) in documents.iter().enumerate() {
            let json = serde_json::to_string(body)?;
            sqlx::query(&sql)
                .bind(document_id(body))
                .bind(scientific_name(body))
                .bind(&json)
                .bind(position as i32)
                .execute(&mut *tx)
                .await
                .map_err(map_write_error)?;
        }

        // Dropping the transaction on an early return rolls it back
        tx.commit().await?;

        info!("Replaced {} with {} documents", category, documents.len());
        Ok(documents.len())
    }
}

// ==================== In-memory ====================

/// Store kept in process memory, with the same uniqueness and version rules
/// as the PostgreSQL one. Used by the test suites.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<Category, Vec<StoredDocument>>>,
    saves: Mutex<usize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful [`DocumentStore::save`] calls.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|saves| *saves).unwrap_or_default()
    }

    fn with_collection<T>(
        &self,
        category: Category,
        f: impl FnOnce(&mut Vec<StoredDocument>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        // A poisoned lock only means another test thread panicked mid-write
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(collections.entry(category).or_default())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, category: Category) -> Result<Vec<StoredDocument>, StoreError> {
        self.with_collection(category, |docs| Ok(docs.clone()))
    }

    async fn find_by_scientific_name(
        &self,
        category: Category,
        name: &str,
    ) -> Result<Option<StoredDocument>, StoreError> {
        // Same folding as `lower()` in the PostgreSQL query
        let wanted = name.to_lowercase();
        self.with_collection(category, |docs| {
            Ok(docs
                .iter()
                .find(|doc| doc.scientific_name().to_lowercase() == wanted)
                .cloned())
        })
    }

    async fn get(&self, category: Category, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        self.with_collection(category, |docs| Ok(docs.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn save(&self, category: Category, document: &StoredDocument) -> Result<i64, StoreError> {
        let version = self.with_collection(category, |docs| {
            let stored = docs
                .iter_mut()
                .find(|doc| doc.id == document.id)
                .ok_or_else(|| StoreError::NotFound {
                    id: document.id.clone(),
                })?;

            if stored.version != document.version {
                return Err(StoreError::VersionConflict {
                    id: document.id.clone(),
                });
            }

            stored.body = document.body.clone();
            stored.version += 1;
            Ok(stored.version)
        })?;

        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(version)
    }

    async fn replace_all(
        &self,
        category: Category,
        documents: &[Map<String, Value>],
    ) -> Result<usize, StoreError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for body in documents {
            if !ids.insert(document_id(body)) {
                return Err(StoreError::Duplicate(format!("{}_pkey", category.table())));
            }
            if !names.insert(scientific_name(body)) {
                return Err(StoreError::Duplicate(format!(
                    "{}_scientific_name_key",
                    category.table()
                )));
            }
        }

        self.with_collection(category, |docs| {
            *docs = documents
                .iter()
                .map(|body| StoredDocument {
                    id: document_id(body).to_string(),
                    version: 1,
                    body: body.clone(),
                })
                .collect();
            Ok(docs.len())
        })
    }
}

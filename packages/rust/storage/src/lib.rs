//! Turso Embedded / libSQL storage layer (offline mode).
//!
//! The [`Storage`] struct wraps a libSQL database holding runs, their draft
//! documents with raw content, and saved pipeline versions.
//!
//! The pipeline core never touches SQL: it reads batches through
//! [`Storage::load_batch`] and callers persist results with
//! [`Storage::save_version`].

mod migrations;

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use topicflow_shared::{
    ClusterData, ClusterMember, ContentType, JsonMap, Media, PipelineConfig, ProcessingItem,
    Result, StageStats, TopTerm, TopicflowError,
};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

/// Summary numbers stored with every saved version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionStats {
    pub total_documents: usize,
    pub total_clusters: usize,
    /// Sum of stage durations, in milliseconds.
    pub total_duration: u64,
}

/// One row of a run's version history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: i64,
    pub run_id: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub stats: VersionStats,
}

/// A saved version with everything needed to show it again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedVersion {
    pub summary: VersionSummary,
    pub pipeline: PipelineConfig,
    pub stages: Vec<StageStats>,
    pub clusters: Vec<ClusterData>,
}

/// What a pipeline execution produced, borrowed for persistence.
#[derive(Debug, Clone, Copy)]
pub struct VersionRecord<'a> {
    pub pipeline: &'a PipelineConfig,
    /// Items left after the last stage.
    pub total_documents: usize,
    pub stages: &'a [StageStats],
    pub clusters: &'a [ClusterData],
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| TopicflowError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        Self::connect(db).await
    }

    /// Open a private in-memory database (tests and one-shot CLI runs).
    pub async fn open_in_memory() -> Result<Self> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(storage_err)?;
        Self::connect(db).await
    }

    async fn connect(db: Database) -> Result<Self> {
        let conn = db.connect().map_err(storage_err)?;
        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        TopicflowError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Runs and documents
    // -----------------------------------------------------------------------

    /// Store items as draft documents of `run_id`, creating the run and any
    /// missing sources. Returns the new document ids in input order.
    ///
    /// Item ids are not kept; the database assigns fresh ones.
    pub async fn import_items(&self, run_id: i64, items: &[ProcessingItem]) -> Result<Vec<i64>> {
        let now = timestamp(&Utc::now());
        let tx = self.conn.transaction().await.map_err(storage_err)?;

        tx.execute(
            "INSERT OR IGNORE INTO runs (id, created_at) VALUES (?1, ?2)",
            params![run_id, now.as_str()],
        )
        .await
        .map_err(storage_err)?;

        let mut seen_sources = HashSet::new();
        let mut ids = Vec::with_capacity(items.len());

        for item in items {
            if seen_sources.insert(item.source_id) {
                tx.execute(
                    "INSERT OR IGNORE INTO sources (id, name, created_at) VALUES (?1, ?2, ?3)",
                    params![item.source_id, item.source_name.as_str(), now.as_str()],
                )
                .await
                .map_err(storage_err)?;
            }

            let metadata = document_metadata(item);
            let metadata_json = if metadata.is_empty() {
                None
            } else {
                Some(to_json(&metadata)?)
            };

            tx.execute(
                "INSERT INTO documents (run_id, source_id, url, title, text, published_at, metadata_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    run_id,
                    item.source_id,
                    item.url.as_str(),
                    item.title.as_str(),
                    item.text.as_deref(),
                    item.published_at.as_ref().map(timestamp),
                    metadata_json,
                ],
            )
            .await
            .map_err(storage_err)?;
            let document_id = tx.last_insert_rowid();

            let media_json = match &item.media {
                Some(media) => Some(to_json(media)?),
                None => None,
            };

            tx.execute(
                "INSERT INTO raw_items (document_id, content_body, content_type, content_hash, media_json, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    document_id,
                    item.raw_content.as_str(),
                    item.content_type.as_str(),
                    content_hash(&item.raw_content),
                    media_json,
                    timestamp(&item.fetched_at),
                ],
            )
            .await
            .map_err(storage_err)?;

            ids.push(document_id);
        }

        tx.commit().await.map_err(storage_err)?;
        tracing::debug!(run_id, count = ids.len(), "imported items");
        Ok(ids)
    }

    /// Record another fetch of a document's raw content.
    pub async fn add_raw_item(
        &self,
        document_id: i64,
        content: &str,
        content_type: ContentType,
        fetched_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO raw_items (document_id, content_body, content_type, content_hash, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    document_id,
                    content,
                    content_type.as_str(),
                    content_hash(content),
                    timestamp(&fetched_at),
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Mark every draft document of a run as published. Returns the count.
    pub async fn publish_run(&self, run_id: i64) -> Result<u64> {
        self.conn
            .execute(
                "UPDATE documents SET published = 1 WHERE run_id = ?1 AND published = 0",
                params![run_id],
            )
            .await
            .map_err(storage_err)
    }

    /// Draft documents of a run as processing items, ordered by document id.
    ///
    /// Each document is joined with its source and its most recently fetched
    /// raw item; documents missing either are skipped.
    pub async fn load_batch(&self, run_id: i64, limit: Option<usize>) -> Result<Vec<ProcessingItem>> {
        // SQLite treats a negative LIMIT as "no limit"; so does a limit of 0 here.
        let limit = limit.filter(|&l| l > 0).map_or(-1, |l| l as i64);
        let rows = self
            .conn
            .query(
                "SELECT d.id, d.source_id, s.name, d.url, d.title, d.text, d.published_at, d.metadata_json,
                        r.id, r.content_body, r.content_type, r.media_json, r.fetched_at
                 FROM documents d
                 JOIN sources s ON s.id = d.source_id
                 JOIN raw_items r ON r.id = (
                     SELECT r2.id FROM raw_items r2
                     WHERE r2.document_id = d.id
                     ORDER BY r2.fetched_at DESC, r2.id DESC
                     LIMIT 1
                 )
                 WHERE d.run_id = ?1 AND d.published = 0
                 ORDER BY d.id
                 LIMIT ?2",
                params![run_id, limit],
            )
            .await
            .map_err(storage_err)?;

        let items = collect_rows(rows, row_to_item).await?;
        tracing::debug!(run_id, count = items.len(), "loaded batch");
        Ok(items)
    }

    // -----------------------------------------------------------------------
    // Versions
    // -----------------------------------------------------------------------

    /// Persist an execution result as the next immutable version of a run.
    pub async fn save_version(&self, run_id: i64, record: VersionRecord<'_>) -> Result<VersionSummary> {
        let stats = VersionStats {
            total_documents: record.total_documents,
            total_clusters: record.clusters.len(),
            total_duration: record.stages.iter().map(|s| s.duration_ms).sum(),
        };
        let created_at = Utc::now();

        let tx = self.conn.transaction().await.map_err(storage_err)?;

        let version = {
            let mut rows = tx
                .query(
                    "SELECT COALESCE(MAX(version), 0) + 1 FROM run_versions WHERE run_id = ?1",
                    params![run_id],
                )
                .await
                .map_err(storage_err)?;
            match rows.next().await {
                Ok(Some(row)) => row.get::<i64>(0).map_err(storage_err)?,
                Ok(None) => 1,
                Err(e) => return Err(storage_err(e)),
            }
        };

        tx.execute(
            "INSERT INTO run_versions (run_id, version, pipeline_json, stats_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                version,
                to_json(record.pipeline)?,
                to_json(&stats)?,
                timestamp(&created_at),
            ],
        )
        .await
        .map_err(storage_err)?;
        let version_id = tx.last_insert_rowid();

        for stage in record.stages {
            tx.execute(
                "INSERT INTO run_version_stages (version_id, stage_order, processor_id, stats_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    version_id,
                    stage.order,
                    stage.processor_id.as_str(),
                    to_json(stage)?,
                ],
            )
            .await
            .map_err(storage_err)?;
        }

        for cluster in record.clusters {
            tx.execute(
                "INSERT INTO run_version_clusters (version_id, title, mentions_count, avg_similarity, top_terms_json, members_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    version_id,
                    cluster.title.as_str(),
                    cluster.mentions_count as i64,
                    cluster.avg_similarity,
                    to_json(&cluster.top_terms)?,
                    to_json(&cluster.documents)?,
                ],
            )
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;
        tracing::info!(run_id, version, version_id, "saved pipeline version");

        Ok(VersionSummary {
            id: version_id,
            run_id,
            version,
            created_at,
            stats,
        })
    }

    /// Version history of a run, newest first.
    pub async fn list_versions(&self, run_id: i64) -> Result<Vec<VersionSummary>> {
        let rows = self
            .conn
            .query(
                "SELECT id, run_id, version, created_at, stats_json
                 FROM run_versions WHERE run_id = ?1 ORDER BY version DESC",
                params![run_id],
            )
            .await
            .map_err(storage_err)?;

        collect_rows(rows, row_to_summary).await
    }

    /// A saved version with its pipeline, stage stats and clusters.
    pub async fn load_version(&self, version_id: i64) -> Result<Option<SavedVersion>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, run_id, version, created_at, stats_json, pipeline_json
                 FROM run_versions WHERE id = ?1",
                params![version_id],
            )
            .await
            .map_err(storage_err)?;

        let (summary, pipeline) = match rows.next().await {
            Ok(Some(row)) => {
                let pipeline_json: String = row.get(5).map_err(storage_err)?;
                (row_to_summary(&row)?, from_json::<PipelineConfig>(&pipeline_json)?)
            }
            Ok(None) => return Ok(None),
            Err(e) => return Err(storage_err(e)),
        };

        let rows = self
            .conn
            .query(
                "SELECT stats_json FROM run_version_stages WHERE version_id = ?1 ORDER BY id",
                params![version_id],
            )
            .await
            .map_err(storage_err)?;
        let stages = collect_rows(rows, |row| {
            let json: String = row.get(0).map_err(storage_err)?;
            from_json::<StageStats>(&json)
        })
        .await?;

        let rows = self
            .conn
            .query(
                "SELECT title, mentions_count, avg_similarity, top_terms_json, members_json
                 FROM run_version_clusters WHERE version_id = ?1 ORDER BY id",
                params![version_id],
            )
            .await
            .map_err(storage_err)?;
        let clusters = collect_rows(rows, |row| {
            let top_terms: String = row.get(3).map_err(storage_err)?;
            let members: String = row.get(4).map_err(storage_err)?;
            Ok(ClusterData {
                title: row.get::<String>(0).map_err(storage_err)?,
                mentions_count: row.get::<i64>(1).map_err(storage_err)? as usize,
                avg_similarity: row.get::<f64>(2).map_err(storage_err)?,
                top_terms: from_json::<Vec<TopTerm>>(&top_terms)?,
                documents: from_json::<Vec<ClusterMember>>(&members)?,
            })
        })
        .await?;

        Ok(Some(SavedVersion {
            summary,
            pipeline,
            stages,
            clusters,
        }))
    }
}

fn storage_err(e: impl std::fmt::Display) -> TopicflowError {
    TopicflowError::Storage(e.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(storage_err)
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| TopicflowError::Storage(format!("invalid stored JSON: {e}")))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TopicflowError::Storage(format!("invalid date: {e}")))
}

/// SHA-256 of the raw body, hex encoded.
fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Item metadata with `author` and `language` folded in.
fn document_metadata(item: &ProcessingItem) -> JsonMap {
    let mut metadata = item.metadata.clone().unwrap_or_default();
    if let Some(author) = item.author() {
        metadata.insert("author".into(), author.into());
    }
    if let Some(language) = item.language.as_deref().filter(|l| !l.is_empty()) {
        metadata.insert("language".into(), language.into());
    }
    metadata
}

/// Convert a joined document/source/raw-item row to a [`ProcessingItem`].
fn row_to_item(row: &libsql::Row) -> Result<ProcessingItem> {
    let metadata: Option<JsonMap> = row
        .get::<String>(7)
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok());
    let meta_str = |key: &str| -> Option<String> {
        metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let content_type: String = row.get(10).map_err(storage_err)?;
    let media: Option<Media> = row
        .get::<String>(11)
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok());
    let fetched_at: String = row.get(12).map_err(storage_err)?;

    Ok(ProcessingItem {
        id: row.get::<i64>(0).map_err(storage_err)?,
        source_id: row.get::<i64>(1).map_err(storage_err)?,
        source_name: row.get::<String>(2).map_err(storage_err)?,
        url: row.get::<String>(3).map_err(storage_err)?,
        title: row.get::<String>(4).map_err(storage_err)?,
        text: row.get::<String>(5).ok(),
        author: meta_str("author"),
        language: meta_str("language"),
        published_at: match row.get::<String>(6).ok() {
            Some(s) => Some(parse_timestamp(&s)?),
            None => None,
        },
        media,
        raw_item_id: row.get::<i64>(8).map_err(storage_err)?,
        raw_content: row.get::<String>(9).map_err(storage_err)?,
        content_type: content_type.parse().map_err(TopicflowError::Storage)?,
        fetched_at: parse_timestamp(&fetched_at)?,
        metadata,
    })
}

/// Map every row, failing on the first row error instead of stopping early.
async fn collect_rows<T>(
    mut rows: libsql::Rows,
    map: impl Fn(&libsql::Row) -> Result<T>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(storage_err)? {
        out.push(map(&row)?);
    }
    Ok(out)
}

fn row_to_summary(row: &libsql::Row) -> Result<VersionSummary> {
    let created_at: String = row.get(3).map_err(storage_err)?;
    let stats: String = row.get(4).map_err(storage_err)?;
    Ok(VersionSummary {
        id: row.get::<i64>(0).map_err(storage_err)?,
        run_id: row.get::<i64>(1).map_err(storage_err)?,
        version: row.get::<i64>(2).map_err(storage_err)?,
        created_at: parse_timestamp(&created_at)?,
        stats: from_json(&stats)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use topicflow_shared::{MediaImage, PipelineStep};
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("tf_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn item(id: i64, source_id: i64, title: &str) -> ProcessingItem {
        ProcessingItem {
            id,
            source_id,
            source_name: format!("source-{source_id}"),
            url: format!("https://example.com/{id}"),
            title: title.into(),
            text: None,
            author: None,
            language: None,
            published_at: None,
            media: None,
            metadata: None,
            raw_item_id: 0,
            raw_content: format!("<p>{title}</p>"),
            content_type: ContentType::Html,
            fetched_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        assert_eq!(storage.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("tf_test_{}.db", Uuid::now_v7()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn in_memory_database() {
        let storage = Storage::open_in_memory().await.expect("open in memory");
        assert_eq!(storage.get_schema_version().await, 2);
        assert!(storage.load_batch(1, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_and_load_round_trip() {
        let storage = test_storage().await;

        let mut first = item(100, 1, "First story");
        first.text = Some("Already extracted".into());
        first.author = Some("Jane Roe".into());
        first.language = Some("en".into());
        first.published_at = Some(Utc.with_ymd_and_hms(2026, 2, 28, 8, 30, 0).unwrap());
        first.metadata = Some(json!({"channel": "tech"}).as_object().unwrap().clone());
        first.media = Some(Media {
            images: vec![MediaImage {
                url: "https://example.com/a.png".into(),
                width: Some(640),
                height: None,
            }],
            videos: vec![],
        });
        let second = item(200, 2, "Second story");

        let ids = storage
            .import_items(7, &[first.clone(), second.clone()])
            .await
            .expect("import");
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);

        let batch = storage.load_batch(7, None).await.expect("load");
        assert_eq!(batch.len(), 2);

        let loaded = &batch[0];
        assert_eq!(loaded.id, ids[0]);
        assert_eq!(loaded.source_name, "source-1");
        assert_eq!(loaded.title, "First story");
        assert_eq!(loaded.text.as_deref(), Some("Already extracted"));
        assert_eq!(loaded.author.as_deref(), Some("Jane Roe"));
        assert_eq!(loaded.language.as_deref(), Some("en"));
        assert_eq!(loaded.published_at, first.published_at);
        assert_eq!(loaded.media, first.media);
        assert_eq!(loaded.content_type, ContentType::Html);
        assert_eq!(loaded.fetched_at, first.fetched_at);
        let metadata = loaded.metadata.as_ref().unwrap();
        assert_eq!(metadata["channel"], "tech");

        let plain = &batch[1];
        assert_eq!(plain.text, None);
        assert_eq!(plain.author, None);
        assert_eq!(plain.metadata, None);
    }

    #[tokio::test]
    async fn row_error_mid_query_is_not_a_short_result() {
        let storage = Storage::open_in_memory().await.unwrap();
        // abs() of the smallest integer overflows when the third row is stepped.
        let rows = storage
            .conn
            .query(
                "WITH RECURSIVE n(v) AS (SELECT 1 UNION ALL SELECT v + 1 FROM n WHERE v < 3)
                 SELECT CASE WHEN v = 3 THEN abs(-9223372036854775807 - 1) ELSE v END FROM n",
                params![],
            )
            .await
            .unwrap();

        let err = collect_rows(rows, |row| row.get::<i64>(0).map_err(storage_err))
            .await
            .unwrap_err();
        assert!(matches!(err, TopicflowError::Storage(_)), "{err}");
    }

    #[tokio::test]
    async fn load_batch_respects_limit_and_run() {
        let storage = test_storage().await;
        let items: Vec<ProcessingItem> = (1..=5).map(|i| item(i, 1, "Story")).collect();
        storage.import_items(1, &items).await.unwrap();
        storage.import_items(2, &items[..2]).await.unwrap();

        assert_eq!(storage.load_batch(1, Some(3)).await.unwrap().len(), 3);
        assert_eq!(storage.load_batch(1, None).await.unwrap().len(), 5);
        assert_eq!(storage.load_batch(1, Some(0)).await.unwrap().len(), 5);
        assert_eq!(storage.load_batch(2, None).await.unwrap().len(), 2);
        assert!(storage.load_batch(3, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn published_documents_are_not_loaded() {
        let storage = test_storage().await;
        storage.import_items(1, &[item(1, 1, "Story")]).await.unwrap();

        assert_eq!(storage.publish_run(1).await.unwrap(), 1);
        assert!(storage.load_batch(1, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_raw_item_wins() {
        let storage = test_storage().await;
        let original = item(1, 1, "Story");
        let ids = storage.import_items(1, &[original.clone()]).await.unwrap();

        let newer = original.fetched_at + Duration::hours(1);
        let raw_id = storage
            .add_raw_item(ids[0], r#"{"text": "updated"}"#, ContentType::Json, newer)
            .await
            .unwrap();
        let older = original.fetched_at - Duration::hours(1);
        storage
            .add_raw_item(ids[0], "stale", ContentType::Text, older)
            .await
            .unwrap();

        let batch = storage.load_batch(1, None).await.unwrap();
        assert_eq!(batch[0].raw_item_id, raw_id);
        assert_eq!(batch[0].content_type, ContentType::Json);
        assert_eq!(batch[0].fetched_at, newer);
    }

    #[tokio::test]
    async fn versions_are_numbered_per_run() {
        let storage = test_storage().await;
        storage.import_items(1, &[item(1, 1, "Story")]).await.unwrap();

        let pipeline = PipelineConfig::new(vec![PipelineStep::new(10, "dedup_url")]);
        let stages = vec![StageStats {
            order: 10,
            processor_id: "dedup_url".into(),
            processor_name: "URL dedup".into(),
            items_in: 3,
            items_out: 2,
            items_removed: 1,
            clusters_created: None,
            duration_ms: 4,
            metadata: json!({"duplicatesRemoved": 1}).as_object().unwrap().clone(),
        }];
        let clusters = vec![ClusterData {
            title: "openai, gpt, model".into(),
            mentions_count: 2,
            top_terms: vec![TopTerm {
                term: "openai".into(),
                weight: 3.5,
            }],
            avg_similarity: 0.7,
            documents: vec![
                ClusterMember { id: 1, similarity: 1.0 },
                ClusterMember { id: 2, similarity: 0.7 },
            ],
        }];

        let record = VersionRecord {
            pipeline: &pipeline,
            total_documents: 2,
            stages: &stages,
            clusters: &clusters,
        };
        let v1 = storage.save_version(1, record).await.expect("save v1");
        let v2 = storage.save_version(1, record).await.expect("save v2");
        let other = storage.save_version(2, record).await.expect("save other run");

        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
        assert_eq!(other.version, 1);
        assert_eq!(
            v1.stats,
            VersionStats {
                total_documents: 2,
                total_clusters: 1,
                total_duration: 4,
            }
        );

        let history = storage.list_versions(1).await.expect("list");
        let numbers: Vec<i64> = history.iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![2, 1]);

        let saved = storage.load_version(v1.id).await.unwrap().expect("saved version");
        assert_eq!(saved.pipeline, pipeline);
        assert_eq!(saved.stages, stages);
        assert_eq!(saved.clusters, clusters);

        assert!(storage.load_version(9999).await.unwrap().is_none());
    }

    #[test]
    fn content_hash_is_hex_sha256() {
        let hash = content_hash("hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}

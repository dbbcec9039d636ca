//! SQL migration definitions for the Topicflow database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: sources, runs, documents, raw_items",
            sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS sources (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS runs (
    id         INTEGER PRIMARY KEY,
    created_at TEXT NOT NULL
);

-- Documents stay drafts (published = 0) until the run is published.
CREATE TABLE IF NOT EXISTS documents (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id        INTEGER NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    source_id     INTEGER NOT NULL REFERENCES sources(id),
    url           TEXT NOT NULL,
    title         TEXT NOT NULL,
    text          TEXT,
    published_at  TEXT,
    metadata_json TEXT,
    published     INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_documents_run ON documents(run_id, published);

CREATE TABLE IF NOT EXISTS raw_items (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id  INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    content_body TEXT NOT NULL,
    content_type TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    media_json   TEXT,
    fetched_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_raw_items_document ON raw_items(document_id, fetched_at);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Saved pipeline versions with stage stats and clusters",
            sql: r#"
CREATE TABLE IF NOT EXISTS run_versions (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id        INTEGER NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    version       INTEGER NOT NULL,
    pipeline_json TEXT NOT NULL,
    stats_json    TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    UNIQUE(run_id, version)
);

CREATE TABLE IF NOT EXISTS run_version_stages (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    version_id    INTEGER NOT NULL REFERENCES run_versions(id) ON DELETE CASCADE,
    stage_order   INTEGER NOT NULL,
    processor_id  TEXT NOT NULL,
    stats_json    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_version_stages ON run_version_stages(version_id);

CREATE TABLE IF NOT EXISTS run_version_clusters (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    version_id     INTEGER NOT NULL REFERENCES run_versions(id) ON DELETE CASCADE,
    title          TEXT NOT NULL,
    mentions_count INTEGER NOT NULL,
    avg_similarity REAL NOT NULL,
    top_terms_json TEXT NOT NULL,
    members_json   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_version_clusters ON run_version_clusters(version_id);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}

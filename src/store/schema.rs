//! Table layout of the local store.
//!
//! Every statement is `IF NOT EXISTS`, so bootstrapping an existing file is
//! a no-op.

pub(crate) const SCHEMA_DDL: &str = "
CREATE TABLE IF NOT EXISTS logical_databases (
  logical_db TEXT PRIMARY KEY,
  database_id TEXT NOT NULL,
  title_property TEXT NOT NULL,
  schema_json TEXT NOT NULL,
  synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
  record_id TEXT PRIMARY KEY,
  logical_db TEXT NOT NULL REFERENCES logical_databases(logical_db),
  database_id TEXT NOT NULL,
  title TEXT NOT NULL DEFAULT '',
  property_text TEXT NOT NULL DEFAULT '',
  plain_text TEXT NOT NULL DEFAULT '',
  text_blob TEXT NOT NULL DEFAULT '',
  properties_json TEXT NOT NULL,
  record_json TEXT NOT NULL,
  url TEXT NOT NULL DEFAULT '',
  created_time TEXT,
  last_edited_time TEXT,
  archived INTEGER NOT NULL DEFAULT 0,
  synced_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_db ON records(logical_db);
CREATE INDEX IF NOT EXISTS idx_records_title ON records(title);

CREATE TABLE IF NOT EXISTS relations (
  from_record_id TEXT NOT NULL,
  from_logical_db TEXT NOT NULL,
  property_name TEXT NOT NULL,
  to_record_id TEXT NOT NULL,
  synced_at TEXT NOT NULL,
  PRIMARY KEY (from_record_id, property_name, to_record_id)
);
CREATE INDEX IF NOT EXISTS idx_rel_from ON relations(from_record_id);
CREATE INDEX IF NOT EXISTS idx_rel_to ON relations(to_record_id);
CREATE INDEX IF NOT EXISTS idx_rel_db ON relations(from_logical_db);

CREATE TABLE IF NOT EXISTS sync_runs (
  run_id INTEGER PRIMARY KEY AUTOINCREMENT,
  status TEXT NOT NULL,
  started_at TEXT NOT NULL,
  finished_at TEXT,
  incremental INTEGER NOT NULL DEFAULT 1,
  include_content INTEGER NOT NULL DEFAULT 1,
  page_size INTEGER NOT NULL DEFAULT 100,
  database_count INTEGER NOT NULL DEFAULT 0,
  record_count INTEGER NOT NULL DEFAULT 0,
  relation_count INTEGER NOT NULL DEFAULT 0,
  changed_count INTEGER NOT NULL DEFAULT 0,
  summary TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS sync_events (
  event_id INTEGER PRIMARY KEY AUTOINCREMENT,
  run_id INTEGER NOT NULL REFERENCES sync_runs(run_id),
  logical_db TEXT NOT NULL DEFAULT '',
  step TEXT NOT NULL,
  status TEXT NOT NULL,
  message TEXT NOT NULL,
  detail_json TEXT NOT NULL DEFAULT '{}',
  created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sync_events_run ON sync_events(run_id, event_id);

CREATE TABLE IF NOT EXISTS workflow_runs (
  run_id INTEGER PRIMARY KEY AUTOINCREMENT,
  status TEXT NOT NULL,
  started_at TEXT NOT NULL,
  finished_at TEXT,
  target_count INTEGER NOT NULL DEFAULT 0,
  suggestion_count INTEGER NOT NULL DEFAULT 0,
  needs_review_count INTEGER NOT NULL DEFAULT 0,
  failure_count INTEGER NOT NULL DEFAULT 0,
  summary TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS workflow_events (
  event_id INTEGER PRIMARY KEY AUTOINCREMENT,
  run_id INTEGER NOT NULL REFERENCES workflow_runs(run_id),
  step TEXT NOT NULL,
  status TEXT NOT NULL,
  message TEXT NOT NULL,
  detail_json TEXT NOT NULL DEFAULT '{}',
  created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_workflow_events_run ON workflow_events(run_id, event_id);

CREATE TABLE IF NOT EXISTS agent_suggestions (
  suggestion_id INTEGER PRIMARY KEY AUTOINCREMENT,
  run_id INTEGER NOT NULL,
  error_record_id TEXT NOT NULL UNIQUE,
  error_title TEXT NOT NULL,
  status TEXT NOT NULL,
  confidence REAL,
  proposed_title TEXT,
  proposed_resource_id TEXT,
  proposed_concept_id TEXT,
  proposed_skill_id TEXT,
  proposed_mindset_id TEXT,
  proposed_similar_ids_json TEXT NOT NULL DEFAULT '[]',
  reasoning_summary TEXT NOT NULL DEFAULT '',
  validation_notes TEXT NOT NULL DEFAULT '',
  source_snapshot_json TEXT NOT NULL,
  candidates_json TEXT NOT NULL,
  model_response_json TEXT NOT NULL,
  reviewer_note TEXT NOT NULL DEFAULT '',
  failure_reason TEXT NOT NULL DEFAULT '',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL,
  reviewed_at TEXT,
  applied_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_suggestions_status ON agent_suggestions(status, updated_at);
CREATE INDEX IF NOT EXISTS idx_suggestions_run ON agent_suggestions(run_id);

CREATE TABLE IF NOT EXISTS knowledge_runs (
  run_id INTEGER PRIMARY KEY AUTOINCREMENT,
  status TEXT NOT NULL,
  started_at TEXT NOT NULL,
  finished_at TEXT,
  target_count INTEGER NOT NULL DEFAULT 0,
  suggestion_count INTEGER NOT NULL DEFAULT 0,
  needs_review_count INTEGER NOT NULL DEFAULT 0,
  failure_count INTEGER NOT NULL DEFAULT 0,
  summary TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS knowledge_events (
  event_id INTEGER PRIMARY KEY AUTOINCREMENT,
  run_id INTEGER NOT NULL REFERENCES knowledge_runs(run_id),
  step TEXT NOT NULL,
  status TEXT NOT NULL,
  message TEXT NOT NULL,
  detail_json TEXT NOT NULL DEFAULT '{}',
  created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_knowledge_events_run ON knowledge_events(run_id, event_id);

CREATE TABLE IF NOT EXISTS knowledge_suggestions (
  suggestion_id INTEGER PRIMARY KEY AUTOINCREMENT,
  run_id INTEGER NOT NULL,
  logical_db TEXT NOT NULL,
  record_id TEXT NOT NULL,
  record_title TEXT NOT NULL,
  lesson_code TEXT NOT NULL DEFAULT '',
  source_doc_path TEXT NOT NULL DEFAULT '',
  source_refs_json TEXT NOT NULL DEFAULT '[]',
  status TEXT NOT NULL,
  confidence REAL,
  proposed_markdown TEXT NOT NULL,
  reasoning_summary TEXT NOT NULL DEFAULT '',
  validation_notes TEXT NOT NULL DEFAULT '',
  source_snapshot_json TEXT NOT NULL,
  model_response_json TEXT NOT NULL,
  reviewer_note TEXT NOT NULL DEFAULT '',
  failure_reason TEXT NOT NULL DEFAULT '',
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL,
  reviewed_at TEXT,
  applied_at TEXT,
  UNIQUE(logical_db, record_id)
);
CREATE INDEX IF NOT EXISTS idx_knowledge_suggestions_status ON knowledge_suggestions(status, updated_at);
CREATE INDEX IF NOT EXISTS idx_knowledge_suggestions_run ON knowledge_suggestions(run_id);
";

// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100; block-children listings always use it.
pub const NOTION_API_PAGE_SIZE: u32 = 100;

/// How many blocks a single append-children call may carry.
pub const BLOCK_APPEND_CHUNK_SIZE: usize = 50;

/// Per-request transport timeout unless the config file overrides it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Attempts per gateway call, including the first.
pub const RETRY_MAX_ATTEMPTS: u32 = 5;

/// Pause before the second attempt. Each later pause doubles.
pub const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Sync defaults
// ---------------------------------------------------------------------------

/// Characters of body text kept per record.
pub const DEFAULT_CONTENT_MAX_CHARS: usize = 1600;

/// Block-tree depth visited when extracting body text.
pub const DEFAULT_CONTENT_MAX_DEPTH: usize = 2;

/// Records processed between progress log lines.
pub const SYNC_PROGRESS_INTERVAL: usize = 50;

/// Changed-record summaries kept in one `database_synced` event.
pub const CHANGED_RECORDS_EVENT_CAP: usize = 200;

// ---------------------------------------------------------------------------
// Local store
// ---------------------------------------------------------------------------

/// Attempts to open the store while SQLite reports it busy or locked.
pub const STORE_OPEN_ATTEMPTS: u32 = 20;

/// Pause between store open attempts.
pub const STORE_OPEN_RETRY_DELAY: Duration = Duration::from_millis(150);

/// How long a statement waits on a locked database before failing.
pub const STORE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Ids per `IN (...)` clause when reading edit times back.
pub const STORE_ID_BATCH_SIZE: usize = 500;

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 500;

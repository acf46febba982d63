use std::collections::HashSet;

use rusqlite::Connection;

use crate::store::StoreError;

/// Stamp written into every saved row. Bump when the projected column
/// layout changes; older rows stay readable and are found via the
/// current-schema query filter instead of a migration pass.
pub const LATEST_SCHEMA_VERSION: i32 = 6;

/// Projected columns added to the item table one at a time, so a store
/// created by any earlier version picks up only what it is missing.
const ITEM_COLUMNS: &[(&str, &str)] = &[
    ("path", "TEXT"),
    ("start_date", "INTEGER"),
    ("end_date", "INTEGER"),
    ("channel_id", "TEXT"),
    ("is_kids", "INTEGER"),
    ("is_movie", "INTEGER"),
    ("is_sports", "INTEGER"),
    ("community_rating", "REAL"),
    ("custom_rating", "TEXT"),
    ("index_number", "INTEGER"),
    ("is_locked", "INTEGER"),
    ("name", "TEXT"),
    ("official_rating", "TEXT"),
    ("media_type", "TEXT"),
    ("overview", "TEXT"),
    ("parent_index_number", "INTEGER"),
    ("premiere_date", "INTEGER"),
    ("production_year", "INTEGER"),
    ("parent_id", "TEXT"),
    ("genres", "TEXT"),
    ("parental_rating_value", "INTEGER"),
    ("schema_version", "INTEGER"),
    ("sort_name", "TEXT"),
    ("run_time_ticks", "INTEGER"),
    ("official_rating_description", "TEXT"),
    ("home_page_url", "TEXT"),
    ("vote_count", "INTEGER"),
    ("display_media_type", "TEXT"),
    ("date_created", "INTEGER"),
    ("date_modified", "INTEGER"),
    ("forced_sort_name", "TEXT"),
    ("is_offline", "INTEGER"),
];

/// Bring a database up to the current layout. Safe on an empty file and on
/// a store created by any earlier version: tables are IF NOT EXISTS,
/// columns are added individually and skipped when already present, and
/// indices are created last so they can cover late-added columns.
pub(crate) fn initialize(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA temp_store = memory;

        CREATE TABLE IF NOT EXISTS media_items (
            guid TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            data BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS children_ids (
            parent_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            PRIMARY KEY (parent_id, item_id)
        );

        CREATE TABLE IF NOT EXISTS people (
            item_id TEXT NOT NULL,
            name TEXT NOT NULL,
            role TEXT,
            person_type TEXT,
            sort_order INTEGER,
            list_order INTEGER
        );
        ",
    )
    .map_err(|e| StoreError::Storage(format!("create tables: {}", e)))?;

    let existing = existing_columns(conn, "media_items")?;
    for (name, decl) in ITEM_COLUMNS {
        if existing.contains(*name) {
            continue;
        }
        conn.execute(
            &format!("ALTER TABLE media_items ADD COLUMN {} {}", name, decl),
            [],
        )
        .map_err(|e| StoreError::Storage(format!("add column {}: {}", name, e)))?;
    }

    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_media_items_type ON media_items(type);
        CREATE INDEX IF NOT EXISTS idx_media_items_parent ON media_items(parent_id);
        CREATE INDEX IF NOT EXISTS idx_children_ids ON children_ids(parent_id, item_id);
        CREATE INDEX IF NOT EXISTS idx_people_item ON people(item_id);
        CREATE INDEX IF NOT EXISTS idx_people_name ON people(name);
        ",
    )
    .map_err(|e| StoreError::Storage(format!("create indices: {}", e)))?;

    Ok(())
}

fn existing_columns(conn: &Connection, table: &str) -> Result<HashSet<String>, StoreError> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(|e| StoreError::Storage(format!("table_info: {}", e)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| StoreError::Storage(format!("table_info: {}", e)))?
        .collect::<Result<HashSet<String>, _>>()
        .map_err(|e| StoreError::Storage(format!("table_info: {}", e)))?;
    Ok(columns)
}

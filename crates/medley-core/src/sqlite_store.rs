use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use uuid::Uuid;

use crate::cancel::CancellationToken;
use crate::codec::ItemCodec;
use crate::entity::{Entity, ItemId, ItemKind};
use crate::people::PersonInfo;
use crate::query::{ItemsQuery, PeopleQuery, QueryResult};
use crate::registry::TypeRegistry;
use crate::schema::{self, LATEST_SCHEMA_VERSION};
use crate::sql_query::{bind_args, compile_items_query, compile_people_query};
use crate::store::{ItemRepository, StoreError};

const RETRIEVE_COLUMNS: &str = "type, data, is_offline";

const SAVE_ITEM_SQL: &str = "REPLACE INTO media_items (
    guid, type, data, path, start_date, end_date, channel_id,
    is_kids, is_movie, is_sports, community_rating, custom_rating,
    index_number, is_locked, name, official_rating, media_type, overview,
    parent_index_number, premiere_date, production_year, parent_id, genres,
    parental_rating_value, schema_version, sort_name, run_time_ticks,
    official_rating_description, home_page_url, vote_count,
    display_media_type, date_created, date_modified, forced_sort_name,
    is_offline
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// SQLite-backed implementation of the ItemRepository contract.
///
/// The connection is not safe for concurrent write transactions, so every
/// mutation first acquires `write_lock` (the write section) and only then
/// opens its transaction; the guard releases on every exit path. Reads
/// take only the connection lock.
pub struct SqliteItemRepository {
    conn: Mutex<Option<Connection>>,
    write_lock: Mutex<()>,
    codec: Arc<dyn ItemCodec>,
    registry: TypeRegistry,
    disposed: AtomicBool,
}

impl SqliteItemRepository {
    /// Open (or create) a database at the given path and bring its schema
    /// up to date.
    pub fn open(path: impl AsRef<Path>, codec: Arc<dyn ItemCodec>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Storage(format!("open: {}", e)))?;
        Self::init_with_connection(conn, codec)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory(codec: Arc<dyn ItemCodec>) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("open_in_memory: {}", e)))?;
        Self::init_with_connection(conn, codec)
    }

    fn init_with_connection(
        conn: Connection,
        codec: Arc<dyn ItemCodec>,
    ) -> Result<Self, StoreError> {
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            write_lock: Mutex::new(()),
            codec,
            registry: TypeRegistry::new(),
            disposed: AtomicBool::new(false),
        })
    }

    /// Mark the store closed and release the connection. Callers racing a
    /// write wait here for it to finish; every later call fails fast with
    /// `Disposed`.
    pub fn close(&self) {
        self.disposed.store(true, Ordering::SeqCst);

        let _write = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut guard = match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(conn) = guard.take() {
            if let Err((_, e)) = conn.close() {
                tracing::error!(error = %e, "error closing database");
            }
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.disposed.load(Ordering::SeqCst) {
            Err(StoreError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Reconstruct an entity from its tag, payload, and overlay columns.
    /// Unknown tags and corrupt payloads yield `None` so scans can skip
    /// the row instead of failing.
    fn decode_row(&self, tag: &str, data: &[u8], is_offline: Option<bool>) -> Option<Entity> {
        let kind = match self.registry.resolve(tag) {
            Some(kind) => kind,
            None => {
                tracing::debug!(tag, "unknown item type");
                return None;
            }
        };
        let mut entity = match self.codec.deserialize(data, kind) {
            Ok(entity) => entity,
            Err(e) => {
                tracing::error!(error = %e, tag, "error deserializing item payload");
                return None;
            }
        };
        // The overlay only adds state the payload does not carry.
        if let Some(is_offline) = is_offline {
            entity.common_mut().is_offline = is_offline;
        }
        Some(entity)
    }

    /// Write one item's row: payload plus every projected column,
    /// recomputed from current entity state. Optional fields bind as NULL.
    fn bind_save(conn: &Connection, codec: &dyn ItemCodec, item: &Entity) -> Result<(), StoreError> {
        let common = item.common();
        let data = codec.serialize(item)?;
        let attributes = item.program_attributes();

        conn.execute(
            SAVE_ITEM_SQL,
            params![
                item.id().to_string(),
                item.kind().tag(),
                data,
                common.path,
                item.start_date().map(|d| d.timestamp_millis()),
                common.end_date.map(|d| d.timestamp_millis()),
                common.channel_id,
                attributes.map(|a| a.is_kids),
                attributes.map(|a| a.is_movie),
                attributes.map(|a| a.is_sports),
                common.community_rating,
                common.custom_rating,
                common.index_number,
                common.is_locked,
                common.name,
                common.official_rating,
                common.media_type,
                common.overview,
                common.parent_index_number,
                common.premiere_date.map(|d| d.timestamp_millis()),
                common.production_year,
                common.parent_id.map(|p| p.to_string()),
                common.genres.join("|"),
                common.parental_rating_value(),
                LATEST_SCHEMA_VERSION,
                common.sort_name,
                common.run_time_ticks,
                common.official_rating_description,
                common.home_page_url,
                common.vote_count,
                common.display_media_type,
                common.date_created.map(|d| d.timestamp_millis()),
                common.date_modified.map(|d| d.timestamp_millis()),
                common.forced_sort_name,
                common.is_offline,
            ],
        )
        .map_err(|e| storage("save item", e))?;

        Ok(())
    }
}

fn storage(context: &str, e: rusqlite::Error) -> StoreError {
    StoreError::Storage(format!("{}: {}", context, e))
}

fn lock_error<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Storage(format!("lock poisoned: {}", e))
}

impl ItemRepository for SqliteItemRepository {
    fn save_item(&self, item: &Entity, token: &CancellationToken) -> Result<(), StoreError> {
        self.save_items(std::slice::from_ref(item), token)
    }

    fn save_items(&self, items: &[Entity], token: &CancellationToken) -> Result<(), StoreError> {
        for item in items {
            if item.id().is_nil() {
                return Err(StoreError::InvalidArgument("item id must not be nil"));
            }
        }
        token.check()?;
        self.ensure_open()?;

        let _write = self.write_lock.lock().map_err(lock_error)?;
        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| storage("begin tx", e))?;

        let result = (|| {
            for item in items {
                token.check()?;
                Self::bind_save(&tx, self.codec.as_ref(), item)?;
            }
            tx.commit().map_err(|e| storage("commit", e))
        })();

        if let Err(e) = &result {
            if !matches!(e, StoreError::Cancelled) {
                tracing::error!(error = %e, "failed to save items");
            }
        }
        result
    }

    fn retrieve_item(&self, id: ItemId) -> Result<Option<Entity>, StoreError> {
        if id.is_nil() {
            return Err(StoreError::InvalidArgument("id must not be nil"));
        }
        self.ensure_open()?;

        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM media_items WHERE guid = :guid",
                RETRIEVE_COLUMNS
            ))
            .map_err(|e| storage("prepare retrieve", e))?;

        let id_text = id.to_string();
        let row = stmt
            .query_row(&[(":guid", &id_text as &dyn ToSql)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, Option<bool>>(2)?,
                ))
            })
            .optional()
            .map_err(|e| storage("retrieve", e))?;

        Ok(row.and_then(|(tag, data, is_offline)| self.decode_row(&tag, &data, is_offline)))
    }

    fn delete_item(&self, id: ItemId, token: &CancellationToken) -> Result<(), StoreError> {
        if id.is_nil() {
            return Err(StoreError::InvalidArgument("id must not be nil"));
        }
        token.check()?;
        self.ensure_open()?;

        let _write = self.write_lock.lock().map_err(lock_error)?;
        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| storage("begin tx", e))?;

        let id_text = id.to_string();
        let result = (|| {
            tx.execute(
                "DELETE FROM children_ids WHERE parent_id = ?1",
                params![id_text],
            )
            .map_err(|e| storage("delete children", e))?;
            tx.execute("DELETE FROM people WHERE item_id = ?1", params![id_text])
                .map_err(|e| storage("delete people", e))?;
            tx.execute("DELETE FROM media_items WHERE guid = ?1", params![id_text])
                .map_err(|e| storage("delete item", e))?;
            tx.commit().map_err(|e| storage("commit", e))
        })();

        if let Err(e) = &result {
            if !matches!(e, StoreError::Cancelled) {
                tracing::error!(error = %e, "failed to delete item");
            }
        }
        result
    }

    fn items_of_kind(
        &self,
        kind: ItemKind,
    ) -> Result<Box<dyn Iterator<Item = Result<Entity, StoreError>> + '_>, StoreError> {
        self.ensure_open()?;
        Ok(Box::new(ItemScan {
            store: self,
            tag: kind.tag(),
            last_rowid: 0,
            buffer: VecDeque::new(),
            finished: false,
        }))
    }

    fn get_items(&self, query: &ItemsQuery) -> Result<QueryResult<Entity>, StoreError> {
        self.ensure_open()?;
        let compiled = compile_items_query(query, &self.registry, Utc::now())?;
        let args = bind_args(&compiled.params);

        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;

        let sql = format!(
            "SELECT {} FROM media_items{}{}{}",
            RETRIEVE_COLUMNS, compiled.where_text, compiled.order_text, compiled.limit_text
        );
        tracing::debug!(%sql, "items query");

        let mut items = Vec::new();
        {
            let mut stmt = conn.prepare(&sql).map_err(|e| storage("prepare query", e))?;
            let mut rows = stmt
                .query(args.as_slice())
                .map_err(|e| storage("query", e))?;
            while let Some(row) = rows.next().map_err(|e| storage("row", e))? {
                let tag: String = row.get(0).map_err(|e| storage("row type", e))?;
                let data: Vec<u8> = row.get(1).map_err(|e| storage("row data", e))?;
                let is_offline: Option<bool> =
                    row.get(2).map_err(|e| storage("row is_offline", e))?;
                if let Some(entity) = self.decode_row(&tag, &data, is_offline) {
                    items.push(entity);
                }
            }
        }

        let count_sql = format!(
            "SELECT COUNT(guid) FROM media_items{}",
            compiled.where_text_without_paging
        );
        let total: i64 = conn
            .query_row(&count_sql, args.as_slice(), |row| row.get(0))
            .map_err(|e| storage("count", e))?;

        Ok(QueryResult {
            items,
            total_record_count: total as usize,
        })
    }

    fn get_item_ids(&self, query: &ItemsQuery) -> Result<QueryResult<ItemId>, StoreError> {
        self.ensure_open()?;
        let compiled = compile_items_query(query, &self.registry, Utc::now())?;
        let args = bind_args(&compiled.params);

        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;

        let sql = format!(
            "SELECT guid FROM media_items{}{}{}",
            compiled.where_text, compiled.order_text, compiled.limit_text
        );
        tracing::debug!(%sql, "item ids query");

        let ids = collect_ids(conn, &sql, args.as_slice())?;

        let count_sql = format!(
            "SELECT COUNT(guid) FROM media_items{}",
            compiled.where_text_without_paging
        );
        let total: i64 = conn
            .query_row(&count_sql, args.as_slice(), |row| row.get(0))
            .map_err(|e| storage("count", e))?;

        Ok(QueryResult {
            items: ids,
            total_record_count: total as usize,
        })
    }

    fn get_item_id_list(&self, query: &ItemsQuery) -> Result<Vec<ItemId>, StoreError> {
        self.ensure_open()?;
        let compiled = compile_items_query(query, &self.registry, Utc::now())?;
        let args = bind_args(&compiled.params);

        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;

        let sql = format!(
            "SELECT guid FROM media_items{}{}{}",
            compiled.where_text, compiled.order_text, compiled.limit_text
        );
        collect_ids(conn, &sql, args.as_slice())
    }

    fn save_children(
        &self,
        parent_id: ItemId,
        children: &[ItemId],
        token: &CancellationToken,
    ) -> Result<(), StoreError> {
        if parent_id.is_nil() {
            return Err(StoreError::InvalidArgument("parent id must not be nil"));
        }
        token.check()?;
        self.ensure_open()?;

        let _write = self.write_lock.lock().map_err(lock_error)?;
        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| storage("begin tx", e))?;

        let parent_text = parent_id.to_string();
        let result = (|| {
            // Full replace: the edge set for a parent is never patched.
            tx.execute(
                "DELETE FROM children_ids WHERE parent_id = ?1",
                params![parent_text],
            )
            .map_err(|e| storage("delete children", e))?;

            for child in children {
                token.check()?;
                tx.execute(
                    "REPLACE INTO children_ids (parent_id, item_id) VALUES (?1, ?2)",
                    params![parent_text, child.to_string()],
                )
                .map_err(|e| storage("save child", e))?;
            }
            tx.commit().map_err(|e| storage("commit", e))
        })();

        if let Err(e) = &result {
            if !matches!(e, StoreError::Cancelled) {
                tracing::error!(error = %e, "failed to save children");
            }
        }
        result
    }

    fn get_children(&self, parent_id: ItemId) -> Result<Vec<ItemId>, StoreError> {
        if parent_id.is_nil() {
            return Err(StoreError::InvalidArgument("parent id must not be nil"));
        }
        self.ensure_open()?;

        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;
        let parent_text = parent_id.to_string();
        collect_ids(
            conn,
            "SELECT item_id FROM children_ids WHERE parent_id = :parent_id",
            &[(":parent_id", &parent_text as &dyn ToSql)],
        )
    }

    fn get_children_items(&self, parent_id: ItemId) -> Result<Vec<Entity>, StoreError> {
        if parent_id.is_nil() {
            return Err(StoreError::InvalidArgument("parent id must not be nil"));
        }
        self.ensure_open()?;

        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;

        let sql = format!(
            "SELECT {} FROM media_items WHERE guid IN \
             (SELECT item_id FROM children_ids WHERE parent_id = :parent_id)",
            RETRIEVE_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| storage("prepare children items", e))?;
        let parent_text = parent_id.to_string();
        let mut rows = stmt
            .query(&[(":parent_id", &parent_text as &dyn ToSql)])
            .map_err(|e| storage("children items", e))?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().map_err(|e| storage("row", e))? {
            let tag: String = row.get(0).map_err(|e| storage("row type", e))?;
            let data: Vec<u8> = row.get(1).map_err(|e| storage("row data", e))?;
            let is_offline: Option<bool> = row.get(2).map_err(|e| storage("row is_offline", e))?;
            if let Some(entity) = self.decode_row(&tag, &data, is_offline) {
                items.push(entity);
            }
        }
        Ok(items)
    }

    fn update_people(
        &self,
        item_id: ItemId,
        people: &[PersonInfo],
        token: &CancellationToken,
    ) -> Result<(), StoreError> {
        if item_id.is_nil() {
            return Err(StoreError::InvalidArgument("item id must not be nil"));
        }
        for person in people {
            if person.name.trim().is_empty() {
                return Err(StoreError::InvalidArgument("person name must not be empty"));
            }
        }
        token.check()?;
        self.ensure_open()?;

        let _write = self.write_lock.lock().map_err(lock_error)?;
        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| storage("begin tx", e))?;

        let item_text = item_id.to_string();
        let result = (|| {
            tx.execute("DELETE FROM people WHERE item_id = ?1", params![item_text])
                .map_err(|e| storage("delete people", e))?;

            // list_order reflects input order and is always dense from 0,
            // regardless of what the caller put in the field.
            for (list_order, person) in people.iter().enumerate() {
                token.check()?;
                tx.execute(
                    "INSERT INTO people (item_id, name, role, person_type, sort_order, list_order) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        item_text,
                        person.name,
                        person.role,
                        person.person_type,
                        person.sort_order,
                        list_order as i64,
                    ],
                )
                .map_err(|e| storage("save person", e))?;
            }
            tx.commit().map_err(|e| storage("commit", e))
        })();

        if let Err(e) = &result {
            if !matches!(e, StoreError::Cancelled) {
                tracing::error!(error = %e, "failed to save people");
            }
        }
        result
    }

    fn get_people(&self, query: &PeopleQuery) -> Result<Vec<PersonInfo>, StoreError> {
        self.ensure_open()?;
        let builder = compile_people_query(query);
        let args = bind_args(builder.params());

        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;

        let sql = format!(
            "SELECT item_id, name, role, person_type, sort_order, list_order FROM people{} \
             ORDER BY list_order",
            builder.where_text()
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| storage("prepare people", e))?;
        let mut rows = stmt
            .query(args.as_slice())
            .map_err(|e| storage("people", e))?;

        let mut people = Vec::new();
        while let Some(row) = rows.next().map_err(|e| storage("row", e))? {
            let item_text: String = row.get(0).map_err(|e| storage("row item_id", e))?;
            let item_id = match Uuid::parse_str(&item_text) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping person row with malformed item id");
                    continue;
                }
            };
            people.push(PersonInfo {
                item_id,
                name: row.get(1).map_err(|e| storage("row name", e))?,
                role: row.get(2).map_err(|e| storage("row role", e))?,
                person_type: row.get(3).map_err(|e| storage("row person_type", e))?,
                sort_order: row.get(4).map_err(|e| storage("row sort_order", e))?,
                list_order: row.get(5).map_err(|e| storage("row list_order", e))?,
            });
        }
        Ok(people)
    }

    fn get_people_names(&self, query: &PeopleQuery) -> Result<Vec<String>, StoreError> {
        self.ensure_open()?;
        let builder = compile_people_query(query);
        let args = bind_args(builder.params());

        let guard = self.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;

        let sql = format!(
            "SELECT name FROM people{} GROUP BY name ORDER BY MIN(list_order)",
            builder.where_text()
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| storage("prepare people names", e))?;
        let names = stmt
            .query_map(args.as_slice(), |row| row.get(0))
            .map_err(|e| storage("people names", e))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| storage("collect people names", e))?;
        Ok(names)
    }
}

fn collect_ids(
    conn: &Connection,
    sql: &str,
    args: &[(&str, &dyn ToSql)],
) -> Result<Vec<ItemId>, StoreError> {
    let mut stmt = conn.prepare(sql).map_err(|e| storage("prepare ids", e))?;
    let mut rows = stmt.query(args).map_err(|e| storage("ids", e))?;

    let mut ids = Vec::new();
    while let Some(row) = rows.next().map_err(|e| storage("row", e))? {
        let text: String = row.get(0).map_err(|e| storage("row id", e))?;
        match Uuid::parse_str(&text) {
            Ok(id) => ids.push(id),
            Err(e) => tracing::warn!(error = %e, "skipping row with malformed id"),
        }
    }
    Ok(ids)
}

const SCAN_BATCH: usize = 100;

/// Forward-only, non-restartable enumeration of every item of one kind.
///
/// Rows are fetched in rowid-keyed batches so the scan never holds the
/// connection lock while the caller processes an element; rows that fail
/// to decode are logged and skipped without ending the scan.
pub struct ItemScan<'a> {
    store: &'a SqliteItemRepository,
    tag: &'static str,
    last_rowid: i64,
    buffer: VecDeque<Entity>,
    finished: bool,
}

impl ItemScan<'_> {
    /// Fetch the next batch into the buffer. Returns false once the table
    /// has no rows past the cursor.
    fn refill(&mut self) -> Result<bool, StoreError> {
        self.store.ensure_open()?;
        let guard = self.store.conn.lock().map_err(lock_error)?;
        let conn = guard.as_ref().ok_or(StoreError::Disposed)?;

        let sql = format!(
            "SELECT rowid, {} FROM media_items WHERE type = :type AND rowid > :rowid \
             ORDER BY rowid LIMIT :batch",
            RETRIEVE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(|e| storage("prepare scan", e))?;

        let tag = self.tag;
        let after = self.last_rowid;
        let batch = SCAN_BATCH as i64;
        let mut rows = stmt
            .query(&[
                (":type", &tag as &dyn ToSql),
                (":rowid", &after),
                (":batch", &batch),
            ])
            .map_err(|e| storage("scan", e))?;

        let mut fetched = false;
        while let Some(row) = rows.next().map_err(|e| storage("row", e))? {
            fetched = true;
            self.last_rowid = row.get(0).map_err(|e| storage("row rowid", e))?;
            let tag: String = row.get(1).map_err(|e| storage("row type", e))?;
            let data: Vec<u8> = row.get(2).map_err(|e| storage("row data", e))?;
            let is_offline: Option<bool> = row.get(3).map_err(|e| storage("row is_offline", e))?;
            if let Some(entity) = self.store.decode_row(&tag, &data, is_offline) {
                self.buffer.push_back(entity);
            }
        }
        Ok(fetched)
    }
}

impl Iterator for ItemScan<'_> {
    type Item = Result<Entity, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entity) = self.buffer.pop_front() {
                return Some(Ok(entity));
            }
            if self.finished {
                return None;
            }
            match self.refill() {
                // A batch may decode to nothing when every row was skipped.
                Ok(true) => continue,
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, JsonCodec};
    use crate::entity::{
        Channel, ItemCommon, Movie, Program, ProgramAttributes, Recording,
    };
    use crate::people::person_type;
    use crate::query::SortOrder;
    use chrono::Duration;
    use std::collections::HashSet;

    fn open_store() -> SqliteItemRepository {
        SqliteItemRepository::open_in_memory(Arc::new(JsonCodec)).unwrap()
    }

    fn movie(name: &str, genres: &[&str]) -> Entity {
        Entity::Movie(Movie {
            common: ItemCommon {
                id: Uuid::new_v4(),
                name: Some(name.into()),
                genres: genres.iter().map(|g| (*g).to_string()).collect(),
                ..Default::default()
            },
        })
    }

    fn token() -> CancellationToken {
        CancellationToken::new()
    }

    #[test]
    fn save_and_retrieve_round_trip() {
        let store = open_store();
        let mut entity = movie("Arrival", &["Sci-Fi", "Drama"]);
        {
            let common = entity.common_mut();
            common.official_rating = Some("PG-13".into());
            common.production_year = Some(2016);
            common.run_time_ticks = Some(69_600_000_000);
            common.premiere_date = Some(Utc::now());
        }
        store.save_item(&entity, &token()).unwrap();

        let got = store.retrieve_item(entity.id()).unwrap().unwrap();
        assert_eq!(got, entity);
    }

    #[test]
    fn retrieve_missing_is_none() {
        let store = open_store();
        assert!(store.retrieve_item(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn nil_id_is_a_caller_error() {
        let store = open_store();
        assert!(matches!(
            store.retrieve_item(Uuid::nil()),
            Err(StoreError::InvalidArgument(_))
        ));

        let mut entity = movie("No Id", &[]);
        entity.common_mut().id = Uuid::nil();
        assert!(matches!(
            store.save_item(&entity, &token()),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn save_twice_is_one_row() {
        let store = open_store();
        let mut entity = movie("Alien", &["Horror"]);
        store.save_item(&entity, &token()).unwrap();

        entity.common_mut().production_year = Some(1979);
        store.save_item(&entity, &token()).unwrap();

        let result = store.get_items(&ItemsQuery::default()).unwrap();
        assert_eq!(result.total_record_count, 1);
        assert_eq!(
            result.items[0].common().production_year,
            Some(1979)
        );
    }

    #[test]
    fn is_offline_overlays_after_deserialization() {
        let store = open_store();
        let mut entity = movie("Offline Movie", &[]);
        entity.common_mut().is_offline = true;
        store.save_item(&entity, &token()).unwrap();

        let got = store.retrieve_item(entity.id()).unwrap().unwrap();
        assert!(got.common().is_offline);
    }

    #[test]
    fn delete_cascades_to_associations() {
        let store = open_store();
        let parent = movie("Boxed Set", &[]);
        let parent_id = parent.id();
        store.save_item(&parent, &token()).unwrap();
        store
            .save_children(parent_id, &[Uuid::new_v4(), Uuid::new_v4()], &token())
            .unwrap();
        store
            .update_people(
                parent_id,
                &[PersonInfo {
                    item_id: parent_id,
                    name: "Denis Villeneuve".into(),
                    person_type: Some(person_type::DIRECTOR.into()),
                    ..Default::default()
                }],
                &token(),
            )
            .unwrap();

        store.delete_item(parent_id, &token()).unwrap();

        assert!(store.retrieve_item(parent_id).unwrap().is_none());
        assert!(store.get_children(parent_id).unwrap().is_empty());
        let people = store
            .get_people(&PeopleQuery {
                item_id: Some(parent_id),
                ..Default::default()
            })
            .unwrap();
        assert!(people.is_empty());
    }

    #[test]
    fn delete_missing_is_a_no_op() {
        let store = open_store();
        store.delete_item(Uuid::new_v4(), &token()).unwrap();
    }

    #[test]
    fn children_replace_is_atomic() {
        let store = open_store();
        let parent = Uuid::new_v4();
        let (a, b, c, d) = (
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );

        store.save_children(parent, &[a, b, c], &token()).unwrap();
        store.save_children(parent, &[d], &token()).unwrap();

        let children: HashSet<ItemId> =
            store.get_children(parent).unwrap().into_iter().collect();
        assert_eq!(children, HashSet::from([d]));
    }

    #[test]
    fn children_items_hydrate() {
        let store = open_store();
        let parent = Uuid::new_v4();
        let x = movie("X", &[]);
        let y = movie("Y", &[]);
        store.save_items(&[x.clone(), y.clone()], &token()).unwrap();
        store
            .save_children(parent, &[x.id(), y.id()], &token())
            .unwrap();

        let items = store.get_children_items(parent).unwrap();
        let names: HashSet<Option<String>> =
            items.iter().map(|i| i.common().name.clone()).collect();
        assert_eq!(
            names,
            HashSet::from([Some("X".to_string()), Some("Y".to_string())])
        );
    }

    #[test]
    fn people_replace_assigns_dense_list_order() {
        let store = open_store();
        let item_id = Uuid::new_v4();
        let people = vec![
            PersonInfo {
                item_id,
                name: "Amy Adams".into(),
                role: Some("Louise Banks".into()),
                person_type: Some(person_type::ACTOR.into()),
                sort_order: Some(40),
                list_order: Some(99),
            },
            PersonInfo {
                item_id,
                name: "Jeremy Renner".into(),
                person_type: Some(person_type::ACTOR.into()),
                sort_order: Some(10),
                ..Default::default()
            },
            PersonInfo {
                item_id,
                name: "Denis Villeneuve".into(),
                person_type: Some(person_type::DIRECTOR.into()),
                ..Default::default()
            },
        ];
        store.update_people(item_id, &people, &token()).unwrap();

        let got = store
            .get_people(&PeopleQuery {
                item_id: Some(item_id),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(got.len(), 3);
        let orders: Vec<Option<i32>> = got.iter().map(|p| p.list_order).collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(got[0].name, "Amy Adams");
        assert_eq!(got[0].sort_order, Some(40));

        // Replace leaves no residue.
        store
            .update_people(
                item_id,
                &[PersonInfo {
                    item_id,
                    name: "Johann Johannsson".into(),
                    person_type: Some(person_type::COMPOSER.into()),
                    ..Default::default()
                }],
                &token(),
            )
            .unwrap();
        let got = store
            .get_people(&PeopleQuery {
                item_id: Some(item_id),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "Johann Johannsson");
        assert_eq!(got[0].list_order, Some(0));
    }

    #[test]
    fn empty_person_name_is_a_caller_error() {
        let store = open_store();
        let err = store
            .update_people(
                Uuid::new_v4(),
                &[PersonInfo {
                    name: "  ".into(),
                    ..Default::default()
                }],
                &token(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn people_filters() {
        let store = open_store();
        let film_a = Uuid::new_v4();
        let film_b = Uuid::new_v4();
        store
            .update_people(
                film_a,
                &[
                    PersonInfo {
                        item_id: film_a,
                        name: "Amy Adams".into(),
                        person_type: Some(person_type::ACTOR.into()),
                        ..Default::default()
                    },
                    PersonInfo {
                        item_id: film_a,
                        name: "Denis Villeneuve".into(),
                        person_type: Some(person_type::DIRECTOR.into()),
                        ..Default::default()
                    },
                ],
                &token(),
            )
            .unwrap();
        store
            .update_people(
                film_b,
                &[
                    PersonInfo {
                        item_id: film_b,
                        name: "Amy Adams".into(),
                        person_type: Some(person_type::ACTOR.into()),
                        ..Default::default()
                    },
                    PersonInfo {
                        item_id: film_b,
                        name: "David O. Russell".into(),
                        person_type: Some(person_type::DIRECTOR.into()),
                        ..Default::default()
                    },
                ],
                &token(),
            )
            .unwrap();

        let actors = store
            .get_people(&PeopleQuery {
                item_id: Some(film_a),
                person_types: vec![person_type::ACTOR.into()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].name, "Amy Adams");

        let non_directors = store
            .get_people(&PeopleQuery {
                item_id: Some(film_a),
                exclude_person_types: vec![person_type::DIRECTOR.into()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(non_directors.len(), 1);

        // Every credit, anywhere, for the names attached to film A.
        let appearances = store
            .get_people(&PeopleQuery {
                appears_in_item_id: Some(film_a),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(appearances.len(), 3);
        assert!(appearances
            .iter()
            .all(|p| p.name == "Amy Adams" || p.name == "Denis Villeneuve"));
        assert!(appearances.iter().any(|p| p.item_id == film_b));

        let names = store
            .get_people_names(&PeopleQuery {
                name_contains: Some("Adams".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(names, vec!["Amy Adams".to_string()]);
    }

    #[test]
    fn genre_query_scenario() {
        let store = open_store();
        let arrival = movie("Arrival", &["Sci-Fi"]);
        let alien = movie("Alien", &["Horror"]);
        store
            .save_items(&[arrival.clone(), alien], &token())
            .unwrap();

        let result = store
            .get_items(&ItemsQuery {
                include_item_types: vec!["Movie".into()],
                genres: vec!["Sci-Fi".into()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.total_record_count, 1);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id(), arrival.id());
    }

    #[test]
    fn recording_category_expands() {
        let store = open_store();
        let audio = Entity::AudioRecording(Recording {
            common: ItemCommon {
                id: Uuid::new_v4(),
                name: Some("Radio Hour".into()),
                ..Default::default()
            },
            ..Default::default()
        });
        let video = Entity::VideoRecording(Recording {
            common: ItemCommon {
                id: Uuid::new_v4(),
                name: Some("Game Replay".into()),
                ..Default::default()
            },
            ..Default::default()
        });
        let noise = movie("Not A Recording", &[]);
        store
            .save_items(&[audio, video, noise], &token())
            .unwrap();

        let result = store
            .get_items(&ItemsQuery {
                include_item_types: vec!["Recording".into()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.total_record_count, 2);
    }

    #[test]
    fn airing_window_filter() {
        let store = open_store();
        let now = Utc::now();
        let mut on_air = Program {
            attributes: ProgramAttributes::default(),
            start_date: Some(now - Duration::minutes(10)),
            ..Default::default()
        };
        on_air.common.id = Uuid::new_v4();
        on_air.common.name = Some("Live Now".into());
        on_air.common.end_date = Some(now + Duration::minutes(20));

        let mut finished = Program {
            start_date: Some(now - Duration::hours(3)),
            ..Default::default()
        };
        finished.common.id = Uuid::new_v4();
        finished.common.name = Some("Earlier".into());
        finished.common.end_date = Some(now - Duration::hours(2));

        store
            .save_items(
                &[Entity::Program(on_air), Entity::Program(finished)],
                &token(),
            )
            .unwrap();

        let airing = store
            .get_items(&ItemsQuery {
                is_airing: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(airing.items.len(), 1);
        assert_eq!(
            airing.items[0].common().name,
            Some("Live Now".to_string())
        );

        let off_air = store
            .get_items(&ItemsQuery {
                is_airing: Some(false),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(off_air.items.len(), 1);
        assert_eq!(
            off_air.items[0].common().name,
            Some("Earlier".to_string())
        );
    }

    #[test]
    fn program_flags_project_from_attributes() {
        let store = open_store();
        let mut kids_movie = Program::default();
        kids_movie.common.id = Uuid::new_v4();
        kids_movie.attributes = ProgramAttributes {
            is_movie: true,
            is_kids: true,
            is_sports: false,
        };
        let mut sports = Program::default();
        sports.common.id = Uuid::new_v4();
        sports.attributes = ProgramAttributes {
            is_movie: false,
            is_kids: false,
            is_sports: true,
        };
        store
            .save_items(
                &[Entity::Program(kids_movie.clone()), Entity::Program(sports)],
                &token(),
            )
            .unwrap();

        let result = store
            .get_item_ids(&ItemsQuery {
                is_kids: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.items, vec![kids_movie.common.id]);
    }

    #[test]
    fn channel_filter() {
        let store = open_store();
        let mut seven = Channel::default();
        seven.common.id = Uuid::new_v4();
        seven.common.channel_id = Some("ch-7".into());
        let mut nine = Channel::default();
        nine.common.id = Uuid::new_v4();
        nine.common.channel_id = Some("ch-9".into());
        store
            .save_items(
                &[Entity::Channel(seven.clone()), Entity::Channel(nine.clone())],
                &token(),
            )
            .unwrap();

        let one = store
            .get_item_ids(&ItemsQuery {
                channel_ids: vec!["ch-7".into()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(one.items, vec![seven.common.id]);

        let both = store
            .get_item_ids(&ItemsQuery {
                channel_ids: vec!["ch-7".into(), "ch-9".into()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(both.total_record_count, 2);
    }

    #[test]
    fn person_filter_on_items() {
        let store = open_store();
        let with_amy = movie("Arrival", &[]);
        let without = movie("Alien", &[]);
        store
            .save_items(&[with_amy.clone(), without.clone()], &token())
            .unwrap();
        store
            .update_people(
                with_amy.id(),
                &[PersonInfo {
                    item_id: with_amy.id(),
                    name: "Amy Adams".into(),
                    person_type: Some(person_type::ACTOR.into()),
                    ..Default::default()
                }],
                &token(),
            )
            .unwrap();

        let result = store
            .get_item_ids(&ItemsQuery {
                person: Some("Amy Adams".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.items, vec![with_amy.id()]);
    }

    #[test]
    fn parental_rating_ceiling_lets_unrated_pass() {
        let store = open_store();
        let mut pg = movie("Family Film", &[]);
        pg.common_mut().official_rating = Some("PG".into());
        let mut mature = movie("Late Night", &[]);
        mature.common_mut().official_rating = Some("TV-MA".into());
        let unrated = movie("Home Video", &[]);
        store
            .save_items(&[pg.clone(), mature, unrated.clone()], &token())
            .unwrap();

        let result = store
            .get_item_ids(&ItemsQuery {
                max_parental_rating: Some(2),
                sort_by: vec!["name".into()],
                ..Default::default()
            })
            .unwrap();
        let ids: HashSet<ItemId> = result.items.into_iter().collect();
        assert_eq!(ids, HashSet::from([pg.id(), unrated.id()]));

        let rated_only = store
            .get_item_ids(&ItemsQuery {
                has_parental_rating: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rated_only.total_record_count, 2);
    }

    #[test]
    fn dead_parent_detection() {
        let store = open_store();
        let parent = movie("Parent", &[]);
        let mut attached = movie("Attached", &[]);
        attached.common_mut().parent_id = Some(parent.id());
        let mut orphan = movie("Orphan", &[]);
        orphan.common_mut().parent_id = Some(Uuid::new_v4());
        store
            .save_items(&[parent, attached, orphan.clone()], &token())
            .unwrap();

        let result = store
            .get_item_ids(&ItemsQuery {
                has_dead_parent_id: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.items, vec![orphan.id()]);
    }

    #[test]
    fn schema_version_filter() {
        let store = open_store();
        let current = movie("Fresh", &[]);
        let stale = movie("Stale", &[]);
        store
            .save_items(&[current.clone(), stale.clone()], &token())
            .unwrap();

        {
            let guard = store.conn.lock().unwrap();
            let conn = guard.as_ref().unwrap();
            conn.execute(
                "UPDATE media_items SET schema_version = 1 WHERE guid = ?1",
                params![stale.id().to_string()],
            )
            .unwrap();
        }

        let fresh = store
            .get_item_ids(&ItemsQuery {
                is_current_schema: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(fresh.items, vec![current.id()]);

        let outdated = store
            .get_item_ids(&ItemsQuery {
                is_current_schema: Some(false),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(outdated.items, vec![stale.id()]);
    }

    #[test]
    fn pages_union_to_the_unpaged_set() {
        let store = open_store();
        let items: Vec<Entity> = (0..10)
            .map(|i| movie(&format!("Item{}", i), &[]))
            .collect();
        store.save_items(&items, &token()).unwrap();

        let unpaged = store
            .get_item_ids(&ItemsQuery {
                sort_by: vec!["name".into()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(unpaged.items.len(), 10);

        let mut collected = Vec::new();
        for offset in (0..10).step_by(3) {
            let page = store
                .get_item_ids(&ItemsQuery {
                    sort_by: vec!["name".into()],
                    limit: Some(3),
                    start_index: Some(offset),
                    ..Default::default()
                })
                .unwrap();
            assert_eq!(page.total_record_count, 10);
            collected.extend(page.items);
        }

        assert_eq!(collected, unpaged.items);
        let unique: HashSet<ItemId> = collected.iter().copied().collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn limit_keeps_full_count() {
        let store = open_store();
        let items: Vec<Entity> = (0..7).map(|i| movie(&format!("M{}", i), &[])).collect();
        store.save_items(&items, &token()).unwrap();

        let result = store
            .get_items(&ItemsQuery {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.total_record_count, 7);
    }

    #[test]
    fn sort_descending() {
        let store = open_store();
        let mut older = movie("Older", &[]);
        older.common_mut().production_year = Some(1979);
        let mut newer = movie("Newer", &[]);
        newer.common_mut().production_year = Some(2016);
        store
            .save_items(&[older.clone(), newer.clone()], &token())
            .unwrap();

        let result = store
            .get_item_ids(&ItemsQuery {
                sort_by: vec!["production_year".into()],
                sort_order: SortOrder::Descending,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.items, vec![newer.id(), older.id()]);
    }

    #[test]
    fn unknown_sort_field_fails() {
        let store = open_store();
        let err = store
            .get_items(&ItemsQuery {
                sort_by: vec!["favorite_color".into()],
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSortField(_)));
    }

    #[test]
    fn scan_yields_every_item_of_kind() {
        let store = open_store();
        let items: Vec<Entity> = (0..250)
            .map(|i| movie(&format!("Bulk{}", i), &[]))
            .collect();
        store.save_items(&items, &token()).unwrap();
        store
            .save_item(
                &Entity::Channel(Channel {
                    common: ItemCommon {
                        id: Uuid::new_v4(),
                        ..Default::default()
                    },
                    number: None,
                }),
                &token(),
            )
            .unwrap();

        let scanned: Vec<Entity> = store
            .items_of_kind(ItemKind::Movie)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(scanned.len(), 250);
    }

    #[test]
    fn scan_skips_undecodable_rows() {
        let store = open_store();
        let good = movie("Good", &[]);
        store.save_item(&good, &token()).unwrap();

        {
            let guard = store.conn.lock().unwrap();
            let conn = guard.as_ref().unwrap();
            conn.execute(
                "INSERT INTO media_items (guid, type, data) VALUES (?1, 'Movie', x'deadbeef')",
                params![Uuid::new_v4().to_string()],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO media_items (guid, type, data) VALUES (?1, 'Mystery', x'00')",
                params![Uuid::new_v4().to_string()],
            )
            .unwrap();
        }

        let scanned: Vec<Entity> = store
            .items_of_kind(ItemKind::Movie)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].id(), good.id());

        // The bogus rows do not break unfiltered queries either.
        let result = store.get_items(&ItemsQuery::default()).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.total_record_count, 3);
    }

    #[test]
    fn disposed_store_fails_fast() {
        let store = open_store();
        let entity = movie("Too Late", &[]);
        store.close();

        assert!(matches!(
            store.save_item(&entity, &token()),
            Err(StoreError::Disposed)
        ));
        assert!(matches!(
            store.retrieve_item(Uuid::new_v4()),
            Err(StoreError::Disposed)
        ));
        assert!(matches!(
            store.get_items(&ItemsQuery::default()),
            Err(StoreError::Disposed)
        ));
    }

    #[test]
    fn pre_cancelled_token_saves_nothing() {
        let store = open_store();
        let cancelled = CancellationToken::new();
        cancelled.cancel();

        let err = store
            .save_items(&[movie("A", &[]), movie("B", &[])], &cancelled)
            .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
        assert_eq!(
            store.get_items(&ItemsQuery::default()).unwrap().total_record_count,
            0
        );
    }

    /// Codec wrapper that trips the shared token after the first payload it
    /// encodes, cancelling a batch save from the inside.
    struct TrippingCodec {
        inner: JsonCodec,
        token: CancellationToken,
        serialized: AtomicBool,
    }

    impl ItemCodec for TrippingCodec {
        fn serialize(&self, entity: &Entity) -> Result<Vec<u8>, CodecError> {
            if self.serialized.swap(true, Ordering::SeqCst) {
                self.token.cancel();
            }
            self.inner.serialize(entity)
        }

        fn deserialize(&self, data: &[u8], kind: ItemKind) -> Result<Entity, CodecError> {
            self.inner.deserialize(data, kind)
        }
    }

    #[test]
    fn mid_batch_cancellation_rolls_back_everything() {
        let shared = CancellationToken::new();
        let store = SqliteItemRepository::open_in_memory(Arc::new(TrippingCodec {
            inner: JsonCodec,
            token: shared.clone(),
            serialized: AtomicBool::new(false),
        }))
        .unwrap();

        let err = store
            .save_items(
                &[movie("First", &[]), movie("Second", &[]), movie("Third", &[])],
                &shared,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));

        // Nothing from the batch is observable.
        let count = store
            .get_items(&ItemsQuery::default())
            .unwrap()
            .total_record_count;
        assert_eq!(count, 0);
    }

    #[test]
    fn concurrent_batches_never_interleave_into_corruption() {
        let store = Arc::new(open_store());
        let items: Vec<Entity> = (0..40).map(|i| movie(&format!("C{}", i), &[])).collect();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = Arc::clone(&store);
            let batch = items.clone();
            handles.push(std::thread::spawn(move || {
                store.save_items(&batch, &CancellationToken::new()).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let result = store.get_items(&ItemsQuery::default()).unwrap();
        assert_eq!(result.total_record_count, 40);
    }

    #[test]
    fn reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.db");

        let entity = movie("Persistent", &["Drama"]);
        {
            let store = SqliteItemRepository::open(&path, Arc::new(JsonCodec)).unwrap();
            store.save_item(&entity, &token()).unwrap();
            store.close();
        }

        let store = SqliteItemRepository::open(&path, Arc::new(JsonCodec)).unwrap();
        let got = store.retrieve_item(entity.id()).unwrap().unwrap();
        assert_eq!(got, entity);
    }

    #[test]
    fn name_contains_filter() {
        let store = open_store();
        store
            .save_items(
                &[movie("The Arrival Protocol", &[]), movie("Alien", &[])],
                &token(),
            )
            .unwrap();

        let result = store
            .get_items(&ItemsQuery {
                name_contains: Some("Arrival".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(
            result.items[0].common().name,
            Some("The Arrival Protocol".to_string())
        );
    }
}

use crate::cancel::CancellationToken;
use crate::codec::CodecError;
use crate::entity::{Entity, ItemId, ItemKind};
use crate::people::PersonInfo;
use crate::query::{ItemsQuery, PeopleQuery, QueryResult};

/// The item repository contract implemented by storage backends.
///
/// Mutating methods take a cancellation token and are serialized through
/// the backend's write section; a cancelled or failed mutation rolls back
/// entirely. Read methods run outside the write section and may observe
/// either side of an in-flight write.
pub trait ItemRepository: Send + Sync {
    /// Upsert a single item.
    fn save_item(&self, item: &Entity, token: &CancellationToken) -> Result<(), StoreError>;

    /// Upsert a batch of items in one transaction.
    fn save_items(&self, items: &[Entity], token: &CancellationToken) -> Result<(), StoreError>;

    /// Point lookup by id. A missing row is `Ok(None)`.
    fn retrieve_item(&self, id: ItemId) -> Result<Option<Entity>, StoreError>;

    /// Delete an item and its association rows. Missing ids are a no-op.
    fn delete_item(&self, id: ItemId, token: &CancellationToken) -> Result<(), StoreError>;

    /// Lazily enumerate every item of one kind. Rows that fail to decode
    /// are skipped; an engine failure ends the sequence with one `Err`.
    fn items_of_kind(
        &self,
        kind: ItemKind,
    ) -> Result<Box<dyn Iterator<Item = Result<Entity, StoreError>> + '_>, StoreError>;

    /// Run a filtered/sorted/paged query, hydrating each row.
    fn get_items(&self, query: &ItemsQuery) -> Result<QueryResult<Entity>, StoreError>;

    /// Same predicate and paging as `get_items`, ids only.
    fn get_item_ids(&self, query: &ItemsQuery) -> Result<QueryResult<ItemId>, StoreError>;

    /// Ids without the total count.
    fn get_item_id_list(&self, query: &ItemsQuery) -> Result<Vec<ItemId>, StoreError>;

    /// Atomically replace the child set of a parent.
    fn save_children(
        &self,
        parent_id: ItemId,
        children: &[ItemId],
        token: &CancellationToken,
    ) -> Result<(), StoreError>;

    fn get_children(&self, parent_id: ItemId) -> Result<Vec<ItemId>, StoreError>;

    fn get_children_items(&self, parent_id: ItemId) -> Result<Vec<Entity>, StoreError>;

    /// Atomically replace the people credited on an item. List order is
    /// reassigned densely from zero in input order.
    fn update_people(
        &self,
        item_id: ItemId,
        people: &[PersonInfo],
        token: &CancellationToken,
    ) -> Result<(), StoreError>;

    fn get_people(&self, query: &PeopleQuery) -> Result<Vec<PersonInfo>, StoreError>;

    fn get_people_names(&self, query: &PeopleQuery) -> Result<Vec<String>, StoreError>;
}

/// Errors from the item store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Caller-contract violation, raised before any engine interaction.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The store has been closed; the connection is no longer touched.
    #[error("Store has been closed")]
    Disposed,

    /// The caller's cancellation token tripped; the transaction was
    /// rolled back.
    #[error("Operation cancelled")]
    Cancelled,

    /// A sort field that is not a projected column.
    #[error("Unknown sort field: {0}")]
    InvalidSortField(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<CodecError> for StoreError {
    fn from(e: CodecError) -> Self {
        StoreError::Codec(e.to_string())
    }
}

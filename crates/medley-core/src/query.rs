use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::ItemId;

/// Sort direction, applied uniformly to every field in `sort_by`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// A structured query against the item table.
///
/// Every populated filter contributes one conjunctive clause. Type lists
/// hold category names and are expanded through the `TypeRegistry` before
/// compilation. `sort_by` entries are projected-column names; an unknown
/// name is a caller error, not silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsQuery {
    pub is_current_schema: Option<bool>,
    pub is_movie: Option<bool>,
    pub is_kids: Option<bool>,
    pub is_sports: Option<bool>,
    pub include_item_types: Vec<String>,
    pub exclude_item_types: Vec<String>,
    pub channel_ids: Vec<String>,
    pub min_start_date: Option<DateTime<Utc>>,
    pub max_start_date: Option<DateTime<Utc>>,
    pub min_end_date: Option<DateTime<Utc>>,
    pub max_end_date: Option<DateTime<Utc>>,
    /// start ≤ now ≤ end when true; outside that window when false.
    pub is_airing: Option<bool>,
    /// Items credited to this person name.
    pub person: Option<String>,
    pub name_contains: Option<String>,
    /// Substring matches against the delimited genre list, OR-combined.
    pub genres: Vec<String>,
    /// Unrated items pass this ceiling.
    pub max_parental_rating: Option<i32>,
    pub has_parental_rating: Option<bool>,
    /// Items whose parent id no longer resolves to a row.
    pub has_dead_parent_id: Option<bool>,
    pub sort_by: Vec<String>,
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
    pub start_index: Option<usize>,
}

/// A page of results plus the total count of the unpaged predicate.
///
/// The page and the count run as two separate statements; under a
/// concurrent write the count may drift from the page contents, which is
/// accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    pub total_record_count: usize,
}

/// A query against the person-association table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeopleQuery {
    pub item_id: Option<ItemId>,
    /// People who appear together with the people of this item.
    pub appears_in_item_id: Option<ItemId>,
    pub person_types: Vec<String>,
    pub exclude_person_types: Vec<String>,
    pub max_list_order: Option<i32>,
    pub name_contains: Option<String>,
}

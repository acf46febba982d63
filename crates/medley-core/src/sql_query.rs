use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::ToSql;

use crate::query::{ItemsQuery, PeopleQuery, SortOrder};
use crate::registry::TypeRegistry;
use crate::schema::LATEST_SCHEMA_VERSION;
use crate::store::StoreError;

/// Column names accepted in `ItemsQuery::sort_by`. Everything projected
/// out of the payload, plus the key columns themselves.
pub(crate) const ITEM_SORT_COLUMNS: &[&str] = &[
    "guid",
    "type",
    "path",
    "start_date",
    "end_date",
    "channel_id",
    "is_kids",
    "is_movie",
    "is_sports",
    "community_rating",
    "custom_rating",
    "index_number",
    "is_locked",
    "name",
    "official_rating",
    "media_type",
    "overview",
    "parent_index_number",
    "premiere_date",
    "production_year",
    "parent_id",
    "genres",
    "parental_rating_value",
    "schema_version",
    "sort_name",
    "run_time_ticks",
    "official_rating_description",
    "home_page_url",
    "vote_count",
    "display_media_type",
    "date_created",
    "date_modified",
    "forced_sort_name",
    "is_offline",
];

/// Accumulates conjunctive clause text together with the named parameters
/// it references, so the two can never drift apart. `bind` records a value
/// and hands back the `:placeholder` to splice into the clause.
pub(crate) struct ClauseBuilder {
    clauses: Vec<String>,
    params: Vec<(String, SqlValue)>,
}

impl ClauseBuilder {
    pub(crate) fn new() -> Self {
        Self {
            clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, clause: impl Into<String>) {
        self.clauses.push(clause.into());
    }

    pub(crate) fn bind(&mut self, name: &str, value: SqlValue) -> String {
        let placeholder = format!(":{}", name);
        self.params.push((placeholder.clone(), value));
        placeholder
    }

    pub(crate) fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub(crate) fn where_text(&self) -> String {
        where_text_of(&self.clauses)
    }

    pub(crate) fn params(&self) -> &[(String, SqlValue)] {
        &self.params
    }
}

pub(crate) fn where_text_of(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

/// Borrow compiled parameters in the shape rusqlite binds by name.
pub(crate) fn bind_args(params: &[(String, SqlValue)]) -> Vec<(&str, &dyn ToSql)> {
    params
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

/// An items query lowered to SQL fragments. The paged WHERE embeds the
/// unpaged one in its anti-join subquery, referencing the same named
/// parameters, so one parameter set serves both texts. The count statement
/// uses the unpaged WHERE with the identical parameters.
#[derive(Debug)]
pub(crate) struct CompiledItemsQuery {
    pub where_text: String,
    pub where_text_without_paging: String,
    pub order_text: String,
    pub limit_text: String,
    pub params: Vec<(String, SqlValue)>,
}

pub(crate) fn compile_items_query(
    query: &ItemsQuery,
    registry: &TypeRegistry,
    now: DateTime<Utc>,
) -> Result<CompiledItemsQuery, StoreError> {
    let mut b = ClauseBuilder::new();

    if let Some(current) = query.is_current_schema {
        let p = b.bind(
            "schema_version",
            SqlValue::Integer(LATEST_SCHEMA_VERSION as i64),
        );
        if current {
            b.push(format!(
                "(schema_version IS NOT NULL AND schema_version = {})",
                p
            ));
        } else {
            b.push(format!(
                "(schema_version IS NULL OR schema_version <> {})",
                p
            ));
        }
    }

    if let Some(v) = query.is_movie {
        let p = b.bind("is_movie", SqlValue::Integer(i64::from(v)));
        b.push(format!("is_movie = {}", p));
    }
    if let Some(v) = query.is_kids {
        let p = b.bind("is_kids", SqlValue::Integer(i64::from(v)));
        b.push(format!("is_kids = {}", p));
    }
    if let Some(v) = query.is_sports {
        let p = b.bind("is_sports", SqlValue::Integer(i64::from(v)));
        b.push(format!("is_sports = {}", p));
    }

    let include: Vec<String> = query
        .include_item_types
        .iter()
        .flat_map(|t| registry.expand(t))
        .collect();
    push_string_set(&mut b, "type", "include_type", &include, false);

    let exclude: Vec<String> = query
        .exclude_item_types
        .iter()
        .flat_map(|t| registry.expand(t))
        .collect();
    push_string_set(&mut b, "type", "exclude_type", &exclude, true);

    push_string_set(&mut b, "channel_id", "channel_id", &query.channel_ids, false);

    if let Some(d) = query.min_start_date {
        let p = b.bind("min_start_date", SqlValue::Integer(d.timestamp_millis()));
        b.push(format!("start_date >= {}", p));
    }
    if let Some(d) = query.max_start_date {
        let p = b.bind("max_start_date", SqlValue::Integer(d.timestamp_millis()));
        b.push(format!("start_date <= {}", p));
    }
    if let Some(d) = query.min_end_date {
        let p = b.bind("min_end_date", SqlValue::Integer(d.timestamp_millis()));
        b.push(format!("end_date >= {}", p));
    }
    if let Some(d) = query.max_end_date {
        let p = b.bind("max_end_date", SqlValue::Integer(d.timestamp_millis()));
        b.push(format!("end_date <= {}", p));
    }

    if let Some(airing) = query.is_airing {
        let p = b.bind("airing_now", SqlValue::Integer(now.timestamp_millis()));
        if airing {
            b.push(format!("start_date <= {}", p));
            b.push(format!("end_date >= {}", p));
        } else {
            b.push(format!("(start_date > {p} OR end_date < {p})", p = p));
        }
    }

    if let Some(person) = query.person.as_deref().filter(|p| !p.trim().is_empty()) {
        let p = b.bind("person_name", SqlValue::Text(person.to_string()));
        b.push(format!(
            "guid IN (SELECT item_id FROM people WHERE name = {})",
            p
        ));
    }

    if let Some(name) = query
        .name_contains
        .as_deref()
        .filter(|n| !n.trim().is_empty())
    {
        let p = b.bind("name_contains", SqlValue::Text(format!("%{}%", name)));
        b.push(format!("name LIKE {}", p));
    }

    if !query.genres.is_empty() {
        let mut parts = Vec::with_capacity(query.genres.len());
        for (index, genre) in query.genres.iter().enumerate() {
            let p = b.bind(
                &format!("genre{}", index),
                SqlValue::Text(format!("%{}%", genre)),
            );
            parts.push(format!("genres LIKE {}", p));
        }
        b.push(format!("({})", parts.join(" OR ")));
    }

    if let Some(ceiling) = query.max_parental_rating {
        let p = b.bind("max_parental_rating", SqlValue::Integer(ceiling as i64));
        b.push(format!(
            "(parental_rating_value IS NULL OR parental_rating_value <= {})",
            p
        ));
    }

    if let Some(rated) = query.has_parental_rating {
        if rated {
            b.push("parental_rating_value IS NOT NULL");
        } else {
            b.push("parental_rating_value IS NULL");
        }
    }

    if query.has_dead_parent_id == Some(true) {
        b.push("(parent_id IS NOT NULL AND parent_id NOT IN (SELECT guid FROM media_items))");
    }

    let order_text = compile_order_by(&query.sort_by, query.sort_order)?;
    let where_text_without_paging = b.where_text();

    // Paging excludes the ids the preceding pages would return under the
    // same predicate and sort, rather than skipping rows positionally. The
    // subquery reuses the named parameters already bound above.
    let where_text = match query.start_index.filter(|offset| *offset > 0) {
        Some(offset) => {
            let mut clauses = b.clauses().to_vec();
            clauses.push(format!(
                "guid NOT IN (SELECT guid FROM media_items{}{} LIMIT {})",
                where_text_without_paging, order_text, offset
            ));
            where_text_of(&clauses)
        }
        None => where_text_without_paging.clone(),
    };

    let limit_text = match query.limit {
        Some(limit) => format!(" LIMIT {}", limit),
        None => String::new(),
    };

    Ok(CompiledItemsQuery {
        where_text,
        where_text_without_paging,
        order_text,
        limit_text,
        params: b.params,
    })
}

fn compile_order_by(sort_by: &[String], order: SortOrder) -> Result<String, StoreError> {
    if sort_by.is_empty() {
        return Ok(String::new());
    }
    let direction = match order {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    };
    let mut parts = Vec::with_capacity(sort_by.len());
    for field in sort_by {
        if !ITEM_SORT_COLUMNS.contains(&field.as_str()) {
            return Err(StoreError::InvalidSortField(field.clone()));
        }
        parts.push(format!("{} {}", field, direction));
    }
    Ok(format!(" ORDER BY {}", parts.join(", ")))
}

pub(crate) fn compile_people_query(query: &PeopleQuery) -> ClauseBuilder {
    let mut b = ClauseBuilder::new();

    if let Some(item_id) = query.item_id {
        let p = b.bind("item_id", SqlValue::Text(item_id.to_string()));
        b.push(format!("item_id = {}", p));
    }

    if let Some(appears_in) = query.appears_in_item_id {
        let p = b.bind("appears_in_item_id", SqlValue::Text(appears_in.to_string()));
        b.push(format!(
            "name IN (SELECT name FROM people WHERE item_id = {})",
            p
        ));
    }

    push_string_set(
        &mut b,
        "person_type",
        "person_type",
        &query.person_types,
        false,
    );
    push_string_set(
        &mut b,
        "person_type",
        "exclude_person_type",
        &query.exclude_person_types,
        true,
    );

    if let Some(ceiling) = query.max_list_order {
        let p = b.bind("max_list_order", SqlValue::Integer(ceiling as i64));
        b.push(format!("list_order <= {}", p));
    }

    if let Some(name) = query
        .name_contains
        .as_deref()
        .filter(|n| !n.trim().is_empty())
    {
        let p = b.bind("person_name_contains", SqlValue::Text(format!("%{}%", name)));
        b.push(format!("name LIKE {}", p));
    }

    b
}

/// One value binds as equality (or inequality when negated); several bind
/// as an IN (or NOT IN) group with one parameter per value.
fn push_string_set(
    b: &mut ClauseBuilder,
    column: &str,
    param_prefix: &str,
    values: &[String],
    negate: bool,
) {
    match values.len() {
        0 => {}
        1 => {
            let p = b.bind(param_prefix, SqlValue::Text(values[0].clone()));
            let op = if negate { "<>" } else { "=" };
            b.push(format!("{} {} {}", column, op, p));
        }
        _ => {
            let placeholders: Vec<String> = values
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    b.bind(
                        &format!("{}{}", param_prefix, index),
                        SqlValue::Text(value.clone()),
                    )
                })
                .collect();
            let op = if negate { "NOT IN" } else { "IN" };
            b.push(format!("{} {} ({})", column, op, placeholders.join(", ")));
        }
    }
}

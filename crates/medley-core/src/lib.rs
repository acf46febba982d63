pub mod cancel;
pub mod codec;
pub mod entity;
pub mod external;
pub mod people;
pub mod query;
pub mod registry;
pub mod reviews;
pub mod schema;
pub mod sql_query;
pub mod sqlite_store;
pub mod store;

pub use cancel::CancellationToken;
pub use codec::{CodecError, ItemCodec, JsonCodec};
pub use entity::*;
pub use external::*;
pub use people::*;
pub use query::*;
pub use registry::TypeRegistry;
pub use reviews::{CriticReviewStore, ItemReview};
pub use schema::LATEST_SCHEMA_VERSION;
pub use sqlite_store::{ItemScan, SqliteItemRepository};
pub use store::{ItemRepository, StoreError};

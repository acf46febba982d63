use serde::{Deserialize, Serialize};

use crate::entity::ItemId;

/// Well-known person type strings.
pub mod person_type {
    pub const ACTOR: &str = "Actor";
    pub const DIRECTOR: &str = "Director";
    pub const WRITER: &str = "Writer";
    pub const PRODUCER: &str = "Producer";
    pub const COMPOSER: &str = "Composer";
    pub const GUEST_STAR: &str = "GuestStar";
    pub const CONDUCTOR: &str = "Conductor";
    pub const LYRICIST: &str = "Lyricist";
}

/// A person credited on an item.
///
/// `sort_order` is caller-supplied semantic rank; `list_order` is the
/// zero-based input position the store assigns on write, so whatever the
/// caller puts there is ignored by `update_people`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonInfo {
    pub item_id: ItemId,
    pub name: String,
    pub role: Option<String>,
    pub person_type: Option<String>,
    pub sort_order: Option<i32>,
    pub list_order: Option<i32>,
}

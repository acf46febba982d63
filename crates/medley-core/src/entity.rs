use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique item identifier.
pub type ItemId = Uuid;

/// Metadata shared by every library entity.
///
/// These are the fields the store projects into queryable columns on every
/// save. Domain-specific state lives on the variant structs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemCommon {
    pub id: ItemId,
    pub name: Option<String>,
    pub path: Option<String>,
    pub sort_name: Option<String>,
    pub forced_sort_name: Option<String>,
    pub overview: Option<String>,
    pub media_type: Option<String>,
    pub display_media_type: Option<String>,
    pub channel_id: Option<String>,
    pub parent_id: Option<ItemId>,
    pub index_number: Option<i32>,
    pub parent_index_number: Option<i32>,
    pub genres: Vec<String>,
    pub community_rating: Option<f32>,
    pub vote_count: Option<i32>,
    pub custom_rating: Option<String>,
    pub official_rating: Option<String>,
    pub official_rating_description: Option<String>,
    pub home_page_url: Option<String>,
    pub premiere_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub production_year: Option<i32>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
    pub run_time_ticks: Option<i64>,
    pub is_locked: bool,
    /// Availability flag maintained out of band by the library scanner.
    /// Lives in its projected column only, never in the serialized payload.
    #[serde(skip)]
    pub is_offline: bool,
}

impl ItemCommon {
    /// Numeric parental-rating ceiling derived from the official rating
    /// string. Unknown or missing ratings have no ceiling.
    pub fn parental_rating_value(&self) -> Option<i32> {
        self.official_rating
            .as_deref()
            .and_then(parental_rating_value)
    }
}

fn parental_rating_value(rating: &str) -> Option<i32> {
    match rating.trim().to_ascii_uppercase().as_str() {
        "TV-Y" | "G" | "TV-G" | "APPROVED" => Some(1),
        "TV-Y7" | "TV-Y7-FV" | "PG" | "TV-PG" => Some(2),
        "PG-13" => Some(3),
        "TV-14" | "R" => Some(4),
        "TV-MA" | "NC-17" => Some(5),
        _ => None,
    }
}

/// Program-grid attributes carried by live TV programs and recordings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramAttributes {
    pub is_movie: bool,
    pub is_kids: bool,
    pub is_sports: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub common: ItemCommon,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub common: ItemCommon,
    /// Airing status, e.g. "Continuing" or "Ended".
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub common: ItemCommon,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub common: ItemCommon,
    pub series_id: Option<ItemId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub common: ItemCommon,
    /// Channel number as presented by the provider, e.g. "13.1".
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub common: ItemCommon,
    pub attributes: ProgramAttributes,
    pub start_date: Option<DateTime<Utc>>,
}

/// Shared shape of audio and video recordings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub common: ItemCommon,
    pub attributes: ProgramAttributes,
    pub start_date: Option<DateTime<Utc>>,
    /// Recorder status, e.g. "Completed" or "InProgress".
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Audio {
    pub common: ItemCommon,
    pub album: Option<String>,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicAlbum {
    pub common: ItemCommon,
    pub album_artists: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub common: ItemCommon,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub common: ItemCommon,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub common: ItemCommon,
    pub is_root: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxSet {
    pub common: ItemCommon,
}

/// The concrete kind of a library entity.
///
/// `tag()` is the stable string persisted in the item table's type column;
/// `from_tag` is its inverse and returns `None` for tags this build does
/// not know (e.g. rows written by a newer server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Movie,
    Series,
    Season,
    Episode,
    Channel,
    Program,
    AudioRecording,
    VideoRecording,
    Audio,
    MusicAlbum,
    Photo,
    Person,
    Folder,
    BoxSet,
}

impl ItemKind {
    pub const ALL: &'static [ItemKind] = &[
        ItemKind::Movie,
        ItemKind::Series,
        ItemKind::Season,
        ItemKind::Episode,
        ItemKind::Channel,
        ItemKind::Program,
        ItemKind::AudioRecording,
        ItemKind::VideoRecording,
        ItemKind::Audio,
        ItemKind::MusicAlbum,
        ItemKind::Photo,
        ItemKind::Person,
        ItemKind::Folder,
        ItemKind::BoxSet,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ItemKind::Movie => "Movie",
            ItemKind::Series => "Series",
            ItemKind::Season => "Season",
            ItemKind::Episode => "Episode",
            ItemKind::Channel => "Channel",
            ItemKind::Program => "Program",
            ItemKind::AudioRecording => "AudioRecording",
            ItemKind::VideoRecording => "VideoRecording",
            ItemKind::Audio => "Audio",
            ItemKind::MusicAlbum => "MusicAlbum",
            ItemKind::Photo => "Photo",
            ItemKind::Person => "Person",
            ItemKind::Folder => "Folder",
            ItemKind::BoxSet => "BoxSet",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ItemKind> {
        ItemKind::ALL.iter().copied().find(|k| k.tag() == tag)
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A library entity of any kind.
///
/// The store persists the kind tag alongside the serialized variant, so a
/// row can be reconstructed without inspecting the payload first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Movie(Movie),
    Series(Series),
    Season(Season),
    Episode(Episode),
    Channel(Channel),
    Program(Program),
    AudioRecording(Recording),
    VideoRecording(Recording),
    Audio(Audio),
    MusicAlbum(MusicAlbum),
    Photo(Photo),
    Person(Person),
    Folder(Folder),
    BoxSet(BoxSet),
}

impl Entity {
    pub fn kind(&self) -> ItemKind {
        match self {
            Entity::Movie(_) => ItemKind::Movie,
            Entity::Series(_) => ItemKind::Series,
            Entity::Season(_) => ItemKind::Season,
            Entity::Episode(_) => ItemKind::Episode,
            Entity::Channel(_) => ItemKind::Channel,
            Entity::Program(_) => ItemKind::Program,
            Entity::AudioRecording(_) => ItemKind::AudioRecording,
            Entity::VideoRecording(_) => ItemKind::VideoRecording,
            Entity::Audio(_) => ItemKind::Audio,
            Entity::MusicAlbum(_) => ItemKind::MusicAlbum,
            Entity::Photo(_) => ItemKind::Photo,
            Entity::Person(_) => ItemKind::Person,
            Entity::Folder(_) => ItemKind::Folder,
            Entity::BoxSet(_) => ItemKind::BoxSet,
        }
    }

    pub fn common(&self) -> &ItemCommon {
        match self {
            Entity::Movie(v) => &v.common,
            Entity::Series(v) => &v.common,
            Entity::Season(v) => &v.common,
            Entity::Episode(v) => &v.common,
            Entity::Channel(v) => &v.common,
            Entity::Program(v) => &v.common,
            Entity::AudioRecording(v) => &v.common,
            Entity::VideoRecording(v) => &v.common,
            Entity::Audio(v) => &v.common,
            Entity::MusicAlbum(v) => &v.common,
            Entity::Photo(v) => &v.common,
            Entity::Person(v) => &v.common,
            Entity::Folder(v) => &v.common,
            Entity::BoxSet(v) => &v.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut ItemCommon {
        match self {
            Entity::Movie(v) => &mut v.common,
            Entity::Series(v) => &mut v.common,
            Entity::Season(v) => &mut v.common,
            Entity::Episode(v) => &mut v.common,
            Entity::Channel(v) => &mut v.common,
            Entity::Program(v) => &mut v.common,
            Entity::AudioRecording(v) => &mut v.common,
            Entity::VideoRecording(v) => &mut v.common,
            Entity::Audio(v) => &mut v.common,
            Entity::MusicAlbum(v) => &mut v.common,
            Entity::Photo(v) => &mut v.common,
            Entity::Person(v) => &mut v.common,
            Entity::Folder(v) => &mut v.common,
            Entity::BoxSet(v) => &mut v.common,
        }
    }

    pub fn id(&self) -> ItemId {
        self.common().id
    }

    /// Grid start time, for kinds that have one.
    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Entity::Program(v) => v.start_date,
            Entity::AudioRecording(v) | Entity::VideoRecording(v) => v.start_date,
            _ => None,
        }
    }

    pub fn program_attributes(&self) -> Option<&ProgramAttributes> {
        match self {
            Entity::Program(v) => Some(&v.attributes),
            Entity::AudioRecording(v) | Entity::VideoRecording(v) => Some(&v.attributes),
            _ => None,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::entity::ItemId;
use crate::store::StoreError;

/// A chapter marker within a playable item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterInfo {
    pub start_position_ticks: i64,
    pub name: Option<String>,
    pub image_path: Option<String>,
}

/// Chapter storage, kept in its own database by the hosting server.
///
/// Saves are full replaces of an item's ordered chapter list, under the
/// same single-writer transaction discipline as the item store.
pub trait ChapterRepository: Send + Sync {
    fn get_chapters(&self, id: ItemId) -> Result<Vec<ChapterInfo>, StoreError>;

    fn get_chapter(&self, id: ItemId, index: usize) -> Result<Option<ChapterInfo>, StoreError>;

    fn save_chapters(
        &self,
        id: ItemId,
        chapters: &[ChapterInfo],
        token: &CancellationToken,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaStreamType {
    Audio,
    Video,
    Subtitle,
}

/// A single stream probed out of a media container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaStream {
    pub item_id: ItemId,
    pub index: i32,
    pub stream_type: MediaStreamType,
    pub codec: Option<String>,
    pub language: Option<String>,
    pub channels: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub bit_rate: Option<i32>,
    pub is_default: bool,
    pub is_forced: bool,
    pub is_external: bool,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaStreamQuery {
    pub item_id: ItemId,
    pub stream_type: Option<MediaStreamType>,
    pub index: Option<i32>,
}

/// Probed-stream storage, kept in its own database by the hosting server.
/// Saves replace an item's stream set wholesale.
pub trait MediaStreamRepository: Send + Sync {
    fn get_media_streams(&self, query: &MediaStreamQuery) -> Result<Vec<MediaStream>, StoreError>;

    fn save_media_streams(
        &self,
        id: ItemId,
        streams: &[MediaStream],
        token: &CancellationToken,
    ) -> Result<(), StoreError>;
}

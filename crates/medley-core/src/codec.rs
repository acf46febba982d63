use crate::entity::{Entity, ItemKind};

/// Errors from payload encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Serialization capability injected into the store.
///
/// The payload must round-trip every entity field the store does not carry
/// in a projected column. The kind tag is persisted separately, so
/// `deserialize` is told which variant the bytes describe.
pub trait ItemCodec: Send + Sync {
    fn serialize(&self, entity: &Entity) -> Result<Vec<u8>, CodecError>;

    fn deserialize(&self, data: &[u8], kind: ItemKind) -> Result<Entity, CodecError>;
}

/// Default codec: JSON payloads of the bare variant struct.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl ItemCodec for JsonCodec {
    fn serialize(&self, entity: &Entity) -> Result<Vec<u8>, CodecError> {
        let result = match entity {
            Entity::Movie(v) => serde_json::to_vec(v),
            Entity::Series(v) => serde_json::to_vec(v),
            Entity::Season(v) => serde_json::to_vec(v),
            Entity::Episode(v) => serde_json::to_vec(v),
            Entity::Channel(v) => serde_json::to_vec(v),
            Entity::Program(v) => serde_json::to_vec(v),
            Entity::AudioRecording(v) => serde_json::to_vec(v),
            Entity::VideoRecording(v) => serde_json::to_vec(v),
            Entity::Audio(v) => serde_json::to_vec(v),
            Entity::MusicAlbum(v) => serde_json::to_vec(v),
            Entity::Photo(v) => serde_json::to_vec(v),
            Entity::Person(v) => serde_json::to_vec(v),
            Entity::Folder(v) => serde_json::to_vec(v),
            Entity::BoxSet(v) => serde_json::to_vec(v),
        };
        result.map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn deserialize(&self, data: &[u8], kind: ItemKind) -> Result<Entity, CodecError> {
        fn decode<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
            serde_json::from_slice(data).map_err(|e| CodecError::Decode(e.to_string()))
        }

        let entity = match kind {
            ItemKind::Movie => Entity::Movie(decode(data)?),
            ItemKind::Series => Entity::Series(decode(data)?),
            ItemKind::Season => Entity::Season(decode(data)?),
            ItemKind::Episode => Entity::Episode(decode(data)?),
            ItemKind::Channel => Entity::Channel(decode(data)?),
            ItemKind::Program => Entity::Program(decode(data)?),
            ItemKind::AudioRecording => Entity::AudioRecording(decode(data)?),
            ItemKind::VideoRecording => Entity::VideoRecording(decode(data)?),
            ItemKind::Audio => Entity::Audio(decode(data)?),
            ItemKind::MusicAlbum => Entity::MusicAlbum(decode(data)?),
            ItemKind::Photo => Entity::Photo(decode(data)?),
            ItemKind::Person => Entity::Person(decode(data)?),
            ItemKind::Folder => Entity::Folder(decode(data)?),
            ItemKind::BoxSet => Entity::BoxSet(decode(data)?),
        };
        Ok(entity)
    }
}

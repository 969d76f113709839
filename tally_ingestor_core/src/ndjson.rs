use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;

use crate::event::EventRecord;

/// Content type of uploaded batches.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

const ESTIMATED_EVENT_SIZE: usize = 256;

/// Encode records as newline-delimited JSON.
///
/// One object per line, every line (including the last) terminated by `\n`.
pub fn encode_ndjson(records: &[EventRecord]) -> Result<Bytes, serde_json::Error> {
    let mut writer = BytesMut::with_capacity(records.len() * ESTIMATED_EVENT_SIZE).writer();

    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.get_mut().put_u8(b'\n');
    }

    Ok(writer.into_inner().freeze())
}

/// Decode newline-delimited JSON into values of type `T`.
///
/// Blank lines are ignored.
pub fn decode_ndjson<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<T>, serde_json::Error> {
    serde_json::Deserializer::from_slice(data)
        .into_iter::<T>()
        .collect()
}

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use thiserror::Error;

const DATA_MARKER: &[u8; 4] = b"data";
// RIFF chunk size field lives at bytes 4..8 of the container
const RIFF_SIZE_OFFSET: usize = 4;

#[derive(Debug, Error)]
pub enum StitchError {
    #[error("no audio chunks supplied")]
    EmptyInput,
    #[error("chunk {index} is not valid base64: {source}")]
    Decode {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },
}

/// Merge base64-encoded WAV chunks into a single WAV buffer.
///
/// The first chunk is kept whole; every later chunk contributes only the
/// bytes after its first `data` marker and size field. The RIFF size field
/// and the data chunk size field of the result are rewritten to match the
/// concatenated payload. A single chunk is returned decoded but otherwise
/// untouched.
///
/// A donor chunk without a `data` marker contributes nothing. That silently
/// drops whatever audio it carried, but matches what the upstream service
/// emits in practice: every fragment past the first is a complete WAV file.
pub fn stitch<S: AsRef<str>>(chunks: &[S]) -> Result<Vec<u8>, StitchError> {
    if chunks.is_empty() {
        return Err(StitchError::EmptyInput);
    }

    let mut merged = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let decoded = BASE64_STANDARD
            .decode(chunk.as_ref())
            .map_err(|source| StitchError::Decode { index, source })?;
        if index == 0 {
            merged = decoded;
        } else if let Some(pos) = find_data_marker(&decoded) {
            // Skip the marker and its 4-byte size field, keep the payload
            if let Some(payload) = decoded.get(pos + 8..) {
                merged.extend_from_slice(payload);
            }
        }
    }

    if chunks.len() > 1 {
        patch_sizes(&mut merged);
    }
    Ok(merged)
}

fn find_data_marker(buf: &[u8]) -> Option<usize> {
    buf.windows(DATA_MARKER.len())
        .position(|window| window == DATA_MARKER)
}

fn patch_sizes(buf: &mut [u8]) {
    if buf.len() < RIFF_SIZE_OFFSET + 4 {
        return;
    }
    let riff_size = (buf.len() - 8) as u32;
    buf[RIFF_SIZE_OFFSET..RIFF_SIZE_OFFSET + 4].copy_from_slice(&riff_size.to_le_bytes());

    if let Some(pos) = find_data_marker(buf) {
        if buf.len() >= pos + 8 {
            let data_size = (buf.len() - pos - 8) as u32;
            buf[pos + 4..pos + 8].copy_from_slice(&data_size.to_le_bytes());
        }
    }
}

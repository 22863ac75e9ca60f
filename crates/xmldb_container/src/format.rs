//! Snapshot encoding for the `DOCUMENTS` file.
//!
//! ```text
//! magic    "XDBC"         4 bytes
//! version  u16 LE
//! count    u32 LE
//! entries  count x { name_len u32 LE, name, content_len u32 LE, content }
//! digest   SHA-256 of everything above, 32 bytes
//! ```

use crate::error::{ContainerError, ContainerResult};
use sha2::{Digest, Sha256};

/// Magic bytes for snapshot files.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"XDBC";

/// Current snapshot version.
pub const SNAPSHOT_VERSION: u16 = 1;

const DIGEST_LEN: usize = 32;
const HEADER_LEN: usize = 4 + 2 + 4;

/// Encodes `(name, content)` pairs into a snapshot.
///
/// # Errors
///
/// Returns `DocumentTooLarge` if a name or content does not fit a `u32`
/// length prefix.
pub fn encode<'a, I>(documents: I) -> ContainerResult<Vec<u8>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut buf = Vec::new();
    buf.extend_from_slice(&SNAPSHOT_MAGIC);
    buf.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());

    // Count is patched once the entries are written.
    let count_at = buf.len();
    buf.extend_from_slice(&0u32.to_le_bytes());

    let mut count: u32 = 0;
    for (name, content) in documents {
        put_field(&mut buf, name, name.as_bytes())?;
        put_field(&mut buf, name, content.as_bytes())?;
        count = count
            .checked_add(1)
            .ok_or_else(|| ContainerError::corrupted("too many documents for one snapshot"))?;
    }
    buf[count_at..count_at + 4].copy_from_slice(&count.to_le_bytes());

    let digest = Sha256::digest(&buf);
    buf.extend_from_slice(&digest);
    Ok(buf)
}

/// Decodes a snapshot into `(name, content)` pairs.
pub fn decode(data: &[u8]) -> ContainerResult<Vec<(String, String)>> {
    if data.len() < HEADER_LEN + DIGEST_LEN {
        return Err(ContainerError::corrupted("snapshot too short"));
    }
    if data[0..4] != SNAPSHOT_MAGIC {
        return Err(ContainerError::corrupted("invalid snapshot magic"));
    }

    let (body, digest) = data.split_at(data.len() - DIGEST_LEN);
    if Sha256::digest(body).as_slice() != digest {
        return Err(ContainerError::corrupted("snapshot checksum mismatch"));
    }

    let version = u16::from_le_bytes([body[4], body[5]]);
    if version != SNAPSHOT_VERSION {
        return Err(ContainerError::corrupted(format!(
            "unsupported snapshot version {version}"
        )));
    }

    let count = u32::from_le_bytes([body[6], body[7], body[8], body[9]]) as usize;
    let mut cursor = HEADER_LEN;
    let mut documents = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let name = take_field(body, &mut cursor)?;
        let content = take_field(body, &mut cursor)?;
        documents.push((name, content));
    }

    if cursor != body.len() {
        return Err(ContainerError::corrupted("trailing bytes after entries"));
    }

    Ok(documents)
}

fn put_field(buf: &mut Vec<u8>, name: &str, bytes: &[u8]) -> ContainerResult<()> {
    let len = check_len(name, bytes.len())?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Converts a field length to its `u32` prefix.
pub(crate) fn check_len(name: &str, len: usize) -> ContainerResult<u32> {
    u32::try_from(len).map_err(|_| ContainerError::DocumentTooLarge {
        name: name.to_string(),
        len,
    })
}

fn take_field(body: &[u8], cursor: &mut usize) -> ContainerResult<String> {
    if *cursor + 4 > body.len() {
        return Err(ContainerError::corrupted("truncated entry length"));
    }
    let len = u32::from_le_bytes([
        body[*cursor],
        body[*cursor + 1],
        body[*cursor + 2],
        body[*cursor + 3],
    ]) as usize;
    *cursor += 4;

    if *cursor + len > body.len() {
        return Err(ContainerError::corrupted("truncated entry"));
    }
    let bytes = &body[*cursor..*cursor + len];
    *cursor += len;

    String::from_utf8(bytes.to_vec())
        .map_err(|_| ContainerError::corrupted("entry is not valid UTF-8"))
}

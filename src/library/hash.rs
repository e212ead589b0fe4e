//! Content identity: SHA-256 over a file's bytes.
//!
//! Files are hashed in fixed-size chunks so large libraries never need a whole
//! file in memory; the digest is identical to hashing the full buffer.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::model::ContentHash;

const CHUNK_SIZE: usize = 64 * 1024;

/// Digest of an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    ContentHash::from_hex(format!("{:x}", Sha256::digest(bytes)))
}

/// Digest of the file at `path`, streamed in chunks.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentHash::from_hex(format!("{:x}", hasher.finalize())))
}

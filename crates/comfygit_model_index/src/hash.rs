//! The quick sampled hash used as the primary model identity, plus the
//! optional full-file hashes (blake3 / sha256) used as tie-breakers.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use comfygit_consts::QUICK_HASH_CHUNK_SIZE;
use xxhash_rust::xxh3::Xxh3Builder;

/// A 256-bit sampled hash: length-prefixed file length, followed by three
/// length-prefixed chunks read from the start, middle, and end of the file.
/// Stable across renames/moves; changes whenever file content does.
///
/// 256 bits are produced by running the sample through two independently
/// seeded XXH3-128 streams and concatenating the results — a cheap way to
/// widen a fast non-cryptographic hash without reaching for something
/// cryptographically strong, which the quick hash deliberately is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuickHash(pub [u8; 32]);

impl QuickHash {
    pub fn to_hex(self) -> String {
        hex_encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        hex_decode(s).map(Self)
    }
}

impl fmt::Display for QuickHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

const SEED_A: u64 = 0x9E37_79B9_7F4A_7C15;
const SEED_B: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// Computes the quick hash from in-memory sample chunks (exposed separately
/// from file IO so the sampling strategy is independently testable).
pub fn quick_hash_from_samples(file_len: u64, chunks: &[&[u8]; 3]) -> QuickHash {
    let mut a = Xxh3Builder::new().with_seed(SEED_A).build();
    let mut b = Xxh3Builder::new().with_seed(SEED_B).build();
    feed_length_prefixed(&mut a, &file_len.to_le_bytes());
    feed_length_prefixed(&mut b, &file_len.to_le_bytes());
    for chunk in chunks {
        feed_length_prefixed(&mut a, chunk);
        feed_length_prefixed(&mut b, chunk);
    }
    let ha = a.digest128().to_le_bytes();
    let hb = b.digest128().to_le_bytes();
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&ha);
    out[16..].copy_from_slice(&hb);
    QuickHash(out)
}

fn feed_length_prefixed(hasher: &mut xxhash_rust::xxh3::Xxh3, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Reads the three sample chunks (start, middle, end; each capped at
/// [`QUICK_HASH_CHUNK_SIZE`]) and returns the quick hash plus the file size.
pub fn quick_hash_file(path: &Path) -> std::io::Result<(QuickHash, u64)> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let chunk_size = QUICK_HASH_CHUNK_SIZE.min(len);

    let start_off = 0u64;
    let mid_off = len.saturating_sub(chunk_size) / 2;
    let end_off = len.saturating_sub(chunk_size);

    let start = read_at(&mut file, start_off, chunk_size)?;
    let mid = read_at(&mut file, mid_off, chunk_size)?;
    let end = read_at(&mut file, end_off, chunk_size)?;

    let hash = quick_hash_from_samples(len, &[&start, &mid, &end]);
    Ok((hash, len))
}

fn read_at(file: &mut File, offset: u64, len: u64) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

/// Computes a blake3 full-file hash, used as a tie-breaker when two distinct
/// files collide on their quick hash.
pub fn blake3_hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Computes a sha256 full-file hash, primarily so re-downloaded models can be
/// verified against a checksum published by an external source.
pub fn sha256_hash_file(path: &Path) -> std::io::Result<String> {
    use sha2::{Digest, Sha256};
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Option<[u8; 32]> {
    if s.len() != 64 {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
        let byte_str = std::str::from_utf8(chunk).ok()?;
        out[i] = u8::from_str_radix(byte_str, 16).ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn stable_under_rename_unstable_under_content_change() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.safetensors");
        let mut f = File::create(&path_a).unwrap();
        f.write_all(&vec![7u8; 1024]).unwrap();
        drop(f);

        let (hash_a, _) = quick_hash_file(&path_a).unwrap();
        let path_b = dir.path().join("renamed.safetensors");
        fs_err::rename(&path_a, &path_b).unwrap();
        let (hash_b, _) = quick_hash_file(&path_b).unwrap();
        assert_eq!(hash_a, hash_b, "rename must not change the quick hash");

        let mut f = File::create(&path_b).unwrap();
        f.write_all(&vec![8u8; 1024]).unwrap();
        drop(f);
        let (hash_c, _) = quick_hash_file(&path_b).unwrap();
        assert_ne!(hash_a, hash_c, "content change must change the quick hash");
    }

    #[test]
    fn hex_round_trips() {
        let hash = QuickHash([3u8; 32]);
        assert_eq!(QuickHash::from_hex(&hash.to_hex()), Some(hash));
    }

    #[test]
    fn small_files_still_hash_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.safetensors");
        fs_err::write(&path, b"hi").unwrap();
        let (_hash, len) = quick_hash_file(&path).unwrap();
        assert_eq!(len, 2);
    }
}

// Copyright © 2024 blitzbeaver contributors

//! The beaver file: a tracking graph in a checksummed binary envelope.
//!
//! Layout, integers little endian:
//! - 8 bytes magic `BEAVER\0\0`
//! - `u32` format version
//! - `u64` xxh3 digest of the payload
//! - `u64` payload length
//! - bincode encoded [`TrackingGraph`]

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bincode::{deserialize, serialize};
use log::info;
use xxhash_rust::xxh3::Xxh3 as Hasher;

use crate::engine::{Result, TrackingGraph};

pub const BEAVER_MAGIC: [u8; 8] = *b"BEAVER\0\0";
pub const BEAVER_VERSION: u32 = 1;

const HEADER_LEN: usize = 8 + 4 + 8 + 8;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PersistedGraphFormatError {
    #[error("not a beaver file")]
    BadMagic,

    #[error("unsupported beaver file version {0}, expected {BEAVER_VERSION}")]
    UnsupportedVersion(u32),

    #[error("beaver file is truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("beaver file has {0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("beaver file checksum mismatch")]
    ChecksumMismatch,

    #[error("failed to encode tracking graph: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode tracking graph: {0}")]
    Decode(#[source] bincode::Error),

    #[error("invalid tracking graph: {0}")]
    InvalidGraph(String),
}

fn checksum(payload: &[u8]) -> u64 {
    let mut hasher = Hasher::default();
    hasher.update(payload);
    hasher.digest()
}

pub fn to_bytes(graph: &TrackingGraph) -> Result<Vec<u8>, PersistedGraphFormatError> {
    let payload = serialize(graph).map_err(PersistedGraphFormatError::Encode)?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&BEAVER_MAGIC);
    bytes.extend_from_slice(&BEAVER_VERSION.to_le_bytes());
    bytes.extend_from_slice(&checksum(&payload).to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

pub fn from_bytes(bytes: &[u8]) -> Result<TrackingGraph, PersistedGraphFormatError> {
    if !bytes.starts_with(&BEAVER_MAGIC) && !BEAVER_MAGIC.starts_with(bytes) {
        return Err(PersistedGraphFormatError::BadMagic);
    }
    if bytes.len() < HEADER_LEN {
        return Err(PersistedGraphFormatError::Truncated {
            expected: HEADER_LEN,
            actual: bytes.len(),
        });
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    let version = u32::from_le_bytes(le_array(&header[8..12]));
    if version != BEAVER_VERSION {
        return Err(PersistedGraphFormatError::UnsupportedVersion(version));
    }
    let digest = u64::from_le_bytes(le_array(&header[12..20]));
    let payload_len = u64::from_le_bytes(le_array(&header[20..28]));

    let expected = usize::try_from(payload_len).unwrap_or(usize::MAX);
    match payload.len() {
        actual if actual < expected => {
            return Err(PersistedGraphFormatError::Truncated {
                expected: HEADER_LEN.saturating_add(expected),
                actual: bytes.len(),
            })
        }
        actual if actual > expected => {
            return Err(PersistedGraphFormatError::TrailingBytes(actual - expected))
        }
        _ => {}
    }
    if checksum(payload) != digest {
        return Err(PersistedGraphFormatError::ChecksumMismatch);
    }

    let graph: TrackingGraph = deserialize(payload).map_err(PersistedGraphFormatError::Decode)?;
    if let Some(reason) = graph.find_invalid_edge() {
        return Err(PersistedGraphFormatError::InvalidGraph(reason));
    }
    Ok(graph)
}

pub fn write_graph(graph: &TrackingGraph, mut writer: impl Write) -> Result<()> {
    let bytes = to_bytes(graph)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

pub fn read_graph(mut reader: impl Read) -> Result<TrackingGraph> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(from_bytes(&bytes)?)
}

pub fn save_graph(graph: &TrackingGraph, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_graph(graph, BufWriter::new(File::create(path)?))?;
    info!(
        "Saved tracking graph with {} trackers to {}",
        graph.num_trackers(),
        path.display()
    );
    Ok(())
}

pub fn load_graph(path: impl AsRef<Path>) -> Result<TrackingGraph> {
    let path = path.as_ref();
    let graph = read_graph(BufReader::new(File::open(path)?))?;
    info!(
        "Loaded tracking graph with {} trackers from {}",
        graph.num_trackers(),
        path.display()
    );
    Ok(graph)
}

impl TrackingGraph {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistedGraphFormatError> {
        to_bytes(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistedGraphFormatError> {
        from_bytes(bytes)
    }
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut array = [0; N];
    array.copy_from_slice(bytes);
    array
}

//! Durable snapshots of a [`VectorIndex`].
//!
//! Layout, all little endian:
//!
//! ```text
//! magic "FIDX" | version u32 | dimension u32 | count u64
//! count * dimension f32 values, entry order
//! count identities: tag u8 (0 = i64, 1 = u32 length + UTF-8)
//! ```
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never observes a partially written snapshot.

use crate::index::VectorIndex;
use crate::mapping::IdentityMapping;
use crate::vector::IdentityId;
use crate::{FaceIndexError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array1;
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const SNAPSHOT_MAGIC: &[u8; 4] = b"FIDX";
const SNAPSHOT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

const TAG_INT: u8 = 0;
const TAG_STR: u8 = 1;
/// Tag byte plus the smaller of an `i64` or a `u32` length prefix.
const MIN_ID_LEN: usize = 1 + 4;

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    file_path: PathBuf,
    dimension: usize,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P, dimension: usize) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            dimension,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    /// Atomically replace the snapshot with the contents of `index`.
    pub fn save(&self, index: &VectorIndex) -> Result<()> {
        let bytes = encode_snapshot(index);
        self.write_atomic(&bytes)
            .map_err(|source| FaceIndexError::PersistenceWriteFailure {
                path: self.file_path.clone(),
                source,
            })?;
        debug!(
            path = %self.file_path.display(),
            entries = index.count(),
            bytes = bytes.len(),
            "snapshot written"
        );
        Ok(())
    }

    fn write_atomic(&self, bytes: &[u8]) -> io::Result<()> {
        let dir = match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let file_name = self
            .file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        let written = File::create(&tmp_path).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp_path, &self.file_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        sync_directory(&dir)
    }

    /// Read the snapshot. A missing file yields an empty index; anything
    /// unreadable is reported as [`FaceIndexError::CorruptSnapshot`].
    pub fn load(&self) -> Result<VectorIndex> {
        let file = match File::open(&self.file_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(VectorIndex::new(self.dimension));
            }
            Err(e) => return Err(e.into()),
        };

        let mut bytes = Vec::new();
        BufReader::new(file).read_to_end(&mut bytes)?;
        if bytes.len() < HEADER_LEN {
            return Err(self.corrupt(format!(
                "file is {} bytes, shorter than header",
                bytes.len()
            )));
        }

        decode_snapshot(&bytes, self.dimension).map_err(|reason| self.corrupt(reason))
    }

    /// [`load`](Self::load), recovering from a corrupt snapshot by starting empty.
    ///
    /// The previous contents are lost to the index. They are moved aside to a
    /// `.corrupt` sibling and reported at error level so an operator can inspect them.
    pub fn load_or_empty(&self) -> Result<VectorIndex> {
        match self.load() {
            Ok(index) => {
                if self.exists() {
                    info!(
                        path = %self.file_path.display(),
                        entries = index.count(),
                        "loaded snapshot"
                    );
                }
                Ok(index)
            }
            Err(FaceIndexError::CorruptSnapshot { path, reason }) => {
                error!(
                    path = %path.display(),
                    %reason,
                    "snapshot is unreadable, starting with an empty index; enrolled embeddings are lost"
                );
                self.quarantine();
                Ok(VectorIndex::new(self.dimension))
            }
            Err(e) => Err(e),
        }
    }

    fn quarantine(&self) {
        let target = self.quarantine_path();
        match fs::rename(&self.file_path, &target) {
            Ok(()) => warn!(path = %target.display(), "moved corrupt snapshot aside"),
            Err(e) => warn!(
                path = %self.file_path.display(),
                error = %e,
                "could not move corrupt snapshot aside"
            ),
        }
    }

    pub fn quarantine_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        self.file_path.with_file_name(name)
    }

    fn corrupt(&self, reason: String) -> FaceIndexError {
        FaceIndexError::CorruptSnapshot {
            path: self.file_path.clone(),
            reason,
        }
    }
}

/// Make a rename inside `dir` durable.
fn sync_directory(dir: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        File::open(dir)?.sync_all()?;
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }
    Ok(())
}

pub fn encode_snapshot(index: &VectorIndex) -> Vec<u8> {
    let count = index.count();
    let mut buf = Vec::with_capacity(HEADER_LEN + count * (index.dimension() * 4 + 9));

    // Writes into a Vec cannot fail.
    let _ = write_snapshot(&mut buf, index);
    buf
}

fn write_snapshot<W: Write>(out: &mut W, index: &VectorIndex) -> io::Result<()> {
    out.write_all(SNAPSHOT_MAGIC)?;
    out.write_u32::<LittleEndian>(SNAPSHOT_VERSION)?;
    out.write_u32::<LittleEndian>(index.dimension() as u32)?;
    out.write_u64::<LittleEndian>(index.count() as u64)?;

    for vector in index.vectors() {
        for value in vector.iter() {
            out.write_f32::<LittleEndian>(*value)?;
        }
    }

    for id in index.mapping().iter() {
        match id {
            IdentityId::Int(value) => {
                out.write_u8(TAG_INT)?;
                out.write_i64::<LittleEndian>(*value)?;
            }
            IdentityId::Str(value) => {
                out.write_u8(TAG_STR)?;
                out.write_u32::<LittleEndian>(value.len() as u32)?;
                out.write_all(value.as_bytes())?;
            }
        }
    }
    Ok(())
}

/// Parse snapshot bytes, rejecting anything not written for `expected_dimension`.
pub fn decode_snapshot(
    bytes: &[u8],
    expected_dimension: usize,
) -> std::result::Result<VectorIndex, String> {
    let mut cursor = Cursor::new(bytes);
    let truncated = |e: io::Error| format!("truncated snapshot: {}", e);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic).map_err(truncated)?;
    if magic != *SNAPSHOT_MAGIC {
        return Err("invalid snapshot magic".to_string());
    }

    let version = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    if version != SNAPSHOT_VERSION {
        return Err(format!("unsupported snapshot version {}", version));
    }

    let dimension = cursor.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    if dimension == 0 {
        return Err("snapshot dimension is zero".to_string());
    }
    if dimension != expected_dimension {
        return Err(format!(
            "snapshot dimension {} does not match configured dimension {}",
            dimension, expected_dimension
        ));
    }

    let count = cursor.read_u64::<LittleEndian>().map_err(truncated)? as usize;
    let body = bytes.len() - HEADER_LEN;
    let vector_bytes = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .filter(|n| *n <= body)
        .ok_or_else(|| format!("entry count {} exceeds file size", count))?;
    if count > (body - vector_bytes) / MIN_ID_LEN {
        return Err(format!("entry count {} exceeds identity bytes", count));
    }

    let mut vectors = Vec::with_capacity(count);
    let mut values = vec![0f32; dimension];
    for _ in 0..count {
        cursor
            .read_f32_into::<LittleEndian>(&mut values)
            .map_err(truncated)?;
        vectors.push(Array1::from_vec(values.clone()));
    }
    debug_assert_eq!(cursor.position() as usize, HEADER_LEN + vector_bytes);

    let mut mapping = IdentityMapping::with_capacity(count);
    for position in 0..count {
        let id = match cursor.read_u8().map_err(truncated)? {
            TAG_INT => IdentityId::Int(cursor.read_i64::<LittleEndian>().map_err(truncated)?),
            TAG_STR => {
                let len = cursor.read_u32::<LittleEndian>().map_err(truncated)? as usize;
                let remaining = bytes.len() - cursor.position() as usize;
                if len > remaining {
                    return Err(format!("identity at position {} overruns file", position));
                }
                let mut raw = vec![0u8; len];
                cursor.read_exact(&mut raw).map_err(truncated)?;
                let value = String::from_utf8(raw)
                    .map_err(|_| format!("identity at position {} is not UTF-8", position))?;
                IdentityId::Str(value)
            }
            tag => return Err(format!("unknown identity tag {} at position {}", tag, position)),
        };
        mapping.push(id);
    }

    if (cursor.position() as usize) != bytes.len() {
        return Err(format!(
            "{} trailing bytes after last identity",
            bytes.len() - cursor.position() as usize
        ));
    }

    VectorIndex::from_parts(dimension, vectors, mapping).map_err(|e| e.to_string())
}

//! SOSD-style dataset files.
//!
//! Layout: a little-endian `u64` element count followed by `count` raw
//! little-endian records. Key files hold bare keys; entry files hold packed
//! `(key, u64 value)` pairs with no padding. The key width is encoded in the
//! file name suffix, e.g. `books_200M_uint64`.
//!
//! Files are memory-mapped for reading. Failures never abort the process;
//! they come back as [`HarnessError`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use learned_search::{Entry, Key, SortedKv};
use memmap2::Mmap;
use tracing::info;

use crate::error::{HarnessError, Result};
use crate::platform;

const HEADER_LEN: usize = 8;

/// Key width of a dataset, taken from its file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// `_uint32`
    U32,
    /// `_uint64`
    U64,
}

impl DataType {
    /// Resolves the type from the text after the last `_` in the file name.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = match name.rfind('_') {
            Some(pos) if pos + 1 < name.len() => &name[pos + 1..],
            _ => "",
        };
        match suffix {
            "uint32" => Ok(DataType::U32),
            "uint64" => Ok(DataType::U64),
            other => Err(HarnessError::UnsupportedType {
                suffix: other.to_owned(),
            }),
        }
    }

    /// File name suffix for this type, without the leading `_`.
    pub fn suffix(self) -> &'static str {
        match self {
            DataType::U32 => "uint32",
            DataType::U64 => "uint64",
        }
    }
}

// =============================================================================
// Reading
// =============================================================================

/// Loads a key file.
pub fn load_keys<K: Key>(path: impl AsRef<Path>) -> Result<Vec<K>> {
    let path = path.as_ref();
    let (keys, elapsed) = platform::time(|| read_records(path, K::WIDTH, K::read_le));
    let keys = keys?;
    log_throughput("read", keys.len(), path, elapsed);
    Ok(keys)
}

/// Loads an entry file.
pub fn load_entries<K: Key>(path: impl AsRef<Path>) -> Result<Vec<Entry<K>>> {
    let path = path.as_ref();
    let (entries, elapsed) = platform::time(|| {
        read_records(path, K::WIDTH + 8, |rec| {
            Entry::new(K::read_le(rec), u64::read_le(&rec[K::WIDTH..]))
        })
    });
    let entries = entries?;
    log_throughput("read", entries.len(), path, elapsed);
    Ok(entries)
}

/// Loads a key file into a store whose values are the keys' positions.
pub fn load_store<K: Key>(path: impl AsRef<Path>) -> Result<SortedKv<K>> {
    Ok(SortedKv::from_keys(load_keys(path)?))
}

fn read_records<T>(path: &Path, width: usize, decode: impl Fn(&[u8]) -> T) -> Result<Vec<T>> {
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and dropped before returning; the
    // dataset must not be truncated by another process while it is read.
    let map = unsafe { Mmap::map(&file)? };
    decode_records(&map, width, decode)
}

fn decode_records<T>(bytes: &[u8], width: usize, decode: impl Fn(&[u8]) -> T) -> Result<Vec<T>> {
    let actual = bytes.len() as u64;
    if bytes.len() < HEADER_LEN {
        return Err(HarnessError::Truncated {
            expected: HEADER_LEN as u64,
            actual,
        });
    }
    let count = u64::read_le(&bytes[..HEADER_LEN]);
    let expected = count
        .checked_mul(width as u64)
        .and_then(|n| n.checked_add(HEADER_LEN as u64))
        .unwrap_or(u64::MAX);
    if actual < expected {
        return Err(HarnessError::Truncated { expected, actual });
    }

    // `expected <= actual`, so it fits in usize.
    Ok(bytes[HEADER_LEN..expected as usize]
        .chunks_exact(width)
        .map(decode)
        .collect())
}

// =============================================================================
// Writing
// =============================================================================

/// Writes a key file, replacing any existing file.
pub fn write_keys<K: Key>(keys: &[K], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let (written, elapsed) = platform::time(|| write_records(path, keys, |k, out| k.write_le(out)));
    written?;
    log_throughput("wrote", keys.len(), path, elapsed);
    Ok(())
}

/// Writes an entry file, replacing any existing file.
pub fn write_entries<K: Key>(entries: &[Entry<K>], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let (written, elapsed) = platform::time(|| {
        write_records(path, entries, |e, out| {
            e.key.write_le(out);
            e.value.write_le(out);
        })
    });
    written?;
    log_throughput("wrote", entries.len(), path, elapsed);
    Ok(())
}

fn write_records<T>(
    path: &Path,
    records: &[T],
    encode: impl Fn(&T, &mut Vec<u8>),
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&(records.len() as u64).to_le_bytes())?;
    let mut scratch = Vec::with_capacity(16);
    for rec in records {
        scratch.clear();
        encode(rec, &mut scratch);
        out.write_all(&scratch)?;
    }
    out.flush()?;
    Ok(())
}

/// Pairs each key with its position as value.
pub fn add_values<K: Key>(keys: &[K]) -> Vec<Entry<K>> {
    keys.iter()
        .enumerate()
        .map(|(i, &k)| Entry::new(k, i as u64))
        .collect()
}

fn log_throughput(verb: &str, count: usize, path: &Path, elapsed: Duration) {
    let ms = elapsed.as_secs_f64() * 1e3;
    let mvals_per_s = if ms > 0.0 {
        count as f64 / 1e3 / ms
    } else {
        f64::INFINITY
    };
    info!(
        target: "learned_search::harness",
        count,
        path = %path.display(),
        ms = format_args!("{ms:.1}"),
        mvals_per_s = format_args!("{mvals_per_s:.2}"),
        "{verb} values"
    );
}

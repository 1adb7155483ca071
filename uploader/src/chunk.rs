//! Size-bounded chunking of in-memory records for `tabledata.insertAll`.
//!
//! The planner samples the first record only: batches are expected to be
//! homogeneous, and the estimate is multiplied by [`SIZE_FACTOR`] to cover the
//! gap between the in-memory size and the encoded request size.

use std::collections::{BTreeMap, HashMap};
use std::mem::size_of;
use std::slice;

/// A single row streamed into a table.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Correction applied to the sampled in-memory size.
pub const SIZE_FACTOR: usize = 3;

/// Budgets are expressed in decimal megabytes.
pub const BYTES_PER_MB: f64 = 1_000_000.0;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("no records to chunk")]
    EmptyInput,
    #[error("representative record has an estimated size of zero bytes")]
    InvalidRecordSize,
    #[error("chunk budget must be a positive number of megabytes: {0}")]
    InvalidBudget(f64),
}

/// Estimates the memory held by a value, following owned heap data recursively.
pub trait DeepSize {
    /// Bytes owned on the heap, excluding the inline size of `self`.
    fn heap_size(&self) -> usize;

    fn deep_size(&self) -> usize
    where
        Self: Sized,
    {
        size_of::<Self>() + self.heap_size()
    }
}

macro_rules! inline_only {
    ($($t:ty),*) => {
        $(impl DeepSize for $t {
            fn heap_size(&self) -> usize {
                0
            }
        })*
    };
}

inline_only!((), bool, char, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

impl DeepSize for String {
    fn heap_size(&self) -> usize {
        self.len()
    }
}

impl DeepSize for &str {
    fn heap_size(&self) -> usize {
        self.len()
    }
}

impl<T: DeepSize> DeepSize for Option<T> {
    fn heap_size(&self) -> usize {
        self.as_ref().map_or(0, DeepSize::heap_size)
    }
}

impl<T: DeepSize> DeepSize for Box<T> {
    fn heap_size(&self) -> usize {
        self.as_ref().deep_size()
    }
}

impl<T: DeepSize> DeepSize for Vec<T> {
    fn heap_size(&self) -> usize {
        self.iter().map(DeepSize::deep_size).sum()
    }
}

impl<K: DeepSize, V: DeepSize> DeepSize for HashMap<K, V> {
    fn heap_size(&self) -> usize {
        self.iter().map(|(k, v)| k.deep_size() + v.deep_size()).sum()
    }
}

impl<K: DeepSize, V: DeepSize> DeepSize for BTreeMap<K, V> {
    fn heap_size(&self) -> usize {
        self.iter().map(|(k, v)| k.deep_size() + v.deep_size()).sum()
    }
}

impl DeepSize for serde_json::Value {
    fn heap_size(&self) -> usize {
        use serde_json::Value;
        match self {
            Value::Null | Value::Bool(_) | Value::Number(_) => 0,
            Value::String(v) => v.heap_size(),
            Value::Array(v) => v.heap_size(),
            Value::Object(v) => v.heap_size(),
        }
    }
}

impl DeepSize for Record {
    fn heap_size(&self) -> usize {
        self.iter().map(|(k, v)| k.deep_size() + v.deep_size()).sum()
    }
}

/// Number of records of `avg_record_bytes` that fit in `chunk_mb` megabytes.
/// May be zero; [`plan`] clamps it to one.
pub fn records_per_chunk(chunk_mb: f64, avg_record_bytes: usize) -> usize {
    (chunk_mb * BYTES_PER_MB / avg_record_bytes as f64).floor() as usize
}

/// Plans how `records` are split into chunks of at most `chunk_mb` megabytes.
///
/// Chunks are contiguous, non-empty and in input order; a record estimated
/// larger than the whole budget still gets a chunk of its own.
pub fn plan<T: DeepSize>(records: &[T], chunk_mb: f64) -> Result<ChunkPlan<'_, T>, Error> {
    let first = records.first().ok_or(Error::EmptyInput)?;
    if !chunk_mb.is_finite() || chunk_mb <= 0.0 {
        return Err(Error::InvalidBudget(chunk_mb));
    }
    let avg_record_bytes = first.deep_size() * SIZE_FACTOR;
    if avg_record_bytes == 0 {
        return Err(Error::InvalidRecordSize);
    }
    Ok(ChunkPlan {
        records,
        avg_record_bytes,
        records_per_chunk: records_per_chunk(chunk_mb, avg_record_bytes).max(1),
    })
}

/// A lazy partition of a record slice. Iterating it again yields the same chunks.
#[derive(Debug)]
pub struct ChunkPlan<'a, T> {
    records: &'a [T],
    avg_record_bytes: usize,
    records_per_chunk: usize,
}

impl<'a, T> ChunkPlan<'a, T> {
    /// Estimated encoded size of one record, [`SIZE_FACTOR`] included.
    pub fn avg_record_bytes(&self) -> usize {
        self.avg_record_bytes
    }

    pub fn records_per_chunk(&self) -> usize {
        self.records_per_chunk
    }

    pub fn chunk_count(&self) -> usize {
        self.records.len().div_ceil(self.records_per_chunk)
    }

    pub fn iter(&self) -> slice::Chunks<'a, T> {
        self.records.chunks(self.records_per_chunk)
    }
}

impl<'a, T> IntoIterator for ChunkPlan<'a, T> {
    type Item = &'a [T];
    type IntoIter = slice::Chunks<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &ChunkPlan<'a, T> {
    type Item = &'a [T];
    type IntoIter = slice::Chunks<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use std::mem::size_of;

    use serde_json::json;

    use crate::chunk::{plan, records_per_chunk, DeepSize, Error, Record, SIZE_FACTOR};

    /// A row whose estimated size is fixed, regardless of platform layout.
    #[derive(Debug, Clone, PartialEq)]
    struct Row(usize, u32);

    impl DeepSize for Row {
        fn heap_size(&self) -> usize {
            0
        }

        fn deep_size(&self) -> usize {
            self.0
        }
    }

    fn rows(n: u32, size: usize) -> Vec<Row> {
        (0..n).map(|i| Row(size, i)).collect()
    }

    fn campaign(i: i64) -> Record {
        let value = json!({"campaign_name": "Ronnie Joshua", "campaign_id": 123456789 + i});
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn single_chunk_when_budget_covers_everything() {
        let records = rows(47, 1_000);
        let plan = plan(&records, 9.0).unwrap();
        assert_eq!(3_000, plan.avg_record_bytes());
        assert_eq!(3_000, plan.records_per_chunk());
        let chunks: Vec<&[Row]> = plan.iter().collect();
        assert_eq!(1, chunks.len());
        assert_eq!(records.as_slice(), chunks[0]);
    }

    #[test]
    fn chunks_partition_input_in_order() {
        for (n, size, mb) in [(10, 100_000, 1.0), (1_000, 7, 0.001), (7, 1, 0.000_003), (5, 333, 0.01)] {
            let records = rows(n, size);
            let plan = plan(&records, mb).unwrap();
            let per_chunk = plan.records_per_chunk();
            let chunks: Vec<&[Row]> = plan.iter().collect();
            assert_eq!(plan.chunk_count(), chunks.len());
            for (i, chunk) in chunks.iter().enumerate() {
                assert!(!chunk.is_empty());
                assert!(chunk.len() <= per_chunk);
                if i + 1 < chunks.len() {
                    assert_eq!(per_chunk, chunk.len());
                }
            }
            let joined: Vec<Row> = chunks.concat();
            assert_eq!(records, joined);
        }
    }

    #[test]
    fn chunk_size_follows_budget() {
        // 100_000 bytes * 3 per record, 1 MB budget
        let records = rows(10, 100_000);
        let plan = plan(&records, 1.0).unwrap();
        assert_eq!(3, plan.records_per_chunk());
        let lens: Vec<usize> = plan.iter().map(<[Row]>::len).collect();
        assert_eq!(vec![3, 3, 3, 1], lens);
    }

    #[test]
    fn oversized_record_gets_its_own_chunk() {
        let records = rows(4, 2_000_000);
        assert_eq!(0, records_per_chunk(1.0, 2_000_000 * SIZE_FACTOR));
        let plan = plan(&records, 1.0).unwrap();
        assert_eq!(1, plan.records_per_chunk());
        assert_eq!(4, plan.iter().count());
        assert!(plan.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn records_per_chunk_is_monotonic_in_budget() {
        let mut last = 0;
        for step in 1..200 {
            let mb = step as f64 * 0.05;
            let current = records_per_chunk(mb, 3_000);
            assert!(current >= last, "{current} < {last} at {mb} MB");
            last = current;
        }
        assert_eq!(3_000, records_per_chunk(9.0, 3_000));
    }

    #[test]
    fn plan_is_restartable() {
        let records = rows(10, 100_000);
        let plan = plan(&records, 1.0).unwrap();
        let first: Vec<&[Row]> = (&plan).into_iter().collect();
        let second: Vec<&[Row]> = plan.into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input() {
        let records: Vec<Row> = vec![];
        assert_eq!(Error::EmptyInput, plan(&records, 9.0).unwrap_err());
    }

    #[test]
    fn zero_sized_record() {
        let records = vec![(), ()];
        assert_eq!(Error::InvalidRecordSize, plan(&records, 9.0).unwrap_err());
    }

    #[test]
    fn invalid_budget() {
        let records = rows(3, 10);
        assert_eq!(Error::InvalidBudget(0.0), plan(&records, 0.0).unwrap_err());
        assert_eq!(Error::InvalidBudget(-1.0), plan(&records, -1.0).unwrap_err());
        assert!(matches!(plan(&records, f64::NAN), Err(Error::InvalidBudget(_))));
    }

    #[test]
    fn deep_size_follows_nested_values() {
        let flat = json!({"a": "x"});
        let nested = json!({"a": "x", "b": {"c": ["y", "zz"]}});
        assert!(nested.deep_size() > flat.deep_size());

        let s = "hello".to_string();
        assert_eq!(size_of::<String>() + 5, s.deep_size());
        let v = vec![s.clone(), s];
        assert_eq!(size_of::<Vec<String>>() + 2 * (size_of::<String>() + 5), v.deep_size());
    }

    #[test]
    fn plan_json_records() {
        let records: Vec<Record> = (0..100).map(campaign).collect();
        let expected = records[0].deep_size() * SIZE_FACTOR;
        let plan = plan(&records, 0.01).unwrap();
        assert_eq!(expected, plan.avg_record_bytes());
        assert_eq!(records_per_chunk(0.01, expected).max(1), plan.records_per_chunk());
        assert_eq!(100, plan.iter().map(<[Record]>::len).sum::<usize>());
    }
}

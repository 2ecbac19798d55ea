//! Exact nearest-neighbour index over fixed-dimension `f32` vectors.
//!
//! Entries are identified by insertion position. Distances are squared Euclidean;
//! equal distances resolve to the lower id so results are fully deterministic.

use std::fs;
use std::path::Path;

use lawqa_core::error::AppError;
use serde::{Deserialize, Serialize};

mod distance;

pub use distance::squared_l2;

const BLOB_FORMAT: &str = "flat-l2";
const BLOB_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dims: usize,
    // Row-major, `dims` floats per entry.
    data: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexBlob {
    format: String,
    version: u32,
    dims: usize,
    count: usize,
    /// Little-endian `f32` bytes, hex encoded so the round trip is bit-exact.
    data: String,
}

impl FlatIndex {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            data: Vec::new(),
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        if self.dims == 0 {
            0
        } else {
            self.data.len() / self.dims
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        if id >= self.len() {
            return None;
        }
        Some(&self.data[id * self.dims..(id + 1) * self.dims])
    }

    /// Append `vectors`; the first one gets id `len()`. Either all are added or none.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), AppError> {
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != self.dims || self.dims == 0 {
                return Err(AppError::new(
                    "RAG_DIMENSION_MISMATCH",
                    "Vector dimensionality does not match the index",
                )
                .with_details(format!(
                    "expected={}; got={}; position={}",
                    self.dims,
                    v.len(),
                    self.len() + i
                )));
            }
        }
        self.data.reserve(vectors.len() * self.dims);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// The `k` nearest entries to `query`, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, AppError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dims {
            return Err(AppError::new(
                "RAG_DIMENSION_MISMATCH",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={}; query_dims={}", self.dims, query.len())));
        }

        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dims)
            .enumerate()
            .map(|(id, row)| Neighbor {
                id,
                distance: squared_l2(query, row),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        hits.truncate(k);
        Ok(hits)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AppError> {
        let mut raw = Vec::with_capacity(self.data.len() * 4);
        for x in &self.data {
            raw.extend_from_slice(&x.to_le_bytes());
        }
        let blob = IndexBlob {
            format: BLOB_FORMAT.to_string(),
            version: BLOB_VERSION,
            dims: self.dims,
            count: self.len(),
            data: hex::encode(raw),
        };
        serde_json::to_vec(&blob).map_err(|e| {
            AppError::new("RAG_ARTIFACT_WRITE_FAILED", "Failed to encode vector index")
                .with_details(e.to_string())
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        let decode_err = |msg: &str| AppError::new("RAG_ARTIFACT_READ_FAILED", msg.to_string());

        let blob: IndexBlob = serde_json::from_slice(bytes).map_err(|e| {
            decode_err("Failed to decode vector index").with_details(e.to_string())
        })?;
        if blob.format != BLOB_FORMAT || blob.version != BLOB_VERSION {
            return Err(decode_err("Unsupported vector index format")
                .with_details(format!("format={}; version={}", blob.format, blob.version)));
        }
        let raw = hex::decode(&blob.data).map_err(|e| {
            decode_err("Vector index payload is not valid hex").with_details(e.to_string())
        })?;
        let expected = blob
            .count
            .checked_mul(blob.dims)
            .and_then(|n| n.checked_mul(4));
        if expected != Some(raw.len()) {
            return Err(decode_err("Vector index payload length does not match its header")
                .with_details(format!(
                    "dims={}; count={}; bytes={}",
                    blob.dims,
                    blob.count,
                    raw.len()
                )));
        }
        let data = raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self {
            dims: blob.dims,
            data,
        })
    }

    /// Write to `path` via a sibling `.tmp` file and rename.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        crate::store::artifacts::write_atomic(path, &self.to_bytes()?)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let bytes = fs::read(path).map_err(|e| {
            AppError::new("RAG_ARTIFACT_READ_FAILED", "Failed to read vector index")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(hits: &[Neighbor]) -> Vec<usize> {
        hits.iter().map(|h| h.id).collect()
    }

    #[test]
    fn assigns_positional_ids_and_orders_nearest_first() {
        let mut index = FlatIndex::new(2);
        index
            .add(&[vec![5.0, 5.0], vec![0.0, 0.0], vec![1.0, 1.0]])
            .expect("add");
        assert_eq!(index.len(), 3);
        assert_eq!(index.vector(1), Some(&[0.0f32, 0.0][..]));

        let hits = index.search(&[0.0, 0.0], 3).expect("search");
        assert_eq!(ids(&hits), vec![1, 2, 0]);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].distance, 2.0);
    }

    #[test]
    fn ties_break_on_lowest_id() {
        let mut index = FlatIndex::new(1);
        index.add(&[vec![2.0], vec![-2.0], vec![2.0], vec![0.0]]).expect("add");
        let hits = index.search(&[0.0], 4).expect("search");
        assert_eq!(ids(&hits), vec![3, 0, 1, 2]);
    }

    #[test]
    fn k_larger_than_len_returns_everything() {
        let mut index = FlatIndex::new(1);
        index.add(&[vec![1.0], vec![2.0]]).expect("add");
        assert_eq!(index.search(&[0.0], 5).expect("search").len(), 2);
        assert!(index.search(&[0.0], 0).expect("k=0").is_empty());
    }

    #[test]
    fn empty_index_returns_nothing_even_for_wrong_dims() {
        let index = FlatIndex::new(0);
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 2.0, 3.0], 3).expect("search").is_empty());
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let mut index = FlatIndex::new(2);
        let err = index.add(&[vec![1.0, 2.0], vec![1.0]]).expect_err("add");
        assert_eq!(err.code, "RAG_DIMENSION_MISMATCH");
        assert!(index.is_empty(), "a rejected batch must not be partially applied");

        index.add(&[vec![1.0, 2.0]]).expect("add");
        let err = index.search(&[1.0, 2.0, 3.0], 1).expect_err("search");
        assert_eq!(err.code, "RAG_DIMENSION_MISMATCH");
    }

    #[test]
    fn bytes_round_trip_is_bit_exact() {
        let mut index = FlatIndex::new(3);
        index
            .add(&[vec![0.1, -0.0, f32::MIN_POSITIVE], vec![1e-30, 3.25, -7.5]])
            .expect("add");
        let back = FlatIndex::from_bytes(&index.to_bytes().expect("encode")).expect("decode");
        assert_eq!(back.dims(), 3);
        for id in 0..2 {
            let a = index.vector(id).expect("a");
            let b = back.vector(id).expect("b");
            let bits_a: Vec<u32> = a.iter().map(|x| x.to_bits()).collect();
            let bits_b: Vec<u32> = b.iter().map(|x| x.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut index = FlatIndex::new(2);
        index.add(&[vec![1.0, 2.0]]).expect("add");
        let mut blob: serde_json::Value =
            serde_json::from_slice(&index.to_bytes().expect("encode")).expect("json");
        blob["count"] = serde_json::json!(2);
        let err = FlatIndex::from_bytes(&serde_json::to_vec(&blob).expect("json"))
            .expect_err("truncated");
        assert_eq!(err.code, "RAG_ARTIFACT_READ_FAILED");
    }

    #[test]
    fn rejects_header_whose_size_overflows() {
        let mut index = FlatIndex::new(2);
        index.add(&[vec![1.0, 2.0]]).expect("add");
        let mut blob: serde_json::Value =
            serde_json::from_slice(&index.to_bytes().expect("encode")).expect("json");
        blob["count"] = serde_json::json!(usize::MAX);
        let err = FlatIndex::from_bytes(&serde_json::to_vec(&blob).expect("json"))
            .expect_err("overflowing header");
        assert_eq!(err.code, "RAG_ARTIFACT_READ_FAILED");
    }

    #[test]
    fn save_and_load_reproduce_search_results() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.json");
        let mut index = FlatIndex::new(2);
        index
            .add(&[vec![0.3, 0.4], vec![0.9, 0.1], vec![0.3, 0.4]])
            .expect("add");
        index.save(&path).expect("save");
        assert!(!dir.path().join("index.json.tmp").exists());

        let loaded = FlatIndex::load(&path).expect("load");
        let q = [0.5, 0.5];
        assert_eq!(
            loaded.search(&q, 3).expect("loaded"),
            index.search(&q, 3).expect("fresh")
        );
    }
}

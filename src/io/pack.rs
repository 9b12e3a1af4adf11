//! The demand vector pack format: a compressed binary blob preserving the
//! (zoning name, segmentation name, value store) triple exactly.

use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as Flate2Compression;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::dvector::DVector;
use crate::error::{DemandError, Result};
use crate::io::fs::write_atomic;
use crate::registry::Registry;

/// Magic bytes for the pack format: "TDVC" (Tripvec Demand VeCtor)
const MAGIC: &[u8] = b"TDVC";
/// Format version (currently 1)
const VERSION: u8 = 1;
/// Flag bit: payload is gzip-compressed
const FLAG_GZIP: u8 = 0b0000_0001;

#[derive(Serialize, Deserialize)]
struct PackHeader {
    zoning: String,
    segmentation: String,
    zones: u64,
    segments: u64,
}

/// Serialize a demand vector to pack bytes.
pub fn write_dvector_bytes(vector: &DVector) -> Result<Vec<u8>> {
    let header = PackHeader {
        zoning: vector.zoning().name().to_string(),
        segmentation: vector.segmentation().name().to_string(),
        zones: vector.zoning().len() as u64,
        segments: vector.segmentation().len() as u64,
    };
    let header_bytes = serde_json::to_vec(&header)
        .map_err(|e| DemandError::Format(format!("failed to encode pack header: {e}")))?;

    let mut out = Vec::new();
    out.write_all(MAGIC)?;
    out.write_all(&[VERSION, FLAG_GZIP])?;
    out.write_all(&(header_bytes.len() as u32).to_le_bytes())?;
    out.write_all(&header_bytes)?;

    // Values in row-major (zone, segment) order, little endian.
    let mut encoder = GzEncoder::new(&mut out, Flate2Compression::default());
    for &value in vector.data().iter() {
        encoder.write_all(&value.to_le_bytes())?;
    }
    encoder.finish()?;

    Ok(out)
}

/// Deserialize a demand vector from pack bytes, resolving its catalogues
/// through the registry.
pub fn read_dvector_bytes(bytes: &[u8], registry: &Registry) -> Result<DVector> {
    let mut reader = bytes;

    let mut magic = [0u8; 4];
    read_exact(&mut reader, &mut magic, "magic bytes")?;
    if magic != MAGIC {
        return Err(DemandError::Format("not a demand vector pack".to_string()));
    }

    let mut meta = [0u8; 2];
    read_exact(&mut reader, &mut meta, "version and flags")?;
    let (version, flags) = (meta[0], meta[1]);
    if version != VERSION {
        return Err(DemandError::Format(format!(
            "unsupported pack version {version}, expected {VERSION}"
        )));
    }

    let mut len_bytes = [0u8; 4];
    read_exact(&mut reader, &mut len_bytes, "header length")?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    if reader.len() < header_len {
        return Err(DemandError::Format("truncated pack header".to_string()));
    }
    let (header_bytes, payload) = reader.split_at(header_len);
    let header: PackHeader = serde_json::from_slice(header_bytes)
        .map_err(|e| DemandError::Format(format!("failed to decode pack header: {e}")))?;

    let zoning = registry.zoning(&header.zoning)?;
    let segmentation = registry.segmentation(&header.segmentation)?;
    if zoning.len() as u64 != header.zones || segmentation.len() as u64 != header.segments {
        return Err(DemandError::Format(format!(
            "pack was written against {} zones x {} segments, catalogues have {} x {}",
            header.zones,
            header.segments,
            zoning.len(),
            segmentation.len()
        )));
    }

    let raw = if flags & FLAG_GZIP != 0 {
        let mut decoder = GzDecoder::new(payload);
        let mut raw = Vec::new();
        decoder.read_to_end(&mut raw)?;
        raw
    } else {
        payload.to_vec()
    };

    let cell_count = (header.zones * header.segments) as usize;
    if raw.len() != cell_count * 8 {
        return Err(DemandError::Format(format!(
            "pack payload holds {} bytes, expected {}",
            raw.len(),
            cell_count * 8
        )));
    }

    let values: Vec<f64> = raw
        .chunks_exact(8)
        .map(|chunk| f64::from_le_bytes(chunk.try_into().unwrap()))
        .collect();
    let data = Array2::from_shape_vec((zoning.len(), segmentation.len()), values)
        .map_err(|e| DemandError::Format(format!("pack payload shape error: {e}")))?;

    DVector::from_dense(zoning, segmentation, data)
}

fn read_exact(reader: &mut &[u8], buf: &mut [u8], what: &str) -> Result<()> {
    reader
        .read_exact(buf)
        .map_err(|_| DemandError::Format(format!("truncated pack: missing {what}")))
}

impl DVector {
    /// Save this vector as a pack file, atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = write_dvector_bytes(self)?;
        write_atomic(path, &bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved demand vector pack");
        Ok(())
    }

    /// Load a vector from a pack file, resolving catalogues through the
    /// registry.
    pub fn load(path: &Path, registry: &Registry) -> Result<DVector> {
        let bytes = std::fs::read(path)?;
        read_dvector_bytes(&bytes, registry)
    }
}

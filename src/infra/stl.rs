//! Binary STL mesh parser.

use crate::core::{MeshParser, PipelineError, Triangle};

const HEADER_LEN: usize = 80;
const COUNT_LEN: usize = 4;
const RECORD_LEN: usize = 50;

/// [`MeshParser`] for binary STL: an 80-byte header, a little-endian `u32`
/// triangle count, then 50-byte records (normal, three vertices, attribute).
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryStlParser;

impl BinaryStlParser {
    /// Create a parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn read_f32(bytes: &[u8], at: usize) -> f64 {
    let mut raw = [0_u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    f64::from(f32::from_le_bytes(raw))
}

fn read_vertex(record: &[u8], at: usize) -> [f64; 3] {
    [
        read_f32(record, at),
        read_f32(record, at + 4),
        read_f32(record, at + 8),
    ]
}

impl MeshParser for BinaryStlParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Triangle>, PipelineError> {
        if bytes.len() < HEADER_LEN + COUNT_LEN {
            return Err(PipelineError::OutputParse(format!(
                "binary STL too short: {} bytes",
                bytes.len()
            )));
        }

        let mut raw_count = [0_u8; 4];
        raw_count.copy_from_slice(&bytes[HEADER_LEN..HEADER_LEN + COUNT_LEN]);
        let count = u32::from_le_bytes(raw_count) as usize;

        let body = &bytes[HEADER_LEN + COUNT_LEN..];
        let expected = count.checked_mul(RECORD_LEN).ok_or_else(|| {
            PipelineError::OutputParse(format!("binary STL triangle count overflows: {count}"))
        })?;
        if body.len() < expected {
            return Err(PipelineError::OutputParse(format!(
                "binary STL truncated: {count} triangles need {expected} bytes, found {}",
                body.len()
            )));
        }

        Ok(body
            .chunks_exact(RECORD_LEN)
            .take(count)
            .map(|record| {
                // Skip the 12-byte facet normal.
                [
                    read_vertex(record, 12),
                    read_vertex(record, 24),
                    read_vertex(record, 36),
                ]
            })
            .collect())
    }
}

/// Encode triangles as binary STL with zero normals.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_binary_stl(triangles: &[Triangle]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + COUNT_LEN + triangles.len() * RECORD_LEN);
    out.extend_from_slice(&[0_u8; HEADER_LEN]);
    let count = u32::try_from(triangles.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&count.to_le_bytes());
    for triangle in triangles.iter().take(count as usize) {
        out.extend_from_slice(&[0_u8; 12]);
        for vertex in triangle {
            for coord in vertex {
                out.extend_from_slice(&(*coord as f32).to_le_bytes());
            }
        }
        out.extend_from_slice(&[0_u8; 2]);
    }
    out
}

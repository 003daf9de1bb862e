use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Byte range of one page segment inside a [`NormalizedText`].
///
/// Page numbers are 1-based and follow the order of the caller-supplied page
/// offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpan {
    pub start: usize,
    pub end: usize,
    pub page: u32,
}

/// Canonical text produced by the normalization pipeline.
///
/// Running the pipeline over `text` again yields the same string; all offsets
/// in [`Sentence`] and [`Chunk`] index into `text`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub text: String,
    /// Page segments, empty when the caller supplied no page offsets.
    pub pages: Vec<PageSpan>,
}

impl NormalizedText {
    /// Wrap an already-normalized string without page information.
    pub fn from_text(text: String) -> Self {
        Self {
            text,
            pages: Vec::new(),
        }
    }

    /// Page number covering the given byte offset, if page spans are known.
    pub fn page_at(&self, offset: usize) -> Option<u32> {
        self.pages
            .iter()
            .find(|span| span.start <= offset && offset < span.end)
            .map(|span| span.page)
    }
}

/// One sentence span with exact byte offsets into the normalized text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub page: Option<u32>,
}

impl Sentence {
    /// Character length of the sentence.
    pub fn size(&self) -> usize {
        self.text.chars().count()
    }
}

/// A contiguous, non-overlapping run of sentences forming one retrieval unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Dense sequential identifier, `0..N-1` in output order.
    pub chunk_id: usize,
    /// Exact normalized-text span covering the chunk's sentences.
    pub text: String,
    /// Page of the chunk's first sentence.
    pub page: Option<u32>,
    /// Character length of `text`.
    pub size: usize,
    /// Half-open sentence-index range covered by this chunk.
    pub sentence_range: Range<usize>,
}

/// Aggregate result returned by the pipeline, including optional trace data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkingOutcome {
    pub chunks: Vec<Chunk>,
    pub trace: Option<ChunkingTrace>,
    pub stats: ChunkingStats,
}

impl ChunkingOutcome {
    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            trace: None,
            stats: ChunkingStats::default(),
        }
    }
}

/// Basic runtime stats for diagnostics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkingStats {
    pub total_sentences: usize,
    pub total_chunks: usize,
    pub average_size: f32,
}

/// Trace data is useful for debugging breakpoint placement and repair steps.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkingTrace {
    pub events: Vec<TraceEvent>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceEvent {
    pub label: String,
    pub score: Option<f32>,
    pub index: Option<usize>,
}

impl TraceEvent {
    pub fn new(label: impl Into<String>, score: Option<f32>, index: Option<usize>) -> Self {
        Self {
            label: label.into(),
            score,
            index,
        }
    }
}

/// Errors the preprocessing core can surface to callers.
#[derive(thiserror::Error, Debug)]
pub enum ChunkingError {
    /// Rejected before any processing starts; never retried.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
    /// Provider failure or a vector count mismatched to the sentence count.
    /// Terminal for the document; retry policy belongs to the caller.
    #[error("embedding failed: {reason}")]
    EmbeddingFailed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_at_resolves_covering_span() {
        let normalized = NormalizedText {
            text: "first page\n\nsecond page".to_string(),
            pages: vec![
                PageSpan {
                    start: 0,
                    end: 10,
                    page: 1,
                },
                PageSpan {
                    start: 12,
                    end: 23,
                    page: 2,
                },
            ],
        };
        assert_eq!(normalized.page_at(0), Some(1));
        assert_eq!(normalized.page_at(9), Some(1));
        assert_eq!(normalized.page_at(11), None);
        assert_eq!(normalized.page_at(12), Some(2));
    }

    #[test]
    fn chunk_serializes_with_flat_fields() {
        let chunk = Chunk {
            chunk_id: 0,
            text: "Hello world.".to_string(),
            page: Some(3),
            size: 12,
            sentence_range: 0..1,
        };
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["chunk_id"], 0);
        assert_eq!(value["text"], "Hello world.");
        assert_eq!(value["page"], 3);
        assert_eq!(value["size"], 12);
    }
}

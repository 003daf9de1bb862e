//! ```text
//! Raw extracted text ──► normalize ──► NormalizedText (idempotent, page-aware)
//!                                          │
//!                      segmenter ◄─────────┘
//!                          │ offset-exact sentences
//!                          │
//!                          ├─► embeddings (injected provider) ──► cache
//!                          ├─► breakpoints (cosine distances, percentile cuts)
//!                          └─► assembly (merge/split repair, renumbering)
//!
//! service::PreprocessingService ──► ChunkingOutcome + ProcessTelemetry
//!                                       └─► downstream serialization & indexing (external)
//! ```
//!
//! # ragprep
//!
//! Text normalization and semantic chunking for preparing unstructured
//! documents for retrieval-augmented generation.  The crate owns the ordered
//! normalization passes that canonicalize noisy extracted text and the
//! embedding-similarity-driven segmentation that partitions it into
//! size-bounded, topically coherent chunks.  Per-format extraction, metadata
//! harvesting, JSON output, and file I/O stay with the caller.

pub mod assembly;
pub mod breakpoints;
pub mod cache;
pub mod config;
pub mod embeddings;
pub mod normalize;
pub mod segmenter;
pub mod service;
pub mod types;

pub use config::{
    ChunkingConfig, HyphenForm, NormalizerConfig, PreprocessingModuleConfig,
    default_abbreviations,
};
pub use embeddings::{
    EmbeddingProvider, MockEmbeddingProvider, NullEmbeddingProvider, RigEmbeddingProvider,
    SharedEmbeddingProvider,
};
pub use normalize::{normalize, normalize_pages};
pub use segmenter::segment;
pub use service::{
    EmbedderKind, PreprocessingService, PreprocessingServiceBuilder, ProcessDocumentRequest,
    ProcessDocumentResponse, ProcessTelemetry,
};
pub use types::{
    Chunk, ChunkingError, ChunkingOutcome, ChunkingStats, ChunkingTrace, NormalizedText, PageSpan,
    Sentence, TraceEvent,
};

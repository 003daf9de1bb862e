//! Integration tests for the preprocessing pipeline with mock and scripted
//! embedding providers, suitable for CI and deterministic runs.

use std::sync::{Arc, Once};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

use ragprep::{
    ChunkingConfig, ChunkingError, EmbeddingProvider, MockEmbeddingProvider,
    PreprocessingService, ProcessDocumentRequest, SharedEmbeddingProvider,
};

/// Two-topic scripted provider: cat sentences share one axis, everything else
/// the other, so exactly one similarity drop shows up between the topics.
struct TopicProvider;

#[async_trait]
impl EmbeddingProvider for TopicProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        Ok(inputs
            .iter()
            .map(|text| {
                if text.contains("Cats") {
                    vec![1.0, 0.0]
                } else {
                    vec![0.0, 1.0]
                }
            })
            .collect())
    }
}

struct CountingProvider {
    inner: MockEmbeddingProvider,
    calls: Arc<AtomicUsize>,
}

impl CountingProvider {
    fn new() -> (SharedEmbeddingProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            inner: MockEmbeddingProvider::new(),
            calls: calls.clone(),
        };
        (Arc::new(provider), calls)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(inputs).await
    }
}

struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    async fn embed_batch(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        Err(ChunkingError::EmbeddingFailed {
            reason: "forced failure".to_string(),
        })
    }
}

/// Returns one vector fewer than requested.
struct MiscountingProvider;

#[async_trait]
impl EmbeddingProvider for MiscountingProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ChunkingError> {
        Ok(inputs
            .iter()
            .skip(1)
            .map(|_| vec![1.0, 0.0])
            .collect())
    }
}

fn service_with(provider: SharedEmbeddingProvider) -> PreprocessingService {
    PreprocessingService::builder()
        .with_embedding_provider(provider)
        .build()
}

const TWO_TOPIC_TEXT: &str = "Cats purr when they rest. Cats also knead blankets. \
                              Solar panels convert sunlight. Panel output varies by season.";

// Four sentences, two topics, default config: the similarity spike between
// sentences 1 and 2 yields one breakpoint, but both candidate chunks are
// under the 100-char minimum, so the merge pass collapses them into one
// chunk covering the whole document.
#[tokio::test]
async fn merge_pass_takes_precedence_over_semantic_breakpoints() {
    init_tracing();
    let service = service_with(Arc::new(TopicProvider));
    let response = service
        .process_document(ProcessDocumentRequest::new(TWO_TOPIC_TEXT))
        .await
        .unwrap();

    let chunks = &response.outcome.chunks;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].chunk_id, 0);
    assert_eq!(chunks[0].sentence_range, 0..4);
    assert_eq!(response.telemetry.sentence_count, 4);

    let trace = response.outcome.trace.unwrap();
    let breakpoints: Vec<usize> = trace
        .events
        .iter()
        .filter(|event| event.label == "breakpoint")
        .filter_map(|event| event.index)
        .collect();
    assert_eq!(breakpoints, vec![2]);
}

#[tokio::test]
async fn relaxed_minimum_keeps_the_semantic_boundary() {
    let service = service_with(Arc::new(TopicProvider));
    let request = ProcessDocumentRequest::new(TWO_TOPIC_TEXT)
        .update_chunking_config(|cfg| cfg.min_chunk_size = 10);
    let response = service.process_document(request).await.unwrap();

    let chunks = &response.outcome.chunks;
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].sentence_range, 0..2);
    assert_eq!(chunks[1].sentence_range, 2..4);
    assert!(chunks[0].text.starts_with("Cats purr"));
    assert!(chunks[1].text.starts_with("Solar panels"));
}

// Ligature, curly quotes, ellipsis glyph, and an isolated page marker all
// resolve during normalization before chunking sees the text.
#[tokio::test]
async fn normalization_scenario_flows_through_the_pipeline() {
    init_tracing();
    let service = service_with(Arc::new(MockEmbeddingProvider::new()));
    let raw = "The \u{FB01}rst \u{201C}quoted\u{201D} phrase\u{2026}\n\nPage 5\n\nnext section";
    let response = service
        .process_document(ProcessDocumentRequest::new(raw))
        .await
        .unwrap();

    let chunks = &response.outcome.chunks;
    assert_eq!(chunks.len(), 1);
    assert_eq!(
        chunks[0].text,
        "The first \"quoted\" phrase...\n\nnext section"
    );
}

#[tokio::test]
async fn empty_document_yields_empty_chunk_list() {
    let service = service_with(Arc::new(MockEmbeddingProvider::new()));
    let response = service
        .process_document(ProcessDocumentRequest::new("   \n\n  "))
        .await
        .unwrap();
    assert!(response.outcome.chunks.is_empty());
    assert_eq!(response.outcome.stats.total_chunks, 0);
}

#[tokio::test]
async fn single_sentence_yields_exactly_one_chunk() {
    let service = service_with(Arc::new(MockEmbeddingProvider::new()));
    let response = service
        .process_document(ProcessDocumentRequest::new("One lonely sentence."))
        .await
        .unwrap();
    assert_eq!(response.outcome.chunks.len(), 1);
    assert_eq!(response.outcome.chunks[0].sentence_range, 0..1);
}

#[tokio::test]
async fn provider_failure_is_terminal_for_the_document() {
    let service = service_with(Arc::new(FailingProvider));
    let result = service
        .process_document(ProcessDocumentRequest::new(TWO_TOPIC_TEXT))
        .await;
    assert!(matches!(result, Err(ChunkingError::EmbeddingFailed { .. })));
}

#[tokio::test]
async fn vector_count_mismatch_is_an_embedding_failure() {
    let service = service_with(Arc::new(MiscountingProvider));
    let result = service
        .process_document(ProcessDocumentRequest::new(TWO_TOPIC_TEXT))
        .await;
    assert!(matches!(result, Err(ChunkingError::EmbeddingFailed { .. })));
}

#[tokio::test]
async fn invalid_config_is_rejected_before_the_provider_runs() {
    let (provider, calls) = CountingProvider::new();
    let service = service_with(provider);
    let request = ProcessDocumentRequest::new(TWO_TOPIC_TEXT).with_chunking_config(ChunkingConfig {
        min_chunk_size: 500,
        max_chunk_size: 100,
        ..ChunkingConfig::default()
    });
    let result = service.process_document(request).await;
    assert!(matches!(result, Err(ChunkingError::InvalidConfig { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cache_absorbs_repeat_documents() {
    let (provider, calls) = CountingProvider::new();
    let service = PreprocessingService::builder()
        .with_embedding_provider(provider)
        .with_cache_capacity(128)
        .build();

    let first = service
        .process_document(ProcessDocumentRequest::new(TWO_TOPIC_TEXT))
        .await
        .unwrap();
    let calls_after_first = calls.load(Ordering::SeqCst);
    assert!(calls_after_first > 0);
    assert_eq!(first.telemetry.cache_hits, 0);

    let second = service
        .process_document(ProcessDocumentRequest::new(TWO_TOPIC_TEXT))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
    assert!(second.telemetry.cache_hits > 0);
    assert_eq!(
        first.outcome.chunks.len(),
        second.outcome.chunks.len()
    );
}

#[tokio::test]
async fn lower_percentile_never_yields_fewer_chunks() {
    let text = "Apples grow on trees. Rivers carve deep canyons. Engines burn refined fuel. \
                Painters mix bright pigments. Clocks measure passing time.";
    let service = service_with(Arc::new(MockEmbeddingProvider::new()));

    let loose = service
        .process_document(
            ProcessDocumentRequest::new(text)
                .update_chunking_config(|cfg| {
                    cfg.breakpoint_percentile = 0;
                    cfg.min_chunk_size = 1;
                }),
        )
        .await
        .unwrap();
    let strict = service
        .process_document(
            ProcessDocumentRequest::new(text)
                .update_chunking_config(|cfg| {
                    cfg.breakpoint_percentile = 100;
                    cfg.min_chunk_size = 1;
                }),
        )
        .await
        .unwrap();

    assert!(loose.outcome.chunks.len() >= strict.outcome.chunks.len());
}

#[tokio::test]
async fn page_offsets_flow_into_chunk_pages() {
    let page_one = "The opening page talks about cats. Cats are discussed at length.";
    let page_two = "The closing page covers solar panels. Panels are compared in detail.";
    let raw = format!("{page_one}{page_two}");

    let service = service_with(Arc::new(TopicProvider));
    let request = ProcessDocumentRequest::new(raw)
        .with_page_offsets(vec![page_one.len()])
        .update_chunking_config(|cfg| cfg.min_chunk_size = 10);
    let response = service.process_document(request).await.unwrap();

    let chunks = &response.outcome.chunks;
    assert!(chunks.len() >= 2);
    assert_eq!(chunks.first().unwrap().page, Some(1));
    assert_eq!(chunks.last().unwrap().page, Some(2));
}

#[tokio::test]
async fn chunk_ids_are_dense_and_ordered() {
    let text = "Sentence one sits here. Sentence two sits here. Sentence three sits here. \
                Sentence four sits here. Sentence five sits here.";
    let service = service_with(Arc::new(MockEmbeddingProvider::new()));
    let request = ProcessDocumentRequest::new(text)
        .update_chunking_config(|cfg| cfg.min_chunk_size = 1);
    let response = service.process_document(request).await.unwrap();

    let chunks = &response.outcome.chunks;
    assert!(!chunks.is_empty());
    let mut covered = 0usize;
    for (idx, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_id, idx);
        assert_eq!(chunk.sentence_range.start, covered);
        covered = chunk.sentence_range.end;
    }
    assert_eq!(covered, response.telemetry.sentence_count);
}

#[tokio::test]
async fn chunks_serialize_to_the_downstream_shape() {
    let service = service_with(Arc::new(MockEmbeddingProvider::new()));
    let response = service
        .process_document(ProcessDocumentRequest::new("A single sentence for export."))
        .await
        .unwrap();

    let value = serde_json::to_value(&response.outcome.chunks).unwrap();
    let first = &value[0];
    assert_eq!(first["chunk_id"], 0);
    assert!(first["text"].is_string());
    assert!(first["page"].is_null());
    assert!(first["size"].is_number());
}

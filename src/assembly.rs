//! Chunk assembly: grouping sentences at breakpoints, then repairing size
//! violations by merging short chunks and splitting oversized ones.

use std::ops::Range;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkingStats, ChunkingTrace, NormalizedText, Sentence, TraceEvent};

/// Group sentences into chunks and repair size violations.
///
/// The sentence sequence is cut at every breakpoint, chunks shorter than the
/// minimum merge forward (the last one merges backward), and chunks longer
/// than the maximum split at the sentence boundary nearest their character
/// midpoint.  A single sentence is never fragmented: one overlong sentence
/// stays an oversized chunk.  Chunks partition the sentence sequence exactly
/// and carry dense sequential ids.
pub fn assemble(
    normalized: &NormalizedText,
    sentences: &[Sentence],
    distances: &[f32],
    breakpoints: &[usize],
    cfg: &ChunkingConfig,
) -> (Vec<Chunk>, ChunkingTrace, ChunkingStats) {
    let mut events = Vec::new();
    for (idx, score) in distances.iter().enumerate() {
        events.push(TraceEvent::new("distance", Some(*score), Some(idx)));
    }
    for idx in breakpoints {
        events.push(TraceEvent::new("breakpoint", None, Some(*idx)));
    }

    if sentences.is_empty() {
        return (
            Vec::new(),
            ChunkingTrace { events },
            ChunkingStats::default(),
        );
    }

    let text = normalized.text.as_str();
    let mut ranges = initial_ranges(sentences.len(), breakpoints);

    // Merge pass: short chunks join the following chunk; a short final chunk
    // joins the preceding one.
    loop {
        if ranges.len() <= 1 {
            break;
        }
        let Some(idx) = ranges
            .iter()
            .position(|range| span_size(text, sentences, range) < cfg.min_chunk_size)
        else {
            break;
        };
        if idx + 1 < ranges.len() {
            let next = ranges.remove(idx + 1);
            ranges[idx].end = next.end;
            events.push(TraceEvent::new("merge", None, Some(idx)));
        } else {
            let last = ranges.remove(idx);
            ranges[idx - 1].end = last.end;
            events.push(TraceEvent::new("merge", None, Some(idx - 1)));
        }
    }

    // Split pass: worklist instead of recursion so pathological documents
    // cannot exhaust the stack.
    let mut final_ranges: Vec<Range<usize>> = Vec::new();
    for range in ranges {
        let mut stack = vec![range];
        while let Some(current) = stack.pop() {
            if current.len() <= 1 || span_size(text, sentences, &current) <= cfg.max_chunk_size {
                final_ranges.push(current);
                continue;
            }
            let cut = midpoint_cut(text, sentences, &current);
            events.push(TraceEvent::new("split", None, Some(cut)));
            stack.push(cut..current.end);
            stack.push(current.start..cut);
        }
    }

    let mut chunks = Vec::with_capacity(final_ranges.len());
    for (chunk_id, range) in final_ranges.into_iter().enumerate() {
        let start = sentences[range.start].start;
        let end = sentences[range.end - 1].end;
        let chunk_text = text[start..end].to_string();
        chunks.push(Chunk {
            chunk_id,
            size: chunk_text.chars().count(),
            page: sentences[range.start].page,
            sentence_range: range,
            text: chunk_text,
        });
    }

    let stats = compute_stats(&chunks, sentences.len());
    (chunks, ChunkingTrace { events }, stats)
}

/// Cut the sentence index space at each breakpoint, yielding maximal
/// contiguous runs.
fn initial_ranges(sentence_count: usize, breakpoints: &[usize]) -> Vec<Range<usize>> {
    let mut sorted = breakpoints.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges = Vec::with_capacity(sorted.len() + 1);
    let mut start = 0usize;
    for point in sorted {
        if point <= start || point >= sentence_count {
            continue;
        }
        ranges.push(start..point);
        start = point;
    }
    ranges.push(start..sentence_count);
    ranges
}

/// Character length of the normalized-text span covered by a sentence range,
/// inter-sentence separators included.
fn span_size(text: &str, sentences: &[Sentence], range: &Range<usize>) -> usize {
    let start = sentences[range.start].start;
    let end = sentences[range.end - 1].end;
    text[start..end].chars().count()
}

/// The sentence boundary nearest the character midpoint of the range.
/// Always strictly inside the range, so both halves are non-empty.
fn midpoint_cut(text: &str, sentences: &[Sentence], range: &Range<usize>) -> usize {
    let target = span_size(text, sentences, range) / 2;

    let mut best = range.start + 1;
    let mut best_delta = usize::MAX;
    let mut prefix = 0usize;
    for cut in (range.start + 1)..range.end {
        prefix += text[sentences[cut - 1].start..sentences[cut].start]
            .chars()
            .count();
        let delta = prefix.abs_diff(target);
        if delta < best_delta {
            best_delta = delta;
            best = cut;
        }
    }
    best
}

/// Aggregate statistics for assembled chunks.
fn compute_stats(chunks: &[Chunk], total_sentences: usize) -> ChunkingStats {
    let total_chunks = chunks.len();
    let size_sum: usize = chunks.iter().map(|chunk| chunk.size).sum();
    let average_size = if total_chunks == 0 {
        0.0
    } else {
        size_sum as f32 / total_chunks as f32
    };
    ChunkingStats {
        total_sentences,
        total_chunks,
        average_size,
    }
}

//! Sentence segmentation with exact byte offsets into normalized text.
//!
//! Splits after sentence-final punctuation followed by whitespace and an
//! uppercase letter (or end of text); paragraph breaks also close a sentence.
//! Splits are suppressed after configured abbreviations and never happen
//! inside decimals.  Concatenating the produced spans with the original
//! inter-sentence separators reproduces the input exactly.

use std::collections::BTreeSet;

use crate::types::{NormalizedText, Sentence};

/// Split normalized text into ordered sentences with exact offsets.
pub fn segment(normalized: &NormalizedText, abbreviations: &BTreeSet<String>) -> Vec<Sentence> {
    let text = normalized.text.as_str();
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    let mut sentences: Vec<Sentence> = Vec::new();
    let mut start: Option<usize> = None;

    let mut i = 0usize;
    while i < chars.len() {
        let (idx, c) = chars[i];

        let Some(sentence_start) = start else {
            if !c.is_whitespace() {
                start = Some(idx);
            }
            i += 1;
            continue;
        };

        match c {
            '\n' => {
                push_sentence(normalized, &mut sentences, sentence_start, idx);
                start = None;
                i += 1;
            }
            '.' | '!' | '?' => {
                let end = idx + c.len_utf8();
                let Some(&(_, next)) = chars.get(i + 1) else {
                    push_sentence(normalized, &mut sentences, sentence_start, end);
                    start = None;
                    break;
                };
                if !next.is_whitespace() {
                    i += 1;
                    continue;
                }
                let mut j = i + 1;
                while j < chars.len() && chars[j].1.is_whitespace() {
                    j += 1;
                }
                if j >= chars.len() {
                    push_sentence(normalized, &mut sentences, sentence_start, end);
                    start = None;
                    break;
                }
                let upcoming = chars[j].1;
                let suppressed =
                    c == '.' && is_abbreviation(text, sentence_start, idx, abbreviations);
                if upcoming.is_uppercase() && !suppressed {
                    push_sentence(normalized, &mut sentences, sentence_start, end);
                    start = None;
                }
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    if let Some(sentence_start) = start {
        push_sentence(normalized, &mut sentences, sentence_start, text.len());
    }

    sentences
}

fn push_sentence(
    normalized: &NormalizedText,
    sentences: &mut Vec<Sentence>,
    start: usize,
    end: usize,
) {
    let trimmed = normalized.text[start..end].trim_end();
    if trimmed.is_empty() {
        return;
    }
    let end = start + trimmed.len();
    sentences.push(Sentence {
        text: trimmed.to_string(),
        start,
        end,
        page: normalized.page_at(start),
    });
}

/// The token immediately before `period_idx`, with leading punctuation
/// stripped, checked against the exception set.
fn is_abbreviation(
    text: &str,
    sentence_start: usize,
    period_idx: usize,
    abbreviations: &BTreeSet<String>,
) -> bool {
    let before = &text[sentence_start..period_idx];
    let token = before
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("");
    let token = token.trim_start_matches(|c: char| !c.is_alphanumeric());
    !token.is_empty() && abbreviations.contains(token)
}

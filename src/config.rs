use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::ChunkingError;

/// Tokens that suppress a sentence break when they precede a period.
const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "Co", "Corp", "Dr", "Eq", "Fig", "Gen", "Inc", "Jr", "Ltd", "Mr", "Mrs", "Ms", "Mt", "No",
    "Prof", "Rev", "Sr", "St", "Vol", "al", "approx", "e.g", "ed", "etc", "i.e", "pp", "vs",
];

/// The default abbreviation exception list used by [`ChunkingConfig`].
pub fn default_abbreviations() -> BTreeSet<String> {
    DEFAULT_ABBREVIATIONS
        .iter()
        .map(|abbr| (*abbr).to_string())
        .collect()
}

/// High-level tuning knobs for segmentation, breakpoint detection, and chunk
/// repair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Percentile of the cosine-distance distribution at which a topic shift
    /// is declared, in `[0, 100]`. Lower values yield more, smaller chunks.
    pub breakpoint_percentile: u8,
    /// Chunks shorter than this (in characters) are merged during repair.
    pub min_chunk_size: usize,
    /// Chunks longer than this (in characters) are split during repair.
    pub max_chunk_size: usize,
    /// Tokens that never end a sentence when followed by a period.
    pub abbreviation_exceptions: BTreeSet<String>,
    /// Embedding cache capacity: `Some(0)` disables, `None` leaves the
    /// service default untouched.
    pub cache_capacity: Option<usize>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            breakpoint_percentile: 80,
            min_chunk_size: 100,
            max_chunk_size: 1500,
            abbreviation_exceptions: default_abbreviations(),
            cache_capacity: None,
        }
    }
}

impl ChunkingConfig {
    /// Reject invalid configurations before any processing starts.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.breakpoint_percentile > 100 {
            return Err(ChunkingError::InvalidConfig {
                reason: format!(
                    "breakpoint_percentile must lie in [0, 100], got {}",
                    self.breakpoint_percentile
                ),
            });
        }
        if self.max_chunk_size == 0 {
            return Err(ChunkingError::InvalidConfig {
                reason: "max_chunk_size must be positive".to_string(),
            });
        }
        if self.min_chunk_size > self.max_chunk_size {
            return Err(ChunkingError::InvalidConfig {
                reason: format!(
                    "min_chunk_size {} exceeds max_chunk_size {}",
                    self.min_chunk_size, self.max_chunk_size
                ),
            });
        }
        Ok(())
    }
}

/// Replacement form for em dashes and horizontal bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HyphenForm {
    /// `—` becomes `-`.
    Plain,
    /// `—` becomes ` - `, preserving readability of parenthetical dashes.
    Spaced,
}

impl HyphenForm {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            HyphenForm::Plain => "-",
            HyphenForm::Spaced => " - ",
        }
    }
}

/// Configuration for the normalization pipeline.
///
/// Uses a builder pattern — all setters are `#[must_use]`.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NormalizerConfig {
    /// Replacement form for em dashes (default [`HyphenForm::Spaced`]).
    pub em_dash: HyphenForm,
    /// Whether to repair OCR artifacts: hyphenated line wraps, spaced-out
    /// words, stray spaces around hyphens (default `true`).
    pub repair_ocr: bool,
    /// Whether to remove standalone page-marker lines (default `true`).
    pub strip_page_markers: bool,
    /// Whether to rewrite inline markup commands to readable text
    /// (default `true`).
    pub clean_markup: bool,
    /// Whether to wrap detected URLs and emails in `[URL: ...]` /
    /// `[EMAIL: ...]` markers (default `true`).
    pub tag_contacts: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            em_dash: HyphenForm::Spaced,
            repair_ocr: true,
            strip_page_markers: true,
            clean_markup: true,
            tag_contacts: true,
        }
    }
}

impl NormalizerConfig {
    /// Create a new config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the em-dash replacement form.
    #[must_use]
    pub fn em_dash(mut self, form: HyphenForm) -> Self {
        self.em_dash = form;
        self
    }

    /// Enable or disable OCR artifact repair.
    #[must_use]
    pub fn repair_ocr(mut self, enabled: bool) -> Self {
        self.repair_ocr = enabled;
        self
    }

    /// Enable or disable page-marker removal.
    #[must_use]
    pub fn strip_page_markers(mut self, enabled: bool) -> Self {
        self.strip_page_markers = enabled;
        self
    }

    /// Enable or disable markup cleanup.
    #[must_use]
    pub fn clean_markup(mut self, enabled: bool) -> Self {
        self.clean_markup = enabled;
        self
    }

    /// Enable or disable URL/email tagging.
    #[must_use]
    pub fn tag_contacts(mut self, enabled: bool) -> Self {
        self.tag_contacts = enabled;
        self
    }
}

/// Shared module bootstrap configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PreprocessingModuleConfig {
    pub normalizer: NormalizerConfig,
    pub chunking: ChunkingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ChunkingConfig::default();
        assert_eq!(cfg.breakpoint_percentile, 80);
        assert_eq!(cfg.min_chunk_size, 100);
        assert_eq!(cfg.max_chunk_size, 1500);
        assert!(cfg.abbreviation_exceptions.contains("Dr"));
        assert!(cfg.cache_capacity.is_none());
    }

    #[test]
    fn validate_rejects_out_of_range_percentile() {
        let cfg = ChunkingConfig {
            breakpoint_percentile: 101,
            ..ChunkingConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ChunkingError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let cfg = ChunkingConfig {
            min_chunk_size: 2000,
            max_chunk_size: 1500,
            ..ChunkingConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ChunkingError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(ChunkingConfig::default().validate().is_ok());
    }
}

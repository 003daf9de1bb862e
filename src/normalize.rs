//! Ordered normalization passes that canonicalize noisy extracted text.
//!
//! The pipeline repairs mojibake and control characters, applies Unicode NFKC,
//! straightens typography, heals OCR artifacts, drops page-marker lines,
//! rewrites inline markup to readable text, and tags URLs/emails.  Passes are
//! ordered so that each sees the representation it needs: line breaks survive
//! until after page-marker removal, space-sensitive OCR repairs run after the
//! final line fold, and contact tagging runs last so no earlier pass can
//! corrupt a literal match.
//!
//! The whole pipeline is idempotent: normalizing an already-normalized string
//! returns it unchanged.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{HyphenForm, NormalizerConfig};
use crate::types::{NormalizedText, PageSpan};

// ── Entry points ───────────────────────────────────────────────────────

/// Normalize a whole document without page information.
pub fn normalize(raw: &str, config: &NormalizerConfig) -> NormalizedText {
    NormalizedText::from_text(normalize_segment(raw, config))
}

/// Normalize a document whose pages begin at the given byte offsets.
///
/// Each page segment is normalized independently and the results are joined
/// with paragraph breaks; [`NormalizedText::pages`] records where each
/// surviving page landed.  Offsets are sanitized: out-of-range or unsorted
/// values are dropped, and offsets inside a multi-byte character are moved
/// back to the nearest boundary.
pub fn normalize_pages(
    raw: &str,
    page_offsets: &[usize],
    config: &NormalizerConfig,
) -> NormalizedText {
    let bounds = sanitize_offsets(raw, page_offsets);

    let mut segments: Vec<&str> = Vec::with_capacity(bounds.len() + 1);
    let mut start = 0usize;
    for &cut in &bounds {
        segments.push(&raw[start..cut]);
        start = cut;
    }
    segments.push(&raw[start..]);

    let mut text = String::new();
    let mut pages = Vec::new();
    for (index, segment) in segments.iter().enumerate() {
        let cleaned = normalize_segment(segment, config);
        if cleaned.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        let begin = text.len();
        text.push_str(&cleaned);
        pages.push(PageSpan {
            start: begin,
            end: text.len(),
            page: (index + 1) as u32,
        });
    }

    NormalizedText { text, pages }
}

fn sanitize_offsets(raw: &str, offsets: &[usize]) -> Vec<usize> {
    let mut bounds: Vec<usize> = offsets
        .iter()
        .copied()
        .filter(|&offset| offset > 0 && offset < raw.len())
        .map(|mut offset| {
            while !raw.is_char_boundary(offset) {
                offset -= 1;
            }
            offset
        })
        .filter(|&offset| offset > 0)
        .collect();
    bounds.sort_unstable();
    bounds.dedup();
    bounds
}

// ── Pass sequencing ────────────────────────────────────────────────────

fn normalize_segment(raw: &str, config: &NormalizerConfig) -> String {
    let mut current: Cow<'_, str> = Cow::Borrowed(raw);

    // 1. Encoding/control cleanup.  Single newlines survive this pass so the
    //    OCR and page-marker passes below still see line structure.
    if let Cow::Owned(s) = repair_mojibake(&current) {
        current = Cow::Owned(s);
    }
    if let Cow::Owned(s) = strip_control_chars(&current) {
        current = Cow::Owned(s);
    }
    if let Cow::Owned(s) = collapse_whitespace(&current) {
        current = Cow::Owned(s);
    }

    // 2. Compatibility canonicalization.
    if let Cow::Owned(s) = apply_nfkc(&current) {
        current = Cow::Owned(s);
    }

    // 3. Typographic normalization.
    if let Cow::Owned(s) = normalize_typography(&current, config.em_dash) {
        current = Cow::Owned(s);
    }
    if let Cow::Owned(s) = squeeze_punctuation(&current) {
        current = Cow::Owned(s);
    }

    // 4. OCR repair that needs line breaks.
    if config.repair_ocr {
        if let Cow::Owned(s) = join_hyphen_breaks(&current) {
            current = Cow::Owned(s);
        }
    }

    // 5. Page-marker lines, judged against line and segment boundaries.
    if config.strip_page_markers {
        if let Cow::Owned(s) = strip_page_marker_lines(&current) {
            current = Cow::Owned(s);
        }
    }

    // Fold remaining single newlines into spaces; paragraphs stay `\n\n`.
    if let Cow::Owned(s) = canonicalize_paragraphs(&current) {
        current = Cow::Owned(s);
    }

    // 6. Markup cleanup.
    if config.clean_markup {
        if let Cow::Owned(s) = clean_markup(&current) {
            current = Cow::Owned(s);
        }
    }

    // 4b. Space-sensitive OCR repair, after folding so rejoined words cannot
    //     reappear on a second pass.
    if config.repair_ocr {
        if let Cow::Owned(s) = repair_spacing(&current) {
            current = Cow::Owned(s);
        }
    }

    if let Cow::Owned(s) = canonicalize_paragraphs(&current) {
        current = Cow::Owned(s);
    }

    // 7. Contact tagging runs last.
    if config.tag_contacts {
        if let Cow::Owned(s) = tag_urls_and_emails(&current) {
            current = Cow::Owned(s);
        }
    }

    current.into_owned()
}

// ── 1. Encoding/control cleanup ────────────────────────────────────────

/// UTF-8 byte sequences decoded as Latin-1/CP-1252, mapped back to the
/// character they were meant to be.
static MOJIBAKE: &[(&str, &str)] = &[
    ("\u{00E2}\u{20AC}\u{2122}", "'"),        // â€™
    ("\u{00E2}\u{20AC}\u{02DC}", "'"),        // â€˜
    ("\u{00E2}\u{20AC}\u{0153}", "\""),       // â€œ
    ("\u{00E2}\u{20AC}\u{009D}", "\""),       // â€ + 0x9D
    ("\u{00E2}\u{20AC}\u{201C}", "\u{2013}"), // â€“ → en dash
    ("\u{00E2}\u{20AC}\u{201D}", "\u{2014}"), // â€” → em dash
    ("\u{00E2}\u{20AC}\u{00A6}", "\u{2026}"), // â€¦ → ellipsis
    ("\u{00E2}\u{20AC}\u{00A2}", "\u{2022}"), // â€¢ → bullet
    ("\u{00C3}\u{00A9}", "é"),
    ("\u{00C3}\u{00A8}", "è"),
    ("\u{00C3}\u{00A1}", "á"),
    ("\u{00C3}\u{00A0}", "à"),
    ("\u{00C3}\u{00B6}", "ö"),
    ("\u{00C3}\u{00BC}", "ü"),
    ("\u{00C3}\u{00B1}", "ñ"),
    ("\u{00C3}\u{00A7}", "ç"),
];

fn repair_mojibake(input: &str) -> Cow<'_, str> {
    if !input.contains('\u{00E2}') && !input.contains('\u{00C3}') {
        return Cow::Borrowed(input);
    }
    let mut result = input.to_string();
    for (broken, repaired) in MOJIBAKE {
        if result.contains(broken) {
            result = result.replace(broken, repaired);
        }
    }
    if result == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(result)
    }
}

/// Returns `true` for control and invisible characters that never belong in
/// extracted text.  Newlines and tabs survive; tabs are folded into spaces by
/// the whitespace pass.
fn is_strippable(c: char) -> bool {
    (c.is_control() && c != '\n' && c != '\t')
        || matches!(
            c,
            '\u{200B}'             // ZWSP
            | '\u{200C}'           // ZWNJ
            | '\u{200D}'           // ZWJ
            | '\u{FEFF}'           // BOM
            | '\u{00AD}'           // soft hyphen
            | '\u{2060}'           // word joiner
            | '\u{202A}'..='\u{202E}'  // bidi controls
            | '\u{2066}'..='\u{2069}'  // bidi isolates
            | '\u{FE00}'..='\u{FE0F}'  // variation selectors
        )
}

fn strip_control_chars(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_strippable) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.chars().filter(|c| !is_strippable(*c)).collect())
}

static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());
static NEWLINE_EDGE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" *\n *").unwrap());
static NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Collapse horizontal whitespace runs to single spaces, trim line edges, and
/// cap newline runs at a paragraph break.
fn collapse_whitespace(input: &str) -> Cow<'_, str> {
    let spaces = HORIZONTAL_WS.replace_all(input, " ");
    let edges = NEWLINE_EDGE_WS.replace_all(&spaces, "\n");
    let capped = NEWLINE_RUN.replace_all(&edges, "\n\n");
    if capped == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(capped.into_owned())
    }
}

// ── 2. Compatibility canonicalization ──────────────────────────────────

/// Apply Unicode NFKC normalization (ligatures, superscripts, fullwidth
/// variants), with a fast path when the text is already canonical.
fn apply_nfkc(input: &str) -> Cow<'_, str> {
    use unicode_normalization::UnicodeNormalization;
    use unicode_normalization::{IsNormalized, is_nfkc_quick};

    if is_nfkc_quick(input.chars()) == IsNormalized::Yes {
        return Cow::Borrowed(input);
    }
    let normalized: String = input.nfkc().collect();
    if normalized == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(normalized)
    }
}

// ── 3. Typographic normalization ───────────────────────────────────────

fn typography_replacement(c: char) -> Option<&'static str> {
    Some(match c {
        // curly and angle single quotes
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2039}' | '\u{203A}' => "'",
        // curly and angle double quotes
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => "\"",
        // bullet glyphs
        '\u{2022}' | '\u{2023}' | '\u{25E6}' | '\u{2043}' | '\u{25AA}' | '\u{25CF}'
        | '\u{25CB}' | '\u{25A0}' | '\u{25A1}' | '\u{25B6}' | '\u{25B8}' | '\u{27A2}' => "-",
        // ellipsis
        '\u{2026}' => "...",
        // figure dash, en dash, minus sign
        '\u{2012}' | '\u{2013}' | '\u{2212}' => "-",
        _ => return None,
    })
}

fn is_em_dash(c: char) -> bool {
    matches!(c, '\u{2014}' | '\u{2015}')
}

fn normalize_typography(input: &str, em_dash: HyphenForm) -> Cow<'_, str> {
    let needs_work = input
        .chars()
        .any(|c| is_em_dash(c) || typography_replacement(c).is_some());
    if !needs_work {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if is_em_dash(c) {
            out.push_str(em_dash.as_str());
        } else if let Some(replacement) = typography_replacement(c) {
            out.push_str(replacement);
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

static BANG_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!{2,}").unwrap());
static QUESTION_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?{2,}").unwrap());
static RULE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-=_]{3,}").unwrap());

/// Squeeze shouting punctuation and horizontal rules.  Periods are left
/// untouched so decimals and ellipses survive.
fn squeeze_punctuation(input: &str) -> Cow<'_, str> {
    let bangs = BANG_RUN.replace_all(input, "!");
    let questions = QUESTION_RUN.replace_all(&bangs, "?");
    let rules = RULE_RUN.replace_all(&questions, "---");
    if rules == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(rules.into_owned())
    }
}

// ── 4. OCR artifact repair ─────────────────────────────────────────────

static HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)-[^\S\n]*\n[^\S\n]*(\w)").unwrap());

/// Rejoin words hyphenated across a single line wrap.  Paragraph breaks are
/// never crossed.
fn join_hyphen_breaks(input: &str) -> Cow<'_, str> {
    HYPHEN_BREAK.replace_all(input, "${1}${2}")
}

static SPACED_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z] ){2,}[A-Za-z]\b").unwrap());
static SPACE_BEFORE_HYPHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w) +-(\w)").unwrap());
static SPACE_AFTER_HYPHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)- +(\w)").unwrap());

/// Heal spacing artifacts from glyph-positioned PDF extraction: runs of three
/// or more spaced-out single letters become one word, and stray spaces around
/// intra-word hyphens are removed.  Repairs run to a fixed point: adjacent
/// artifacts can shadow each other within one regex pass, and every repair
/// strictly shrinks the text, so the loop terminates.
fn repair_spacing(input: &str) -> Cow<'_, str> {
    fn round(text: &str) -> String {
        let joined = SPACED_LETTERS
            .replace_all(text, |caps: &regex::Captures<'_>| caps[0].replace(' ', ""));
        let before = SPACE_BEFORE_HYPHEN.replace_all(&joined, "${1}-${2}");
        SPACE_AFTER_HYPHEN
            .replace_all(&before, "${1}-${2}")
            .into_owned()
    }

    let first = round(input);
    if first == input {
        return Cow::Borrowed(input);
    }
    let mut current = first;
    loop {
        let next = round(&current);
        if next == current {
            return Cow::Owned(current);
        }
        current = next;
    }
}

// ── 5. Page-marker removal ─────────────────────────────────────────────

static PURE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-\s]*\d{1,4}[-\s]*$").unwrap());
static PAGE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[Pp]age\s+\d+(\s+of\s+\d+)?$").unwrap());
static NUMBER_PIPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s*\|\s*$").unwrap());

fn is_page_marker(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && (PURE_NUMBER.is_match(trimmed)
            || PAGE_WORD.is_match(trimmed)
            || NUMBER_PIPE.is_match(trimmed))
}

/// Drop standalone page-marker lines.  A marker is removed when both of its
/// neighbors are blank, or when it sits on a segment boundary (the first or
/// last line of a page).  Short numeric lines embedded in running text are
/// kept.
fn strip_page_marker_lines(input: &str) -> Cow<'_, str> {
    if !input.chars().any(|c| c.is_ascii_digit()) {
        return Cow::Borrowed(input);
    }

    let lines: Vec<&str> = input.split('\n').collect();
    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    let mut removed_any = false;

    for (i, line) in lines.iter().enumerate() {
        if is_page_marker(line) {
            let blank_before = i == 0 || lines[i - 1].trim().is_empty();
            let blank_after = i + 1 == lines.len() || lines[i + 1].trim().is_empty();
            let on_boundary = i == 0 || i + 1 == lines.len();
            if (blank_before && blank_after) || on_boundary {
                removed_any = true;
                continue;
            }
        }
        kept.push(line);
    }

    if removed_any {
        Cow::Owned(kept.join("\n"))
    } else {
        Cow::Borrowed(input)
    }
}

// ── Paragraph canonicalization ─────────────────────────────────────────

static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Fold single newlines into spaces, collapse repeated spaces, trim paragraph
/// edges, and drop empty paragraphs.  Paragraphs end up separated by exactly
/// one blank line, which makes the whole pipeline a fixed point on its own
/// output.
fn canonicalize_paragraphs(input: &str) -> Cow<'_, str> {
    let mut paragraphs: Vec<String> = Vec::new();
    for block in PARAGRAPH_BREAK.split(input) {
        let mut flat = String::with_capacity(block.len());
        for line in block.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !flat.is_empty() {
                flat.push(' ');
            }
            flat.push_str(line);
        }
        let flat = collapse_spaces(flat);
        if !flat.is_empty() {
            paragraphs.push(flat);
        }
    }
    let result = paragraphs.join("\n\n");
    if result == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(result)
    }
}

fn collapse_spaces(text: String) -> String {
    if !text.contains("  ") {
        return text;
    }
    let mut out = String::with_capacity(text.len());
    let mut previous_space = false;
    for c in text.chars() {
        if c == ' ' {
            if previous_space {
                continue;
            }
            previous_space = true;
        } else {
            previous_space = false;
        }
        out.push(c);
    }
    out
}

// ── 6. Markup cleanup ──────────────────────────────────────────────────

/// Inline-markup commands rewritten to readable text.  Longest keys first so
/// no entry clobbers a longer command sharing its prefix.
static MARKUP_SYMBOLS: &[(&str, &str)] = &[
    ("\\Rightarrow", "=>"),
    ("\\rightarrow", "->"),
    ("\\leftarrow", "<-"),
    ("\\epsilon", "epsilon"),
    ("\\partial", "partial"),
    ("\\approx", "approximately"),
    ("\\lambda", "lambda"),
    ("\\subset", "subset of"),
    ("\\alpha", "alpha"),
    ("\\delta", "delta"),
    ("\\gamma", "gamma"),
    ("\\ldots", "..."),
    ("\\nabla", "nabla"),
    ("\\notin", "not in"),
    ("\\omega", "omega"),
    ("\\sigma", "sigma"),
    ("\\theta", "theta"),
    ("\\times", "x"),
    ("\\infty", "infinity"),
    ("\\beta", "beta"),
    ("\\cdot", "*"),
    ("\\dots", "..."),
    ("\\prod", "product"),
    ("\\sqrt", "sqrt"),
    ("\\int", "integral"),
    ("\\neq", "!="),
    ("\\leq", "<="),
    ("\\geq", ">="),
    ("\\sum", "sum"),
    ("\\mu", "mu"),
    ("\\pi", "pi"),
    ("\\in", "in"),
];

static FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\frac\{([^}]*)\}\{([^}]*)\}").unwrap());
static STYLING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(?:textbf|textit|text|emph|mathrm|mathbf)\{([^}]*)\}").unwrap()
});
static SUPERSCRIPT_BRACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\^\{([^}]*)\}").unwrap());
static SUBSCRIPT_BRACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_\{([^}]*)\}").unwrap());
static LEFTOVER_COMMAND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\([A-Za-z]+)").unwrap());

/// Rewrite inline markup: known commands become spelled-out text, fractions
/// become parenthesized ratios, styling wrappers are unwrapped, inline-math
/// dollar delimiters are stripped, and any leftover command keeps its token
/// text without the escape character.
fn clean_markup(input: &str) -> Cow<'_, str> {
    if !input.contains('\\') && !input.contains('$') && !input.contains('{')
        && !input.contains('}')
    {
        return Cow::Borrowed(input);
    }

    let mut result = input.to_string();
    if result.contains('\\') {
        for (command, replacement) in MARKUP_SYMBOLS {
            if result.contains(command) {
                result = result.replace(command, replacement);
            }
        }
        result = FRACTION.replace_all(&result, "(${1}/${2})").into_owned();
        result = STYLING.replace_all(&result, "${1}").into_owned();
    }
    result = SUPERSCRIPT_BRACES
        .replace_all(&result, "^${1}")
        .into_owned();
    result = SUBSCRIPT_BRACES.replace_all(&result, "_${1}").into_owned();
    result = strip_inline_math(&result);
    result = LEFTOVER_COMMAND.replace_all(&result, "${1}").into_owned();
    result = strip_stray_braces(&result);

    if result == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(result)
    }
}

/// Remove paired single-`$` inline-math delimiters.  Display-math `$$` pairs
/// and unpaired dollars are left alone.
fn strip_inline_math(input: &str) -> String {
    if !input.contains('$') {
        return input.to_string();
    }

    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut singles: Vec<usize> = Vec::new();
    for (pos, &(idx, c)) in chars.iter().enumerate() {
        if c != '$' {
            continue;
        }
        let prev_dollar = pos > 0 && chars[pos - 1].1 == '$';
        let next_dollar = pos + 1 < chars.len() && chars[pos + 1].1 == '$';
        if !prev_dollar && !next_dollar {
            singles.push(idx);
        }
    }

    // Pair delimiters in order; a trailing unpaired dollar is kept.
    let paired: Vec<usize> = singles[..singles.len() - singles.len() % 2].to_vec();
    if paired.is_empty() {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut drop = paired.iter().copied().peekable();
    for (idx, c) in input.char_indices() {
        if drop.peek() == Some(&idx) {
            drop.next();
            continue;
        }
        out.push(c);
    }
    out
}

/// Drop `{` / `}` characters not embedded in a word on either side.
fn strip_stray_braces(input: &str) -> String {
    if !input.contains('{') && !input.contains('}') {
        return input.to_string();
    }

    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '{' || c == '}' {
            let word_before = i > 0 && is_word_char(chars[i - 1]);
            let word_after = i + 1 < chars.len() && is_word_char(chars[i + 1]);
            if !word_before && !word_after {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ── 7. URL/email tagging ───────────────────────────────────────────────

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"')\]]+"#).unwrap());
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

/// Wrap detected URLs and emails as `[URL: ...]` / `[EMAIL: ...]`.  Matches
/// already sitting inside a tag are left untouched, which keeps the pass
/// idempotent and protects emails embedded in tagged URLs.
fn tag_urls_and_emails(input: &str) -> Cow<'_, str> {
    let tagged_urls = wrap_matches(input, &URL, "URL");
    let tagged = wrap_matches(&tagged_urls, &EMAIL, "EMAIL");
    if tagged == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(tagged)
    }
}

fn wrap_matches(input: &str, pattern: &Regex, label: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0usize;
    for found in pattern.find_iter(input) {
        out.push_str(&input[last..found.start()]);
        if inside_open_tag(&out) {
            out.push_str(found.as_str());
        } else {
            out.push('[');
            out.push_str(label);
            out.push_str(": ");
            out.push_str(found.as_str());
            out.push(']');
        }
        last = found.end();
    }
    out.push_str(&input[last..]);
    out
}

fn inside_open_tag(prefix: &str) -> bool {
    for marker in ["[URL: ", "[EMAIL: "] {
        if let Some(open) = prefix.rfind(marker) {
            if !prefix[open..].contains(']') {
                return true;
            }
        }
    }
    false
}

// ── Tests ──────────────────────────────────────────────────────────────

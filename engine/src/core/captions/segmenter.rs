//! Caption Segmenter
//!
//! Derives progressive caption timing from free text. Both the live preview and
//! the batch burn-in call into this module, so on-screen timing in the editor
//! matches the exported video to within one segment.
//!
//! Segment durations are proportional to the character length of the
//! *untrimmed* clause while the displayed text is trimmed. The whitespace that
//! separates two clauses therefore weighs on the clause that follows it.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{timeline::Scene, CoreError, CoreResult, TimeSec};

/// Display budget of one caption segment, in characters
pub const MAX_SEGMENT_CHARS: usize = 45;

/// A timed sub-span of a scene's text, in scene-local seconds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub text: String,
    pub start: TimeSec,
    pub end: TimeSec,
}

impl CaptionSegment {
    pub fn duration(&self) -> TimeSec {
        self.end - self.start
    }

    /// Half-open containment check
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start && time < self.end
    }
}

/// Clause boundary: punctuation followed by whitespace
fn clause_boundary() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[.!?,;]\s+").expect("clause pattern is a valid regex"))
}

/// Text to display plus the weight it carries in the duration split
struct WeightedClause {
    display: String,
    weight: usize,
}

/// Splits `text` into timed caption segments spanning `total_duration`.
///
/// Returns an empty list for blank text or a non-positive duration.
pub fn segment(text: &str, total_duration: TimeSec) -> Vec<CaptionSegment> {
    if text.trim().is_empty() || !total_duration.is_finite() || total_duration <= 0.0 {
        return Vec::new();
    }

    let clauses: Vec<WeightedClause> = split_clauses(text)
        .into_iter()
        .flat_map(repack_clause)
        .collect();

    let total_weight: usize = clauses.iter().map(|c| c.weight).sum();
    if total_weight == 0 {
        return Vec::new();
    }

    let count = clauses.len();
    let mut cursor = 0.0;
    clauses
        .into_iter()
        .enumerate()
        .map(|(index, clause)| {
            let start = cursor;
            let end = if index + 1 == count {
                total_duration
            } else {
                start + total_duration * clause.weight as f64 / total_weight as f64
            };
            cursor = end;
            CaptionSegment {
                text: clause.display,
                start,
                end,
            }
        })
        .collect()
}

/// Strict variant of [`segment`] that rejects invalid durations instead of
/// returning an empty list.
pub fn try_segment(text: &str, total_duration: TimeSec) -> CoreResult<Vec<CaptionSegment>> {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(CoreError::InvalidDuration(total_duration));
    }
    Ok(segment(text, total_duration))
}

/// Segments for a scene's own text and duration
pub fn segments_for_scene(scene: &Scene) -> Vec<CaptionSegment> {
    segment(&scene.text, scene.duration_sec)
}

/// Picks the segment shown at `local_time`.
///
/// Before the first segment the first one is shown, past the last one the
/// last one stays on screen.
pub fn active_segment(segments: &[CaptionSegment], local_time: TimeSec) -> Option<&CaptionSegment> {
    let first = segments.first()?;
    let last = segments.last()?;

    if local_time <= 0.0 || local_time.is_nan() {
        return Some(first);
    }
    if local_time >= last.end {
        return Some(last);
    }

    segments
        .iter()
        .find(|s| s.contains(local_time))
        .or(Some(last))
}

/// Greedy word wrap to at most `chars_per_line` characters per line.
///
/// Words longer than the width are kept whole on their own line.
pub fn wrap_lines(text: &str, chars_per_line: usize) -> Vec<String> {
    pack_words(text, chars_per_line.max(1))
}

fn split_clauses(text: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut last = 0;

    for boundary in clause_boundary().find_iter(text) {
        // Punctuation is a single ASCII byte and stays with the clause it ends.
        let cut = boundary.start() + 1;
        clauses.push(&text[last..cut]);
        last = cut;
    }
    if last < text.len() {
        clauses.push(&text[last..]);
    }

    clauses.retain(|c| !c.trim().is_empty());
    clauses
}

fn repack_clause(raw: &str) -> Vec<WeightedClause> {
    let display = raw.trim();
    if display.chars().count() <= MAX_SEGMENT_CHARS {
        return vec![WeightedClause {
            display: display.to_string(),
            weight: raw.chars().count(),
        }];
    }

    pack_words(display, MAX_SEGMENT_CHARS)
        .into_iter()
        .map(|line| WeightedClause {
            weight: line.chars().count(),
            display: line,
        })
        .collect()
}

fn pack_words(text: &str, budget: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= budget {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_contiguous(segments: &[CaptionSegment], total: f64) {
        assert!(!segments.is_empty());
        assert_eq!(segments[0].start, 0.0);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[0].end);
        }
        let sum: f64 = segments.iter().map(|s| s.duration()).sum();
        assert!((sum - total).abs() < EPS, "sum {} != {}", sum, total);
        assert_eq!(segments.last().unwrap().end, total);
    }

    #[test]
    fn test_empty_text_or_duration_yields_nothing() {
        assert!(segment("", 10.0).is_empty());
        assert!(segment("   ", 10.0).is_empty());
        assert!(segment("hello", 0.0).is_empty());
        assert!(segment("hello", -3.0).is_empty());
        assert!(segment("hello", f64::NAN).is_empty());
    }

    #[test]
    fn test_try_segment_fails_fast_on_bad_duration() {
        assert!(matches!(
            try_segment("hello", 0.0),
            Err(CoreError::InvalidDuration(_))
        ));
        assert_eq!(try_segment("", 2.0).unwrap(), Vec::new());
    }

    #[test]
    fn test_single_short_clause_spans_scene() {
        let segments = segment("A quick test.", 5.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "A quick test.");
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[0].end, 5.0);
    }

    #[test]
    fn test_splits_on_punctuation_and_keeps_it() {
        let segments = segment("Wait, what? Yes! Done.", 6.0);
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Wait,", "what?", "Yes!", "Done."]);
        assert_contiguous(&segments, 6.0);
    }

    #[test]
    fn test_punctuation_without_whitespace_does_not_split() {
        let segments = segment("Version 2.5 costs $3,000 today.", 4.0);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_durations_follow_untrimmed_length() {
        // "Hi." weighs 3, " Goodbye now." weighs 13 (leading space included).
        let segments = segment("Hi. Goodbye now.", 16.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "Goodbye now.");
        assert!((segments[0].duration() - 3.0).abs() < EPS);
        assert!((segments[1].duration() - 13.0).abs() < EPS);
    }

    #[test]
    fn test_long_clause_is_repacked_without_splitting_words() {
        let text = "The quick brown fox jumps over the lazy dog while the sleepy cat watches from the warm windowsill";
        let segments = segment(text, 9.0);

        assert!(segments.len() > 1);
        for s in &segments {
            assert!(s.text.chars().count() <= MAX_SEGMENT_CHARS, "too long: {}", s.text);
        }
        let rejoined: Vec<&str> = segments.iter().flat_map(|s| s.text.split(' ')).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
        assert_contiguous(&segments, 9.0);
    }

    #[test]
    fn test_oversized_word_stands_alone() {
        let word = "x".repeat(60);
        let text = format!("tiny {} end", word);
        let segments = segment(&text, 3.0);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].text, word);
    }

    #[test]
    fn test_sum_matches_duration_for_many_inputs() {
        let inputs = [
            "One. Two. Three.",
            "Short, then a much longer clause that keeps going for quite a while, and more; finally!",
            "No punctuation at all but it is long enough to need repacking into several lines",
        ];
        for (i, text) in inputs.iter().enumerate() {
            let duration = 2.5 + i as f64 * 3.3;
            assert_contiguous(&segment(text, duration), duration);
        }
    }

    #[test]
    fn test_active_segment_fallbacks() {
        let segments = segment("First part. Second part.", 4.0);

        assert_eq!(active_segment(&segments, -1.0).unwrap().text, "First part.");
        assert_eq!(active_segment(&segments, 0.0).unwrap().text, "First part.");
        assert_eq!(active_segment(&segments, 3.9).unwrap().text, "Second part.");
        assert_eq!(active_segment(&segments, 4.0).unwrap().text, "Second part.");
        assert_eq!(active_segment(&segments, 99.0).unwrap().text, "Second part.");
        assert!(active_segment(&[], 1.0).is_none());
    }

    #[test]
    fn test_active_segment_boundary_belongs_to_next() {
        let segments = segment("Aaaa. Bbbb.", 2.0);
        let boundary = segments[0].end;
        assert_eq!(active_segment(&segments, boundary).unwrap().text, "Bbbb.");
    }

    #[test]
    fn test_wrap_lines() {
        let lines = wrap_lines("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        assert!(wrap_lines("", 10).is_empty());
    }
}

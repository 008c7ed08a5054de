// orchestrator/scoring.rs — Heuristic confidence for completed transformations

use crate::prompt_engine::TransformationKind;
use std::collections::HashSet;

/// Confidence before any check passes, in tenths.
const BASE_TENTHS: u32 = 7;
const MIN_LENGTH_RATIO: f64 = 0.3;
const MAX_LENGTH_RATIO: f64 = 3.0;
const MIN_WORD_OVERLAP: f64 = 0.3;
const SIGNIFICANT_WORD_LEN: usize = 3;

const TYPE_ANNOTATION_MARKERS: &[&str] = &[
    ": string", ": number", ": boolean", ": any", ": void", "interface ", "type ", "Record<",
    "Array<", "Promise<",
];
const FIELD_SEPARATORS: &[char] = &[',', ';', '\t', '|'];

/// Coarse well-formedness score: 0.7 base, +0.1 per passed check, capped at 1.0.
///
/// Checks: plausible length ratio, overlap with the original's significant
/// words, and a kind-specific marker. Not a correctness signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringPolicy;

impl ScoringPolicy {
    pub fn score(&self, original: &str, transformed: &str, kind: TransformationKind) -> f64 {
        let passed = [
            length_ratio_plausible(original, transformed),
            keeps_significant_words(original, transformed),
            has_kind_marker(transformed, kind),
        ]
        .iter()
        .filter(|passed| **passed)
        .count() as u32;

        // Tenths keep 0.8 / 0.9 exact instead of accumulating float error.
        let confidence = f64::from(BASE_TENTHS + passed) / 10.0;
        confidence.clamp(0.0, 1.0)
    }
}

fn length_ratio_plausible(original: &str, transformed: &str) -> bool {
    let original_len = original.chars().count();
    if original_len == 0 {
        return false;
    }

    let ratio = transformed.chars().count() as f64 / original_len as f64;
    ratio > MIN_LENGTH_RATIO && ratio < MAX_LENGTH_RATIO
}

fn keeps_significant_words(original: &str, transformed: &str) -> bool {
    let words: HashSet<String> = original
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|word| word.chars().count() > SIGNIFICANT_WORD_LEN)
        .collect();

    if words.is_empty() {
        return false;
    }

    let haystack = transformed.to_lowercase();
    let kept = words.iter().filter(|word| haystack.contains(word.as_str())).count();

    kept as f64 / words.len() as f64 >= MIN_WORD_OVERLAP
}

fn has_kind_marker(transformed: &str, kind: TransformationKind) -> bool {
    match kind {
        TransformationKind::LanguageConversion => TYPE_ANNOTATION_MARKERS
            .iter()
            .any(|marker| transformed.contains(marker)),
        TransformationKind::FormatConversion => transformed.contains(FIELD_SEPARATORS),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "function add(a,b){return a+b}";

    #[test]
    fn typed_conversion_scores_full_confidence() {
        let converted = "function add(a: number, b: number): number { return a + b; }";
        let score = ScoringPolicy.score(CODE, converted, TransformationKind::LanguageConversion);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn empty_output_keeps_base_confidence() {
        let score = ScoringPolicy.score(CODE, "", TransformationKind::Cleanup);
        assert_eq!(score, 0.7);
    }

    #[test]
    fn runaway_output_loses_length_bonus() {
        let original = "quarterly revenue grew";
        let verbose = format!("{} {}", original, "padding ".repeat(50));

        let tight = ScoringPolicy.score(original, "Quarterly revenue grew strongly.", TransformationKind::Summarization);
        let loose = ScoringPolicy.score(original, &verbose, TransformationKind::Summarization);

        assert_eq!(tight, 0.9);
        assert_eq!(loose, 0.8);
    }

    #[test]
    fn csv_output_gets_separator_bonus() {
        let json = r#"{"name": "Ada", "role": "engineer"}"#;
        let csv = "name,role\nAda,engineer";

        assert_eq!(ScoringPolicy.score(json, csv, TransformationKind::FormatConversion), 1.0);
        assert_eq!(ScoringPolicy.score(json, csv, TransformationKind::Explanation), 0.9);
    }

    #[test]
    fn discarded_content_loses_overlap_bonus() {
        let original = "Please review the attached invoice before Friday";
        let unrelated = "The weather is lovely today and sunny too";

        let score = ScoringPolicy.score(original, unrelated, TransformationKind::Enhancement);
        assert_eq!(score, 0.8);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let long = "long ".repeat(500);
        let samples: [&str; 5] = ["", "a", CODE, "x,y;z|w: string interface type", long.as_str()];
        for original in samples {
            for transformed in samples {
                for kind in TransformationKind::ALL {
                    let score = ScoringPolicy.score(original, transformed, kind);
                    assert!((0.0..=1.0).contains(&score));
                }
            }
        }
    }
}

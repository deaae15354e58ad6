//! Property-based tests for the line classifier.
//!
//! 1. Classification is a pure function of `(line, command, args)`.
//! 2. A conventional prefix always decides the category, whatever follows.
//! 3. Importance stays in 1..=5 for arbitrary input.
//! 4. Similar-line grouping partitions its input.

use proptest::prelude::*;
use readout_classify::LineClassifier;
use readout_classify::fast_path::{ERROR_PREFIXES, WARNING_PREFIXES};
use readout_core::{CognitiveLoad, LineContext, OutputKind, OutputLine};

// ── Helpers ─────────────────────────────────────────────────────────────

fn command_strategy() -> impl Strategy<Value = (String, Vec<String>)> {
    (
        prop::sample::select(vec!["go", "cargo", "npm", "make", "pytest", "sh", "unknown-tool"]),
        prop::collection::vec("[a-z./-]{0,8}", 0..3),
    )
        .prop_map(|(cmd, args)| (cmd.to_string(), args))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn classification_is_deterministic(line in ".{0,120}", (cmd, args) in command_strategy()) {
        let classifier = LineClassifier::default();
        let first = classifier.classify_output_line(&line, &cmd, &args);
        let again = classifier.classify_output_line(&line, &cmd, &args);
        let fresh = LineClassifier::default().classify_output_line(&line, &cmd, &args);
        prop_assert_eq!(first, again);
        prop_assert_eq!(first, fresh);
    }

    #[test]
    fn intent_is_deterministic((cmd, args) in command_strategy()) {
        let classifier = LineClassifier::default();
        let intent = classifier.detect_command_intent(&cmd, &args);
        prop_assert!(!intent.is_empty());
        prop_assert_eq!(intent, classifier.detect_command_intent(&cmd, &args));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Fast-path precedence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn error_prefix_always_wins(
        prefix in prop::sample::select(ERROR_PREFIXES.to_vec()),
        indent in "[ \t]{0,4}",
        rest in ".{0,80}",
        (cmd, args) in command_strategy(),
    ) {
        let line = format!("{indent}{prefix}{rest}");
        let (kind, ctx) = LineClassifier::default().classify_output_line(&line, &cmd, &args);
        prop_assert_eq!(kind, OutputKind::Error);
        prop_assert_eq!(ctx.importance, 5);
        prop_assert_eq!(ctx.cognitive_load, CognitiveLoad::High);
    }

    #[test]
    fn warning_prefix_always_wins(
        prefix in prop::sample::select(WARNING_PREFIXES.to_vec()),
        rest in ".{0,80}",
        (cmd, args) in command_strategy(),
    ) {
        let line = format!("{}{rest}", prefix.to_uppercase());
        let (kind, ctx) = LineClassifier::default().classify_output_line(&line, &cmd, &args);
        prop_assert_eq!(kind, OutputKind::Warning);
        prop_assert_eq!(ctx.importance, 4);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Importance bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn importance_in_range(line in "\\PC{0,200}", (cmd, args) in command_strategy()) {
        let (_, ctx) = LineClassifier::default().classify_output_line(&line, &cmd, &args);
        let range = LineContext::MIN_IMPORTANCE..=LineContext::MAX_IMPORTANCE;
        prop_assert!(range.contains(&ctx.importance));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Grouping partitions the input
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn grouping_partitions_lines(contents in prop::collection::vec(".{0,40}", 0..60)) {
        let classifier = LineClassifier::default();
        let lines: Vec<OutputLine> = contents
            .iter()
            .map(|c| {
                let (kind, ctx) = classifier.classify_output_line(c, "sh", &[] as &[&str]);
                OutputLine::new(c.as_str(), kind, ctx)
            })
            .collect();
        let groups = classifier.find_similar_lines(&lines);
        let total: usize = groups.values().map(Vec::len).sum();
        prop_assert_eq!(total, lines.len());
        for (key, members) in &groups {
            prop_assert!(!members.is_empty());
            for line in members {
                prop_assert_eq!(&classifier.similarity_key(line), key);
            }
        }
    }
}

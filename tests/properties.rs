//! Property tests for the engine's core guarantees.

use proptest::prelude::*;

use textpatch::{
    find_structural_block, report, run, PatchSet, PatchSpec, PatchStatus, Span, TextBuffer,
};

/// Brace-free text segments used to assemble structural bodies.
fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9 .;()\n]{0,12}"
}

/// A balanced `{...}` body with the given segments nested inside each other.
fn nested_body(segments: &[String]) -> String {
    let mut body = String::new();
    for seg in segments {
        body.push('{');
        body.push_str(seg);
    }
    for _ in segments {
        body.push('}');
    }
    body
}

proptest! {
    #[test]
    fn splice_preserves_text_outside_the_span(
        prefix in "[a-z ]{0,30}",
        middle in "[a-z ]{1,30}",
        suffix in "[a-z ]{0,30}",
        replacement in "[A-Z]{0,20}",
    ) {
        let buffer = TextBuffer::new(format!("{prefix}{middle}{suffix}"));
        let span = Span::new(prefix.len(), prefix.len() + middle.len());
        let out = buffer.splice(span, &replacement);
        prop_assert_eq!(out.as_str(), format!("{prefix}{replacement}{suffix}"));
    }

    #[test]
    fn structural_scan_matches_balanced_block(
        segments in proptest::collection::vec(segment(), 1..6),
        tail in "[a-z ;\n]{0,20}",
    ) {
        // Uppercase keeps the marker out of the segment/tail alphabets, so it
        // stays unique in the assembled buffer.
        let marker = "fn Target() ";
        let body = nested_body(&segments);
        let buffer = TextBuffer::new(format!("intro;\n{marker}{body}{tail}"));

        let span = find_structural_block(&buffer, marker, '{', '}', None)
            .unwrap()
            .expect("marker is present");
        let matched = buffer.slice(span);

        let expected = format!("{marker}{body}");
        prop_assert_eq!(matched, expected.as_str());
        prop_assert_eq!(
            matched.matches('{').count(),
            matched.matches('}').count()
        );
    }

    #[test]
    fn report_arithmetic_for_arbitrary_runs(
        entries in proptest::collection::vec(
            ("[a-z]{1,8}", "[a-z]{1,8}", any::<bool>()),
            1..8,
        ),
        target in "[a-z ]{0,40}",
    ) {
        // Build a set of uniquely-named literal patches; `hit` controls
        // whether the anchor is planted in the target.
        let mut text = target;
        let mut specs = Vec::new();
        for (i, (anchor, replacement, hit)) in entries.iter().enumerate() {
            let name = format!("patch-{i}");
            let anchor = format!("<<{i}:{anchor}>>");
            if *hit {
                text.push_str(&anchor);
            }
            specs.push(PatchSpec::literal(name, anchor, replacement.clone()).unwrap());
        }

        let original = TextBuffer::new(text);
        let set = PatchSet::from_specs(specs).unwrap();
        let out = run(&original, &set).unwrap();
        let r = report(
            &out.outcomes,
            Vec::new(),
            original.char_count(),
            out.buffer.char_count(),
        );

        prop_assert_eq!(r.total_patches, entries.len());
        prop_assert_eq!(r.applied_count + r.skipped_count, r.total_patches);
        prop_assert_eq!(
            r.char_delta,
            out.buffer.char_count() as i64 - original.char_count() as i64
        );
    }

    #[test]
    fn rerunning_a_literal_set_is_a_fixed_point(
        anchor in "[a-z]{3,10}",
        replacement in "[A-Z]{3,10}",
        pad in "[0-9 ]{0,20}",
    ) {
        let original = TextBuffer::new(format!("{pad}<{anchor}>{pad}"));
        let set = PatchSet::from_specs(vec![
            PatchSpec::literal("only", format!("<{anchor}>"), replacement).unwrap(),
        ])
        .unwrap();

        let first = run(&original, &set).unwrap();
        prop_assert_eq!(&first.outcomes[0].status, &PatchStatus::Applied);

        let second = run(&first.buffer, &set).unwrap();
        prop_assert_eq!(second.buffer.as_str(), first.buffer.as_str());
        prop_assert!(second.outcomes[0].status.is_skip());
    }
}

mod common;

use std::collections::HashMap;

use covpage::chunk::{chunk, reassemble, MIN_CHUNK_SIZE};
use covpage::codec::{self, Payload};
use covpage::model::{
    CoverageMetric, CoverageSummary, FileSummaryRecord, MetricKind, ReportClass, ReportClasses,
    StatsDocument,
};
use covpage::rollup::rollup;
use covpage::sort::{sort_records, MetricField, SortKey};
use proptest::prelude::*;
use serde_json::Value;

fn arb_metric() -> impl Strategy<Value = CoverageMetric> {
    (0u64..2000)
        .prop_flat_map(|total| (0..=total, Just(total)))
        .prop_map(|(covered, total)| CoverageMetric::new(covered, total))
}

fn arb_class() -> impl Strategy<Value = ReportClass> {
    prop::sample::select(vec![
        ReportClass::Low,
        ReportClass::Medium,
        ReportClass::High,
        ReportClass::Empty,
    ])
}

fn arb_record() -> impl Strategy<Value = FileSummaryRecord> {
    (
        "[a-zA-Z_/]{1,16}\\.js",
        arb_metric(),
        arb_metric(),
        arb_metric(),
        arb_metric(),
        arb_class(),
        arb_class(),
    )
        .prop_map(|(file, statements, branches, functions, lines, c1, c2)| {
            FileSummaryRecord {
                file,
                metrics: CoverageSummary {
                    statements,
                    branches,
                    functions,
                    lines,
                },
                report_classes: ReportClasses {
                    statements: c1,
                    branches: c2,
                    functions: c1,
                    lines: c2,
                },
            }
        })
}

fn arb_detail() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::from),
        ".{0,24}".prop_map(Value::from),
        prop::collection::vec(".{0,8}", 0..6).prop_map(|v| serde_json::json!({ "annotatedCode": v })),
    ]
}

fn arb_document() -> impl Strategy<Value = StatsDocument> {
    (
        0i64..4_102_444_800_000,
        prop::collection::vec(arb_record(), 0..12),
        prop::collection::btree_map("[a-z/]{1,12}", arb_detail(), 0..6),
    )
        .prop_map(|(datetime, summary, details)| StatsDocument {
            datetime,
            summary,
            details,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decode_inverts_encode(doc in arb_document()) {
        let text = codec::encode(&doc).unwrap();
        let joined = codec::decode(&Payload::Joined(text.clone())).unwrap();
        prop_assert_eq!(&joined, &doc);

        let fragments = codec::decode(&Payload::Chunks(chunk(&text, 100))).unwrap();
        prop_assert_eq!(&fragments, &doc);
    }

    #[test]
    fn chunks_reassemble_exactly(text in "[0-9,]{0,400}", size in 1usize..128) {
        let fragments = chunk(&text, size);
        prop_assert_eq!(reassemble(&fragments), text);
    }

    #[test]
    fn byte_fragments_fit_chunk_size(
        bytes in prop::collection::vec(any::<u8>(), 0..200),
        size in MIN_CHUNK_SIZE..128,
    ) {
        let text = bytes.iter().map(u8::to_string).collect::<Vec<_>>().join(",");
        let fragments = chunk(&text, size);
        for f in &fragments {
            prop_assert!(f.len() <= size, "{:?} exceeds {}", f, size);
        }
        prop_assert_eq!(reassemble(&fragments), text);
    }

    #[test]
    fn rollup_ignores_order(
        (records, shuffled) in prop::collection::vec(arb_record(), 0..20)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        for kind in MetricKind::ALL {
            prop_assert_eq!(rollup(&records, kind), rollup(&shuffled, kind));
        }
    }

    #[test]
    fn rollup_pct_is_always_finite(records in prop::collection::vec(arb_record(), 0..20)) {
        for kind in MetricKind::ALL {
            let total = rollup(&records, kind);
            prop_assert!(total.pct.is_finite());
            prop_assert!((0.0..=100.0).contains(&total.pct));
            if total.total == 0 {
                prop_assert_eq!(total.pct, 0.0);
            }
        }
    }

    #[test]
    fn sorting_by_file_is_idempotent(records in prop::collection::vec(arb_record(), 0..20)) {
        let mut once = records.clone();
        sort_records(&mut once, SortKey::File, false);
        let mut twice = once.clone();
        sort_records(&mut twice, SortKey::File, false);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sorting_by_pct_keeps_ties_in_order(
        pcts in prop::collection::vec((0u64..4, 1u64..4), 0..24),
        descending in any::<bool>(),
    ) {
        let records: Vec<FileSummaryRecord> = pcts
            .iter()
            .enumerate()
            .map(|(i, &(covered, total))| common::record(&format!("f{i}"), covered.min(total), total))
            .collect();
        let position: HashMap<String, usize> =
            records.iter().enumerate().map(|(i, r)| (r.file.clone(), i)).collect();

        let mut sorted = records.clone();
        sort_records(&mut sorted, SortKey::Metric(MetricKind::Lines, MetricField::Pct), descending);

        for pair in sorted.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.metrics.lines.pct == b.metrics.lines.pct {
                prop_assert!(position[&a.file] < position[&b.file]);
            }
        }
    }
}

#![no_main]

use dejadiff::regression::compare;
use dejadiff::sumfile::{parse_aggregate_counts, parse_grouped_counts, parse_sum_text, render_sum_text};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    // Parsing must never panic and must be idempotent
    let results = parse_sum_text(&input);
    assert_eq!(parse_sum_text(&render_sum_text(&results)), results);
    assert!(compare(&results, &results).is_clean());

    let _ = parse_aggregate_counts("gcc", &input);
    let _ = parse_grouped_counts(&input);
});

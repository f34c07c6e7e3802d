// DejaGnu summary parsing
//
// Turns the text of a `.sum` file (or the stdout of a test run) into either
// a per-test ResultSet or flat count maps used as build properties.
// Parsing never fails on content: lines that match no known shape are
// skipped. Only reading a file can fail, and a missing file is reported as
// absence rather than as an error.

mod counts;
mod results;

pub use counts::{
    collect_testsuite_counts, parse_aggregate_counts, parse_grouped_counts, CountMap,
    DEFAULT_SUITES,
};
pub use results::{parse_sum_text, read_sum_file, render_sum_text, ResultSet, TestOutcome};

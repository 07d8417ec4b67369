//! Declarative macros for generating CLI parsing and output tests.
//!
//! Command modules declare their cases and these macros expand them into
//! `#[rstest]` functions. Expansions expect `Args`, `clap::Parser` and
//! `rstest::rstest` in scope.

/// Parse a full `mollerdb` argument list and check one field of the command.
///
/// # Example
///
/// ```ignore
/// cli_parse_test! {
///     test_name: test_short_end_run,
///     args: ["runs", "-s", "1000", "-e", "1005"],
///     variant: Runs,
///     field: end_run,
///     expected: 1005,
/// }
/// ```
#[macro_export]
macro_rules! cli_parse_test {
    (
        test_name: $test_name:ident,
        args: [$($arg:expr),+ $(,)?],
        variant: $variant:ident,
        field: $field:ident,
        expected: $expected:expr $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let args = Args::try_parse_from(["mollerdb", $($arg),+]).unwrap();
            let crate::commands::Command::$variant(cmd) = args.command else {
                panic!(concat!("parsed as something other than ", stringify!($variant)));
            };
            assert_eq!(cmd.$field, $expected, concat!(stringify!($field), " mismatch"));
        }
    };
}

/// Check that an argument list is rejected, optionally naming the flag the
/// error message must mention.
#[macro_export]
macro_rules! cli_rejects_test {
    (
        test_name: $test_name:ident,
        args: [$($arg:expr),+ $(,)?],
        mentions: $flag:literal $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let err = Args::try_parse_from(["mollerdb", $($arg),+]).unwrap_err();
            assert!(err.to_string().contains($flag), "error should mention {}: {}", $flag, err);
        }
    };
    (
        test_name: $test_name:ident,
        args: [$($arg:expr),+ $(,)?] $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            assert!(Args::try_parse_from(["mollerdb", $($arg),+]).is_err());
        }
    };
}

/// The run-range flags shared by every catalog command.
///
/// Expands into a `run_range` module covering long and short `--start-run` /
/// `--end-run`, both being required, and integer-only values. `extra` holds
/// the command's other required arguments.
///
/// # Example
///
/// ```ignore
/// run_range_cli_tests! {
///     command: "main-detector-results",
///     variant: MainDetectorResults,
///     extra: ["--detector", "md1"],
/// }
/// ```
#[macro_export]
macro_rules! run_range_cli_tests {
    (
        command: $cmd:literal,
        variant: $variant:ident,
        extra: [$($extra:literal),* $(,)?] $(,)?
    ) => {
        mod run_range {
            use crate::cli::Args;
            use clap::Parser;
            use rstest::rstest;

            crate::cli_parse_test! {
                test_name: test_long_start_run,
                args: [$cmd, "--start-run", "1000", "--end-run", "1100" $(, $extra)*],
                variant: $variant,
                field: start_run,
                expected: 1000,
            }

            crate::cli_parse_test! {
                test_name: test_short_end_run,
                args: [$cmd, "-s", "1000", "-e", "1100" $(, $extra)*],
                variant: $variant,
                field: end_run,
                expected: 1100,
            }

            crate::cli_parse_test! {
                test_name: test_negative_run_parses,
                args: [$cmd, "--start-run=-5", "-e", "10" $(, $extra)*],
                variant: $variant,
                field: start_run,
                expected: -5,
            }

            crate::cli_rejects_test! {
                test_name: test_requires_start_run,
                args: [$cmd, "-e", "1100" $(, $extra)*],
                mentions: "--start-run",
            }

            crate::cli_rejects_test! {
                test_name: test_requires_end_run,
                args: [$cmd, "-s", "1000" $(, $extra)*],
                mentions: "--end-run",
            }

            crate::cli_rejects_test! {
                test_name: test_rejects_non_integer_run,
                args: [$cmd, "-s", "first", "-e", "1100" $(, $extra)*],
            }
        }
    };
}

// =============================================================================
// Output Test Macros
// =============================================================================

/// Generate one output test for a fixture.
///
/// The last key picks the check:
/// - `table:` exact table output
/// - `table_contains:` substrings of the table output
/// - `json:` fields of the parsed JSON output
/// - `toon:` substrings of the toon output
///
/// # Example
/// ```ignore
/// output_test! {
///     test_name: test_format_json,
///     fixture: with_port,
///     fixture_type: PingResult,
///     json: { "host": "db.example", "port": 5433 },
/// }
/// ```
#[macro_export]
macro_rules! output_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        table: $expected:expr $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use crate::output::Outputable;
            assert_eq!($fixture.to_table(), $expected);
        }
    };
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        table_contains: [$($needle:literal),* $(,)?] $(,)?
    ) => {
        $crate::output_test!(@contains $test_name, $fixture, $fixture_type, Table, [$($needle),*]);
    };
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        toon: [$($needle:literal),* $(,)?] $(,)?
    ) => {
        $crate::output_test!(@contains $test_name, $fixture, $fixture_type, Toon, [$($needle),*]);
    };
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        json: { $($field:literal : $expected:expr),* $(,)? } $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use crate::output::{OutputFormat, Outputable};
            let parsed: serde_json::Value =
                serde_json::from_str(&$fixture.format(OutputFormat::Json))
                    .expect("Should produce valid JSON");
            $(
                assert_eq!(parsed[$field], $expected, concat!("JSON field mismatch: ", $field));
            )*
        }
    };
    (@contains $test_name:ident, $fixture:ident, $fixture_type:ty, $format:ident, [$($needle:literal),*]) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use crate::output::{OutputFormat, Outputable};
            let output = $fixture.format(OutputFormat::$format);
            $(
                assert!(
                    output.contains($needle),
                    concat!(stringify!($format), " output should contain: ", $needle)
                );
            )*
        }
    };
}

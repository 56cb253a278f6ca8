//! File discovery, checking and report rendering behind the `sigcheck` binary.

mod check;
mod report;

pub use check::{collect_java_files, run_check, CheckReport, CheckSummary};
pub use report::{render_declarations, render_text};

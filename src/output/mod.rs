//! Output formatting for roofline reports.

mod json;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{
    format_estimate_lines, format_report, format_stride_table, format_summary, format_trial_line,
};

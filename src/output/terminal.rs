//! Terminal output formatting.
//!
//! The metric lines (`name = value unit`) are plain text, one per line, so
//! they can be grepped or parsed. The summary around them uses ANSI colors.

use colored::Colorize;

use crate::measurement::{ProbeKind, Sample, StridePoint};
use crate::result::RooflineReport;

/// Format one trial as `bandwidth = X GB/s` or `performance = X GFLOP/s`.
pub fn format_trial_line(kind: ProbeKind, sample: &Sample) -> String {
    let name = match kind {
        ProbeKind::Bandwidth => "bandwidth",
        ProbeKind::Compute => "performance",
    };
    format!("{} = {:.3} {}", name, sample.giga_rate(), kind.rate_unit())
}

/// Format the four fitted quantities, one per line.
pub fn format_estimate_lines(report: &RooflineReport) -> String {
    let e = &report.estimate;
    format!(
        "b = {} GB/s\np = {} GFLOP/s\narithmetic_intensity = {} FLOP/byte\nr = {} GFLOP/s\n",
        e.b, e.p, e.arithmetic_intensity, e.r
    )
}

/// Format a full report for human-readable terminal output.
///
/// Includes the per-trial lines, the fitted quantities, the regime split and
/// any preflight warnings.
pub fn format_report(report: &RooflineReport) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("roofline-oracle\n");
    output.push_str(&sep);
    output.push_str("\n\n");

    for (b, c) in report
        .bandwidth_trials
        .samples()
        .iter()
        .zip(report.compute_trials.samples())
    {
        output.push_str(&format_trial_line(ProbeKind::Bandwidth, b));
        output.push('\n');
        output.push_str(&format_trial_line(ProbeKind::Compute, c));
        output.push('\n');
    }
    output.push('\n');
    output.push_str(&format_estimate_lines(report));
    output.push('\n');
    output.push_str(&format_summary(report));
    output
}

/// Format the colored summary: regime, ridge point, warnings, metadata.
pub fn format_summary(report: &RooflineReport) -> String {
    let mut output = String::new();
    let e = &report.estimate;
    let memory_pct = e.regime.memory_term * 100.0;

    let verdict = if e.regime.memory_term > 0.5 {
        "Memory bound".cyan().bold()
    } else {
        "Compute bound".green().bold()
    };
    output.push_str(&format!(
        "  {} over the intensity range ({:.0}% of draws memory bound)\n",
        verdict, memory_pct
    ));
    output.push_str(&format!("    Ridge point: {} FLOP/byte\n", e.ridge_point));
    output.push('\n');

    if report.preflight.has_warnings() {
        let header = if report.has_critical_warnings() {
            "\u{26A0} Measurement warnings (critical)".red().bold()
        } else {
            "\u{26A0} Measurement warnings".yellow().bold()
        };
        output.push_str(&format!("  {}\n", header));
        for description in report.preflight.descriptions() {
            output.push_str(&format!("    - {}\n", description));
        }
        output.push('\n');
    }

    let m = &report.metadata;
    output.push_str(
        &format!(
            "  {} trials, {} MiB working set, {} flops/trial, seed {}, {:.2}s\n",
            m.trials,
            m.bandwidth_bytes / (1024 * 1024),
            m.flops_per_trial,
            m.seed,
            m.runtime_secs
        )
        .dimmed()
        .to_string(),
    );
    output
}

/// Format a stride sweep as an aligned table.
pub fn format_stride_table(points: &[StridePoint]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{}\n",
        format!(
            "{:>8} {:>10} {:>12} {:>10}",
            "stride", "bytes", "GB/s", "ns/access"
        )
        .bold()
    ));
    for point in points {
        output.push_str(&format!(
            "{:>8} {:>10} {:>12.3} {:>10.3}\n",
            point.stride_elements,
            point.stride_bytes,
            point.effective_gb_per_s(),
            point.ns_per_access()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::measurement::Probe;
    use crate::RooflineEstimator;

    struct Fixed(ProbeKind, f64);

    impl Probe for Fixed {
        fn kind(&self) -> ProbeKind {
            self.0
        }

        fn run(&mut self) -> Result<Sample, ProbeError> {
            Ok(Sample::new(1.0, self.1))
        }
    }

    #[test]
    fn test_report_has_trial_and_metric_lines() {
        let report = RooflineEstimator::new()
            .trials(2)
            .draws(100)
            .seed(7)
            .run_with_probes(
                Fixed(ProbeKind::Bandwidth, 10e9),
                Fixed(ProbeKind::Compute, 50e9),
                |_, _, _| {},
            )
            .unwrap();
        let text = format_report(&report);
        let lines: Vec<&str> = text.lines().collect();

        let trial_lines: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| l.starts_with("bandwidth = ") || l.starts_with("performance = "))
            .collect();
        assert_eq!(
            trial_lines,
            vec![
                "bandwidth = 10.000 GB/s",
                "performance = 50.000 GFLOP/s",
                "bandwidth = 10.000 GB/s",
                "performance = 50.000 GFLOP/s",
            ]
        );

        assert!(lines.contains(&"b = 10.000 GB/s"), "{}", text);
        assert!(lines.contains(&"p = 50.000 GFLOP/s"), "{}", text);
        for prefix in ["arithmetic_intensity = ", "r = "] {
            assert_eq!(
                lines.iter().filter(|l| l.starts_with(prefix)).count(),
                1,
                "{}",
                text
            );
        }
        assert!(text.contains("Ridge point: 5.000 FLOP/byte"), "{}", text);
    }

    #[test]
    fn test_trial_lines() {
        let bw = Sample::new(0.5, 10e9);
        assert_eq!(
            format_trial_line(ProbeKind::Bandwidth, &bw),
            "bandwidth = 20.000 GB/s"
        );
        let c = Sample::new(2.0, 100e9);
        assert_eq!(
            format_trial_line(ProbeKind::Compute, &c),
            "performance = 50.000 GFLOP/s"
        );
    }

    #[test]
    fn test_stride_table_has_row_per_point() {
        let points = vec![
            StridePoint {
                stride_elements: 1,
                stride_bytes: 4,
                accesses: 1000,
                elapsed_secs: 1e-6,
            },
            StridePoint {
                stride_elements: 16,
                stride_bytes: 64,
                accesses: 1000,
                elapsed_secs: 2e-6,
            },
        ];
        let table = format_stride_table(&points);
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("64"));
    }
}

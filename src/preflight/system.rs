//! Host configuration checks.
//!
//! Frequency scaling, boost clocks and virtualization all move the two
//! ceilings a roofline is built from. These checks read sysfs/procfs on Linux
//! and report nothing elsewhere.

use serde::{Deserialize, Serialize};

/// Load average above which the core is probably shared.
const LOAD_THRESHOLD: f64 = 1.0;

/// Warning from system checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SystemWarning {
    /// CPU frequency scaling is not set to performance mode.
    CpuGovernorNotPerformance {
        /// Current governor setting.
        current: String,
    },

    /// Turbo boost is enabled; peak FLOP/s depends on thermal headroom.
    TurboBoostEnabled,

    /// Running under a hypervisor.
    VirtualMachineDetected,

    /// One-minute load average above the threshold.
    HighSystemLoad {
        /// Current load average.
        load_average: f64,
        /// Threshold exceeded.
        threshold: f64,
    },
}

impl SystemWarning {
    /// System warnings are informational.
    pub fn is_critical(&self) -> bool {
        false
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            SystemWarning::CpuGovernorNotPerformance { current } => format!(
                "CPU frequency governor is '{}'; peak GFLOP/s will drift with \
                 clock scaling. Set with: sudo cpupower frequency-set -g performance",
                current
            ),
            SystemWarning::TurboBoostEnabled => {
                "Turbo boost is enabled; the compute ceiling reflects boost \
                 clocks and may not be sustainable."
                    .to_string()
            }
            SystemWarning::VirtualMachineDetected => {
                "Running in a virtual machine; memory bandwidth and clock rates \
                 are shared with other guests."
                    .to_string()
            }
            SystemWarning::HighSystemLoad {
                load_average,
                threshold,
            } => format!(
                "High system load detected: {:.2} (threshold: {:.2}). \
                 Trials may be preempted.",
                load_average, threshold
            ),
        }
    }
}

/// Perform all system checks.
///
/// On unsupported platforms, returns an empty vector.
pub fn system_check() -> Vec<SystemWarning> {
    #[allow(unused_mut)]
    let mut warnings = Vec::new();

    #[cfg(target_os = "linux")]
    {
        let read = |path: &str| std::fs::read_to_string(path).ok();

        warnings.extend(
            read("/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor")
                .and_then(|s| governor_warning(&s)),
        );

        // intel_pstate reports the inverse flag
        let turbo = match read("/sys/devices/system/cpu/intel_pstate/no_turbo") {
            Some(no_turbo) => no_turbo.trim() == "0",
            None => read("/sys/devices/system/cpu/cpufreq/boost").is_some_and(|b| b.trim() == "1"),
        };
        if turbo {
            warnings.push(SystemWarning::TurboBoostEnabled);
        }

        if read("/proc/cpuinfo").is_some_and(|c| cpuinfo_has_hypervisor(&c)) {
            warnings.push(SystemWarning::VirtualMachineDetected);
        }

        warnings.extend(read("/proc/loadavg").and_then(|s| load_warning(&s)));
    }

    warnings
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn governor_warning(contents: &str) -> Option<SystemWarning> {
    let governor = contents.trim().to_lowercase();
    (!governor.is_empty() && governor != "performance")
        .then_some(SystemWarning::CpuGovernorNotPerformance { current: governor })
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn cpuinfo_has_hypervisor(cpuinfo: &str) -> bool {
    cpuinfo
        .lines()
        .filter(|line| line.starts_with("flags"))
        .any(|line| line.split_whitespace().any(|flag| flag == "hypervisor"))
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn load_warning(loadavg: &str) -> Option<SystemWarning> {
    let load = loadavg.split_whitespace().next()?.parse::<f64>().ok()?;
    (load > LOAD_THRESHOLD).then_some(SystemWarning::HighSystemLoad {
        load_average: load,
        threshold: LOAD_THRESHOLD,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_check_runs() {
        let _warnings = system_check();
    }

    #[test]
    fn test_governor_parsing() {
        assert!(governor_warning("performance\n").is_none());
        assert_eq!(
            governor_warning("powersave\n"),
            Some(SystemWarning::CpuGovernorNotPerformance {
                current: "powersave".to_string()
            })
        );
        assert!(governor_warning("").is_none());
    }

    #[test]
    fn test_hypervisor_flag() {
        let host = "processor\t: 0\nflags\t\t: fpu vme de pse avx2 fma\n";
        let guest = "processor\t: 0\nflags\t\t: fpu vme avx2 hypervisor fma\n";
        assert!(!cpuinfo_has_hypervisor(host));
        assert!(cpuinfo_has_hypervisor(guest));
    }

    #[test]
    fn test_load_parsing() {
        assert!(load_warning("0.42 0.30 0.20 1/123 4567\n").is_none());
        match load_warning("2.50 1.00 0.50 3/123 4567\n") {
            Some(SystemWarning::HighSystemLoad { load_average, .. }) => {
                assert_eq!(load_average, 2.5)
            }
            other => panic!("expected HighSystemLoad, got {:?}", other),
        }
        assert!(load_warning("garbage").is_none());
    }

    #[test]
    fn test_warning_descriptions() {
        let warning = SystemWarning::CpuGovernorNotPerformance {
            current: "powersave".to_string(),
        };
        assert!(warning.description().contains("powersave"));
        assert!(SystemWarning::TurboBoostEnabled
            .description()
            .contains("Turbo boost"));

        let warning = SystemWarning::HighSystemLoad {
            load_average: 2.5,
            threshold: 1.0,
        };
        assert!(warning.description().contains("2.50"));
        assert!(!warning.is_critical());
    }
}

//! Measurement infrastructure: the interval timer and the hardware probes.
//!
//! Both roofline probes follow the same discipline:
//! - the working set is allocated and initialized before the timer starts;
//! - loop inputs are read through [`black_box`] so the optimizer cannot fold
//!   or hoist them;
//! - results are passed through [`black_box`] after the timer stops so the
//!   timed loop cannot be proven dead;
//! - every invocation allocates a fresh working set.
//!
//! # Probes
//!
//! - [`BandwidthProbe`]: sequential `i32` stores over ≥128 MiB (bytes/s)
//! - [`ComputeProbe`]: 9-FMA dependency chains over 8 `f64` lanes (FLOP/s)
//! - [`StrideProbe`]: strided stores, a cache/TLB diagnostic

mod bandwidth;
mod collector;
mod compute;
mod stride;
mod timer;

pub use bandwidth::BandwidthProbe;
pub use collector::{Probe, ProbeKind, Sample, TrialSeries};
pub use compute::ComputeProbe;
pub use stride::{StridePoint, StrideProbe};
pub use timer::{black_box, clock_resolution_secs, Timer};

pub(crate) use compute::flops_per_trial;
pub(crate) use timer::check_elapsed;

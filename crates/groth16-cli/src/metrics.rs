//! Wall-clock, CPU and peak-memory measurement around a closure.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Process resource counters at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    /// User CPU time consumed so far
    pub user: Duration,
    /// System CPU time consumed so far
    pub system: Duration,
    /// High-water mark of the resident set, in KiB
    pub max_rss_kb: u64,
}

#[cfg(unix)]
fn timeval(tv: libc::timeval) -> Duration {
    Duration::from_secs(tv.tv_sec.max(0) as u64) + Duration::from_micros(tv.tv_usec.max(0) as u64)
}

impl ResourceUsage {
    /// Read `getrusage(RUSAGE_SELF)`
    #[cfg(unix)]
    #[allow(unsafe_code)]
    pub fn now() -> Self {
        let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
        // SAFETY: `usage` is a valid out pointer for the duration of the call.
        let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
        if rc != 0 {
            return Self::default();
        }
        // SAFETY: getrusage returned 0, so the struct is initialised.
        let usage = unsafe { usage.assume_init() };

        // Linux reports KiB, macOS bytes
        let max_rss = usage.ru_maxrss.max(0) as u64;
        let max_rss_kb = if cfg!(target_os = "macos") { max_rss / 1024 } else { max_rss };

        Self {
            user: timeval(usage.ru_utime),
            system: timeval(usage.ru_stime),
            max_rss_kb,
        }
    }

    /// Counters are unavailable off unix
    #[cfg(not(unix))]
    pub fn now() -> Self {
        Self::default()
    }

    /// Total CPU time
    pub fn cpu(&self) -> Duration {
        self.user + self.system
    }
}

/// Resources spent by one measured section
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Elapsed wall-clock seconds
    pub wall_seconds: f64,
    /// User plus system CPU seconds
    pub cpu_seconds: f64,
    /// CPU seconds over wall seconds, as a percentage
    pub cpu_percent: f64,
    /// Process peak resident set at the end of the section, in KiB
    pub peak_rss_kb: u64,
}

impl Metrics {
    fn between(start: &ResourceUsage, end: &ResourceUsage, wall: Duration) -> Self {
        let wall_seconds = wall.as_secs_f64();
        let cpu_seconds = end.cpu().saturating_sub(start.cpu()).as_secs_f64();
        let cpu_percent = if wall_seconds > 0.0 {
            100.0 * cpu_seconds / wall_seconds
        } else {
            0.0
        };
        Self {
            wall_seconds,
            cpu_seconds,
            cpu_percent,
            peak_rss_kb: end.max_rss_kb,
        }
    }

    /// Sum of two sections run back to back
    pub fn combine(&self, other: &Metrics) -> Metrics {
        let wall_seconds = self.wall_seconds + other.wall_seconds;
        let cpu_seconds = self.cpu_seconds + other.cpu_seconds;
        Metrics {
            wall_seconds,
            cpu_seconds,
            cpu_percent: if wall_seconds > 0.0 {
                100.0 * cpu_seconds / wall_seconds
            } else {
                0.0
            },
            peak_rss_kb: self.peak_rss_kb.max(other.peak_rss_kb),
        }
    }
}

/// Started measurement
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
    usage: ResourceUsage,
}

impl Stopwatch {
    /// Start measuring now
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            usage: ResourceUsage::now(),
        }
    }

    /// Metrics from the start until now
    pub fn stop(&self) -> Metrics {
        let end = ResourceUsage::now();
        Metrics::between(&self.usage, &end, self.started.elapsed())
    }
}

/// Run `f` and measure it
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Metrics) {
    let stopwatch = Stopwatch::start();
    let value = f();
    (value, stopwatch.stop())
}

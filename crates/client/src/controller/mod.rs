//! Write-rate controller
//!
//! Throttles each (event name, call site) pair independently with a
//! second-aligned fixed window:
//!
//! - first write, a write after the window ended, or a write whose clock is
//!   behind the stored window start opens a new window with count 1
//! - otherwise the count goes up and the write is admitted while
//!   `count <= threshold`
//!
//! Windows live in a bounded LRU map keyed by an FNV-1a hash of
//! `"{event}_{func}_{line}"`, so a flood of distinct call sites can only
//! cost the oldest entries.

mod cache;

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use sysevent_config::{DEFAULT_CACHE_CAPACITY, DEFAULT_PERIOD, DEFAULT_THRESHOLD, RateLimitConfig};

use cache::LruCache;

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;

const FNV_OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// Bytes of the key string that feed the hash
const HASH_INPUT_LIMIT: usize = 256;

const MS_PER_SEC: u64 = 1000;

/// Window length and admission threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlParam {
    /// Window length in seconds
    pub period: u32,
    /// Writes admitted per window
    pub threshold: u32,
}

impl ControlParam {
    pub const fn new(period: u32, threshold: u32) -> Self {
        Self { period, threshold }
    }
}

impl Default for ControlParam {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD, DEFAULT_THRESHOLD)
    }
}

impl From<&RateLimitConfig> for ControlParam {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(config.period, config.threshold)
    }
}

/// Where a write came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite<'a> {
    pub func: &'a str,
    pub line: u32,
}

impl<'a> CallSite<'a> {
    pub const fn new(func: &'a str, line: u32) -> Self {
        Self { func, line }
    }
}

/// Outcome of a rate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Suppressed,
}

impl Admission {
    #[inline]
    pub fn is_admitted(self) -> bool {
        self == Self::Admitted
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start_ms: u64,
    count: u32,
}

/// Admission counters
#[derive(Debug, Default)]
pub struct ControllerStats {
    pub admitted: AtomicU64,
    pub suppressed: AtomicU64,
}

impl ControllerStats {
    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }
}

/// Per call-site sliding window limiter
pub struct RateController {
    windows: Mutex<LruCache<u64, Window>>,
    default_param: ControlParam,
    enabled: bool,
    stats: ControllerStats,
}

impl RateController {
    /// Create a controller with the built-in defaults
    pub fn new() -> Self {
        Self::with_capacity(ControlParam::default(), DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(default_param: ControlParam, capacity: usize) -> Self {
        Self {
            windows: Mutex::new(LruCache::new(capacity)),
            default_param,
            enabled: true,
            stats: ControllerStats::default(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        let mut controller = Self::with_capacity(config.into(), config.cache_capacity);
        controller.enabled = config.enabled;
        controller
    }

    /// Parameters used when a write does not bring its own
    #[inline]
    pub fn default_param(&self) -> ControlParam {
        self.default_param
    }

    /// Check a write against the current wall clock
    pub fn check(
        &self,
        param: Option<ControlParam>,
        domain: &str,
        event_name: &str,
        caller: &CallSite<'_>,
    ) -> Admission {
        let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.check_at(param, domain, event_name, caller, now_ms)
    }

    /// Check a write at an explicit time in milliseconds since the epoch
    pub fn check_at(
        &self,
        param: Option<ControlParam>,
        domain: &str,
        event_name: &str,
        caller: &CallSite<'_>,
        now_ms: u64,
    ) -> Admission {
        if !self.enabled {
            return Admission::Admitted;
        }

        let param = param.unwrap_or(self.default_param);
        let key = hash_key(event_name, caller);
        let admission = {
            let mut windows = self.windows.lock();
            let (window, admission) = advance(windows.get(&key), &param, now_ms);
            windows.put(key, window);
            admission
        };

        match admission {
            Admission::Admitted => {
                self.stats.admitted.fetch_add(1, Ordering::Relaxed);
            }
            Admission::Suppressed => {
                self.stats.suppressed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    domain = %domain,
                    event = %event_name,
                    func = %caller.func,
                    line = caller.line,
                    threshold = param.threshold,
                    period = param.period,
                    "write suppressed, frequency too high"
                );
            }
        }
        admission
    }

    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    /// Number of call sites currently tracked
    pub fn tracked(&self) -> usize {
        self.windows.lock().len()
    }

    /// Most call sites tracked at once
    pub fn capacity(&self) -> usize {
        self.windows.lock().capacity()
    }

    pub fn clear(&self) {
        self.windows.lock().clear();
    }
}

impl Default for RateController {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply one write to a window
fn advance(current: Option<Window>, param: &ControlParam, now_ms: u64) -> (Window, Admission) {
    let fresh = Window {
        start_ms: now_ms,
        count: 1,
    };
    let Some(window) = current else {
        return (fresh, Admission::Admitted);
    };

    let cur_sec = now_ms / MS_PER_SEC;
    let start_sec = window.start_ms / MS_PER_SEC;
    let rolled_over = cur_sec >= start_sec.saturating_add(u64::from(param.period));
    let clock_went_back = cur_sec < start_sec;
    if rolled_over || clock_went_back {
        return (fresh, Admission::Admitted);
    }

    let window = Window {
        count: window.count.saturating_add(1),
        ..window
    };
    let admission = if window.count <= param.threshold {
        Admission::Admitted
    } else {
        Admission::Suppressed
    };
    (window, admission)
}

/// FNV-1a over the first 256 bytes of `"{event}_{func}_{line}"`
pub fn hash_key(event_name: &str, caller: &CallSite<'_>) -> u64 {
    let key = format!("{}_{}_{}", event_name, caller.func, caller.line);
    fnv1a(&key.as_bytes()[..key.len().min(HASH_INPUT_LIMIT)])
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

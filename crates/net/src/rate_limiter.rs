use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Knobs for the accept-time and per-session limiters.
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    pub enabled: bool,
    pub max_connections_total: usize,
    pub max_connections_per_ip: usize,
    pub packets_per_second: u32,
    pub login_attempts_per_minute: u32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_connections_total: 1000,
            max_connections_per_ip: 8,
            packets_per_second: 60,
            login_attempts_per_minute: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitRejection {
    TotalLimitReached,
    IpLimitReached,
}

impl std::fmt::Display for AdmitRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TotalLimitReached => write!(f, "server at max connections"),
            Self::IpLimitReached => write!(f, "too many connections from this address"),
        }
    }
}

/// Connection counts per source address and in total, checked at accept.
/// Shared between the accept loop and session tasks via Arc<Mutex>.
#[derive(Debug)]
pub struct ConnectionLimiter {
    config: LimiterConfig,
    total: usize,
    per_ip: BTreeMap<IpAddr, usize>,
}

impl ConnectionLimiter {
    pub fn new(config: LimiterConfig) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            config,
            total: 0,
            per_ip: BTreeMap::new(),
        }))
    }

    pub fn try_admit(&mut self, ip: IpAddr) -> Result<(), AdmitRejection> {
        if !self.config.enabled {
            self.total += 1;
            *self.per_ip.entry(ip).or_insert(0) += 1;
            return Ok(());
        }
        if self.total >= self.config.max_connections_total {
            return Err(AdmitRejection::TotalLimitReached);
        }
        let count = self.per_ip.entry(ip).or_insert(0);
        if *count >= self.config.max_connections_per_ip {
            return Err(AdmitRejection::IpLimitReached);
        }
        *count += 1;
        self.total += 1;
        Ok(())
    }

    pub fn release(&mut self, ip: IpAddr) {
        if let Some(count) = self.per_ip.get_mut(&ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.per_ip.remove(&ip);
            }
        }
        self.total = self.total.saturating_sub(1);
    }

    pub fn total_connections(&self) -> usize {
        self.total
    }
}

/// Per-session token bucket applied by the reader before handler dispatch.
/// Excess packets are counted; sustained violation is reported so the
/// session can be closed rather than throttled forever.
#[derive(Debug)]
pub struct PacketThrottle {
    max_per_second: u32,
    tokens: u32,
    violations: u32,
    last_refill: Instant,
}

/// Consecutive over-budget packets tolerated before the session is closed.
const VIOLATION_CLOSE_THRESHOLD: u32 = 64;

impl PacketThrottle {
    pub fn new(max_per_second: u32) -> Self {
        Self {
            max_per_second,
            tokens: max_per_second,
            violations: 0,
            last_refill: Instant::now(),
        }
    }

    /// Account one inbound packet. `Ok(true)` = within budget, `Ok(false)` =
    /// over budget but tolerated, `Err(())` = violation threshold crossed.
    pub fn on_packet(&mut self) -> Result<bool, ()> {
        if self.max_per_second == 0 {
            return Ok(true);
        }
        self.refill();
        if self.tokens > 0 {
            self.tokens -= 1;
            self.violations = 0;
            return Ok(true);
        }
        self.violations += 1;
        if self.violations >= VIOLATION_CLOSE_THRESHOLD {
            return Err(());
        }
        Ok(false)
    }

    fn refill(&mut self) {
        let elapsed = self.last_refill.elapsed();
        let new_tokens = (elapsed.as_secs_f64() * self.max_per_second as f64) as u32;
        if new_tokens > 0 {
            self.tokens = (self.tokens + new_tokens).min(self.max_per_second);
            self.last_refill = Instant::now();
        }
    }

    #[cfg(test)]
    fn backdate(&mut self, by: Duration) {
        self.last_refill -= by;
    }
}

/// Login attempts per minute per source address, consulted while the
/// session is still pre-authentication.
#[derive(Debug)]
pub struct LoginAttemptLimiter {
    max_per_minute: u32,
    windows: BTreeMap<IpAddr, (Instant, u32)>,
}

impl LoginAttemptLimiter {
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_minute,
            windows: BTreeMap::new(),
        }
    }

    pub fn try_attempt(&mut self, ip: IpAddr) -> bool {
        self.try_attempt_at(ip, Instant::now())
    }

    fn try_attempt_at(&mut self, ip: IpAddr, now: Instant) -> bool {
        if self.max_per_minute == 0 {
            return true;
        }
        let window = Duration::from_secs(60);
        let entry = self.windows.entry(ip).or_insert((now, 0));
        if now.duration_since(entry.0) >= window {
            *entry = (now, 0);
        }
        if entry.1 >= self.max_per_minute {
            return false;
        }
        entry.1 += 1;
        true
    }
}

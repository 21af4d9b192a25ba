//! Network quality accounting shared by both endpoints
//!
//! Each endpoint owns one `NetworkStats`. The server aggregates across all
//! peers; the client tracks its single connection. Counters only ever grow;
//! nothing is reset for reporting.

use std::time::{Duration, Instant};

/// Weight kept from the previous RTT average on each new sample.
const RTT_SMOOTHING: f32 = 0.9;

#[derive(Debug, Clone)]
pub struct NetworkStats {
    pub packets_sent: u32,
    pub packets_received: u32,
    pub packets_lost: u32,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// `f32::INFINITY` until the first sample.
    pub rtt_min: f32,
    pub rtt_max: f32,
    /// Exponentially weighted average, 0 until the first sample.
    pub rtt_avg: f32,
    pub rtt_current: f32,
    pub throughput_bps: f32,
    pub start_time: Instant,
    /// Last send or receive; diagnostics only.
    pub last_update: Instant,
    rtt_samples: u32,
}

/// Point-in-time copy of every statistic, handed out for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub packets_sent: u32,
    pub packets_received: u32,
    pub packets_lost: u32,
    pub loss_percent: u8,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub rtt_current: f32,
    pub rtt_avg: f32,
    pub rtt_min: Option<f32>,
    pub rtt_max: f32,
    pub throughput_bps: f32,
    pub elapsed: Duration,
}

impl NetworkStats {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            packets_sent: 0,
            packets_received: 0,
            packets_lost: 0,
            bytes_sent: 0,
            bytes_received: 0,
            rtt_min: f32::INFINITY,
            rtt_max: 0.0,
            rtt_avg: 0.0,
            rtt_current: 0.0,
            throughput_bps: 0.0,
            start_time: now,
            last_update: now,
            rtt_samples: 0,
        }
    }

    pub fn record_sent(&mut self, size: usize) {
        self.packets_sent = self.packets_sent.wrapping_add(1);
        self.bytes_sent += size as u64;
        self.last_update = Instant::now();
    }

    pub fn record_received(&mut self, size: usize) {
        self.packets_received = self.packets_received.wrapping_add(1);
        self.bytes_received += size as u64;
        self.last_update = Instant::now();
    }

    /// Counts one inferred loss. Never derived from sent/received deltas.
    pub fn record_lost(&mut self) {
        self.packets_lost = self.packets_lost.wrapping_add(1);
    }

    pub fn update_rtt(&mut self, sample_ms: f32) {
        self.rtt_current = sample_ms;
        self.rtt_min = self.rtt_min.min(sample_ms);
        self.rtt_max = self.rtt_max.max(sample_ms);

        self.rtt_avg = if self.rtt_samples == 0 {
            sample_ms
        } else {
            RTT_SMOOTHING * self.rtt_avg + (1.0 - RTT_SMOOTHING) * sample_ms
        };
        self.rtt_samples = self.rtt_samples.saturating_add(1);
    }

    /// Rounded loss percentage in `[0, 100]`; 0 when nothing was sent.
    pub fn loss_percent(&self) -> u8 {
        if self.packets_sent == 0 {
            return 0;
        }

        let loss = self.packets_lost as f64 / self.packets_sent as f64 * 100.0;
        loss.round().clamp(0.0, 100.0) as u8
    }

    /// Bits per second sent since `start_time`, stored in `throughput_bps`.
    pub fn throughput(&mut self) -> f32 {
        self.throughput_over(self.start_time.elapsed())
    }

    /// Recomputes throughput for an explicit elapsed window. A zero window
    /// keeps the previous value.
    pub fn throughput_over(&mut self, elapsed: Duration) -> f32 {
        let secs = elapsed.as_secs_f32();
        if secs > 0.0 {
            self.throughput_bps = self.bytes_sent as f32 * 8.0 / secs;
        }
        self.throughput_bps
    }

    pub fn summary(&mut self) -> StatsSummary {
        let elapsed = self.start_time.elapsed();
        let throughput_bps = self.throughput_over(elapsed);

        StatsSummary {
            packets_sent: self.packets_sent,
            packets_received: self.packets_received,
            packets_lost: self.packets_lost,
            loss_percent: self.loss_percent(),
            bytes_sent: self.bytes_sent,
            bytes_received: self.bytes_received,
            rtt_current: self.rtt_current,
            rtt_avg: self.rtt_avg,
            rtt_min: (self.rtt_samples > 0).then_some(self.rtt_min),
            rtt_max: self.rtt_max,
            throughput_bps,
            elapsed,
        }
    }
}

impl Default for NetworkStats {
    fn default() -> Self {
        Self::new()
    }
}

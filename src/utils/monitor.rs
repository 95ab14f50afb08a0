#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Resource usage of this process at one point of a run.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy)]
pub struct ResourceSnapshot {
    pub cpu_percent: f32,
    pub rss_mb: u64,
    pub peak_rss_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: System,
    pid: Pid,
    peak_rss_mb: u64,
}

/// Per-phase resource logging, enabled with `--monitor`.
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    sampler: Option<Mutex<Sampler>>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let sampler = enabled
            .then(|| sysinfo::get_current_pid().ok())
            .flatten()
            .map(|pid| {
                Mutex::new(Sampler {
                    system: System::new(),
                    pid,
                    peak_rss_mb: 0,
                })
            });

        Self {
            sampler,
            started: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> Option<ResourceSnapshot> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        let pid = sampler.pid;
        sampler.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        let (cpu_percent, rss_mb) = {
            let process = sampler.system.process(pid)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };
        sampler.peak_rss_mb = sampler.peak_rss_mb.max(rss_mb);

        Some(ResourceSnapshot {
            cpu_percent,
            rss_mb,
            peak_rss_mb: sampler.peak_rss_mb,
            elapsed: self.started.elapsed(),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(s) = self.snapshot() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                s.cpu_percent,
                s.rss_mb,
                s.peak_rss_mb,
                s.elapsed
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(s) = self.snapshot() {
            tracing::info!(
                "📊 Run finished in {:?}, peak memory {}MB",
                s.elapsed,
                s.peak_rss_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }
}

// library builds without the cli feature get a no-op monitor
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn disabled_monitor_reports_nothing() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
        assert!(monitor.snapshot().is_none());
    }

    #[test]
    fn enabled_monitor_tracks_peak_memory() {
        let monitor = SystemMonitor::new(true);
        assert!(monitor.is_enabled());

        if let (Some(first), Some(second)) = (monitor.snapshot(), monitor.snapshot()) {
            assert!(second.peak_rss_mb >= first.rss_mb);
            assert!(second.elapsed >= first.elapsed);
        }
    }
}

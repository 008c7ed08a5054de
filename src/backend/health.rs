// backend/health.rs — Cached health probing and availability tracking

use super::{BackendAvailability, BackendGateway, BackendStatus};
use crate::config::BackendConfig;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const STATUS_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);
/// Shorter watch intervals are raised to this.
pub const MIN_PROBE_INTERVAL: Duration = Duration::from_millis(100);

struct CachedStatus {
    probed_at: Instant,
    target: String,
    status: BackendStatus,
}

/// Owns the cached `BackendStatus`. Only `refresh` writes it.
pub struct HealthMonitor {
    gateway: Arc<dyn BackendGateway>,
    ttl: Duration,
    cache: Mutex<Option<CachedStatus>>,
    availability: watch::Sender<BackendAvailability>,
}

impl HealthMonitor {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self::with_ttl(gateway, STATUS_TTL)
    }

    pub fn with_ttl(gateway: Arc<dyn BackendGateway>, ttl: Duration) -> Self {
        let (availability, _) = watch::channel(BackendAvailability::Unknown);
        Self {
            gateway,
            ttl,
            cache: Mutex::new(None),
            availability,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BackendAvailability> {
        self.availability.subscribe()
    }

    pub fn availability(&self) -> BackendAvailability {
        *self.availability.borrow()
    }

    /// Last probe result for this backend target, if still within the TTL.
    pub fn cached(&self, config: &BackendConfig) -> Option<BackendStatus> {
        let guard = self.cache.lock().ok()?;
        guard
            .as_ref()
            .filter(|entry| entry.target == probe_target(config))
            .filter(|entry| entry.probed_at.elapsed() < self.ttl)
            .map(|entry| entry.status.clone())
    }

    /// Cached status when fresh, otherwise a new probe.
    pub async fn status(&self, config: &BackendConfig) -> BackendStatus {
        match self.cached(config) {
            Some(status) => status,
            None => self.refresh(config).await,
        }
    }

    pub async fn refresh(&self, config: &BackendConfig) -> BackendStatus {
        let previous = self.availability.send_replace(BackendAvailability::Probing);

        let status = self.gateway.probe(config).await;
        let next = status.availability();

        if let Ok(mut guard) = self.cache.lock() {
            *guard = Some(CachedStatus {
                probed_at: Instant::now(),
                target: probe_target(config),
                status: status.clone(),
            });
        }
        self.availability.send_replace(next);

        if previous != next {
            tracing::info!(
                gateway = self.gateway.name(),
                from = ?previous,
                to = ?next,
                diagnostic = %status.diagnostic,
                "Backend availability changed"
            );
        }

        status
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cache.lock() {
            *guard = None;
        }
    }

    /// Probe on a fixed timer until `shutdown` fires. `interval` is raised to
    /// at least `MIN_PROBE_INTERVAL`.
    pub fn spawn_watch(
        self: Arc<Self>,
        config: BackendConfig,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let interval = interval.max(MIN_PROBE_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.refresh(&config).await;
                    }
                }
            }

            tracing::debug!("Health watch stopped");
        })
    }
}

fn probe_target(config: &BackendConfig) -> String {
    format!("{}|{}", config.base_url, config.model_name)
}

//! Bounded, cancellable discovery of a wireless controller
//!
//! Scans in sub-intervals with a cooldown between them. The radio IO thread
//! reports a found controller through a cloneable [`DiscoveryHandle`]; the
//! caller blocks on a condition variable until the device arrives, the time
//! budget runs out, or the discovery is cancelled.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};

use crate::config::DiscoveryConfig;
use crate::util::time::Timer;

use super::{Device, Radio};

/// Discovery errors
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// No controller answered within the time budget. Recoverable, the
    /// caller may retry with a fresh scan.
    #[error("no controller found within the discovery time budget")]
    Timeout,

    /// Discovery was cancelled from another thread, normal during shutdown.
    #[error("discovery cancelled")]
    Cancelled,
}

#[derive(Default)]
struct DiscoveryState {
    found: Option<Device>,
    cancelled: bool,
}

struct Shared {
    state: Mutex<DiscoveryState>,
    condvar: Condvar,
}

/// Cloneable handle for reporting into a discovery in progress.
/// `device_found` is called from the radio IO thread, `cancel` from anywhere.
#[derive(Clone)]
pub struct DiscoveryHandle {
    shared: Arc<Shared>,
}

impl DiscoveryHandle {
    /// Report a found controller. The first report wins, later ones are
    /// ignored.
    pub fn device_found(&self, device: Device) {
        let mut state = self.shared.state.lock();
        if state.found.is_none() {
            state.found = Some(device);
        }
        self.shared.condvar.notify_all();
    }

    /// Cancel the discovery. The waiter observes this within its current
    /// wake, well under a second. Sticky: a cancelled discovery stays
    /// cancelled.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        state.cancelled = true;
        self.shared.condvar.notify_all();
    }
}

enum WaitOutcome {
    Found(Device),
    Cancelled,
    Elapsed,
}

/// Blocking discovery driver. Generic over the radio so tests can substitute
/// a recording fake.
pub struct DeviceDiscovery<R: Radio> {
    radio: R,
    config: DiscoveryConfig,
    shared: Arc<Shared>,
}

impl<R: Radio> DeviceDiscovery<R> {
    pub fn new(radio: R, config: DiscoveryConfig) -> Self {
        Self {
            radio,
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(DiscoveryState::default()),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Handle for the radio IO thread and for cancellation
    pub fn handle(&self) -> DiscoveryHandle {
        DiscoveryHandle {
            shared: self.shared.clone(),
        }
    }

    /// Block until a controller is found, the budget elapses, or the
    /// discovery is cancelled. Returns within one scan sub-interval past the
    /// configured timeout in the worst case.
    pub fn discover(&self) -> Result<Device, DiscoveryError> {
        {
            // Leftover reports from a previous attempt must not satisfy
            // this one. Cancellation is sticky and survives the reset.
            let mut state = self.shared.state.lock();
            state.found = None;
        }

        let timer = Timer::new();
        let mut attempt = 0u32;

        loop {
            if timer.elapsed() >= self.config.timeout {
                warn!(
                    elapsed_ms = timer.elapsed_ms(),
                    "Discovery timed out, no controller answered"
                );
                return Err(DiscoveryError::Timeout);
            }

            attempt += 1;
            info!(attempt, "Scanning for controller");
            self.radio.start_scan();
            let outcome = self.wait(self.config.scan_interval);
            self.radio.stop_scan();

            match outcome {
                WaitOutcome::Found(device) => {
                    self.radio.acknowledge(&device);
                    info!(device_id = %device.id, attempt, "Controller found");
                    return Ok(device);
                }
                WaitOutcome::Cancelled => {
                    info!(attempt, "Discovery cancelled");
                    return Err(DiscoveryError::Cancelled);
                }
                WaitOutcome::Elapsed => {}
            }

            // Radio cooldown before the next scan cycle. Waits on the same
            // condvar so cancellation stays prompt.
            match self.wait(self.config.cooldown) {
                WaitOutcome::Found(device) => {
                    self.radio.acknowledge(&device);
                    info!(device_id = %device.id, attempt, "Controller found");
                    return Ok(device);
                }
                WaitOutcome::Cancelled => {
                    info!(attempt, "Discovery cancelled");
                    return Err(DiscoveryError::Cancelled);
                }
                WaitOutcome::Elapsed => {}
            }
        }
    }

    /// Condition wait that tolerates spurious wakes: the found/cancelled
    /// flags are re-validated on every wake until the deadline passes.
    fn wait(&self, duration: std::time::Duration) -> WaitOutcome {
        let deadline = Instant::now() + duration;
        let mut state = self.shared.state.lock();
        loop {
            if state.cancelled {
                return WaitOutcome::Cancelled;
            }
            if let Some(device) = state.found.take() {
                return WaitOutcome::Found(device);
            }
            let result = self.shared.condvar.wait_until(&mut state, deadline);
            if result.timed_out() {
                if state.cancelled {
                    return WaitOutcome::Cancelled;
                }
                if let Some(device) = state.found.take() {
                    return WaitOutcome::Found(device);
                }
                return WaitOutcome::Elapsed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;

    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeRadio {
        calls: StdMutex<Vec<&'static str>>,
    }

    impl Radio for FakeRadio {
        fn start_scan(&self) {
            self.calls.lock().unwrap().push("start_scan");
        }

        fn stop_scan(&self) {
            self.calls.lock().unwrap().push("stop_scan");
        }

        fn acknowledge(&self, _device: &Device) {
            self.calls.lock().unwrap().push("acknowledge");
        }
    }

    fn fast_config() -> DiscoveryConfig {
        DiscoveryConfig {
            timeout: Duration::from_millis(200),
            scan_interval: Duration::from_millis(50),
            cooldown: Duration::from_millis(10),
        }
    }

    #[test]
    fn returns_device_reported_by_io_thread() {
        let discovery = DeviceDiscovery::new(FakeRadio::default(), fast_config());
        let handle = discovery.handle();

        let reporter = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            handle.device_found(Device::connected(DeviceId::new()));
        });

        let device = discovery.discover().expect("device should be found");
        assert!(device.core_connected);
        reporter.join().unwrap();

        let calls = discovery.radio.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &["start_scan", "stop_scan", "acknowledge"]);
    }

    #[test]
    fn times_out_when_nothing_answers() {
        let discovery = DeviceDiscovery::new(FakeRadio::default(), fast_config());

        let result = discovery.discover();
        assert!(matches!(result, Err(DiscoveryError::Timeout)));

        let calls = discovery.radio.calls.lock().unwrap();
        let starts = calls.iter().filter(|c| **c == "start_scan").count();
        let stops = calls.iter().filter(|c| **c == "stop_scan").count();
        assert!(starts >= 2, "should have re-scanned after cooldown");
        assert_eq!(starts, stops, "every scan must be stopped");
        assert!(!calls.contains(&"acknowledge"));
    }

    #[test]
    fn cancel_unblocks_the_waiter_promptly() {
        let config = DiscoveryConfig {
            timeout: Duration::from_secs(30),
            scan_interval: Duration::from_secs(15),
            cooldown: Duration::from_secs(1),
        };
        let discovery = DeviceDiscovery::new(FakeRadio::default(), config);
        let handle = discovery.handle();

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            handle.cancel();
        });

        let timer = Timer::new();
        let result = discovery.discover();
        canceller.join().unwrap();

        assert!(matches!(result, Err(DiscoveryError::Cancelled)));
        assert!(
            timer.elapsed() < Duration::from_secs(1),
            "cancel must unblock well under a second"
        );

        let calls = discovery.radio.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &["start_scan", "stop_scan"]);
    }

    #[test]
    fn spurious_wakes_do_not_end_the_wait() {
        let discovery = DeviceDiscovery::new(FakeRadio::default(), fast_config());
        let shared = discovery.shared.clone();

        // Wake the waiter repeatedly without setting any flag. The wait must
        // keep going until its deadline.
        let waker = std::thread::spawn(move || {
            for _ in 0..5 {
                std::thread::sleep(Duration::from_millis(10));
                shared.condvar.notify_all();
            }
        });

        let result = discovery.discover();
        waker.join().unwrap();
        assert!(matches!(result, Err(DiscoveryError::Timeout)));
    }

    #[test]
    fn cancel_is_sticky_across_attempts() {
        let discovery = DeviceDiscovery::new(FakeRadio::default(), fast_config());
        discovery.handle().cancel();

        assert!(matches!(
            discovery.discover(),
            Err(DiscoveryError::Cancelled)
        ));
        assert!(matches!(
            discovery.discover(),
            Err(DiscoveryError::Cancelled)
        ));
    }
}

//! Cooperative stop requests for running loops.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Requests a stop. Cloning shares the same underlying flag.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// Observes stop requests. Each loop owns its own clone.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl StopSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop is requested. Pends forever if every handle was
    /// dropped without stopping.
    pub async fn stopped(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleeps for `duration` unless stopped first. Returns `false` on stop.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.stopped() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_sleep() {
        let (handle, mut signal) = stop_channel();
        let stopper = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            stopper.stop();
        });

        let started = tokio::time::Instant::now();
        assert!(!signal.sleep(Duration::from_secs(60)).await);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert!(signal.is_stopped());
        assert!(handle.signal().is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_never_stops() {
        let (handle, mut signal) = stop_channel();
        drop(handle);
        assert!(signal.sleep(Duration::from_secs(1)).await);
        assert!(StopSignal::never().sleep(Duration::from_secs(1)).await);
    }
}

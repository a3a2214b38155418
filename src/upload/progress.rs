use std::sync::mpsc::Sender;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::types::WorkflowEvent;

pub const INITIAL_PROGRESS: u8 = 5;
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);
pub const TICK_STEP: u8 = 3;
pub const TICK_CAP: u8 = 80;
pub const STORED_CHECKPOINT: u8 = 85;

/// Cosmetic progress while the storage call is pending; it does not track bytes sent.
///
/// The ticking task lives exactly as long as this value: dropping it aborts the
/// task, so every exit path of the owning scope stops the ticks.
pub struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Must be called inside a tokio runtime.
    pub fn start(start: u8, events: Sender<WorkflowEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.tick().await;

            let mut value = start.min(TICK_CAP);
            while value < TICK_CAP {
                interval.tick().await;
                value = value.saturating_add(TICK_STEP).min(TICK_CAP);
                if events.send(WorkflowEvent::Progress(value)).is_err() {
                    break;
                }
            }
        });

        Self { handle }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    fn progress_values(events: &std::sync::mpsc::Receiver<WorkflowEvent>) -> Vec<u8> {
        events
            .try_iter()
            .map(|event| match event {
                WorkflowEvent::Progress(value) => value,
                other => panic!("unexpected event {other:?}"),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval_and_stops_when_dropped() {
        let (sender, events) = channel();
        let ticker = ProgressTicker::start(INITIAL_PROGRESS, sender);

        tokio::time::sleep(Duration::from_millis(650)).await;
        drop(ticker);
        assert_eq!(progress_values(&events), vec![8, 11, 14]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(progress_values(&events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn never_passes_the_cap() {
        let (sender, events) = channel();
        let _ticker = ProgressTicker::start(INITIAL_PROGRESS, sender);

        tokio::time::sleep(Duration::from_secs(60)).await;
        let values = progress_values(&events);
        assert_eq!(values.last(), Some(&TICK_CAP));
        assert!(values.iter().all(|v| *v <= TICK_CAP));
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert!(TICK_CAP < STORED_CHECKPOINT);
    }
}

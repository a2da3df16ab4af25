use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

enum Msg {
    Trigger,
    Shutdown,
}

/// Coalesces rapid trigger signals into a single deferred action.
///
/// Each `trigger()` arms (or re-arms) a deadline `delay` in the future; the
/// action runs only once the deadline passes without another trigger, so N
/// triggers inside the window produce exactly one run. The action executes
/// on the debouncer's own thread.
pub struct Debouncer {
    tx: Sender<Msg>,
    handle: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("debounce".to_string())
            .spawn(move || run(rx, delay, action))
            .ok();
        Self { tx, handle }
    }

    /// Arm or re-arm the timer. Never blocks and never runs the action on
    /// the caller's thread.
    pub fn trigger(&self) {
        let _ = self.tx.send(Msg::Trigger);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        // A pending (not yet fired) action is cancelled by shutdown.
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run<F>(rx: Receiver<Msg>, delay: Duration, mut action: F)
where
    F: FnMut(),
{
    let mut deadline: Option<Instant> = None;
    loop {
        let msg = match deadline {
            Some(d) => match rx.recv_deadline(d) {
                Ok(msg) => msg,
                Err(RecvTimeoutError::Timeout) => {
                    deadline = None;
                    action();
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match rx.recv() {
                Ok(msg) => msg,
                Err(_) => return,
            },
        };

        match msg {
            Msg::Trigger => deadline = Some(Instant::now() + delay),
            Msg::Shutdown => {
                if deadline.is_some() {
                    debug!("debouncer shut down with a pending action");
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_many_triggers_one_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let debouncer = Debouncer::new(Duration::from_millis(30), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..10 {
            debouncer.trigger();
        }

        thread::sleep(Duration::from_millis(150));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_triggers_outside_window_each_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let debouncer = Debouncer::new(Duration::from_millis(20), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        debouncer.trigger();
        thread::sleep(Duration::from_millis(100));
        debouncer.trigger();
        thread::sleep(Duration::from_millis(100));

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_retrigger_resets_window() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let debouncer = Debouncer::new(Duration::from_millis(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Keep re-arming before the window elapses
        for _ in 0..4 {
            debouncer.trigger();
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        thread::sleep(Duration::from_millis(150));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_cancels_pending_action() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let debouncer = Debouncer::new(Duration::from_millis(200), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        debouncer.trigger();
        drop(debouncer);

        thread::sleep(Duration::from_millis(300));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_trigger_no_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let _debouncer = Debouncer::new(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(80));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}

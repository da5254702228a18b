//! Per-field debounce timers.
//!
//! Each field owns at most one pending timer. Scheduling a field aborts the
//! timer it already had, so a burst of edits ends in a single firing once
//! the field has been quiet for the whole delay.
//!
//! Timers are tokio tasks and must be scheduled from inside a runtime. A
//! firing timer only hands its [`TimerTicket`] to the action; callers that
//! receive tickets asynchronously should confirm them with
//! [`AutosaveScheduler::complete`], which rejects tickets whose timer was
//! cancelled or replaced after the task had already woken up.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Independently debounced parts of a meeting document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Body,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Title => write!(f, "title"),
            Field::Body => write!(f, "body"),
        }
    }
}

/// Identifies one scheduled firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTicket {
    pub field: Field,
    pub generation: u64,
}

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Debounce timers keyed by field. Dropping the scheduler cancels them all.
#[derive(Default)]
pub struct AutosaveScheduler {
    timers: HashMap<Field, PendingTimer>,
    next_generation: u64,
}

impl AutosaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a timer for `field` that runs `action` once `delay` passes
    /// without another call for the same field. Any earlier timer for
    /// `field` is cancelled first.
    pub fn schedule<F>(&mut self, field: Field, delay: Duration, action: F) -> TimerTicket
    where
        F: FnOnce(TimerTicket) + Send + 'static,
    {
        self.cancel(field);

        self.next_generation += 1;
        let ticket = TimerTicket {
            field,
            generation: self.next_generation,
        };

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action(ticket);
        });

        tracing::debug!(%field, generation = ticket.generation, ?delay, "autosave scheduled");
        self.timers.insert(
            field,
            PendingTimer {
                generation: ticket.generation,
                handle,
            },
        );
        ticket
    }

    /// Cancels the pending timer for `field`. Returns true if one existed.
    pub fn cancel(&mut self, field: Field) -> bool {
        match self.timers.remove(&field) {
            Some(timer) => {
                timer.handle.abort();
                tracing::debug!(%field, generation = timer.generation, "autosave cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.cancel(Field::Title);
        self.cancel(Field::Body);
    }

    /// Accepts a fired ticket if it belongs to the field's current timer,
    /// clearing that timer. Stale tickets return false.
    pub fn complete(&mut self, ticket: TimerTicket) -> bool {
        match self.timers.get(&ticket.field) {
            Some(timer) if timer.generation == ticket.generation => {
                self.timers.remove(&ticket.field);
                true
            }
            _ => false,
        }
    }

    /// True while `field` has a timer that was neither cancelled nor
    /// completed. A timer that fired stays pending until its ticket is
    /// completed.
    pub fn is_pending(&self, field: Field) -> bool {
        self.timers.contains_key(&field)
    }

    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty()
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::{sleep, Instant};

    type Fired = Arc<Mutex<Vec<(TimerTicket, Instant)>>>;

    fn recorder(fired: &Fired) -> impl FnOnce(TimerTicket) + Send + 'static {
        let fired = Arc::clone(fired);
        move |ticket| fired.lock().unwrap().push((ticket, Instant::now()))
    }

    const DELAY: Duration = Duration::from_millis(500);

    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual <= expected + Duration::from_millis(2),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_quiet_period() {
        let fired: Fired = Arc::default();
        let mut scheduler = AutosaveScheduler::new();
        let start = Instant::now();

        let ticket = scheduler.schedule(Field::Body, DELAY, recorder(&fired));
        assert!(scheduler.is_pending(Field::Body));

        sleep(Duration::from_millis(499)).await;
        assert!(fired.lock().unwrap().is_empty());

        sleep(Duration::from_millis(100)).await;
        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, ticket);
        assert_close(fired[0].1 - start, DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_prior_timer() {
        let fired: Fired = Arc::default();
        let mut scheduler = AutosaveScheduler::new();
        let start = Instant::now();

        let first = scheduler.schedule(Field::Body, DELAY, recorder(&fired));
        sleep(Duration::from_millis(100)).await;
        let second = scheduler.schedule(Field::Body, DELAY, recorder(&fired));

        sleep(Duration::from_secs(2)).await;
        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, second);
        assert_ne!(first.generation, second.generation);
        assert_close(fired[0].1 - start, Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fields_do_not_share_timers() {
        let fired: Fired = Arc::default();
        let mut scheduler = AutosaveScheduler::new();

        scheduler.schedule(Field::Body, DELAY, recorder(&fired));
        sleep(Duration::from_millis(300)).await;
        scheduler.schedule(Field::Title, DELAY, recorder(&fired));

        sleep(Duration::from_millis(250)).await;
        // Body fired at 500ms even though the title was scheduled at 300ms
        {
            let fired = fired.lock().unwrap();
            assert_eq!(fired.len(), 1);
            assert_eq!(fired[0].0.field, Field::Body);
        }

        sleep(Duration::from_millis(300)).await;
        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[1].0.field, Field::Title);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_prevent_firing() {
        let fired: Fired = Arc::default();
        let mut scheduler = AutosaveScheduler::new();

        scheduler.schedule(Field::Body, DELAY, recorder(&fired));
        scheduler.schedule(Field::Title, DELAY, recorder(&fired));
        assert!(scheduler.cancel(Field::Body));
        assert!(!scheduler.cancel(Field::Body));
        drop(scheduler);

        sleep(Duration::from_secs(5)).await;
        assert!(fired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_rejects_stale_tickets() {
        let mut scheduler = AutosaveScheduler::new();

        let old = scheduler.schedule(Field::Body, DELAY, |_| {});
        let current = scheduler.schedule(Field::Body, DELAY, |_| {});

        assert!(!scheduler.complete(old));
        assert!(scheduler.complete(current));
        assert!(!scheduler.is_pending(Field::Body));
        // A ticket can only be completed once
        assert!(!scheduler.complete(current));
        assert!(!scheduler.has_pending());
    }
}

use std::{
    sync::{Arc, Condvar, Mutex, PoisonError, Weak},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{Error, Result, SequenceCounter};

#[derive(Debug, Default)]
struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Background thread that resets a [`SequenceCounter`] once per tick.
///
/// Deadlines are absolute (`start + n * interval`), so a late wakeup does not
/// push every following reset back. If the thread falls more than a tick
/// behind, the missed resets are skipped and it realigns to one interval
/// after the current time instead of firing in a burst.
///
/// The thread only holds a weak reference to the counter and exits once the
/// counter is gone. [`Ticker::stop`] (also run on drop) wakes it immediately
/// and joins it.
#[derive(Debug)]
pub struct Ticker {
    signal: Arc<Signal>,
    handle: Mutex<Option<JoinHandle<()>>>,
    interval: Duration,
}

impl Ticker {
    /// Starts resetting `counter` every `interval`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTickInterval`] if `interval` is zero or too large to
    ///   schedule (`Instant::now() + interval` overflows).
    /// - [`Error::TickerSpawn`] if the OS refuses to create the thread.
    pub fn spawn(counter: &Arc<SequenceCounter>, interval: Duration) -> Result<Self> {
        if !Self::accepts_interval(interval) {
            return Err(Error::InvalidTickInterval);
        }

        let signal = Arc::new(Signal::default());
        let counter = Arc::downgrade(counter);
        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name("goflake-ticker".into())
            .spawn(move || run(&counter, &thread_signal, interval))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(?interval, "sequence ticker started");

        Ok(Self {
            signal,
            handle: Mutex::new(Some(handle)),
            interval,
        })
    }

    pub(crate) fn accepts_interval(interval: Duration) -> bool {
        !interval.is_zero() && Instant::now().checked_add(interval).is_some()
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `false` once [`Self::stop`] has been called.
    pub fn is_running(&self) -> bool {
        !*self
            .signal
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stops the thread and waits for it to exit. Calling this more than once
    /// is a no-op.
    pub fn stop(&self) {
        {
            let mut stopped = self
                .signal
                .stopped
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *stopped = true;
        }
        self.signal.wake.notify_all();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                #[cfg(feature = "tracing")]
                tracing::error!("sequence ticker panicked");
            } else {
                #[cfg(feature = "tracing")]
                tracing::debug!("sequence ticker stopped");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(counter: &Weak<SequenceCounter>, signal: &Signal, interval: Duration) {
    // `None` once the next deadline is past what `Instant` can represent.
    let mut deadline = Instant::now().checked_add(interval);
    let mut stopped = signal
        .stopped
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    loop {
        let now = Instant::now();
        stopped = match deadline {
            Some(due) if now >= due => stopped,
            Some(due) => {
                signal
                    .wake
                    .wait_timeout_while(stopped, due - now, |stopped| !*stopped)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => signal
                .wake
                .wait_while(stopped, |stopped| !*stopped)
                .unwrap_or_else(PoisonError::into_inner),
        };
        if *stopped {
            break;
        }
        // Woke before the deadline; go back to sleep for the remainder.
        let Some(due) = deadline.filter(|due| Instant::now() >= *due) else {
            continue;
        };

        let Some(counter) = counter.upgrade() else {
            break;
        };
        counter.reset();

        let now = Instant::now();
        deadline = due
            .checked_add(interval)
            .filter(|next| *next > now)
            .or_else(|| now.checked_add(interval));
    }
}

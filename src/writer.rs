//! Debounced program writes.
//!
//! A full program write is several hundred bytes and stalls note traffic on
//! the same port while it is in flight. Edits therefore only restart a quiet
//! period; the write happens once no edit arrived for that long.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::error::Result;

/// Quiet period used when none is configured.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(150);

// Wake-up interval of the writer thread while nothing is pending.
const IDLE_TICK: Duration = Duration::from_millis(100);

/// Restartable single-shot deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debounce {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    /// An idle debounce with the given quiet period.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Current quiet period.
    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Changes the quiet period. A pending deadline is moved accordingly.
    pub fn set_quiet_period(&mut self, quiet: Duration) {
        if let Some(deadline) = self.deadline {
            self.deadline = Some(deadline - self.quiet + quiet);
        }
        self.quiet = quiet;
    }

    /// (Re)starts the quiet period at `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    /// Drops a pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a deadline is armed.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Armed deadline.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, zero once it passed.
    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Returns `true` exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

enum Command {
    Schedule,
    Cancel,
    Suppress,
    Resume { dirty: bool },
    SetQuietPeriod(Duration),
    Shutdown,
}

/// Background thread that runs a flush callback after a quiet period.
///
/// Every call returns immediately; the callback runs on the writer thread.
pub struct DebouncedWriter {
    command_sender: Sender<Command>,
    pending: Arc<AtomicBool>,
    suppressed: Arc<AtomicBool>,
    quiet_ms: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl DebouncedWriter {
    /// Starts the writer thread.
    pub fn spawn<F>(quiet: Duration, on_flush: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (command_sender, command_receiver) = bounded(1024);
        let pending = Arc::new(AtomicBool::new(false));
        let suppressed = Arc::new(AtomicBool::new(false));
        let quiet_ms = Arc::new(AtomicU64::new(quiet.as_millis() as u64));

        let pending_clone = Arc::clone(&pending);
        let thread = thread::Builder::new()
            .name("sysex-writer".to_string())
            .spawn(move || {
                Self::writer_thread(command_receiver, Debounce::new(quiet), pending_clone, on_flush);
            })?;

        Ok(Self {
            command_sender,
            pending,
            suppressed,
            quiet_ms,
            thread: Some(thread),
        })
    }

    fn writer_thread<F: FnMut()>(
        command_receiver: Receiver<Command>,
        mut debounce: Debounce,
        pending: Arc<AtomicBool>,
        mut on_flush: F,
    ) {
        let mut suppressed = false;

        loop {
            let timeout = debounce
                .time_until(Instant::now())
                .unwrap_or(IDLE_TICK);

            match command_receiver.recv_timeout(timeout) {
                Ok(Command::Schedule) => {
                    if !suppressed {
                        debounce.schedule(Instant::now());
                        pending.store(true, Ordering::SeqCst);
                    }
                }
                Ok(Command::Cancel) => debounce.cancel(),
                Ok(Command::Suppress) => {
                    suppressed = true;
                    debounce.cancel();
                }
                Ok(Command::Resume { dirty }) => {
                    suppressed = false;
                    if dirty {
                        debounce.schedule(Instant::now());
                        pending.store(true, Ordering::SeqCst);
                    }
                }
                Ok(Command::SetQuietPeriod(quiet)) => debounce.set_quiet_period(quiet),
                Ok(Command::Shutdown) => {
                    if debounce.is_pending() {
                        log::debug!("WRITER: shutting down with a pending write");
                    }
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if debounce.poll(Instant::now()) {
                pending.store(false, Ordering::SeqCst);
                log::debug!("WRITER: quiet period elapsed, flushing");
                on_flush();
            }
        }
        pending.store(false, Ordering::SeqCst);
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.command_sender.try_send(command) {
            log::debug!("WRITER: command channel full or disconnected: {}", e);
        }
    }

    /// (Re)starts the quiet period. Ignored while suppressed.
    pub fn schedule(&self) {
        if !self.suppressed.load(Ordering::SeqCst) {
            self.pending.store(true, Ordering::SeqCst);
        }
        self.send(Command::Schedule);
    }

    /// Drops a pending write.
    pub fn cancel(&self) {
        self.pending.store(false, Ordering::SeqCst);
        self.send(Command::Cancel);
    }

    /// Drops a pending write and ignores schedules until [`resume`](Self::resume).
    pub fn suppress(&self) {
        self.suppressed.store(true, Ordering::SeqCst);
        self.pending.store(false, Ordering::SeqCst);
        self.send(Command::Suppress);
    }

    /// Lifts suppression. A still dirty buffer gets a new quiet period at once.
    pub fn resume(&self, dirty: bool) {
        self.suppressed.store(false, Ordering::SeqCst);
        if dirty {
            self.pending.store(true, Ordering::SeqCst);
        }
        self.send(Command::Resume { dirty });
    }

    /// Changes the quiet period.
    pub fn set_quiet_period(&self, quiet: Duration) {
        self.quiet_ms.store(quiet.as_millis() as u64, Ordering::SeqCst);
        self.send(Command::SetQuietPeriod(quiet));
    }

    /// Current quiet period.
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_ms.load(Ordering::SeqCst))
    }

    /// Whether a write is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether writes are currently suppressed.
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    /// Stops the thread. A pending write is dropped.
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.command_sender.send(Command::Shutdown);
            if thread.join().is_err() {
                log::warn!("WRITER: writer thread panicked");
            }
        }
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

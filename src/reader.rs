//! Background reader loop.
//!
//! One dedicated thread per open connection polls the link for available
//! bytes, assembles newline-terminated lines, decodes them, and forwards the
//! resulting events over a bounded channel to the presentation loop. The
//! thread never mutates panel state and never dies from a bad line; it exits
//! when the stop flag is set, the channel's receiver is gone, or the link
//! lock is poisoned.

use crate::connection::{LinkState, SharedLink};
use crate::protocol::{self, DeviceEvent};
use memchr::memchr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// Bytes pulled from the port per read attempt.
const READ_CHUNK: usize = 256;

/// Bound on the reader-to-dispatcher event channel.
pub(crate) const EVENT_QUEUE_CAPACITY: usize = 64;

/// Accumulates raw bytes and yields complete `\n`-terminated lines.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Next complete line, terminator stripped, lossily decoded as UTF-8.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = memchr(b'\n', &self.pending)?;
        let line: Vec<u8> = self.pending.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line[..pos]).into_owned())
    }
}

/// Running reader thread plus its cooperative-cancellation flag.
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}

impl ReaderHandle {
    /// Set the cooperative-cancellation flag. The loop observes it within
    /// one poll interval.
    pub fn signal_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Join the loop, waiting at most `timeout`.
    ///
    /// Returns true when the thread exited within the bound. On timeout the
    /// thread is left to finish on its own (it observes the flag at its next
    /// tick) and false is returned.
    pub fn join(self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.thread.is_finished() {
            if Instant::now() >= deadline {
                warn!("reader thread did not stop within {:?}", timeout);
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        self.thread.join().is_ok()
    }

    /// Signal the loop to stop, then join it within `timeout`.
    pub fn shutdown(self, timeout: Duration) -> bool {
        self.signal_stop();
        self.join(timeout)
    }
}

/// Spawn the reader loop for an open link.
pub(crate) fn spawn_reader(
    link: SharedLink,
    events: SyncSender<DeviceEvent>,
    poll_interval: Duration,
) -> ReaderHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let loop_stop = Arc::clone(&stop);
    let thread = thread::Builder::new()
        .name("panel-reader".into())
        .spawn(move || read_loop(link, events, loop_stop, poll_interval))
        .expect("failed to spawn reader thread");
    ReaderHandle { stop, thread }
}

fn read_loop(
    link: SharedLink,
    events: SyncSender<DeviceEvent>,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
) {
    let mut lines = LineBuffer::default();
    let mut chunk = [0u8; READ_CHUNK];

    while !stop.load(Ordering::Relaxed) {
        let read = {
            let mut guard = match link.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    error!("link lock poisoned, reader loop exiting");
                    return;
                }
            };
            match &mut *guard {
                LinkState::Open { port, .. } => {
                    // Non-blocking availability check so the lock is never
                    // held across a blocking read.
                    match port.bytes_to_read() {
                        Some(n) if n > 0 => match port.read_bytes(&mut chunk) {
                            Ok(n) => n,
                            Err(e) if e.is_transient() => 0,
                            Err(e) => {
                                warn!(error = %e, "serial read failed");
                                0
                            }
                        },
                        _ => 0,
                    }
                }
                LinkState::Closed => 0,
            }
        };

        if read == 0 {
            thread::sleep(poll_interval);
            continue;
        }

        lines.push(&chunk[..read]);
        while let Some(line) = lines.next_line() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let event = protocol::decode_line(trimmed);
            trace!(?event, "decoded device line");
            if events.send(event).is_err() {
                debug!("event receiver dropped, reader loop exiting");
                return;
            }
        }
    }
}

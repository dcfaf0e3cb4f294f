//! The panel core: connection lifecycle, intents, and the pump loop.
//!
//! `Panel` ties the pieces together: it owns the state store, the timer
//! queue, the shared link, and the observer, and it is driven from a single
//! presentation thread. Device events produced by the background reader are
//! folded in by [`Panel::pump`], which also fires due timers. Nothing here
//! ever blocks: the settle delay, the door auto-close, and periodic polling
//! are all timers, not sleeps.

use crate::connection::{new_shared_link, LinkState, SharedLink};
use crate::dispatcher;
use crate::door::DoorController;
use crate::error::AppError;
use crate::observer::PanelObserver;
use crate::poller::ReadingPoller;
use crate::port::{PortConfiguration, SerialPortAdapter, SyncSerialPort};
use crate::protocol::{self, Command, DeviceEvent};
use crate::reader::{self, ReaderHandle};
use crate::state::{DoorPhase, PanelState, DEFAULT_BAUD_RATE};
use crate::timer::{TimerId, TimerKind, TimerQueue};
use std::sync::mpsc::{sync_channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tunable durations and rates for a panel instance.
#[derive(Debug, Clone)]
pub struct PanelOptions {
    /// Baud rate for the device link.
    pub baud_rate: u32,
    /// Read/write timeout on the serial port.
    pub read_timeout: Duration,
    /// Device reset latency: time between opening the port and the link
    /// being ready for traffic.
    pub settle_delay: Duration,
    /// Reader-loop idle backoff between availability checks.
    pub reader_poll_interval: Duration,
    /// How long the door stays open before closing itself.
    pub auto_close_delay: Duration,
    /// Period of the automatic target-reading poll.
    pub polling_interval: Duration,
    /// Bound on joining the reader thread at disconnect.
    pub join_timeout: Duration,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
            reader_poll_interval: Duration::from_millis(100),
            auto_close_delay: Duration::from_secs(5),
            polling_interval: Duration::from_secs(1),
            join_timeout: Duration::from_secs(1),
        }
    }
}

/// What a door intent did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorIntentOutcome {
    /// The command was sent and the phase advanced.
    Sent,
    /// The door was already open or opening; nothing was sent.
    AlreadyOpen,
    /// The door was already closed or closing; nothing was sent.
    AlreadyClosed,
}

/// The device-state synchronization core.
pub struct Panel {
    options: PanelOptions,
    link: SharedLink,
    reader: Option<ReaderHandle>,
    events: Option<Receiver<DeviceEvent>>,
    state: PanelState,
    timers: TimerQueue,
    door: DoorController,
    poller: ReadingPoller,
    observer: Box<dyn PanelObserver>,
    /// True once the settle timer has fired for the current connection.
    ready: bool,
}

impl Panel {
    pub fn new(options: PanelOptions, observer: Box<dyn PanelObserver>) -> Self {
        Self {
            options,
            link: new_shared_link(),
            reader: None,
            events: None,
            state: PanelState::default(),
            timers: TimerQueue::new(),
            door: DoorController::new(),
            poller: ReadingPoller::new(),
            observer,
            ready: false,
        }
    }

    // ----- connection lifecycle -----

    /// Open the named serial port and start the reader.
    ///
    /// The link is not ready for traffic until the settle delay elapses on
    /// the pump loop; intents before that fail with
    /// [`AppError::NotConnected`].
    pub fn connect(&mut self, port_name: &str) -> Result<(), AppError> {
        let config = PortConfiguration {
            baud_rate: self.options.baud_rate,
            timeout: self.options.read_timeout,
        };
        // Check before opening so a busy link never touches the OS port.
        if self.is_connected() {
            return Err(AppError::AlreadyConnected);
        }
        let port = SyncSerialPort::open(port_name, config)?;
        self.attach(Box::new(port))
    }

    /// Attach an already-constructed adapter (tests inject a mock here).
    pub fn connect_with(&mut self, port: Box<dyn SerialPortAdapter>) -> Result<(), AppError> {
        self.attach(port)
    }

    fn attach(&mut self, port: Box<dyn SerialPortAdapter>) -> Result<(), AppError> {
        let port_name = port.name().to_string();
        {
            let mut guard = self.link.lock().map_err(|_| AppError::LinkPoisoned)?;
            if guard.is_open() {
                return Err(AppError::AlreadyConnected);
            }
            *guard = LinkState::Open {
                port,
                port_name: port_name.clone(),
                baud_rate: self.options.baud_rate,
            };
        }

        let (tx, rx) = sync_channel(reader::EVENT_QUEUE_CAPACITY);
        self.events = Some(rx);
        self.reader = Some(reader::spawn_reader(
            Arc::clone(&self.link),
            tx,
            self.options.reader_poll_interval,
        ));
        self.ready = false;
        self.timers
            .arm(TimerKind::Settle, Instant::now() + self.options.settle_delay);
        info!(port = %port_name, "link opened, waiting for device reset");
        Ok(())
    }

    /// Tear the connection down. Idempotent: disconnecting while already
    /// disconnected is a no-op.
    ///
    /// Order matters: timers are cancelled first so nothing fires against a
    /// closing link, then the reader is stopped and joined within the
    /// configured bound, then the handle is dropped.
    pub fn disconnect(&mut self) {
        if self.reader.is_none() && !self.is_connected() {
            return;
        }

        self.timers.clear();
        self.door.disarm();
        self.poller.reset();
        self.ready = false;

        let events = self.events.take();
        if let Some(handle) = self.reader.take() {
            handle.signal_stop();
            // Dropping the receiver unblocks a reader stuck on a full
            // channel before the join.
            drop(events);
            handle.join(self.options.join_timeout);
        }

        match self.link.lock() {
            Ok(mut guard) => *guard = LinkState::Closed,
            Err(poisoned) => *poisoned.into_inner() = LinkState::Closed,
        }

        info!("link closed");
        self.observer
            .on_connection_status_changed(false, "disconnected");
    }

    /// Whether a link is open (it may still be settling).
    pub fn is_connected(&self) -> bool {
        self.link.lock().map(|guard| guard.is_open()).unwrap_or(false)
    }

    /// Whether the link is open and past the settle delay.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    // ----- intents -----

    /// Ask the device to toggle a switch. Local state does not change until
    /// the acknowledgment arrives; rapid re-toggles before the round trip
    /// completes can desynchronize displayed from physical state, a known
    /// limitation of the ack-as-toggle protocol.
    pub fn toggle_switch(&mut self, index: u8) -> Result<(), AppError> {
        if !protocol::is_valid_switch_index(index) {
            return Err(AppError::InvalidSwitch(index));
        }
        self.send(Command::ToggleSwitch(index))
    }

    /// Request one target reading.
    pub fn request_reading(&mut self) -> Result<(), AppError> {
        self.send(Command::RequestReading)
    }

    /// Open the door. Counts a visitor and arms the auto-close timer; a
    /// repeat intent while the door is open or opening sends nothing.
    pub fn open_door(&mut self) -> Result<DoorIntentOutcome, AppError> {
        if self.state.door.is_open_or_opening() {
            debug!("door already open, intent ignored");
            return Ok(DoorIntentOutcome::AlreadyOpen);
        }
        self.send(Command::OpenDoor)?;
        self.state.door = DoorPhase::Opening;
        // Visitors count per intent, so repeated device acknowledgments
        // cannot double-count.
        self.state.visitor_count += 1;
        let id = self.timers.arm(
            TimerKind::DoorAutoClose,
            Instant::now() + self.options.auto_close_delay,
        );
        self.door.arm(id);
        self.observer.on_door_phase_changed(DoorPhase::Opening);
        Ok(DoorIntentOutcome::Sent)
    }

    /// Close the door. A repeat intent while closed or closing sends nothing.
    pub fn close_door(&mut self) -> Result<DoorIntentOutcome, AppError> {
        if self.state.door.is_closed_or_closing() {
            debug!("door already closed, intent ignored");
            return Ok(DoorIntentOutcome::AlreadyClosed);
        }
        self.send(Command::CloseDoor)?;
        self.state.door = DoorPhase::Closing;
        self.observer.on_door_phase_changed(DoorPhase::Closing);
        Ok(DoorIntentOutcome::Sent)
    }

    /// Turn periodic target-reading polling on or off. At most one poll
    /// timer is outstanding; disabling cancels the pending one.
    pub fn set_periodic_polling(&mut self, enabled: bool) -> Result<(), AppError> {
        if enabled {
            if !self.ready {
                return Err(AppError::NotConnected);
            }
            if self.poller.enable() {
                let id = self.timers.arm(
                    TimerKind::ReadingPoll,
                    Instant::now() + self.options.polling_interval,
                );
                self.poller.note_armed(id);
            }
        } else if let Some(id) = self.poller.disable() {
            self.timers.cancel(id);
        }
        Ok(())
    }

    pub fn polling_enabled(&self) -> bool {
        self.poller.is_enabled()
    }

    // ----- the pump -----

    /// One turn of the presentation loop: apply queued device events in
    /// arrival order, then fire due timers. Call this regularly from the
    /// owning thread; it never blocks.
    pub fn pump(&mut self) {
        self.drain_events();

        let now = Instant::now();
        while let Some((id, kind)) = self.timers.pop_due(now) {
            match kind {
                TimerKind::Settle => self.on_settled(),
                TimerKind::DoorAutoClose => self.on_auto_close_due(id),
                TimerKind::ReadingPoll => self.on_poll_due(id),
            }
        }
    }

    fn drain_events(&mut self) {
        let mut receiver_gone = false;
        if let Some(events) = self.events.as_ref() {
            loop {
                match events.try_recv() {
                    Ok(event) => {
                        dispatcher::apply(event, &mut self.state, &mut *self.observer)
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        receiver_gone = true;
                        break;
                    }
                }
            }
        }
        if receiver_gone {
            warn!("reader event channel closed unexpectedly");
            self.events = None;
        }
    }

    fn on_settled(&mut self) {
        self.ready = true;
        let port_name = self
            .link
            .lock()
            .ok()
            .and_then(|guard| guard.port_name().map(str::to_string))
            .unwrap_or_default();
        info!(port = %port_name, "device settled, link ready");
        self.observer.on_connection_status_changed(true, &port_name);

        // Ask for the current target reading so the panel starts in sync.
        if let Err(e) = self.request_reading() {
            warn!(error = %e, "initial reading request failed");
        }
    }

    fn on_auto_close_due(&mut self, id: TimerId) {
        if !self.door.should_auto_close(id, self.state.door) {
            return;
        }
        match self.send(Command::CloseDoor) {
            Ok(()) => {
                self.state.door = DoorPhase::Closing;
                self.observer.on_door_phase_changed(DoorPhase::Closing);
                info!("door auto-close sent");
            }
            Err(e) => warn!(error = %e, "door auto-close failed"),
        }
    }

    fn on_poll_due(&mut self, id: TimerId) {
        if !self.poller.should_poll(id) {
            return;
        }
        if !self.ready {
            return;
        }
        if let Err(e) = self.request_reading() {
            warn!(error = %e, "periodic reading request failed");
        }
        let next = self.timers.arm(
            TimerKind::ReadingPoll,
            Instant::now() + self.options.polling_interval,
        );
        self.poller.note_armed(next);
    }

    // ----- snapshots -----

    /// Read-only copy of the current device state.
    pub fn snapshot(&self) -> PanelState {
        self.state.clone()
    }

    /// Number of armed timers (drained to zero by disconnect).
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn send(&mut self, command: Command) -> Result<(), AppError> {
        if !self.ready {
            return Err(AppError::NotConnected);
        }
        let mut guard = self.link.lock().map_err(|_| AppError::LinkPoisoned)?;
        match &mut *guard {
            LinkState::Open { port, .. } => {
                port.write_bytes(command.encode().as_bytes())?;
                debug!(?command, "command sent");
                Ok(())
            }
            LinkState::Closed => Err(AppError::NotConnected),
        }
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

//! The controller loop tying the link to the module router.
//!
//! Each cycle runs two passes, one after the other and never interleaved:
//!
//! 1. **Instructions**: every pending inbound message is received, routed,
//!    and answered with one `Response` message if any module replied.
//! 2. **Telemetry**: when due, one `Stream` message with every module's state.
//!
//! Link and parse failures inside a cycle are logged and dropped; only a dead
//! byte stream ends the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use groduino_link::{ByteStream, ConnectionState, LinkConnection, LinkError};
use groduino_router::{MessageBuilder, Router};
use tracing::{debug, info, trace, warn};

use crate::error::RunnerResult;

/// What one call to [`Controller::run_cycle`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Inbound messages received intact.
    pub received: usize,
    /// Responses sent.
    pub responses: usize,
    /// Whether a telemetry message was sent.
    pub telemetry_sent: bool,
}

/// Drives one link and one router.
#[derive(Debug)]
pub struct Controller<S> {
    link: LinkConnection<S>,
    router: Router,
    telemetry_interval: Duration,
    next_telemetry: Option<Instant>,
}

impl<S: ByteStream> Controller<S> {
    /// Create a controller. Nothing is sent until [`start`](Self::start).
    pub fn new(link: LinkConnection<S>, router: Router, telemetry_interval: Duration) -> Self {
        Controller {
            link,
            router,
            telemetry_interval,
            next_telemetry: None,
        }
    }

    /// Offer the handshake, then bring up modules and apply startup defaults.
    ///
    /// A handshake timeout is not an error; the controller carries on in
    /// unframed mode.
    pub fn start(&mut self) -> RunnerResult<ConnectionState> {
        let state = match self.link.establish() {
            Ok(state) => state,
            Err(LinkError::HandshakeTimeout) => {
                warn!("Controller: running without framing");
                self.link.state()
            }
            Err(e) => return Err(e.into()),
        };

        self.router.begin_all();
        self.router.apply_defaults();
        info!(
            "Controller: started with {} modules, link {:?}",
            self.router.len(),
            state
        );
        Ok(state)
    }

    /// Run one instruction pass and, if due at `now`, one telemetry pass.
    ///
    /// The first call always sends telemetry.
    pub fn run_cycle(&mut self, now: Instant) -> RunnerResult<CycleReport> {
        let mut report = CycleReport::default();

        while self.link.available()? {
            match self.link.receive() {
                Ok(line) => {
                    report.received += 1;
                    if self.handle_line(&line)? {
                        report.responses += 1;
                    }
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => debug!("Controller: nothing usable received: {}", e),
            }
        }

        if self.next_telemetry.map_or(true, |due| now >= due) {
            self.send_telemetry()?;
            self.next_telemetry = Some(now + self.telemetry_interval);
            report.telemetry_sent = true;
        }

        Ok(report)
    }

    /// Run cycles every `poll_interval` until `shutdown` is set.
    pub fn run(&mut self, shutdown: &AtomicBool, poll_interval: Duration) -> RunnerResult<()> {
        while !shutdown.load(Ordering::SeqCst) {
            self.run_cycle(Instant::now())?;
            thread::sleep(poll_interval);
        }
        info!("Controller: shutdown requested");
        Ok(())
    }

    /// Route one received line; returns true if a response was sent.
    fn handle_line(&mut self, line: &str) -> RunnerResult<bool> {
        trace!("Controller: rx {:?}", line);
        let answer = match self.router.route_line(line) {
            Ok(answer) => answer,
            Err(e) => {
                debug!("Controller: ignoring {:?}: {}", line, e);
                return Ok(false);
            }
        };
        if answer.is_empty() {
            return Ok(false);
        }

        let mut message = MessageBuilder::response();
        message.push(&answer);
        self.link.send(&message.finish())?;
        Ok(true)
    }

    fn send_telemetry(&mut self) -> RunnerResult<()> {
        let mut message = MessageBuilder::stream();
        message.push(&self.router.route_telemetry());
        self.link.send(&message.finish())?;
        Ok(())
    }

    /// The link.
    pub fn link(&self) -> &LinkConnection<S> {
        &self.link
    }

    /// The link, mutably.
    pub fn link_mut(&mut self) -> &mut LinkConnection<S> {
        &mut self.link
    }

    /// The module router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The module router, mutably.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }
}

// ABOUTME: State machine handle owning one engine context: configuration, connection and SMS sending
// ABOUTME: Turns the engine's callback-driven send confirmation into a synchronous, timeout-bounded call

use crate::client::error::{GammuError, GammuResult, NativeError};
use crate::datatypes::{
    ErrorCode, MultiPartSmsInfo, PduType, SMSC_LOCATION, Smsc, SmsMessage, UnicodeString,
};
use crate::engine::{Context, Driver, SendStatus, StatusSlot};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How long a send waits for its confirmation unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Replies the engine waits for per command while opening the connection
const CONNECTION_REPLY_NUM: i32 = 1;

/// One configured phone connection
///
/// Owns an engine context from creation until [`StateMachine::free`] or drop,
/// whichever comes first. The context is released exactly once, including
/// when creation fails half way.
///
/// ## Send lifecycle
///
/// ```text
/// Idle → Submitted → Confirmed | Failed | TimedOut
/// ```
///
/// A submission returns as soon as the engine accepts the message. The
/// network's answer arrives later through the send-status callback, which the
/// engine fires while the device read channel is pumped. `send_message` keeps
/// pumping until the callback has written the status slot or the timeout has
/// elapsed.
///
/// A handle serves one send at a time; all operations take `&mut self`.
pub struct StateMachine<D: Driver> {
    driver: D,
    /// `None` once freed
    context: Option<D::Context>,
    /// Present after a successful connect
    smsc: Option<Smsc>,
    /// Transport open, possibly without an SMSC
    connected: bool,
    status: StatusSlot,
    timeout: Duration,
    poll_interval: Duration,
}

impl<D: Driver> StateMachine<D> {
    /// Creates a state machine from `config_path`, or from the default
    /// configuration search path when `None`
    pub fn with_driver(driver: D, config_path: Option<&Path>) -> GammuResult<Self> {
        Self::create(driver, config_path)
    }

    /// Loads the configuration and allocates the engine context.
    ///
    /// Nothing is allocated when the configuration cannot be found.
    ///
    /// # Panics
    ///
    /// Panics when the engine cannot allocate a context.
    pub(crate) fn create(driver: D, config_path: Option<&Path>) -> GammuResult<Self> {
        let config = driver.find_config(config_path).map_err(|code| {
            warn!("Configuration not found ({:?}): {}", config_path, code);
            GammuError::Configuration(describe(&driver, code))
        })?;

        let Some(mut context) = driver.alloc_context() else {
            error!("Engine could not allocate a state machine");
            panic!("out of memory");
        };

        if let Err(code) = context.read_config(&config, 0) {
            warn!("Configuration could not be applied: {}", code);
            drop(context);
            return Err(GammuError::Configuration(describe(&driver, code)));
        }
        context.set_config_num(1);

        debug!("State machine created from {:?}", config_path);
        Ok(Self {
            driver,
            context: Some(context),
            smsc: None,
            connected: false,
            status: StatusSlot::new(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: Duration::ZERO,
        })
    }

    /// Releases the engine context.
    ///
    /// An open connection is terminated first; a teardown failure is logged
    /// and otherwise ignored. Further calls do nothing, and every other
    /// operation fails with [`GammuError::Freed`].
    pub fn free(&mut self) {
        let Some(mut context) = self.context.take() else {
            return;
        };
        if self.connected {
            if let Err(code) = context.terminate_connection() {
                warn!("Terminating connection while freeing failed: {}", code);
            }
            self.connected = false;
        }
        self.smsc = None;
        drop(context);
        debug!("State machine freed");
    }

    /// Returns true once the context has been released
    pub fn is_freed(&self) -> bool {
        self.context.is_none()
    }

    /// Opens the connection, registers the send-status callback and fetches
    /// the service center number used for every outgoing message
    pub fn connect(&mut self) -> GammuResult<()> {
        let context = self.context.as_mut().ok_or(GammuError::Freed)?;

        if let Err(code) = context.init_connection(CONNECTION_REPLY_NUM) {
            warn!("Connection failed: {}", code);
            return Err(GammuError::Connection(describe(&self.driver, code)));
        }
        self.connected = true;

        context.set_send_status_callback(self.status.clone());

        let mut smsc = Smsc::at_location(SMSC_LOCATION);
        if let Err(code) = context.get_smsc(&mut smsc) {
            warn!("Reading SMSC from location {} failed: {}", SMSC_LOCATION, code);
            return Err(GammuError::SmscRetrieval(describe(&self.driver, code)));
        }

        info!("Connected, SMSC {}", smsc.number);
        self.smsc = Some(smsc);
        Ok(())
    }

    /// Terminates the connection. The state machine stays allocated and can
    /// connect again.
    pub fn disconnect(&mut self) -> GammuResult<()> {
        let context = self.context.as_mut().ok_or(GammuError::Freed)?;

        if let Err(code) = context.terminate_connection() {
            warn!("Disconnect failed: {}", code);
            return Err(GammuError::Connection(describe(&self.driver, code)));
        }

        self.connected = false;
        self.smsc = None;
        info!("Disconnected");
        Ok(())
    }

    /// Sends a prepared message and waits for its confirmation.
    ///
    /// The message's SMSC number is replaced by the connection's. Returns the
    /// message reference reported by the network.
    pub fn send_message(&mut self, mut sms: SmsMessage) -> GammuResult<i32> {
        sms.smsc.number = self.ready_smsc()?.number.clone();

        let context = self.context.as_mut().ok_or(GammuError::Freed)?;

        self.status.reset();
        if let Err(code) = context.send_sms(&sms) {
            warn!("Message to {} rejected: {}", sms.number, code);
            return Err(GammuError::SubmissionRejected(describe(&self.driver, code)));
        }

        let started = Instant::now();
        while started.elapsed() < self.timeout {
            context.read_device(true);
            if !self.status.get().is_pending() {
                break;
            }
            let remaining = self.timeout.saturating_sub(started.elapsed());
            if !self.poll_interval.is_zero() && !remaining.is_zero() {
                std::thread::sleep(self.poll_interval.min(remaining));
            }
        }

        let status = self.status.get();
        match status.code {
            ErrorCode::Ok => {
                let reference = status.reference.unwrap_or_default();
                debug!("Message to {} confirmed, reference {}", sms.number, reference);
                Ok(reference)
            }
            ErrorCode::Timeout => {
                warn!(
                    "No confirmation for message to {} within {:?}",
                    sms.number, self.timeout
                );
                Err(GammuError::DeliveryTimeout(describe(
                    &self.driver,
                    ErrorCode::Timeout,
                )))
            }
            code => {
                warn!("Message to {} failed: {}", sms.number, code);
                Err(GammuError::DeliveryFailed(describe(&self.driver, code)))
            }
        }
    }

    /// Sends `text` to `number` as one SMS: submit PDU, no user data header,
    /// default 7-bit coding, message class 1
    pub fn send_sms(&mut self, number: &str, text: &str) -> GammuResult<i32> {
        self.send_message(SmsMessage::submit(number, text))
    }

    /// Sends `text` as a concatenated multi-part message.
    ///
    /// Unicode coding is selected when the text contains anything beyond
    /// 7-bit ASCII. Segments go out in order; the first failure is returned
    /// and the remaining segments are not sent. Segments sent before the
    /// failure stay sent.
    ///
    /// Returns the message reference of every segment.
    pub fn send_long_sms(&mut self, number: &str, text: &str) -> GammuResult<Vec<i32>> {
        self.ready_smsc()?;

        let info = MultiPartSmsInfo::long_text(text);
        let segments = self.driver.encode_multipart(&info).map_err(|code| {
            warn!("Multi-part encoding failed: {}", code);
            GammuError::Encoding(describe(&self.driver, code))
        })?;

        let total = segments.len();
        debug!(
            "Sending long message to {} in {} segment(s), unicode: {}",
            number, total, info.unicode_coding
        );

        let destination = UnicodeString::encode(number);
        let mut references = Vec::with_capacity(total);
        for (index, mut sms) in segments.into_iter().enumerate() {
            sms.number = destination.clone();
            sms.pdu = PduType::Submit;
            match self.send_message(sms) {
                Ok(reference) => references.push(reference),
                Err(err) => {
                    warn!(
                        "Segment {}/{} failed after {} sent: {}",
                        index + 1,
                        total,
                        index,
                        err
                    );
                    return Err(err);
                }
            }
        }

        Ok(references)
    }

    /// Confirmation timeout for each physical message
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Pause between device pumps while waiting for a confirmation
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Service center fetched by the last successful connect
    pub fn smsc(&self) -> Option<&Smsc> {
        self.smsc.as_ref()
    }

    /// Returns true while the transport is open
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Outcome of the most recent send attempt
    pub fn last_status(&self) -> SendStatus {
        self.status.get()
    }

    /// The engine this state machine runs on
    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn ready_smsc(&self) -> GammuResult<&Smsc> {
        if self.context.is_none() {
            return Err(GammuError::Freed);
        }
        self.smsc.as_ref().ok_or_else(|| {
            GammuError::Connection(describe(&self.driver, ErrorCode::NotConnected))
        })
    }
}

#[cfg(feature = "native")]
impl StateMachine<crate::engine::native::NativeDriver> {
    /// Creates a state machine on libGammu from `config_path`, or from the
    /// default gammurc search path when `None`
    pub fn new(config_path: Option<&Path>) -> GammuResult<Self> {
        Self::create(crate::engine::native::NativeDriver, config_path)
    }
}

impl<D: Driver> Drop for StateMachine<D> {
    fn drop(&mut self) {
        self.free();
    }
}

impl<D: Driver> fmt::Debug for StateMachine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("freed", &self.is_freed())
            .field("connected", &self.connected)
            .field("smsc", &self.smsc)
            .field("status", &self.status.get())
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

fn describe<D: Driver>(driver: &D, code: ErrorCode) -> NativeError {
    NativeError::new(code, driver.error_string(code))
}

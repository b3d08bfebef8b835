//! Adapter exchanges: one outstanding message at a time

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::state::{BusShared, Mailbox};
use crate::codec::MessageCode;
use crate::handler::TransmitState;
use crate::transport::Transport;
use crate::types::CecCommand;
use crate::wire::{build_frame, AdapterMessage, MessageState};
use crate::{CecError, Result};

/// Line timeout the adapter uses until told otherwise.
const ADAPTER_DEFAULT_LINE_TIMEOUT: u8 = 3;

/// Owns the write side of the transport.
///
/// The line lock is held for a whole transmission including its retries, so
/// attempts of two commands never interleave on the half-duplex bus.
pub(crate) struct Transmitter {
    transport: Arc<dyn Transport>,
    line: tokio::sync::Mutex<LineState>,
}

struct LineState {
    line_timeout: u8,
}

/// Retry and timing parameters of one transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TransmitPolicy {
    pub(crate) transmit_timeout: Duration,
    pub(crate) max_tries: u8,
    pub(crate) retry_wait: Duration,
    pub(crate) line_timeout: u8,
    pub(crate) retry_line_timeout: u8,
}

impl Transmitter {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            line: tokio::sync::Mutex::new(LineState { line_timeout: ADAPTER_DEFAULT_LINE_TIMEOUT }),
        }
    }
}

impl BusShared {
    /// Transmit `command`, retrying until acknowledged or out of tries.
    ///
    /// Polls get a single attempt. Returns the number of attempts used.
    pub(crate) async fn send_command(
        &self,
        command: &CecCommand,
        policy: &TransmitPolicy,
        mut on_state: impl FnMut(TransmitState),
    ) -> Result<u8> {
        let mut message = build_frame(command, policy.line_timeout);
        message.max_tries = if command.is_poll() { 1 } else { policy.max_tries.max(1) };
        message.transmit_timeout = policy.transmit_timeout;

        let mut line = self.transmitter.line.lock().await;
        loop {
            on_state(TransmitState::AwaitingAck);
            if message.tries > 0 {
                message.line_timeout = policy.retry_line_timeout;
            }
            self.apply_line_timeout(&mut line, message.line_timeout).await;

            self.exchange(&mut message).await?;
            if message.was_acked() {
                trace!(command = %command, tries = message.tries, "Transmit acknowledged");
                return Ok(message.tries);
            }

            let reason = match message.reply() {
                Some(frame) => frame.message().to_string(),
                None => format!("no reply within {:?}", message.transmit_timeout),
            };
            if !message.needs_retry() || !message.has_tries_left() {
                return Err(CecError::TransmitFailed { attempts: message.tries, reason });
            }

            debug!(
                command = %command,
                attempt = message.tries,
                max_tries = message.max_tries,
                reason = %reason,
                "Retrying transmit"
            );
            on_state(TransmitState::Retrying);
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(CecError::Closed),
                _ = tokio::time::sleep(policy.retry_wait) => {}
            }
        }
    }

    /// Send a single-frame adapter command and return the decided message.
    pub(crate) async fn housekeeping(&self, code: MessageCode, data: &[u8]) -> Result<AdapterMessage> {
        let mut message = AdapterMessage::housekeeping(code, data, self.config.transmit_timeout());
        let _line = self.transmitter.line.lock().await;
        self.exchange(&mut message).await?;
        if !message.was_acked() {
            let reason = match message.reply() {
                Some(frame) => frame.message().to_string(),
                None => "no reply".to_string(),
            };
            return Err(CecError::TransmitFailed { attempts: message.tries, reason });
        }
        Ok(message)
    }

    /// Set the adapter's idle time before transmissions.
    pub(crate) async fn set_line_timeout(&self, line_timeout: u8) -> Result<()> {
        let mut message = AdapterMessage::housekeeping(
            MessageCode::TransmitIdleTime,
            &[line_timeout],
            self.config.transmit_timeout(),
        );
        let mut line = self.transmitter.line.lock().await;
        self.exchange(&mut message).await?;
        if !message.was_acked() {
            return Err(CecError::TransmitFailed {
                attempts: message.tries,
                reason: "adapter refused line timeout".to_string(),
            });
        }
        line.line_timeout = line_timeout;
        Ok(())
    }

    async fn apply_line_timeout(&self, line: &mut LineState, line_timeout: u8) {
        if line.line_timeout == line_timeout {
            return;
        }
        let mut message = AdapterMessage::housekeeping(
            MessageCode::TransmitIdleTime,
            &[line_timeout],
            self.config.transmit_timeout(),
        );
        match self.exchange(&mut message).await {
            Ok(()) if message.was_acked() => line.line_timeout = line_timeout,
            Ok(()) => warn!(line_timeout, "Adapter did not accept line timeout"),
            Err(e) => warn!(line_timeout, error = %e, "Failed to set line timeout"),
        }
    }

    /// One attempt: install the mailbox, write, wait for the reader to
    /// decide the attempt or for the timeout.
    ///
    /// A timeout leaves the message `SentNotAcked` with no reply frame.
    async fn exchange(&self, message: &mut AdapterMessage) -> Result<()> {
        message.begin_attempt();
        let wire = message.to_wire();
        let (done, mut rx) = oneshot::channel();
        {
            let mut state = self.lock_state();
            if state.is_closed() {
                return Err(CecError::Closed);
            }
            state.mailbox = Some(Mailbox { message: message.clone(), done });
        }

        trace!(code = %message.request_code(), attempt = message.tries, len = wire.len(), "Writing adapter message");
        if let Err(e) = self.transmitter.transport.write(&wire).await {
            self.lock_state().mailbox = None;
            return Err(e);
        }

        match tokio::time::timeout(message.transmit_timeout, &mut rx).await {
            Ok(Ok(decided)) => {
                *message = decided;
                Ok(())
            }
            Ok(Err(_)) => Err(CecError::Closed),
            Err(_) => {
                let pending = self.lock_state().mailbox.take();
                match pending {
                    Some(mailbox) => {
                        *message = mailbox.message;
                        message.state = MessageState::SentNotAcked;
                        Ok(())
                    }
                    // Decided while the timer fired.
                    None => match rx.try_recv() {
                        Ok(decided) => {
                            *message = decided;
                            Ok(())
                        }
                        Err(_) => Err(CecError::Closed),
                    },
                }
            }
        }
    }
}

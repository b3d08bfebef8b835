//! One request/response exchange with the adapter

use std::time::Duration;

use tracing::trace;

use super::mapper::encode;
use crate::codec::{AdapterFrame, MessageCode};
use crate::types::CecCommand;

/// Progress of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageState {
    #[default]
    Unknown,
    /// Built, not yet written.
    Waiting,
    /// Written, waiting for the adapter's reply.
    Sent,
    SentAcked,
    SentNotAcked,
}

/// The frames of one adapter exchange plus its attempt bookkeeping.
///
/// A transmission spans one frame per CEC byte; housekeeping commands such as
/// ping or set-ack-mask are a single frame. Retries resend the same frames
/// unchanged; only the counters and reply fields are reset.
#[derive(Debug, Clone)]
pub struct AdapterMessage {
    frames: Vec<AdapterFrame>,
    request_code: MessageCode,
    pub state: MessageState,
    pub tries: u8,
    pub max_tries: u8,
    pub transmit_timeout: Duration,
    pub line_timeout: u8,
    packets_left: usize,
    reply: Option<AdapterFrame>,
    response: Vec<u8>,
}

/// Build the adapter message carrying `command`.
///
/// `line_timeout` is the number of idle bit periods the adapter waits before
/// driving the line for this attempt.
pub fn build_frame(command: &CecCommand, line_timeout: u8) -> AdapterMessage {
    let frames = encode(command);
    AdapterMessage {
        request_code: MessageCode::Transmit,
        packets_left: frames.len(),
        frames,
        state: MessageState::Waiting,
        tries: 0,
        max_tries: 1,
        transmit_timeout: command.transmit_timeout,
        line_timeout,
        reply: None,
        response: Vec::new(),
    }
}

impl AdapterMessage {
    /// A single-frame adapter command such as ping or set-ack-mask.
    pub fn housekeeping(code: MessageCode, data: &[u8], timeout: Duration) -> Self {
        Self {
            frames: vec![AdapterFrame::with_data(code, data)],
            request_code: code,
            state: MessageState::Waiting,
            tries: 0,
            max_tries: 1,
            transmit_timeout: timeout,
            line_timeout: 0,
            packets_left: 1,
            reply: None,
            response: Vec::new(),
        }
    }

    pub fn frames(&self) -> &[AdapterFrame] {
        &self.frames
    }

    /// Escaped wire bytes of every frame, in order.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.frames.len() * 4);
        for frame in &self.frames {
            frame.encode_into(&mut out);
        }
        out
    }

    pub fn request_code(&self) -> MessageCode {
        self.request_code
    }

    pub fn is_transmission(&self) -> bool {
        self.request_code == MessageCode::Transmit
    }

    /// Acceptances still expected before the final result.
    pub fn packets_left(&self) -> usize {
        self.packets_left
    }

    /// Reply frame that decided the last attempt, if any.
    pub fn reply(&self) -> Option<&AdapterFrame> {
        self.reply.as_ref()
    }

    /// Data returned by a query such as the firmware version.
    pub fn response(&self) -> &[u8] {
        &self.response
    }

    /// Start a new attempt: bump the try counter and clear reply state.
    pub fn begin_attempt(&mut self) {
        self.tries = self.tries.saturating_add(1);
        self.state = MessageState::Sent;
        self.packets_left = self.frames.len();
        self.reply = None;
        self.response.clear();
    }

    pub fn was_acked(&self) -> bool {
        self.state == MessageState::SentAcked
    }

    pub fn has_tries_left(&self) -> bool {
        self.tries < self.max_tries
    }

    /// Whether the failed attempt is worth repeating.
    ///
    /// No reply at all counts as a timeout and is retried; otherwise the
    /// reply code decides.
    pub fn needs_retry(&self) -> bool {
        match &self.reply {
            None => true,
            Some(frame) => frame.needs_retry(),
        }
    }

    /// Whether `frame` answers this message rather than being unrelated traffic.
    pub fn is_response(&self, frame: &AdapterFrame) -> bool {
        let code = frame.message();
        match code {
            MessageCode::CommandAccepted | MessageCode::CommandRejected => {
                let answered = frame.response_to();
                answered == MessageCode::Nothing
                    || answered == self.request_code
                    || (self.is_transmission() && answered.is_transmission())
            }
            MessageCode::TimeoutError => true,
            c if c.is_transmit_result() => self.is_transmission(),
            c => !self.is_transmission() && c == self.request_code,
        }
    }

    /// Apply a reply frame. Returns `true` once the attempt is decided.
    pub fn on_reply(&mut self, frame: &AdapterFrame) -> bool {
        let code = frame.message();
        trace!(reply = %frame, request = %self.request_code, packets_left = self.packets_left, "Adapter reply");
        match code {
            MessageCode::CommandAccepted => {
                self.packets_left = self.packets_left.saturating_sub(1);
                if self.is_transmission() {
                    return false;
                }
                self.finish(frame, MessageState::SentAcked)
            }
            MessageCode::TransmitSucceeded => self.finish(frame, MessageState::SentAcked),
            c if c == self.request_code && !self.is_transmission() => {
                self.response = frame.data().to_vec();
                self.finish(frame, MessageState::SentAcked)
            }
            _ => self.finish(frame, MessageState::SentNotAcked),
        }
    }

    fn finish(&mut self, frame: &AdapterFrame, state: MessageState) -> bool {
        self.state = state;
        self.reply = Some(frame.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogicalAddress, Opcode};

    fn standby() -> CecCommand {
        CecCommand::new(LogicalAddress::Playback1, LogicalAddress::Tv, Opcode::Standby)
    }

    #[test]
    fn transmission_needs_every_acceptance_then_success() {
        let mut message = build_frame(&standby(), 3);
        message.begin_attempt();
        assert_eq!(message.packets_left(), 3);

        for code in [0x0E, 0x0B, 0x0C] {
            let accepted = AdapterFrame::with_data(MessageCode::CommandAccepted, &[code]);
            assert!(message.is_response(&accepted));
            assert!(!message.on_reply(&accepted));
        }
        assert_eq!(message.packets_left(), 0);

        let done = AdapterFrame::new(MessageCode::TransmitSucceeded);
        assert!(message.is_response(&done));
        assert!(message.on_reply(&done));
        assert!(message.was_acked());
    }

    #[test]
    fn failed_ack_is_final_and_not_retried() {
        let mut message = build_frame(&standby(), 3);
        message.begin_attempt();
        assert!(message.on_reply(&AdapterFrame::new(MessageCode::TransmitFailedAck)));
        assert!(!message.was_acked());
        assert!(!message.needs_retry());
    }

    #[test]
    fn line_failure_and_silence_are_retried() {
        let mut message = build_frame(&standby(), 3);
        message.begin_attempt();
        assert!(message.needs_retry());
        message.on_reply(&AdapterFrame::new(MessageCode::TransmitFailedLine));
        assert!(message.needs_retry());
    }

    #[test]
    fn housekeeping_ignores_transmit_results_and_other_codes() {
        let message =
            AdapterMessage::housekeeping(MessageCode::Ping, &[], Duration::from_millis(500));
        assert!(!message.is_response(&AdapterFrame::new(MessageCode::TransmitSucceeded)));
        assert!(!message.is_response(&AdapterFrame::with_data(MessageCode::FrameStart, &[0x04])));
        assert!(!message.is_response(&AdapterFrame::with_data(
            MessageCode::CommandAccepted,
            &[MessageCode::SetAckMask.as_byte()]
        )));
        assert!(message.is_response(&AdapterFrame::with_data(
            MessageCode::CommandAccepted,
            &[MessageCode::Ping.as_byte()]
        )));
    }

    #[test]
    fn query_reply_carries_response_payload() {
        let mut message = AdapterMessage::housekeeping(
            MessageCode::FirmwareVersion,
            &[],
            Duration::from_millis(500),
        );
        message.begin_attempt();
        let reply = AdapterFrame::with_data(MessageCode::FirmwareVersion, &[0x00, 0x0C]);
        assert!(message.is_response(&reply));
        assert!(message.on_reply(&reply));
        assert_eq!(message.response(), &[0x00, 0x0C]);
    }

    #[test]
    fn retry_resends_identical_bytes() {
        let mut message = build_frame(&standby(), 3);
        message.max_tries = 3;
        message.begin_attempt();
        let first = message.to_wire();
        message.on_reply(&AdapterFrame::new(MessageCode::TransmitFailedLine));
        message.begin_attempt();
        assert_eq!(message.to_wire(), first);
        assert_eq!(message.tries, 2);
        assert!(message.has_tries_left());
        assert!(message.reply().is_none());
    }
}

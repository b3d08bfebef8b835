//! Test utilities: an in-process USB-CEC adapter and tracing setup
//!
//! [`AdapterSimulator`] sits on the far side of a [`MemoryTransport`] and
//! answers the bus the way the adapter firmware does: every frame of a
//! transmission is accepted, the final result is reported, housekeeping
//! commands are acknowledged and the firmware version is answered.

#![cfg(any(test, feature = "test-utils"))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::codec::{AdapterFrame, FrameDecoder, MessageCode};
use crate::transport::{MemoryPeer, MemoryTransport};
use crate::types::{CecCommand, Opcode};
use crate::wire::{CommandAssembler, Decoded};

/// Install a `tracing` subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How the simulated adapter answers transmissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    /// Accept every frame and report success.
    #[default]
    Acknowledge,
    /// Accept every frame, then report that no follower acknowledged.
    NoFollower,
    /// Accept every frame, then report a line error, which the bus retries.
    LineError,
    /// Never answer; the bus sees a timeout.
    Silent,
}

#[derive(Debug, Default)]
struct Recorded {
    mode: AckMode,
    attempts: usize,
    transmitted: Vec<CecCommand>,
    housekeeping: Vec<(MessageCode, Vec<u8>)>,
    /// Reply opcode and operands a device sends back per request opcode.
    replies: HashMap<Opcode, (Opcode, Vec<u8>)>,
}

/// Simulated adapter driving the peer end of a [`MemoryTransport`].
pub struct AdapterSimulator {
    recorded: Arc<Mutex<Recorded>>,
    inject: mpsc::UnboundedSender<Vec<u8>>,
    task: JoinHandle<()>,
}

/// Firmware version the simulator reports.
pub const SIMULATED_FIRMWARE: u16 = 0x0008;

impl AdapterSimulator {
    /// Create a transport for the bus and start simulating its adapter.
    pub fn start() -> (MemoryTransport, AdapterSimulator) {
        let (transport, peer) = MemoryTransport::pair();
        (transport, Self::spawn(peer))
    }

    pub fn spawn(peer: MemoryPeer) -> AdapterSimulator {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let (inject, inject_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(peer, recorded.clone(), inject_rx));
        AdapterSimulator { recorded, inject, task }
    }

    pub fn set_mode(&self, mode: AckMode) {
        self.lock().mode = mode;
    }

    /// Have the destination answer every acknowledged `request` with
    /// `reply` carrying `operands`. A later call replaces the answer.
    pub fn reply_with(&self, request: Opcode, reply: Opcode, operands: &[u8]) {
        self.lock().replies.insert(request, (reply, operands.to_vec()));
    }

    /// Transmission attempts seen, counting each retry.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    /// Commands written by the bus, one entry per attempt.
    pub fn transmitted(&self) -> Vec<CecCommand> {
        self.lock().transmitted.clone()
    }

    /// Housekeeping requests seen, with their data bytes.
    pub fn housekeeping(&self) -> Vec<(MessageCode, Vec<u8>)> {
        self.lock().housekeeping.clone()
    }

    /// Deliver `command` to the bus as if another device sent it.
    pub fn inject(&self, command: &CecCommand) {
        let _ = self.inject.send(received_wire(command));
    }

    /// Deliver raw bytes to the bus.
    pub fn inject_bytes(&self, bytes: &[u8]) {
        let _ = self.inject.send(bytes.to_vec());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AdapterSimulator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Wire bytes of `command` in the received layout: a `FRAME_START` header
/// followed by one `FRAME_DATA` frame per byte, EOM on the last.
pub fn received_wire(command: &CecCommand) -> Vec<u8> {
    let mut bytes = vec![command.header_byte()];
    if let Some(opcode) = command.opcode {
        bytes.push(u8::from(opcode));
        bytes.extend_from_slice(command.operands());
    }
    let last = bytes.len() - 1;
    let mut wire = Vec::new();
    for (i, byte) in bytes.iter().enumerate() {
        let code = if i == 0 { MessageCode::FrameStart } else { MessageCode::FrameData };
        AdapterFrame::with_data(code, &[*byte]).with_flags(i == last, true).encode_into(&mut wire);
    }
    wire
}

async fn run(
    mut peer: MemoryPeer,
    recorded: Arc<Mutex<Recorded>>,
    mut inject: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    let mut decoder = FrameDecoder::new();
    let mut assembler = CommandAssembler::new();
    loop {
        tokio::select! {
            chunk = peer.recv() => {
                let Some(chunk) = chunk else { break };
                let mut replies = Vec::new();
                for frame in decoder.push_bytes(&chunk) {
                    answer(&frame, &mut assembler, &recorded, &mut replies);
                }
                if !replies.is_empty() && peer.send(&replies).is_err() {
                    break;
                }
            }
            bytes = inject.recv() => {
                let Some(bytes) = bytes else { break };
                if peer.send(&bytes).is_err() {
                    break;
                }
            }
        }
    }
}

/// The configured reply of the addressed device to `command`, if any.
fn device_answer(recorded: &Recorded, command: &CecCommand) -> Option<CecCommand> {
    let (opcode, operands) = recorded.replies.get(&command.opcode?)?;
    let mut reply = command.reply(command.destination, *opcode);
    for byte in operands {
        reply.push_operand(*byte).ok()?;
    }
    Some(reply)
}

fn answer(
    frame: &AdapterFrame,
    assembler: &mut CommandAssembler,
    recorded: &Mutex<Recorded>,
    replies: &mut Vec<u8>,
) {
    let mut recorded = recorded.lock().unwrap_or_else(PoisonError::into_inner);
    let code = frame.message();
    trace!(frame = %frame, "Simulated adapter received");

    if frame.is_transmission() {
        if code == MessageCode::TransmitAckPolarity {
            recorded.attempts += 1;
        }
        let completed = match assembler.push(frame) {
            Decoded::Complete(command) => {
                recorded.transmitted.push(command.clone());
                Some(command)
            }
            Decoded::Incomplete => None,
        };
        let mode = recorded.mode;
        if mode == AckMode::Silent {
            return;
        }
        AdapterFrame::with_data(MessageCode::CommandAccepted, &[code.as_byte()]).encode_into(replies);
        if code == MessageCode::TransmitEom {
            let result = match mode {
                AckMode::NoFollower => MessageCode::TransmitFailedAck,
                AckMode::LineError => MessageCode::TransmitFailedLine,
                _ => MessageCode::TransmitSucceeded,
            };
            AdapterFrame::new(result).encode_into(replies);
            if result == MessageCode::TransmitSucceeded {
                if let Some(answer) = completed.and_then(|command| device_answer(&recorded, &command)) {
                    replies.extend(received_wire(&answer));
                }
            }
        }
        return;
    }

    recorded.housekeeping.push((code, frame.data().to_vec()));
    if recorded.mode == AckMode::Silent {
        return;
    }
    match code {
        MessageCode::FirmwareVersion => {
            AdapterFrame::with_data(MessageCode::FirmwareVersion, &SIMULATED_FIRMWARE.to_be_bytes())
                .encode_into(replies);
        }
        _ => {
            AdapterFrame::with_data(MessageCode::CommandAccepted, &[code.as_byte()]).encode_into(replies);
        }
    }
}

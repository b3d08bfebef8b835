//! Frame codec for the USB-CEC adapter serial protocol.
//!
//! The adapter talks to the host in small frames:
//!
//! ```text
//! FRAME_START  code  [data, escaped]...  FRAME_START
//! ```
//!
//! `FRAME_START` (0xFF) both closes the previous frame and opens the next.
//! Any byte at or above the escape marker (0xFD) is sent as the escape marker
//! followed by the byte XOR 0x10. The codec is pure: no I/O, no timers.
//!
//! ```rust
//! use cecbridge::codec::{AdapterFrame, FrameDecoder, MessageCode};
//!
//! let frame = AdapterFrame::with_data(MessageCode::FrameData, &[0xFF]);
//! let wire = frame.to_wire();
//! assert_eq!(wire, vec![0xFF, 0x06, 0xFD, 0xEF, 0xFF]);
//!
//! let mut decoder = FrameDecoder::new();
//! assert_eq!(decoder.push_bytes(&wire), vec![frame]);
//! ```

mod decoder;
mod frame;
mod message_code;

pub use decoder::{DecodeStatus, FrameDecoder};
pub use frame::{AdapterFrame, ESCAPE, ESCAPE_MASK, FRAME_START, MAX_FRAME_LEN, needs_escape};
pub use message_code::{CODE_MASK, FLAG_ACK, FLAG_EOM, MessageCode};

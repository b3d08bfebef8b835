//! Matching adapter replies to the request they answer

use crate::codec::{AdapterFrame, MessageCode};

/// Replies whose request is fixed by their own code.
const REPLY_TABLE: &[(MessageCode, MessageCode)] = &[
    (MessageCode::TransmitSucceeded, MessageCode::Transmit),
    (MessageCode::TransmitLineTimeout, MessageCode::Transmit),
    (MessageCode::TransmitFailedLine, MessageCode::Transmit),
    (MessageCode::TransmitFailedAck, MessageCode::Transmit),
    (MessageCode::TransmitFailedTimeoutData, MessageCode::Transmit),
    (MessageCode::TransmitFailedTimeoutLine, MessageCode::Transmit),
    (MessageCode::FirmwareVersion, MessageCode::FirmwareVersion),
    (MessageCode::GetBuildDate, MessageCode::GetBuildDate),
    (MessageCode::GetAutoEnabled, MessageCode::GetAutoEnabled),
    (MessageCode::GetDefaultLogicalAddress, MessageCode::GetDefaultLogicalAddress),
    (MessageCode::GetLogicalAddressMask, MessageCode::GetLogicalAddressMask),
    (MessageCode::GetPhysicalAddress, MessageCode::GetPhysicalAddress),
    (MessageCode::GetDeviceType, MessageCode::GetDeviceType),
    (MessageCode::GetHdmiVersion, MessageCode::GetHdmiVersion),
    (MessageCode::GetOsdName, MessageCode::GetOsdName),
    (MessageCode::GetAdapterType, MessageCode::GetAdapterType),
];

impl AdapterFrame {
    /// The request code this frame replies to, or [`MessageCode::Nothing`].
    ///
    /// Accepted/rejected replies name the request in their first data byte;
    /// older firmware omits it, which also yields `Nothing`.
    pub fn response_to(&self) -> MessageCode {
        match self.message() {
            MessageCode::CommandAccepted | MessageCode::CommandRejected if self.len() > 1 => {
                MessageCode::from_byte(self.at(1)).unwrap_or(MessageCode::Nothing)
            }
            code => REPLY_TABLE
                .iter()
                .find(|(reply, _)| *reply == code)
                .map_or(MessageCode::Nothing, |(_, request)| *request),
        }
    }
}

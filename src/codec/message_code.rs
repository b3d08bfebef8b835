//! Adapter message codes

/// End-of-message flag carried in the code byte.
pub const FLAG_EOM: u8 = 0x80;
/// Acknowledge flag carried in the code byte.
pub const FLAG_ACK: u8 = 0x40;
/// Bits of the code byte that hold the message code.
pub const CODE_MASK: u8 = !(FLAG_EOM | FLAG_ACK);

/// Purpose of one adapter frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageCode {
    Nothing = 0,
    Ping = 1,
    TimeoutError = 2,
    HighError = 3,
    LowError = 4,
    FrameStart = 5,
    FrameData = 6,
    ReceiveFailed = 7,
    CommandAccepted = 8,
    CommandRejected = 9,
    SetAckMask = 10,
    Transmit = 11,
    TransmitEom = 12,
    TransmitIdleTime = 13,
    TransmitAckPolarity = 14,
    TransmitLineTimeout = 15,
    TransmitSucceeded = 16,
    TransmitFailedLine = 17,
    TransmitFailedAck = 18,
    TransmitFailedTimeoutData = 19,
    TransmitFailedTimeoutLine = 20,
    FirmwareVersion = 21,
    StartBootloader = 22,
    GetBuildDate = 23,
    SetControlled = 24,
    GetAutoEnabled = 25,
    SetAutoEnabled = 26,
    GetDefaultLogicalAddress = 27,
    SetDefaultLogicalAddress = 28,
    GetLogicalAddressMask = 29,
    SetLogicalAddressMask = 30,
    GetPhysicalAddress = 31,
    SetPhysicalAddress = 32,
    GetDeviceType = 33,
    SetDeviceType = 34,
    GetHdmiVersion = 35,
    SetHdmiVersion = 36,
    GetOsdName = 37,
    SetOsdName = 38,
    WriteEeprom = 39,
    GetAdapterType = 40,
    SetActiveSource = 41,
}

const CODES: [MessageCode; 42] = [
    MessageCode::Nothing,
    MessageCode::Ping,
    MessageCode::TimeoutError,
    MessageCode::HighError,
    MessageCode::LowError,
    MessageCode::FrameStart,
    MessageCode::FrameData,
    MessageCode::ReceiveFailed,
    MessageCode::CommandAccepted,
    MessageCode::CommandRejected,
    MessageCode::SetAckMask,
    MessageCode::Transmit,
    MessageCode::TransmitEom,
    MessageCode::TransmitIdleTime,
    MessageCode::TransmitAckPolarity,
    MessageCode::TransmitLineTimeout,
    MessageCode::TransmitSucceeded,
    MessageCode::TransmitFailedLine,
    MessageCode::TransmitFailedAck,
    MessageCode::TransmitFailedTimeoutData,
    MessageCode::TransmitFailedTimeoutLine,
    MessageCode::FirmwareVersion,
    MessageCode::StartBootloader,
    MessageCode::GetBuildDate,
    MessageCode::SetControlled,
    MessageCode::GetAutoEnabled,
    MessageCode::SetAutoEnabled,
    MessageCode::GetDefaultLogicalAddress,
    MessageCode::SetDefaultLogicalAddress,
    MessageCode::GetLogicalAddressMask,
    MessageCode::SetLogicalAddressMask,
    MessageCode::GetPhysicalAddress,
    MessageCode::SetPhysicalAddress,
    MessageCode::GetDeviceType,
    MessageCode::SetDeviceType,
    MessageCode::GetHdmiVersion,
    MessageCode::SetHdmiVersion,
    MessageCode::GetOsdName,
    MessageCode::SetOsdName,
    MessageCode::WriteEeprom,
    MessageCode::GetAdapterType,
    MessageCode::SetActiveSource,
];

impl MessageCode {
    /// Decode a code byte, ignoring the EOM and ACK flags.
    pub fn from_byte(byte: u8) -> Option<Self> {
        CODES.get(usize::from(byte & CODE_MASK)).copied()
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Negative acknowledgements and error notifications.
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            MessageCode::TimeoutError
                | MessageCode::HighError
                | MessageCode::LowError
                | MessageCode::ReceiveFailed
                | MessageCode::CommandRejected
                | MessageCode::TransmitLineTimeout
                | MessageCode::TransmitFailedLine
                | MessageCode::TransmitFailedAck
                | MessageCode::TransmitFailedTimeoutData
                | MessageCode::TransmitFailedTimeoutLine
        )
    }

    /// Errors caused by bus noise or arbitration, worth another attempt.
    ///
    /// A missing follower acknowledgement and a rejected command are permanent.
    pub const fn needs_retry(self) -> bool {
        matches!(
            self,
            MessageCode::TimeoutError
                | MessageCode::ReceiveFailed
                | MessageCode::TransmitLineTimeout
                | MessageCode::TransmitFailedLine
                | MessageCode::TransmitFailedTimeoutData
                | MessageCode::TransmitFailedTimeoutLine
        )
    }

    /// Codes that carry a CEC byte towards the bus.
    pub const fn is_transmission(self) -> bool {
        matches!(
            self,
            MessageCode::Transmit | MessageCode::TransmitEom | MessageCode::TransmitAckPolarity
        )
    }

    /// Results the adapter reports once a whole transmission is done.
    pub const fn is_transmit_result(self) -> bool {
        matches!(
            self,
            MessageCode::TransmitSucceeded
                | MessageCode::TransmitLineTimeout
                | MessageCode::TransmitFailedLine
                | MessageCode::TransmitFailedAck
                | MessageCode::TransmitFailedTimeoutData
                | MessageCode::TransmitFailedTimeoutLine
        )
    }
}

impl std::fmt::Display for MessageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageCode::Nothing => "NOTHING",
            MessageCode::Ping => "PING",
            MessageCode::TimeoutError => "TIMEOUT",
            MessageCode::HighError => "HIGH_ERROR",
            MessageCode::LowError => "LOW_ERROR",
            MessageCode::FrameStart => "FRAME_START",
            MessageCode::FrameData => "FRAME_DATA",
            MessageCode::ReceiveFailed => "RECEIVE_FAILED",
            MessageCode::CommandAccepted => "COMMAND_ACCEPTED",
            MessageCode::CommandRejected => "COMMAND_REJECTED",
            MessageCode::SetAckMask => "SET_ACK_MASK",
            MessageCode::Transmit => "TRANSMIT",
            MessageCode::TransmitEom => "TRANSMIT_EOM",
            MessageCode::TransmitIdleTime => "TRANSMIT_IDLETIME",
            MessageCode::TransmitAckPolarity => "TRANSMIT_ACK_POLARITY",
            MessageCode::TransmitLineTimeout => "TRANSMIT_LINE_TIMEOUT",
            MessageCode::TransmitSucceeded => "TRANSMIT_SUCCEEDED",
            MessageCode::TransmitFailedLine => "TRANSMIT_FAILED_LINE",
            MessageCode::TransmitFailedAck => "TRANSMIT_FAILED_ACK",
            MessageCode::TransmitFailedTimeoutData => "TRANSMIT_FAILED_TIMEOUT_DATA",
            MessageCode::TransmitFailedTimeoutLine => "TRANSMIT_FAILED_TIMEOUT_LINE",
            MessageCode::FirmwareVersion => "FIRMWARE_VERSION",
            MessageCode::StartBootloader => "START_BOOTLOADER",
            MessageCode::GetBuildDate => "GET_BUILDDATE",
            MessageCode::SetControlled => "SET_CONTROLLED",
            MessageCode::GetAutoEnabled => "GET_AUTO_ENABLED",
            MessageCode::SetAutoEnabled => "SET_AUTO_ENABLED",
            MessageCode::GetDefaultLogicalAddress => "GET_DEFAULT_LOGICAL_ADDRESS",
            MessageCode::SetDefaultLogicalAddress => "SET_DEFAULT_LOGICAL_ADDRESS",
            MessageCode::GetLogicalAddressMask => "GET_LOGICAL_ADDRESS_MASK",
            MessageCode::SetLogicalAddressMask => "SET_LOGICAL_ADDRESS_MASK",
            MessageCode::GetPhysicalAddress => "GET_PHYSICAL_ADDRESS",
            MessageCode::SetPhysicalAddress => "SET_PHYSICAL_ADDRESS",
            MessageCode::GetDeviceType => "GET_DEVICE_TYPE",
            MessageCode::SetDeviceType => "SET_DEVICE_TYPE",
            MessageCode::GetHdmiVersion => "GET_HDMI_VERSION",
            MessageCode::SetHdmiVersion => "SET_HDMI_VERSION",
            MessageCode::GetOsdName => "GET_OSD_NAME",
            MessageCode::SetOsdName => "SET_OSD_NAME",
            MessageCode::WriteEeprom => "WRITE_EEPROM",
            MessageCode::GetAdapterType => "GET_ADAPTER_TYPE",
            MessageCode::SetActiveSource => "SET_ACTIVE_SOURCE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_discriminants() {
        for (i, code) in CODES.iter().enumerate() {
            assert_eq!(usize::from(code.as_byte()), i);
        }
    }

    #[test]
    fn flags_are_ignored_when_decoding() {
        assert_eq!(MessageCode::from_byte(0x06 | FLAG_EOM), Some(MessageCode::FrameData));
        assert_eq!(
            MessageCode::from_byte(0x05 | FLAG_EOM | FLAG_ACK),
            Some(MessageCode::FrameStart)
        );
        assert_eq!(MessageCode::from_byte(0x3F), None);
    }

    #[test]
    fn retry_codes_are_a_strict_subset_of_errors() {
        let retryable: Vec<_> = CODES.iter().filter(|c| c.needs_retry()).collect();
        assert!(retryable.iter().all(|c| c.is_error()));
        assert!(CODES.iter().any(|c| c.is_error() && !c.needs_retry()));
        assert!(!MessageCode::TransmitFailedAck.needs_retry());
        assert!(!MessageCode::CommandRejected.needs_retry());
    }
}

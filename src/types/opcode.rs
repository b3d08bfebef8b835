//! CEC opcodes

byte_enum! {
    /// CEC command opcode.
    pub enum Opcode {
        FeatureAbort = 0x00,
        ImageViewOn = 0x04,
        TunerStepIncrement = 0x05,
        TunerStepDecrement = 0x06,
        TunerDeviceStatus = 0x07,
        GiveTunerDeviceStatus = 0x08,
        RecordOn = 0x09,
        RecordStatus = 0x0A,
        RecordOff = 0x0B,
        TextViewOn = 0x0D,
        RecordTvScreen = 0x0F,
        GiveDeckStatus = 0x1A,
        DeckStatus = 0x1B,
        SetMenuLanguage = 0x32,
        ClearAnalogueTimer = 0x33,
        SetAnalogueTimer = 0x34,
        TimerStatus = 0x35,
        Standby = 0x36,
        Play = 0x41,
        DeckControl = 0x42,
        TimerClearedStatus = 0x43,
        UserControlPressed = 0x44,
        UserControlRelease = 0x45,
        GiveOsdName = 0x46,
        SetOsdName = 0x47,
        SetOsdString = 0x64,
        SetTimerProgramTitle = 0x67,
        SystemAudioModeRequest = 0x70,
        GiveAudioStatus = 0x71,
        SetSystemAudioMode = 0x72,
        ReportAudioStatus = 0x7A,
        GiveSystemAudioModeStatus = 0x7D,
        SystemAudioModeStatus = 0x7E,
        RoutingChange = 0x80,
        RoutingInformation = 0x81,
        ActiveSource = 0x82,
        GivePhysicalAddress = 0x83,
        ReportPhysicalAddress = 0x84,
        RequestActiveSource = 0x85,
        SetStreamPath = 0x86,
        DeviceVendorId = 0x87,
        VendorCommand = 0x89,
        VendorRemoteButtonDown = 0x8A,
        VendorRemoteButtonUp = 0x8B,
        GiveDeviceVendorId = 0x8C,
        MenuRequest = 0x8D,
        MenuStatus = 0x8E,
        GiveDevicePowerStatus = 0x8F,
        ReportPowerStatus = 0x90,
        GetMenuLanguage = 0x91,
        SelectAnalogueService = 0x92,
        SelectDigitalService = 0x93,
        SetDigitalTimer = 0x97,
        ClearDigitalTimer = 0x99,
        SetAudioRate = 0x9A,
        InactiveSource = 0x9D,
        CecVersion = 0x9E,
        GetCecVersion = 0x9F,
        VendorCommandWithId = 0xA0,
        ClearExternalTimer = 0xA1,
        SetExternalTimer = 0xA2,
        Abort = 0xFF,
    }
}

impl Opcode {
    /// The reply opcode a request expects, if any.
    pub fn expected_reply(self) -> Option<Opcode> {
        match self {
            Opcode::GiveDevicePowerStatus => Some(Opcode::ReportPowerStatus),
            Opcode::GiveDeviceVendorId => Some(Opcode::DeviceVendorId),
            Opcode::GetCecVersion => Some(Opcode::CecVersion),
            Opcode::GivePhysicalAddress => Some(Opcode::ReportPhysicalAddress),
            Opcode::GiveOsdName => Some(Opcode::SetOsdName),
            Opcode::GetMenuLanguage => Some(Opcode::SetMenuLanguage),
            Opcode::GiveDeckStatus => Some(Opcode::DeckStatus),
            Opcode::MenuRequest => Some(Opcode::MenuStatus),
            Opcode::GiveAudioStatus => Some(Opcode::ReportAudioStatus),
            Opcode::GiveSystemAudioModeStatus => Some(Opcode::SystemAudioModeStatus),
            Opcode::GiveTunerDeviceStatus => Some(Opcode::TunerDeviceStatus),
            _ => None,
        }
    }

    /// Opcodes only valid when sent to the broadcast address.
    pub fn is_broadcast_only(self) -> bool {
        matches!(
            self,
            Opcode::ActiveSource
                | Opcode::RequestActiveSource
                | Opcode::SetStreamPath
                | Opcode::RoutingChange
                | Opcode::RoutingInformation
                | Opcode::ReportPhysicalAddress
                | Opcode::DeviceVendorId
                | Opcode::SetMenuLanguage
        )
    }
}

byte_enum! {
    /// Reason operand of a `FeatureAbort` reply.
    pub enum AbortReason {
        UnrecognizedOpcode = 0x00,
        NotInCorrectModeToRespond = 0x01,
        CannotProvideSource = 0x02,
        InvalidOperand = 0x03,
        Refused = 0x04,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_know_their_reply() {
        assert_eq!(Opcode::GiveOsdName.expected_reply(), Some(Opcode::SetOsdName));
        assert_eq!(Opcode::Standby.expected_reply(), None);
        assert_eq!(Opcode::Unknown(0xF0).expected_reply(), None);
    }

    #[test]
    fn routing_opcodes_are_broadcast_only() {
        assert!(Opcode::ActiveSource.is_broadcast_only());
        assert!(!Opcode::GiveOsdName.is_broadcast_only());
    }
}

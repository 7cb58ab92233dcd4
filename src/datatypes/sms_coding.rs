// ABOUTME: Strongly-typed SMS header enums mirroring libGammu's PDU type, coding, class and UDH kinds
// ABOUTME: Replaces raw C enum values with Rust enums; the native engine maps them back to C constants

/// Kind of PDU an SMS is encoded as
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PduType {
    /// Message originated by this device (`SMS_Submit`)
    #[default]
    Submit,
    /// Message received from the network (`SMS_Deliver`)
    Deliver,
    /// Delivery report (`SMS_Status_Report`)
    StatusReport,
}

/// Character coding of the user data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SmsCoding {
    /// GSM 7-bit default alphabet, uncompressed
    #[default]
    DefaultNoCompression,
    /// GSM 7-bit default alphabet, compressed
    DefaultCompression,
    /// UCS-2, uncompressed
    UnicodeNoCompression,
    /// UCS-2, compressed
    UnicodeCompression,
    /// 8-bit binary data
    EightBit,
}

impl SmsCoding {
    /// Returns true for the 16-bit codings
    pub fn is_unicode(&self) -> bool {
        matches!(
            self,
            SmsCoding::UnicodeNoCompression | SmsCoding::UnicodeCompression
        )
    }

    /// Characters that fit in one SMS without a user data header
    pub fn max_single_sms_length(&self) -> usize {
        match self {
            coding if coding.is_unicode() => 70,
            SmsCoding::EightBit => 140,
            _ => 160,
        }
    }

    /// Characters per segment once a concatenation header takes its share
    pub fn max_segment_length(&self) -> usize {
        match self {
            coding if coding.is_unicode() => 67,
            SmsCoding::EightBit => 134,
            _ => 153,
        }
    }
}

/// Message class as carried in the data coding scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageClass {
    /// Class 0: flash message, displayed immediately
    Flash,
    /// Class 1: stored in mobile equipment
    MobileEquipment,
    /// Class 2: stored on the SIM
    SimSpecific,
    /// Class 3: forwarded to terminal equipment
    TerminalEquipment,
}

impl MessageClass {
    /// Numeric class as used by libGammu
    pub fn as_raw(&self) -> i32 {
        match self {
            MessageClass::Flash => 0,
            MessageClass::MobileEquipment => 1,
            MessageClass::SimSpecific => 2,
            MessageClass::TerminalEquipment => 3,
        }
    }

    /// Parses a native class value; anything outside 0..=3 means "no class"
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(MessageClass::Flash),
            1 => Some(MessageClass::MobileEquipment),
            2 => Some(MessageClass::SimSpecific),
            3 => Some(MessageClass::TerminalEquipment),
            _ => None,
        }
    }

    /// Native value for an optional class (`-1` when unset)
    pub fn raw_or_unset(class: Option<MessageClass>) -> i32 {
        class.map_or(-1, |c| c.as_raw())
    }
}

/// Type of user data header attached to a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum UdhType {
    /// No header (`UDH_NoUDH`)
    #[default]
    NoUdh,
    /// Concatenation with 8-bit reference
    ConcatenatedMessages,
    /// Concatenation with 16-bit reference
    ConcatenatedMessages16bit,
    /// Caller supplied header bytes
    UserUdh,
    /// Any other native UDH kind, kept verbatim
    Raw(u32),
}

/// Kind of a multi-part encoder entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MultiPartEntryKind {
    /// Plain text, must fit one SMS (`SMS_Text`)
    Text,
    /// Long text split with 8-bit concatenation references
    #[default]
    ConcatenatedTextLong,
    /// Long text split with 16-bit concatenation references
    ConcatenatedTextLong16bit,
    /// Long text, concatenated only when it does not fit one SMS
    ConcatenatedAutoTextLong,
}

impl MultiPartEntryKind {
    /// Returns true if the encoder adds concatenation headers for this kind
    pub fn is_concatenated(&self) -> bool {
        !matches!(self, MultiPartEntryKind::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_plain_submit() {
        assert_eq!(PduType::default(), PduType::Submit);
        assert_eq!(SmsCoding::default(), SmsCoding::DefaultNoCompression);
        assert_eq!(UdhType::default(), UdhType::NoUdh);
    }

    #[test]
    fn test_message_class_raw_values() {
        assert_eq!(MessageClass::MobileEquipment.as_raw(), 1);
        assert_eq!(MessageClass::from_raw(1), Some(MessageClass::MobileEquipment));
        assert_eq!(MessageClass::from_raw(-1), None);
        assert_eq!(MessageClass::raw_or_unset(None), -1);
    }

    #[test]
    fn test_segment_lengths() {
        assert_eq!(SmsCoding::DefaultNoCompression.max_single_sms_length(), 160);
        assert_eq!(SmsCoding::DefaultNoCompression.max_segment_length(), 153);
        assert_eq!(SmsCoding::UnicodeNoCompression.max_segment_length(), 67);
        assert!(SmsCoding::UnicodeCompression.is_unicode());
        assert!(!SmsCoding::EightBit.is_unicode());
    }

    #[test]
    fn test_lengths_follow_unicode_coding() {
        assert_eq!(SmsCoding::UnicodeCompression.max_single_sms_length(), 70);
        assert_eq!(SmsCoding::UnicodeCompression.max_segment_length(), 67);
        assert_eq!(SmsCoding::DefaultCompression.max_single_sms_length(), 160);
        assert_eq!(SmsCoding::EightBit.max_single_sms_length(), 140);
        assert_eq!(SmsCoding::EightBit.max_segment_length(), 134);
    }
}

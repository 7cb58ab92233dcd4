// ABOUTME: Rust-side SMS message, SMSC and multi-part descriptors exchanged with the telephony engine
// ABOUTME: Constructors fill in the fixed submit defaults (class 1, no UDH, default coding)

use crate::datatypes::sms_coding::{MessageClass, MultiPartEntryKind, PduType, SmsCoding, UdhType};
use crate::datatypes::unicode_string::{UnicodeString, needs_unicode};
use bytes::Bytes;

/// Message class every outgoing message is sent with
pub const MESSAGE_CLASS: MessageClass = MessageClass::MobileEquipment;

/// Phone memory location the service-center address is read from
pub const SMSC_LOCATION: i32 = 1;

/// SMS service-center descriptor (`GSM_SMSC`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Smsc {
    /// Memory location on the phone
    pub location: i32,
    /// Service-center number
    pub number: UnicodeString,
    /// Name stored with the entry, often empty
    pub name: UnicodeString,
}

impl Smsc {
    /// Empty descriptor pointing at `location`, ready to be filled by the engine
    pub fn at_location(location: i32) -> Self {
        Self {
            location,
            ..Default::default()
        }
    }
}

/// User data header (`GSM_UDHHeader`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDataHeader {
    pub kind: UdhType,
    /// Encoded header bytes
    pub data: Bytes,
    /// 8-bit concatenation reference, `-1` when unused
    pub id8bit: i32,
    /// 16-bit concatenation reference, `-1` when unused
    pub id16bit: i32,
    /// 1-based position of this part, `-1` when unused
    pub part_number: i32,
    /// Total number of parts, `-1` when unused
    pub all_parts: i32,
}

impl Default for UserDataHeader {
    fn default() -> Self {
        Self {
            kind: UdhType::NoUdh,
            data: Bytes::new(),
            id8bit: -1,
            id16bit: -1,
            part_number: -1,
            all_parts: -1,
        }
    }
}

/// One physical SMS (`GSM_SMSMessage`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    /// Service center used for routing; its number is overwritten before submission
    pub smsc: Smsc,
    /// Destination number
    pub number: UnicodeString,
    /// Message text, or raw bytes for 8-bit coding
    pub text: UnicodeString,
    /// Length of `text` as the encoder reported it
    pub length: usize,
    pub pdu: PduType,
    pub udh: UserDataHeader,
    pub coding: SmsCoding,
    pub class: Option<MessageClass>,
    /// Engine-native image of the message as its multi-part encoder built it.
    ///
    /// When present, the engine submits this image and takes only the
    /// destination number, PDU type and SMSC number from the fields above, so
    /// encoder settings this struct does not model (validity, reply path,
    /// folder) reach the network unchanged.
    pub native_image: Option<Bytes>,
}

impl SmsMessage {
    /// Single-part submit message with the fixed defaults
    ///
    /// No user data header, default 7-bit coding, message class 1.
    pub fn submit(number: &str, text: &str) -> Self {
        let text = UnicodeString::encode(text);
        Self {
            smsc: Smsc::default(),
            number: UnicodeString::encode(number),
            length: text.len(),
            text,
            pdu: PduType::Submit,
            udh: UserDataHeader::default(),
            coding: SmsCoding::DefaultNoCompression,
            class: Some(MESSAGE_CLASS),
            native_image: None,
        }
    }
}

/// One input block for the multi-part encoder (`GSM_MultiPartSMSEntry`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPartEntry {
    pub kind: MultiPartEntryKind,
    pub buffer: UnicodeString,
}

/// Description of a long message for the multi-part encoder (`GSM_MultiPartSMSInfo`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPartSmsInfo {
    pub class: Option<MessageClass>,
    /// Selects 16-bit coding for every segment
    pub unicode_coding: bool,
    pub entries: Vec<MultiPartEntry>,
}

impl MultiPartSmsInfo {
    /// Concatenated long text, class 1, Unicode coding only when required
    pub fn long_text(text: &str) -> Self {
        Self {
            class: Some(MESSAGE_CLASS),
            unicode_coding: needs_unicode(text),
            entries: vec![MultiPartEntry {
                kind: MultiPartEntryKind::ConcatenatedTextLong,
                buffer: UnicodeString::encode(text),
            }],
        }
    }
}

/// Ordered segments produced by the multi-part encoder (`GSM_MultiSMSMessage`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSmsMessage {
    segments: Vec<SmsMessage>,
}

impl MultiSmsMessage {
    pub fn new(segments: Vec<SmsMessage>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SmsMessage> {
        self.segments.iter()
    }
}

impl IntoIterator for MultiSmsMessage {
    type Item = SmsMessage;
    type IntoIter = std::vec::IntoIter<SmsMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl From<Vec<SmsMessage>> for MultiSmsMessage {
    fn from(segments: Vec<SmsMessage>) -> Self {
        Self::new(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_defaults() {
        let sms = SmsMessage::submit("123456", "hi");
        assert_eq!(sms.pdu, PduType::Submit);
        assert_eq!(sms.udh.kind, UdhType::NoUdh);
        assert_eq!(sms.coding, SmsCoding::DefaultNoCompression);
        assert_eq!(sms.class, Some(MessageClass::MobileEquipment));
        assert_eq!(sms.number.to_string(), "123456");
        assert_eq!(sms.text.to_string(), "hi");
        assert_eq!(sms.length, 2);
        assert!(sms.smsc.number.is_empty());
        assert!(sms.native_image.is_none());
    }

    #[test]
    fn test_long_text_info_ascii() {
        let info = MultiPartSmsInfo::long_text("just ascii");
        assert_eq!(info.class, Some(MessageClass::MobileEquipment));
        assert!(!info.unicode_coding);
        assert_eq!(info.entries.len(), 1);
        assert_eq!(info.entries[0].kind, MultiPartEntryKind::ConcatenatedTextLong);
        assert_eq!(info.entries[0].buffer.to_string(), "just ascii");
    }

    #[test]
    fn test_long_text_info_selects_unicode() {
        let info = MultiPartSmsInfo::long_text("Gr\u{fc}\u{df}e");
        assert!(info.unicode_coding);
    }

    #[test]
    fn test_smsc_at_location() {
        let smsc = Smsc::at_location(SMSC_LOCATION);
        assert_eq!(smsc.location, 1);
        assert!(smsc.number.is_empty());
    }
}

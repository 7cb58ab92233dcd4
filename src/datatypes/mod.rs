mod error_code;
mod sms_coding;
mod sms_message;
mod unicode_string;

pub use error_code::ErrorCode;
pub use sms_coding::{MessageClass, MultiPartEntryKind, PduType, SmsCoding, UdhType};
pub use sms_message::{
    MESSAGE_CLASS, MultiPartEntry, MultiPartSmsInfo, MultiSmsMessage, SMSC_LOCATION, Smsc,
    SmsMessage, UserDataHeader,
};
pub use unicode_string::{UnicodeString, needs_unicode};

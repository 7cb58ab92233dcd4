// ABOUTME: libGammu GSM_Error status codes as a strongly typed enum with pass-through for unknown values
// ABOUTME: Carries the library's English descriptions for engines that have no native lookup table

use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;

/// Status code returned by every libGammu call (`GSM_Error`).
///
/// The numbering follows `gammu-error.h`: success is `ERR_NONE = 1`, not zero.
/// Codes this crate does not know about are kept verbatim in
/// [`ErrorCode::Other`] so they can be passed back to the native library.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No error (`ERR_NONE`)
    Ok = 1,
    DeviceOpenError = 2,
    DeviceLocked = 3,
    DeviceNotExist = 4,
    DeviceBusy = 5,
    DeviceNoPermission = 6,
    DeviceNoDriver = 7,
    DeviceNotWork = 8,
    DeviceDtrRtsError = 9,
    DeviceChangeSpeedError = 10,
    DeviceWriteError = 11,
    DeviceReadError = 12,
    DeviceParityError = 13,
    /// Command timed out (`ERR_TIMEOUT`)
    Timeout = 14,
    FrameNotRequested = 15,
    UnknownResponse = 16,
    UnknownFrame = 17,
    UnknownConnectionTypeString = 18,
    UnknownModelString = 19,
    SourceNotAvailable = 20,
    NotSupported = 21,
    Empty = 22,
    SecurityError = 23,
    InvalidLocation = 24,
    NotImplemented = 25,
    Full = 26,
    /// Unknown error (`ERR_UNKNOWN`), also what a failed send confirmation maps to
    Unknown = 27,
    CantOpenFile = 28,
    MoreMemory = 29,
    Permission = 30,
    EmptySmsc = 31,
    InsidePhoneMenu = 32,
    NotConnected = 33,
    WorkInProgress = 34,
    PhoneOff = 35,
    FileNotSupported = 36,
    Bug = 37,
    Canceled = 38,
    NeedAnotherAnswer = 39,
    OtherConnectionRequired = 40,
    WrongCrc = 41,
    InvalidDateTime = 42,
    Memory = 43,
    InvalidData = 44,
    FileAlreadyExist = 45,
    FileNotExist = 46,
    ShouldBeFolder = 47,
    ShouldBeFile = 48,
    NoSim = 49,
    GnappletWrong = 50,
    FolderPart = 51,
    FolderNotEmpty = 52,
    DataConverted = 53,
    Unconfigured = 54,
    WrongFolder = 55,
    PhoneInternal = 56,
    WritingFile = 57,
    NoneSection = 58,
    UsingDefaults = 59,
    Corrupted = 60,
    BadFeature = 61,
    Disabled = 62,
    SpecifyChannel = 63,
    NotRunning = 64,
    NoService = 65,
    Busy = 66,
    CouldntConnect = 67,
    CouldntResolve = 68,
    GettingSmsc = 69,
    Aborted = 70,
    InstallNotFound = 71,
    ReadOnly = 72,
    NetworkError = 73,
    InvalidOperation = 74,

    /// Any value not listed above, kept as-is
    #[num_enum(catch_all)]
    Other(i32),
}

impl ErrorCode {
    /// Returns the raw `GSM_Error` value
    pub fn as_raw(self) -> i32 {
        self.into()
    }

    /// Returns true for `ERR_NONE`
    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }

    /// Converts a native status into a `Result`, treating `ERR_NONE` as success
    pub fn into_result(self) -> Result<(), ErrorCode> {
        if self.is_ok() { Ok(()) } else { Err(self) }
    }

    /// English description of the code, as printed by `GSM_ErrorString`
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Ok => "No error.",
            ErrorCode::DeviceOpenError => "Error opening device. Unknown, busy or no permissions.",
            ErrorCode::DeviceLocked => "Error opening device, it is locked.",
            ErrorCode::DeviceNotExist => "Error opening device, it doesn't exist.",
            ErrorCode::DeviceBusy => {
                "Error opening device, it is already opened by other application."
            }
            ErrorCode::DeviceNoPermission => "Error opening device, you don't have permissions.",
            ErrorCode::DeviceNoDriver => {
                "Error opening device. No required driver in operating system."
            }
            ErrorCode::DeviceNotWork => {
                "Error opening device. Some hardware not connected/wrongly configured."
            }
            ErrorCode::DeviceDtrRtsError => "Error setting device DTR or RTS.",
            ErrorCode::DeviceChangeSpeedError => {
                "Error setting device speed. Maybe speed not supported."
            }
            ErrorCode::DeviceWriteError => "Error writing to the device.",
            ErrorCode::DeviceReadError => "Error during reading from the device.",
            ErrorCode::DeviceParityError => "Can't set parity on the device.",
            ErrorCode::Timeout => "No response in specified timeout. Probably phone not connected.",
            ErrorCode::FrameNotRequested => "Frame not requested right now.",
            ErrorCode::UnknownResponse => "Unknown response from phone.",
            ErrorCode::UnknownFrame => "Unknown frame.",
            ErrorCode::UnknownConnectionTypeString => {
                "Unknown connection type string. Check config file."
            }
            ErrorCode::UnknownModelString => "Unknown model type string. Check config file.",
            ErrorCode::SourceNotAvailable => {
                "Some functions not available for your system (disabled in config or not implemented)."
            }
            ErrorCode::NotSupported => "Function not supported by phone.",
            ErrorCode::Empty => "Entry is empty.",
            ErrorCode::SecurityError => "Security error. Maybe no PIN?",
            ErrorCode::InvalidLocation => "Invalid location. Maybe too high?",
            ErrorCode::NotImplemented => "Functionality not implemented.",
            ErrorCode::Full => "Memory full.",
            ErrorCode::Unknown => "Unknown error.",
            ErrorCode::CantOpenFile => "Can not open specified file.",
            ErrorCode::MoreMemory => "More memory required...",
            ErrorCode::Permission => "Operation not allowed by phone.",
            ErrorCode::EmptySmsc => {
                "No SMSC number given. Provide it manually or use the one configured in phone."
            }
            ErrorCode::InsidePhoneMenu => {
                "You're inside phone menu (maybe editing?). Leave it and try again."
            }
            ErrorCode::NotConnected => "Phone is not connected.",
            ErrorCode::WorkInProgress => "Function is currently being implemented.",
            ErrorCode::PhoneOff => "Phone is disabled and connected to charger.",
            ErrorCode::FileNotSupported => "File format not supported by Gammu.",
            ErrorCode::Bug => "Nobody is perfect, some bug appeared in protocol implementation.",
            ErrorCode::Canceled => {
                "Transfer was canceled by phone, maybe you pressed cancel on phone."
            }
            ErrorCode::NeedAnotherAnswer => "Phone module need to send another answer frame.",
            ErrorCode::OtherConnectionRequired => {
                "Current connection type doesn't support called function."
            }
            ErrorCode::WrongCrc => "CRC error.",
            ErrorCode::InvalidDateTime => "Invalid date or time specified.",
            ErrorCode::Memory => "Phone memory error, maybe it is read only.",
            ErrorCode::InvalidData => "Invalid data given to phone.",
            ErrorCode::FileAlreadyExist => "File with specified name already exists.",
            ErrorCode::FileNotExist => "File with specified name doesn't exist.",
            ErrorCode::ShouldBeFolder => "You have to give folder name and not file name.",
            ErrorCode::ShouldBeFile => "You have to give file name and not folder name.",
            ErrorCode::NoSim => "Can not access SIM card.",
            ErrorCode::GnappletWrong => {
                "Wrong GNAPPLET version in phone. Use version from currently used Gammu."
            }
            ErrorCode::FolderPart => "Only part of folder has been listed.",
            ErrorCode::FolderNotEmpty => "Folder must be empty.",
            ErrorCode::DataConverted => "Data were converted.",
            ErrorCode::Unconfigured => "Gammu is not configured.",
            ErrorCode::WrongFolder => "Wrong folder used.",
            ErrorCode::PhoneInternal => "Internal phone error.",
            ErrorCode::WritingFile => "Could not write to a file (on local filesystem).",
            ErrorCode::NoneSection => "No such section exists.",
            ErrorCode::UsingDefaults => "Using default values.",
            ErrorCode::Corrupted => "Corrupted data returned by phone.",
            ErrorCode::BadFeature => "Bad feature string in configuration.",
            ErrorCode::Disabled => "Desired functionality has been disabled on compile time.",
            ErrorCode::SpecifyChannel => "Bluetooth configuration requires channel option.",
            ErrorCode::NotRunning => "Service is not running.",
            ErrorCode::NoService => "Service configuration is missing.",
            ErrorCode::Busy => "Command rejected because device was busy. Wait and restart.",
            ErrorCode::CouldntConnect => "Could not connect to the server.",
            ErrorCode::CouldntResolve => "Could not resolve the host name.",
            ErrorCode::GettingSmsc => "Failed to get SMSC number from phone.",
            ErrorCode::Aborted => "Operation aborted.",
            ErrorCode::InstallNotFound => {
                "Installation data not found, please consult debug log and/or documentation for more details."
            }
            ErrorCode::ReadOnly => "Entry is read only.",
            ErrorCode::NetworkError => "Network error.",
            ErrorCode::InvalidOperation => "Invalid operation.",
            ErrorCode::Other(_) => "Unknown error description.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.as_raw())
    }
}

// ABOUTME: libGammu engine: configuration, state machine, SMS submission and multi-part encoding over FFI
// ABOUTME: Converts between the crate's message types and the fixed-size native structs

//! libGammu engine
//!
//! Requires libGammu development files at build time; bindings are generated
//! by bindgen and the library is located with pkg-config.
//!
//! Native structs such as `GSM_MultiSMSMessage` are several hundred
//! kilobytes, so they are always allocated zeroed on the heap. Text is copied
//! into the fixed arrays with a capacity check: a value that does not fit
//! fails with `ErrorCode::MoreMemory` instead of being truncated.

mod ffi;

use crate::datatypes::{
    ErrorCode, MessageClass, MultiPartEntryKind, MultiPartSmsInfo, MultiSmsMessage, PduType,
    SmsCoding, SmsMessage, Smsc, UdhType, UnicodeString, UserDataHeader,
};
use crate::engine::{Context, Driver, StatusSlot};
use bytes::Bytes;
use std::alloc::{Layout, alloc_zeroed, handle_alloc_error};
use std::ffi::{CStr, CString, c_int, c_void};
use std::path::Path;
use std::ptr::{self, NonNull};
use tracing::{debug, trace};

/// Engine backed by the system libGammu
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDriver;

/// Parsed gammurc (`INI_Section` list)
#[derive(Debug)]
pub struct NativeConfig {
    section: NonNull<ffi::INI_Section>,
}

impl Drop for NativeConfig {
    fn drop(&mut self) {
        // SAFETY: the section came from GSM_FindGammuRC and is freed only here
        unsafe { ffi::INI_Free(self.section.as_ptr()) };
    }
}

/// Allocated `GSM_StateMachine`
#[derive(Debug)]
pub struct NativeContext {
    sm: NonNull<ffi::GSM_StateMachine>,
    /// Keeps the callback's user data alive while the callback is registered
    slot: Option<StatusSlot>,
}

// SAFETY: a GSM_StateMachine has no thread affinity; the owning StateMachine
// serializes all access through `&mut self`.
unsafe impl Send for NativeContext {}

impl Drop for NativeContext {
    fn drop(&mut self) {
        // SAFETY: the pointer came from GSM_AllocStateMachine and is freed only here
        unsafe { ffi::GSM_FreeStateMachine(self.sm.as_ptr()) };
        debug!("Native state machine released");
    }
}

impl Driver for NativeDriver {
    type Config = NativeConfig;
    type Context = NativeContext;

    fn find_config(&self, path: Option<&Path>) -> Result<NativeConfig, ErrorCode> {
        let force = path.map(path_to_cstring).transpose()?;
        let force_ptr = force.as_ref().map_or(ptr::null(), |p| p.as_ptr());

        let mut section: *mut ffi::INI_Section = ptr::null_mut();
        // SAFETY: both pointers are valid for the duration of the call
        check(unsafe { ffi::GSM_FindGammuRC(&mut section, force_ptr) })?;

        NonNull::new(section)
            .map(|section| NativeConfig { section })
            .ok_or(ErrorCode::CantOpenFile)
    }

    fn alloc_context(&self) -> Option<NativeContext> {
        // SAFETY: plain allocation, ownership moves into NativeContext
        let sm = unsafe { ffi::GSM_AllocStateMachine() };
        NonNull::new(sm).map(|sm| NativeContext { sm, slot: None })
    }

    fn encode_multipart(&self, info: &MultiPartSmsInfo) -> Result<MultiSmsMessage, ErrorCode> {
        if info.entries.is_empty() {
            return Err(ErrorCode::Empty);
        }

        // SAFETY: GSM_MultiPartSMSInfo is plain data; all-zero is a valid value
        let mut native = unsafe { zeroed_box::<ffi::GSM_MultiPartSMSInfo>() };
        // SAFETY: native points at a live, writable struct
        unsafe { ffi::GSM_ClearMultiPartSMSInfo(&mut *native) };

        if info.entries.len() > native.Entries.len() {
            return Err(ErrorCode::MoreMemory);
        }

        native.Class = MessageClass::raw_or_unset(info.class);
        native.UnicodeCoding = info.unicode_coding.into();
        native.EntriesNum = info.entries.len() as c_int;

        // The encoder reads through raw pointers into these buffers
        let mut buffers: Vec<Vec<u8>> = info
            .entries
            .iter()
            .map(|entry| entry.buffer.to_nul_terminated())
            .collect();
        for ((slot, entry), buffer) in native
            .Entries
            .iter_mut()
            .zip(&info.entries)
            .zip(buffers.iter_mut())
        {
            slot.ID = entry_kind_to_native(entry.kind);
            slot.Buffer = buffer.as_mut_ptr();
        }

        // SAFETY: see above
        let mut multi = unsafe { zeroed_box::<ffi::GSM_MultiSMSMessage>() };
        // SAFETY: info and multi are live; the entry buffers outlive the call
        let err =
            unsafe { ffi::GSM_EncodeMultiPartSMS(ptr::null_mut(), &mut *native, &mut *multi) };
        drop(buffers);
        check(err)?;

        let count = usize::try_from(multi.Number)
            .unwrap_or(0)
            .min(multi.SMS.len());
        trace!("Encoder produced {} segments", count);
        Ok(multi.SMS[..count].iter().map(sms_from_native).collect::<Vec<_>>().into())
    }

    fn error_string(&self, code: ErrorCode) -> String {
        // SAFETY: GSM_ErrorString returns a static string or NULL
        let text = unsafe { ffi::GSM_ErrorString(code.as_raw() as ffi::GSM_Error) };
        if text.is_null() {
            return code.description().to_string();
        }
        // SAFETY: non-null results are NUL-terminated static strings
        unsafe { CStr::from_ptr(text) }
            .to_string_lossy()
            .into_owned()
    }

    fn set_debug(&self, level: &str, file: &Path) -> Result<(), ErrorCode> {
        let level = CString::new(level).map_err(|_| ErrorCode::InvalidData)?;
        let file = path_to_cstring(file)?;

        // SAFETY: the global debug info lives for the whole process; the
        // strings outlive both calls
        unsafe {
            let di = ffi::GSM_GetGlobalDebug();
            check(ffi::GSM_SetDebugFile(file.as_ptr(), di))?;
            if ffi::GSM_SetDebugLevel(level.as_ptr(), di) == 0 {
                return Err(ErrorCode::InvalidData);
            }
        }
        debug!("Native debug log enabled at {:?}", level);
        Ok(())
    }
}

impl Context for NativeContext {
    type Config = NativeConfig;

    fn read_config(&mut self, config: &NativeConfig, slot: usize) -> Result<(), ErrorCode> {
        let num = c_int::try_from(slot).map_err(|_| ErrorCode::InvalidLocation)?;
        // SAFETY: sm is live; GSM_GetConfig returns NULL for slots out of range
        let cfg = unsafe { ffi::GSM_GetConfig(self.sm.as_ptr(), num) };
        if cfg.is_null() {
            return Err(ErrorCode::InvalidLocation);
        }
        // SAFETY: section and cfg are both live
        check(unsafe { ffi::GSM_ReadConfig(config.section.as_ptr(), cfg, num) })
    }

    fn set_config_num(&mut self, count: usize) {
        let count = c_int::try_from(count).unwrap_or(c_int::MAX);
        // SAFETY: sm is live
        unsafe { ffi::GSM_SetConfigNum(self.sm.as_ptr(), count) };
    }

    fn init_connection(&mut self, reply_num: i32) -> Result<(), ErrorCode> {
        // SAFETY: sm is live
        check(unsafe { ffi::GSM_InitConnection(self.sm.as_ptr(), reply_num) })
    }

    fn terminate_connection(&mut self) -> Result<(), ErrorCode> {
        // SAFETY: sm is live
        check(unsafe { ffi::GSM_TerminateConnection(self.sm.as_ptr()) })
    }

    fn set_send_status_callback(&mut self, slot: StatusSlot) {
        let user_data = slot.as_ptr();
        self.slot = Some(slot);
        // SAFETY: user_data stays valid while self.slot holds the clone, which
        // is at least as long as the state machine the callback belongs to
        unsafe {
            ffi::GSM_SetSendSMSStatusCallback(
                self.sm.as_ptr(),
                Some(send_status_callback),
                user_data,
            )
        };
    }

    fn get_smsc(&mut self, smsc: &mut Smsc) -> Result<(), ErrorCode> {
        // SAFETY: GSM_SMSC is plain data
        let mut native: ffi::GSM_SMSC = unsafe { std::mem::zeroed() };
        native.Location = smsc.location;
        // SAFETY: sm and native are live
        check(unsafe { ffi::GSM_GetSMSC(self.sm.as_ptr(), &mut native) })?;
        *smsc = smsc_from_native(&native);
        Ok(())
    }

    fn send_sms(&mut self, sms: &SmsMessage) -> Result<(), ErrorCode> {
        // SAFETY: GSM_SMSMessage is plain data
        let mut native = unsafe { zeroed_box::<ffi::GSM_SMSMessage>() };
        sms_to_native(sms, &mut native)?;
        // SAFETY: sm and native are live
        check(unsafe { ffi::GSM_SendSMS(self.sm.as_ptr(), &mut *native) })
    }

    fn read_device(&mut self, wait_for_reply: bool) -> usize {
        // SAFETY: sm is live; callbacks fired from here only touch the status slot
        let read = unsafe { ffi::GSM_ReadDevice(self.sm.as_ptr(), wait_for_reply.into()) };
        usize::try_from(read).unwrap_or(0)
    }
}

/// Send-status callback registered with libGammu
unsafe extern "C" fn send_status_callback(
    _sm: *mut ffi::GSM_StateMachine,
    status: c_int,
    reference: c_int,
    user_data: *mut c_void,
) {
    if user_data.is_null() {
        return;
    }
    trace!("Send status {} for reference {}", status, reference);
    // SAFETY: user_data was registered from a StatusSlot kept alive by NativeContext
    unsafe { StatusSlot::complete_raw(user_data, status, reference) };
}

fn check(err: ffi::GSM_Error) -> Result<(), ErrorCode> {
    ErrorCode::from(err as i32).into_result()
}

fn path_to_cstring(path: &Path) -> Result<CString, ErrorCode> {
    CString::new(path.as_os_str().as_encoded_bytes()).map_err(|_| ErrorCode::CantOpenFile)
}

/// Heap allocates a zero-filled `T`
///
/// # Safety
///
/// All-zero bytes must be a valid `T`.
unsafe fn zeroed_box<T>() -> Box<T> {
    let layout = Layout::new::<T>();
    // SAFETY: native structs have a non-zero size
    let raw = unsafe { alloc_zeroed(layout) }.cast::<T>();
    if raw.is_null() {
        handle_alloc_error(layout);
    }
    // SAFETY: allocated with the global allocator and T's layout, zeroed per caller contract
    unsafe { Box::from_raw(raw) }
}

/// Copies `src` into a fixed native array and NUL-terminates it
fn copy_terminated(dst: &mut [u8], src: &[u8]) -> Result<(), ErrorCode> {
    if src.len() + 2 > dst.len() {
        return Err(ErrorCode::MoreMemory);
    }
    dst[..src.len()].copy_from_slice(src);
    dst[src.len()..src.len() + 2].fill(0);
    Ok(())
}

fn sms_to_native(sms: &SmsMessage, out: &mut ffi::GSM_SMSMessage) -> Result<(), ErrorCode> {
    if let Some(image) = &sms.native_image {
        load_image(image, out)?;
        copy_terminated(&mut out.Number, sms.number.as_bytes())?;
        copy_terminated(&mut out.SMSC.Number, sms.smsc.number.as_bytes())?;
        out.PDU = pdu_to_native(sms.pdu);
        return Ok(());
    }

    copy_terminated(&mut out.Number, sms.number.as_bytes())?;
    copy_terminated(&mut out.Text, sms.text.as_bytes())?;
    copy_terminated(&mut out.SMSC.Number, sms.smsc.number.as_bytes())?;
    copy_terminated(&mut out.SMSC.Name, sms.smsc.name.as_bytes())?;
    out.SMSC.Location = sms.smsc.location;

    out.Length = c_int::try_from(sms.length).map_err(|_| ErrorCode::MoreMemory)?;
    out.PDU = pdu_to_native(sms.pdu);
    out.Coding = coding_to_native(sms.coding);
    out.Class = MessageClass::raw_or_unset(sms.class) as _;

    let udh = &sms.udh;
    if udh.data.len() > out.UDH.Text.len() {
        return Err(ErrorCode::MoreMemory);
    }
    out.UDH.Type = udh_to_native(udh.kind);
    out.UDH.Length = udh.data.len() as _;
    out.UDH.Text[..udh.data.len()].copy_from_slice(&udh.data);
    out.UDH.ID8bit = udh.id8bit;
    out.UDH.ID16bit = udh.id16bit;
    out.UDH.PartNumber = udh.part_number;
    out.UDH.AllParts = udh.all_parts;
    Ok(())
}

fn sms_from_native(raw: &ffi::GSM_SMSMessage) -> SmsMessage {
    let coding = coding_from_native(raw.Coding);
    let length = usize::try_from(raw.Length).unwrap_or(0);
    let text = if coding == SmsCoding::EightBit {
        UnicodeString::from_raw(&raw.Text[..length.min(raw.Text.len())])
    } else {
        UnicodeString::from_be_bytes(&raw.Text)
    };
    let udh_len = usize::try_from(raw.UDH.Length)
        .unwrap_or(0)
        .min(raw.UDH.Text.len());

    SmsMessage {
        smsc: smsc_from_native(&raw.SMSC),
        number: UnicodeString::from_be_bytes(&raw.Number),
        text,
        length,
        pdu: pdu_from_native(raw.PDU),
        udh: UserDataHeader {
            kind: udh_from_native(raw.UDH.Type),
            data: Bytes::copy_from_slice(&raw.UDH.Text[..udh_len]),
            id8bit: raw.UDH.ID8bit,
            id16bit: raw.UDH.ID16bit,
            part_number: raw.UDH.PartNumber,
            all_parts: raw.UDH.AllParts,
        },
        coding,
        class: MessageClass::from_raw(i32::from(raw.Class)),
        native_image: Some(store_image(raw)),
    }
}

/// Byte copy of a native message
fn store_image(raw: &ffi::GSM_SMSMessage) -> Bytes {
    // SAFETY: GSM_SMSMessage is plain data living in zero-initialized memory,
    // so every byte including padding is initialized
    let bytes = unsafe {
        std::slice::from_raw_parts(
            ptr::from_ref(raw).cast::<u8>(),
            size_of::<ffi::GSM_SMSMessage>(),
        )
    };
    Bytes::copy_from_slice(bytes)
}

/// Overwrites `out` with an image taken by [`store_image`]
fn load_image(image: &[u8], out: &mut ffi::GSM_SMSMessage) -> Result<(), ErrorCode> {
    if image.len() != size_of::<ffi::GSM_SMSMessage>() {
        return Err(ErrorCode::InvalidData);
    }
    // SAFETY: lengths match and any byte pattern stored from a GSM_SMSMessage
    // is a valid GSM_SMSMessage
    unsafe {
        ptr::copy_nonoverlapping(
            image.as_ptr(),
            ptr::from_mut(out).cast::<u8>(),
            image.len(),
        )
    };
    Ok(())
}

fn smsc_from_native(raw: &ffi::GSM_SMSC) -> Smsc {
    Smsc {
        location: raw.Location,
        number: UnicodeString::from_be_bytes(&raw.Number),
        name: UnicodeString::from_be_bytes(&raw.Name),
    }
}

fn pdu_to_native(pdu: PduType) -> ffi::GSM_SMSMessageType {
    match pdu {
        PduType::Submit => ffi::SMS_Submit,
        PduType::Deliver => ffi::SMS_Deliver,
        PduType::StatusReport => ffi::SMS_Status_Report,
    }
}

fn pdu_from_native(raw: ffi::GSM_SMSMessageType) -> PduType {
    match raw {
        ffi::SMS_Deliver => PduType::Deliver,
        ffi::SMS_Status_Report => PduType::StatusReport,
        _ => PduType::Submit,
    }
}

fn coding_to_native(coding: SmsCoding) -> ffi::GSM_Coding_Type {
    match coding {
        SmsCoding::DefaultNoCompression => ffi::SMS_Coding_Default_No_Compression,
        SmsCoding::DefaultCompression => ffi::SMS_Coding_Default_Compression,
        SmsCoding::UnicodeNoCompression => ffi::SMS_Coding_Unicode_No_Compression,
        SmsCoding::UnicodeCompression => ffi::SMS_Coding_Unicode_Compression,
        SmsCoding::EightBit => ffi::SMS_Coding_8bit,
    }
}

fn coding_from_native(raw: ffi::GSM_Coding_Type) -> SmsCoding {
    match raw {
        ffi::SMS_Coding_Default_Compression => SmsCoding::DefaultCompression,
        ffi::SMS_Coding_Unicode_No_Compression => SmsCoding::UnicodeNoCompression,
        ffi::SMS_Coding_Unicode_Compression => SmsCoding::UnicodeCompression,
        ffi::SMS_Coding_8bit => SmsCoding::EightBit,
        _ => SmsCoding::DefaultNoCompression,
    }
}

fn udh_to_native(kind: UdhType) -> ffi::GSM_UDH {
    match kind {
        UdhType::NoUdh => ffi::UDH_NoUDH,
        UdhType::ConcatenatedMessages => ffi::UDH_ConcatenatedMessages,
        UdhType::ConcatenatedMessages16bit => ffi::UDH_ConcatenatedMessages16bit,
        UdhType::UserUdh => ffi::UDH_UserUDH,
        UdhType::Raw(raw) => raw as ffi::GSM_UDH,
    }
}

fn udh_from_native(raw: ffi::GSM_UDH) -> UdhType {
    match raw {
        ffi::UDH_NoUDH => UdhType::NoUdh,
        ffi::UDH_ConcatenatedMessages => UdhType::ConcatenatedMessages,
        ffi::UDH_ConcatenatedMessages16bit => UdhType::ConcatenatedMessages16bit,
        ffi::UDH_UserUDH => UdhType::UserUdh,
        other => UdhType::Raw(other as u32),
    }
}

fn entry_kind_to_native(kind: MultiPartEntryKind) -> ffi::EncodeMultiPartSMSID {
    match kind {
        MultiPartEntryKind::Text => ffi::SMS_Text,
        MultiPartEntryKind::ConcatenatedTextLong => ffi::SMS_ConcatenatedTextLong,
        MultiPartEntryKind::ConcatenatedTextLong16bit => ffi::SMS_ConcatenatedTextLong16bit,
        MultiPartEntryKind::ConcatenatedAutoTextLong => ffi::SMS_ConcatenatedAutoTextLong,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_terminated_rejects_overflow() {
        let mut dst = [0xFFu8; 6];
        assert_eq!(copy_terminated(&mut dst, &[0, b'a', 0, b'b']), Ok(()));
        assert_eq!(dst, [0, b'a', 0, b'b', 0, 0]);
        assert_eq!(
            copy_terminated(&mut dst, &[0, b'a', 0, b'b', 0, b'c']),
            Err(ErrorCode::MoreMemory)
        );
    }

    #[test]
    fn test_submit_survives_native_conversion() {
        let mut sms = SmsMessage::submit("+15550123", "hello");
        sms.smsc.number = UnicodeString::encode("+15550100");

        let mut native = unsafe { zeroed_box::<ffi::GSM_SMSMessage>() };
        sms_to_native(&sms, &mut native).unwrap();
        let back = sms_from_native(&native);

        assert_eq!(back.number, sms.number);
        assert_eq!(back.text, sms.text);
        assert_eq!(back.smsc.number, sms.smsc.number);
        assert_eq!(back.pdu, PduType::Submit);
        assert_eq!(back.coding, SmsCoding::DefaultNoCompression);
        assert_eq!(back.class, Some(MessageClass::MobileEquipment));
        assert_eq!(back.udh.kind, UdhType::NoUdh);
    }

    #[test]
    fn test_encoder_segment_keeps_unmodelled_fields() {
        let mut raw = unsafe { zeroed_box::<ffi::GSM_SMSMessage>() };
        raw.SMSC.Validity.Format = 2 as _;
        raw.SMSC.Validity.Relative = 167 as _;
        raw.ReplyViaSameSMSC = 1;
        raw.MessageReference = 42;
        raw.PDU = ffi::SMS_Deliver;
        copy_terminated(&mut raw.Text, UnicodeString::encode("part").as_bytes()).unwrap();

        let mut segment = sms_from_native(&raw);
        segment.number = UnicodeString::encode("+15550123");
        segment.smsc.number = UnicodeString::encode("+15550100");
        segment.pdu = PduType::Submit;

        let mut out = unsafe { zeroed_box::<ffi::GSM_SMSMessage>() };
        sms_to_native(&segment, &mut out).unwrap();

        assert_eq!(out.SMSC.Validity.Format, raw.SMSC.Validity.Format);
        assert_eq!(out.SMSC.Validity.Relative, raw.SMSC.Validity.Relative);
        assert_eq!(out.ReplyViaSameSMSC, 1);
        assert_eq!(out.MessageReference, 42);
        assert_eq!(out.PDU, ffi::SMS_Submit);
        assert_eq!(UnicodeString::from_be_bytes(&out.Number).to_string(), "+15550123");
        assert_eq!(UnicodeString::from_be_bytes(&out.SMSC.Number).to_string(), "+15550100");
        assert_eq!(UnicodeString::from_be_bytes(&out.Text).to_string(), "part");
    }

    #[test]
    fn test_truncated_image_is_rejected() {
        let mut sms = SmsMessage::submit("1", "x");
        sms.native_image = Some(Bytes::from_static(&[0; 4]));
        let mut out = unsafe { zeroed_box::<ffi::GSM_SMSMessage>() };
        assert_eq!(sms_to_native(&sms, &mut out), Err(ErrorCode::InvalidData));
    }

    #[test]
    fn test_oversized_number_is_rejected() {
        let sms = SmsMessage::submit(&"9".repeat(1000), "x");
        let mut native = unsafe { zeroed_box::<ffi::GSM_SMSMessage>() };
        assert_eq!(sms_to_native(&sms, &mut native), Err(ErrorCode::MoreMemory));
    }

    #[test]
    fn test_encode_multipart_splits_long_text() {
        let info = MultiPartSmsInfo::long_text(&"a".repeat(300));
        let segments = NativeDriver.encode_multipart(&info).unwrap();
        assert!(segments.len() > 1);
        for sms in segments.iter() {
            assert_eq!(sms.udh.kind, UdhType::ConcatenatedMessages);
        }
    }

    #[test]
    fn test_error_string_from_library() {
        assert!(!NativeDriver.error_string(ErrorCode::Timeout).is_empty());
    }
}

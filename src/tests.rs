//! Integration tests for the state machine running on the dummy phone

use crate::client::{GammuError, StateMachine, StateMachineBuilder};
use crate::datatypes::*;
use crate::engine::dummy::{DEFAULT_SMSC, DummyDriver, SendOutcome};
use std::path::Path;
use std::time::{Duration, Instant};

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn connected(driver: &DummyDriver) -> StateMachine<DummyDriver> {
        let mut sm = StateMachine::with_driver(driver.clone(), None).unwrap();
        sm.connect().unwrap();
        sm
    }

    #[test]
    fn test_single_sms_uses_connection_smsc() {
        let driver = DummyDriver::new();
        let mut sm = connected(&driver);

        sm.send_sms("123456", "hi").unwrap();

        let sent = driver.submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].smsc.number, sm.smsc().unwrap().number);
        assert_eq!(sent[0].smsc.number.to_string(), DEFAULT_SMSC);
        assert_eq!(sent[0].number.to_string(), "123456");
        assert_eq!(sent[0].text.to_string(), "hi");
        assert_eq!(sm.last_status().code, ErrorCode::Ok);
    }

    #[test]
    fn test_single_sms_fixed_defaults() {
        let driver = DummyDriver::new();
        let mut sm = connected(&driver);

        sm.send_sms("123456", "Gr\u{fc}\u{df}e").unwrap();

        let sms = &driver.submitted()[0];
        assert_eq!(sms.pdu, PduType::Submit);
        assert_eq!(sms.udh.kind, UdhType::NoUdh);
        assert_eq!(sms.coding, SmsCoding::DefaultNoCompression);
        assert_eq!(sms.class, Some(MessageClass::MobileEquipment));
        assert_eq!(sms.text.to_string(), "Gr\u{fc}\u{df}e");
    }

    #[test]
    fn test_long_message_uses_connection_smsc() {
        let driver = DummyDriver::new().with_smsc("+4917000000");
        let mut sm = connected(&driver);
        sm.send_long_sms("5551234", &"y".repeat(200)).unwrap();

        for sms in driver.submitted() {
            assert_eq!(sms.smsc.number.to_string(), "+4917000000");
        }
    }

    #[test]
    fn test_encoder_image_reaches_engine_unchanged() {
        let driver = DummyDriver::new();
        let mut sm = connected(&driver);
        let image = bytes::Bytes::from_static(&[7, 0, 42, 1, 0, 167]);
        let mut sms = SmsMessage::submit("123456", "part");
        sms.native_image = Some(image.clone());

        sm.send_message(sms).unwrap();

        let sent = &driver.submitted()[0];
        assert_eq!(sent.native_image, Some(image));
        assert_eq!(sent.smsc.number.to_string(), DEFAULT_SMSC);
    }

    #[test]
    fn test_long_ascii_message_is_split_in_order() {
        let driver = DummyDriver::new();
        let mut sm = connected(&driver);
        let text = "a".repeat(300);

        let references = sm.send_long_sms("123456", &text).unwrap();

        let sent = driver.submitted();
        assert!(sent.len() > 1);
        assert_eq!(references.len(), sent.len());
        for (index, sms) in sent.iter().enumerate() {
            assert_eq!(sms.udh.kind, UdhType::ConcatenatedMessages);
            assert_eq!(sms.udh.part_number, index as i32 + 1);
            assert_eq!(sms.udh.all_parts, sent.len() as i32);
            assert_eq!(sms.coding, SmsCoding::DefaultNoCompression);
            assert_eq!(sms.class, Some(MessageClass::MobileEquipment));
            assert_eq!(sms.number.to_string(), "123456");
            assert_eq!(sms.pdu, PduType::Submit);
        }

        let rebuilt: String = sent.iter().map(|sms| sms.text.to_string()).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_long_message_selects_unicode_for_non_ascii() {
        let driver = DummyDriver::new();
        let mut sm = connected(&driver);

        sm.send_long_sms("123456", &"\u{17c}".repeat(100)).unwrap();

        let sent = driver.submitted();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|sms| sms.coding == SmsCoding::UnicodeNoCompression));
        assert_eq!(sent[0].text.len(), 67);
    }

    #[test]
    fn test_short_long_message_goes_out_whole() {
        let driver = DummyDriver::new();
        let mut sm = connected(&driver);

        let references = sm.send_long_sms("123456", "short").unwrap();

        assert_eq!(references, vec![1]);
        assert_eq!(driver.submitted()[0].udh.kind, UdhType::NoUdh);
    }

    #[test]
    fn test_long_message_stops_at_failed_segment() {
        let driver =
            DummyDriver::new().with_outcomes([SendOutcome::Confirm, SendOutcome::Fail(69)]);
        let mut sm = connected(&driver);

        let err = sm.send_long_sms("123456", &"b".repeat(400)).unwrap_err();

        assert!(matches!(err, GammuError::DeliveryFailed(_)));
        assert_eq!(err.code(), Some(ErrorCode::Unknown));
        let sent = driver.submitted();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].udh.part_number, 2);
        assert_eq!(sent[1].udh.all_parts, 3);
    }

    #[test]
    fn test_long_message_stops_at_rejected_segment() {
        let driver = DummyDriver::new()
            .with_outcomes([SendOutcome::Confirm, SendOutcome::Reject(ErrorCode::Full)]);
        let mut sm = connected(&driver);

        let err = sm.send_long_sms("123456", &"c".repeat(400)).unwrap_err();

        assert!(matches!(err, GammuError::SubmissionRejected(_)));
        assert_eq!(err.code(), Some(ErrorCode::Full));
        assert_eq!(driver.submitted().len(), 1);
    }

    #[test]
    fn test_long_message_too_long_to_encode() {
        let driver = DummyDriver::new();
        let mut sm = connected(&driver);

        let err = sm.send_long_sms("123456", &"d".repeat(153 * 51)).unwrap_err();

        assert!(matches!(err, GammuError::Encoding(_)));
        assert!(driver.submitted().is_empty());
    }

    #[test]
    fn test_send_before_connect_submits_nothing() {
        let driver = DummyDriver::new();
        let mut sm = StateMachine::with_driver(driver.clone(), None).unwrap();

        let err = sm.send_sms("123456", "hi").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotConnected));
        let err = sm.send_long_sms("123456", &"e".repeat(300)).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotConnected));

        assert!(driver.submitted().is_empty());
        assert_eq!(driver.pump_count(), 0);
    }

    #[test]
    fn test_missing_config_allocates_nothing() {
        let driver = DummyDriver::new();

        let err =
            StateMachine::with_driver(driver.clone(), Some(Path::new("/nonexistent/path.ini")))
                .unwrap_err();

        assert!(matches!(err, GammuError::Configuration(_)));
        assert_eq!(err.code(), Some(ErrorCode::CantOpenFile));
        assert_eq!(driver.allocations(), 0);
        assert_eq!(driver.frees(), 0);
    }

    #[test]
    fn test_failed_create_frees_exactly_once() {
        let driver = DummyDriver::new().with_invalid_config_file("/etc/broken.ini");

        let err = StateMachine::with_driver(driver.clone(), Some(Path::new("/etc/broken.ini")))
            .unwrap_err();

        assert!(matches!(err, GammuError::Configuration(_)));
        assert_eq!(driver.allocations(), 1);
        assert_eq!(driver.frees(), 1);
    }

    #[test]
    fn test_silent_phone_times_out_within_bound() {
        let driver = DummyDriver::new()
            .with_outcomes([SendOutcome::Silent])
            .with_pump_delay(Duration::from_millis(5));
        let mut sm = connected(&driver);
        sm.set_timeout(Duration::from_millis(60));

        let started = Instant::now();
        let err = sm.send_sms("123456", "into the void").unwrap_err();
        let elapsed = started.elapsed();

        assert!(err.is_timeout());
        assert_eq!(err.code(), Some(ErrorCode::Timeout));
        assert_eq!(sm.last_status().code, ErrorCode::Timeout);
        assert!(elapsed >= Duration::from_millis(60));
        assert!(elapsed < Duration::from_secs(2));
        assert!(driver.pump_count() > 1);
    }

    #[test]
    fn test_next_send_after_timeout_starts_fresh() {
        let driver = DummyDriver::new()
            .with_outcomes([SendOutcome::Silent, SendOutcome::Confirm]);
        let mut sm = connected(&driver);
        sm.set_timeout(Duration::from_millis(20));

        assert!(sm.send_sms("1", "lost").unwrap_err().is_timeout());
        sm.set_timeout(Duration::from_secs(1));
        assert_eq!(sm.send_sms("1", "found"), Ok(2));
    }

    #[test]
    fn test_poll_interval_paces_pumps() {
        let driver = DummyDriver::new().with_outcomes([SendOutcome::Silent]);
        let mut sm = StateMachineBuilder::new()
            .timeout(Duration::from_millis(50))
            .poll_interval(Duration::from_millis(20))
            .build_with(driver.clone())
            .unwrap();
        sm.connect().unwrap();

        assert!(sm.send_sms("1", "slow").unwrap_err().is_timeout());
        assert!(driver.pump_count() <= 4);
    }

    #[test]
    fn test_poll_interval_never_outlasts_timeout() {
        let driver = DummyDriver::new().with_outcomes([SendOutcome::Silent]);
        let mut sm = StateMachineBuilder::new()
            .timeout(Duration::from_millis(10))
            .poll_interval(Duration::from_millis(800))
            .build_with(driver.clone())
            .unwrap();
        sm.connect().unwrap();

        let started = Instant::now();
        let err = sm.send_sms("1", "slow").unwrap_err();
        let elapsed = started.elapsed();

        assert!(err.is_timeout());
        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_millis(200));
        assert_eq!(driver.pump_count(), 1);
    }

    #[test]
    fn test_drop_disconnects_and_frees() {
        let driver = DummyDriver::new();
        {
            let _sm = connected(&driver);
            assert!(driver.is_connected());
        }
        assert!(!driver.is_connected());
        assert_eq!(driver.allocations(), 1);
        assert_eq!(driver.frees(), 1);
    }

    #[test]
    fn test_error_carries_engine_description() {
        let driver = DummyDriver::new().with_connect_error(ErrorCode::DeviceNotExist);
        let mut sm = StateMachine::with_driver(driver, None).unwrap();

        let err = sm.connect().unwrap_err();

        assert_eq!(
            err.native().unwrap().description(),
            ErrorCode::DeviceNotExist.description()
        );
        assert!(err.to_string().starts_with("Connection error: "));
    }
}

use device_instance::DeviceError;

const ALL: [DeviceError; 11] = [
    DeviceError::Success,
    DeviceError::NotInitialized,
    DeviceError::Timeout,
    DeviceError::MutexError,
    DeviceError::CommunicationError,
    DeviceError::InvalidParameter,
    DeviceError::DataNotReady,
    DeviceError::MemoryError,
    DeviceError::DeviceBusy,
    DeviceError::NotSupported,
    DeviceError::UnknownError,
];

#[test]
fn string_mapping_is_total() {
    for err in ALL {
        assert!(!err.as_str().is_empty());
        assert_ne!(err.as_str(), "Invalid error code");
    }
}

#[test]
fn known_strings() {
    assert_eq!(DeviceError::Success.as_str(), "Success");
    assert_eq!(DeviceError::NotInitialized.as_str(), "Not initialized");
    assert_eq!(DeviceError::MutexError.as_str(), "Mutex error");
    assert_eq!(DeviceError::DeviceBusy.as_str(), "Device busy");
    assert_eq!(DeviceError::UnknownError.as_str(), "Unknown error");
}

#[test]
fn describe_covers_valid_codes() {
    for err in ALL {
        let code = u8::from(err);
        assert_eq!(DeviceError::describe(code), err.as_str());
    }
}

#[test]
fn describe_renders_invalid_codes_distinctly() {
    assert_eq!(DeviceError::describe(11), "Invalid error code");
    assert_eq!(DeviceError::describe(200), "Invalid error code");
    assert_eq!(DeviceError::describe(u8::MAX), "Invalid error code");
}

#[test]
fn raw_code_round_trip() {
    assert_eq!(u8::from(DeviceError::Success), 0);
    assert!(matches!(DeviceError::try_from(2u8), Ok(DeviceError::Timeout)));
    assert!(DeviceError::try_from(11u8).is_err());
}

#[test]
fn display_matches_as_str() {
    assert_eq!(
        format!("{}", DeviceError::CommunicationError),
        "Communication error"
    );
}

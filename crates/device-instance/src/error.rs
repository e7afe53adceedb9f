use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Result type shared by all device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Unified error codes for all device operations.
///
/// The set is closed: drivers pick the kind that best describes a failure
/// and never invent new ones. `Success` is the unique non-error value; it
/// only appears in event notifications and raw-code rendering, never inside
/// the `Err` arm of a [`DeviceResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceError {
    /// Operation completed successfully.
    Success = 0,
    /// Device not initialized.
    NotInitialized,
    /// Wait on an event signal timed out.
    Timeout,
    /// Failed to acquire a mutex within its bounded timeout.
    MutexError,
    /// Communication with the device failed.
    CommunicationError,
    /// Invalid parameter provided.
    InvalidParameter,
    /// Data not yet available.
    DataNotReady,
    /// Out of storage capacity.
    MemoryError,
    /// Device is busy with another operation.
    DeviceBusy,
    /// Operation not supported by this device.
    NotSupported,
    /// Unspecified error.
    UnknownError,
}

impl DeviceError {
    /// Fixed descriptive string for this error kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            DeviceError::Success => "Success",
            DeviceError::NotInitialized => "Not initialized",
            DeviceError::Timeout => "Timeout",
            DeviceError::MutexError => "Mutex error",
            DeviceError::CommunicationError => "Communication error",
            DeviceError::InvalidParameter => "Invalid parameter",
            DeviceError::DataNotReady => "Data not ready",
            DeviceError::MemoryError => "Memory error",
            DeviceError::DeviceBusy => "Device busy",
            DeviceError::NotSupported => "Not supported",
            DeviceError::UnknownError => "Unknown error",
        }
    }

    /// Render a raw error code.
    ///
    /// Total over `u8`: codes outside the enum render as a distinct
    /// `"Invalid error code"` string instead of panicking.
    pub fn describe(code: u8) -> &'static str {
        match DeviceError::try_from(code) {
            Ok(err) => err.as_str(),
            Err(_) => "Invalid error code",
        }
    }
}

impl core::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

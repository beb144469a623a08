// SPDX-License-Identifier: Apache-2.0
//! Typed view of the native status codes.

use std::fmt;

use crate::ffi;

/// A device status as reported by `qrng_get_status` or a retrieval call.
///
/// Codes outside the documented table are kept verbatim in
/// [`DeviceStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Success,
    NoDeviceFound,
    NullPointer,
    OpeningDevice,
    IncompleteData,
    ReadingDevice,
    InternalMemory,
    InsufficientEntropy,
    MultipleOf8Required,
    NetTimeout,
    NetRetriesExceeded,
    InternalChannel,
    WrongDataFormat,
    Unknown(i32),
}

impl DeviceStatus {
    /// Every documented status, in header order.
    pub const DOCUMENTED: [DeviceStatus; 13] = [
        DeviceStatus::Success,
        DeviceStatus::NoDeviceFound,
        DeviceStatus::NullPointer,
        DeviceStatus::OpeningDevice,
        DeviceStatus::IncompleteData,
        DeviceStatus::ReadingDevice,
        DeviceStatus::InternalMemory,
        DeviceStatus::InsufficientEntropy,
        DeviceStatus::MultipleOf8Required,
        DeviceStatus::NetTimeout,
        DeviceStatus::NetRetriesExceeded,
        DeviceStatus::InternalChannel,
        DeviceStatus::WrongDataFormat,
    ];

    pub fn from_code(code: i32) -> Self {
        match code {
            ffi::QRNG_SUCCESS => DeviceStatus::Success,
            ffi::QRNG_NO_DEVICE_FOUND => DeviceStatus::NoDeviceFound,
            ffi::QRNG_ERROR_NULL_PTR => DeviceStatus::NullPointer,
            ffi::QRNG_ERROR_OPENING_DEVICE => DeviceStatus::OpeningDevice,
            ffi::QRNG_ERROR_INCOMPLETE_DATA => DeviceStatus::IncompleteData,
            ffi::QRNG_ERROR_READING_DEVICE => DeviceStatus::ReadingDevice,
            ffi::QRNG_ERROR_INTERNAL_MEMORY => DeviceStatus::InternalMemory,
            ffi::QRNG_ERROR_INSUFFICIENT_ENTHROPY => DeviceStatus::InsufficientEntropy,
            ffi::QRNG_ERROR_MULTIPLE_OF_8_REQUIRED => DeviceStatus::MultipleOf8Required,
            ffi::QRNG_ERROR_NET_TIMEOUT => DeviceStatus::NetTimeout,
            ffi::QRNG_ERROR_NET_RETRIES_EXCEEDED => DeviceStatus::NetRetriesExceeded,
            ffi::QRNG_ERROR_INTERNAL_CH_ERROR => DeviceStatus::InternalChannel,
            ffi::QRNG_ERROR_WRONG_DATA_FORMAT => DeviceStatus::WrongDataFormat,
            other => DeviceStatus::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            DeviceStatus::Success => ffi::QRNG_SUCCESS,
            DeviceStatus::NoDeviceFound => ffi::QRNG_NO_DEVICE_FOUND,
            DeviceStatus::NullPointer => ffi::QRNG_ERROR_NULL_PTR,
            DeviceStatus::OpeningDevice => ffi::QRNG_ERROR_OPENING_DEVICE,
            DeviceStatus::IncompleteData => ffi::QRNG_ERROR_INCOMPLETE_DATA,
            DeviceStatus::ReadingDevice => ffi::QRNG_ERROR_READING_DEVICE,
            DeviceStatus::InternalMemory => ffi::QRNG_ERROR_INTERNAL_MEMORY,
            DeviceStatus::InsufficientEntropy => ffi::QRNG_ERROR_INSUFFICIENT_ENTHROPY,
            DeviceStatus::MultipleOf8Required => ffi::QRNG_ERROR_MULTIPLE_OF_8_REQUIRED,
            DeviceStatus::NetTimeout => ffi::QRNG_ERROR_NET_TIMEOUT,
            DeviceStatus::NetRetriesExceeded => ffi::QRNG_ERROR_NET_RETRIES_EXCEEDED,
            DeviceStatus::InternalChannel => ffi::QRNG_ERROR_INTERNAL_CH_ERROR,
            DeviceStatus::WrongDataFormat => ffi::QRNG_ERROR_WRONG_DATA_FORMAT,
            DeviceStatus::Unknown(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        !ffi::is_error(self.code())
    }

    /// Symbolic name from `qrng_api.h`, if documented.
    pub fn symbol(self) -> Option<&'static str> {
        Some(match self {
            DeviceStatus::Success => "QRNG_SUCCESS",
            DeviceStatus::NoDeviceFound => "QRNG_NO_DEVICE_FOUND",
            DeviceStatus::NullPointer => "QRNG_ERROR_NULL_PTR",
            DeviceStatus::OpeningDevice => "QRNG_ERROR_OPENING_DEVICE",
            DeviceStatus::IncompleteData => "QRNG_ERROR_INCOMPLETE_DATA",
            DeviceStatus::ReadingDevice => "QRNG_ERROR_READING_DEVICE",
            DeviceStatus::InternalMemory => "QRNG_ERROR_INTERNAL_MEMORY",
            DeviceStatus::InsufficientEntropy => "QRNG_ERROR_INSUFFICIENT_ENTHROPY",
            DeviceStatus::MultipleOf8Required => "QRNG_ERROR_MULTIPLE_OF_8_REQUIRED",
            DeviceStatus::NetTimeout => "QRNG_ERROR_NET_TIMEOUT",
            DeviceStatus::NetRetriesExceeded => "QRNG_ERROR_NET_RETRIES_EXCEEDED",
            DeviceStatus::InternalChannel => "QRNG_ERROR_INTERNAL_CH_ERROR",
            DeviceStatus::WrongDataFormat => "QRNG_ERROR_WRONG_DATA_FORMAT",
            DeviceStatus::Unknown(_) => return None,
        })
    }

    pub fn message(self) -> &'static str {
        ffi::status_message(self.code())
    }
}

impl From<i32> for DeviceStatus {
    fn from(code: i32) -> Self {
        DeviceStatus::from_code(code)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_codes_round_trip() {
        for status in DeviceStatus::DOCUMENTED {
            assert_eq!(DeviceStatus::from_code(status.code()), status);
            assert!(status.symbol().is_some());
        }
    }

    #[test]
    fn test_unknown_code_preserved() {
        let status = DeviceStatus::from_code(-3);
        assert_eq!(status, DeviceStatus::Unknown(-3));
        assert_eq!(status.code(), -3);
        assert!(!status.is_ok());
        assert_eq!(status.symbol(), None);
        assert_eq!(status.message(), "QRNG is already initialized");
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceStatus::Success.to_string(), "no error (0)");
        assert!(DeviceStatus::Success.is_ok());
        assert_eq!(
            DeviceStatus::NoDeviceFound.to_string(),
            "no device found (driver missing or hardware disconnected) (-1)"
        );
    }
}

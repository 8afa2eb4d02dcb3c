//! Collaborator status codes.
//!
//! Leaf drivers report failure as a signed integer status (errno style,
//! negative for the well-known conditions below). The core never interprets
//! the value beyond "zero or not": it logs it, blinks, and hands it back to
//! the entry point unchanged.

/// A non-success status returned by a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverError {
    code: i32,
}

impl DriverError {
    /// Generic I/O failure (`-EIO`).
    pub const IO: Self = Self::new(-5);
    /// Device or resource busy (`-EBUSY`).
    pub const BUSY: Self = Self::new(-16);
    /// No such device (`-ENODEV`).
    pub const NO_DEVICE: Self = Self::new(-19);
    /// Invalid argument (`-EINVAL`).
    pub const INVALID: Self = Self::new(-22);
    /// Timed out waiting for the peer (`-ETIMEDOUT`).
    pub const TIMED_OUT: Self = Self::new(-116);

    /// Wrap a raw status code.
    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    /// The raw status code as reported by the collaborator.
    pub const fn code(self) -> i32 {
        self.code
    }

    /// Convert a C-style status (`0` = success) into a `Result`.
    pub const fn check(code: i32) -> Result<(), Self> {
        if code == 0 {
            Ok(())
        } else {
            Err(Self::new(code))
        }
    }
}

impl From<DriverError> for i32 {
    fn from(err: DriverError) -> Self {
        err.code
    }
}

impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::IO => write!(f, "I/O error (err {})", self.code),
            Self::BUSY => write!(f, "device busy (err {})", self.code),
            Self::NO_DEVICE => write!(f, "no such device (err {})", self.code),
            Self::INVALID => write!(f, "invalid argument (err {})", self.code),
            Self::TIMED_OUT => write!(f, "timed out (err {})", self.code),
            _ => write!(f, "err {}", self.code),
        }
    }
}

//! Errors emitted by the USB MIDI driver.
//! Every error belongs to one of four kinds. State and size errors are
//! detected before anything is submitted to the host service, transfer
//! errors come from the host service and interruptions come from a detach
//! or stop that tore down a blocked transfer.



use core::fmt;

use super::host::HostError;



/// A set of possible errors in the driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum Error {
    /// The driver is not started.
    NotStarted,

    /// The driver is already started.
    AlreadyStarted,

    /// No device is attached for the requested direction.
    Unavailable,

    /// The requested size exceeds the maximum packet size.
    BadSize( usize ),

    /// A transfer of the same kind is already in flight.
    Busy,

    /// The host service refused to queue the transfer.
    Submission( HostError ),

    /// The transfer completed with an error.
    Transfer( HostError ),

    /// The transfer was torn down by a detach or stop before completing.
    Interrupted,

    /// The host service refused a registration or port routing request.
    Host( HostError ),

    /// The device offered no usable pipes or could not be configured.
    AttachFailed,

    /// The caller memory could not be accessed.
    Boundary( HostError ),
}

/// Classification of the driver errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum ErrorKind {
    /// The operation is invalid in the current lifecycle state.
    State,

    /// The requested size exceeds the class maximum.
    Size,

    /// The host service failed to submit or complete the transfer.
    Transfer,

    /// A blocked transfer was woken by a detach or stop.
    Interrupted,
}

impl Error {
    /// Returns the kind of the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::NotStarted | Error::AlreadyStarted | Error::Unavailable | Error::Busy => ErrorKind::State,
            Error::BadSize( _ ) => ErrorKind::Size,
            Error::Interrupted => ErrorKind::Interrupted,
            Error::Submission( _ ) | Error::Transfer( _ ) | Error::Host( _ ) | Error::Boundary( _ ) | Error::AttachFailed => ErrorKind::Transfer,
        }
    }

    /// Returns the negative status code exposed through the syscall surface.
    /// Host errors are passed through unchanged.
    pub const fn code(&self) -> i32 {
        match self {
            Error::NotStarted | Error::AlreadyStarted | Error::BadSize( _ ) => -1,
            Error::Busy => -2,
            Error::Unavailable => -3,
            Error::Interrupted => -4,
            Error::AttachFailed => -5,
            Error::Submission( HostError(code) )
            | Error::Transfer( HostError(code) )
            | Error::Host( HostError(code) )
            | Error::Boundary( HostError(code) ) => *code,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotStarted => f.write_str("not started"),
            Error::AlreadyStarted => f.write_str("already started"),
            Error::Unavailable => f.write_str("USB device unavailable"),
            Error::BadSize( size ) => write!(f, "bad packet size {}", size),
            Error::Busy => f.write_str("a transfer of this kind is already in flight"),
            Error::Submission( HostError(code) ) => write!(f, "transfer submission failed: {:#010x}", code),
            Error::Transfer( HostError(code) ) => write!(f, "transfer failed: {:#010x}", code),
            Error::Interrupted => f.write_str("transfer interrupted by detach or stop"),
            Error::Host( HostError(code) ) => write!(f, "host service request failed: {:#010x}", code),
            Error::AttachFailed => f.write_str("device attach failed"),
            Error::Boundary( HostError(code) ) => write!(f, "caller memory copy failed: {:#010x}", code),
        }
    }
}

impl core::error::Error for Error {}

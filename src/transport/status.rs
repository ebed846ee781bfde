//! ## status
//!
//! NT status codes returned by the SMB2 primitives

use std::fmt;

/// Closed set of server status codes the probe distinguishes.
///
/// Exactly one variant, [`NtStatus::Success`], means success. Codes the probe has no
/// specific handling for are kept as [`NtStatus::Other`] so they can still be reported.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NtStatus {
    Success,
    NoMoreFiles,
    Unsuccessful,
    InvalidHandle,
    InvalidParameter,
    NoSuchFile,
    AccessDenied,
    ObjectNameNotFound,
    ObjectNameCollision,
    ObjectPathNotFound,
    DiskFull,
    LogonFailure,
    AccountRestriction,
    PasswordExpired,
    IoTimeout,
    FileIsADirectory,
    NotSupported,
    BadNetworkName,
    NetworkNameDeleted,
    NotADirectory,
    UserSessionDeleted,
    ConnectionRefused,
    NetworkUnreachable,
    HostUnreachable,
    Other(u32),
}

impl NtStatus {
    /// Wire value of the status
    pub fn code(self) -> u32 {
        match self {
            Self::Success => 0x0000_0000,
            Self::NoMoreFiles => 0x8000_0006,
            Self::Unsuccessful => 0xC000_0001,
            Self::InvalidHandle => 0xC000_0008,
            Self::InvalidParameter => 0xC000_000D,
            Self::NoSuchFile => 0xC000_000F,
            Self::AccessDenied => 0xC000_0022,
            Self::ObjectNameNotFound => 0xC000_0034,
            Self::ObjectNameCollision => 0xC000_0035,
            Self::ObjectPathNotFound => 0xC000_003A,
            Self::DiskFull => 0xC000_007F,
            Self::LogonFailure => 0xC000_006D,
            Self::AccountRestriction => 0xC000_006E,
            Self::PasswordExpired => 0xC000_0071,
            Self::IoTimeout => 0xC000_00B5,
            Self::FileIsADirectory => 0xC000_00BA,
            Self::NotSupported => 0xC000_00BB,
            Self::BadNetworkName => 0xC000_00CC,
            Self::NetworkNameDeleted => 0xC000_00C9,
            Self::NotADirectory => 0xC000_0103,
            Self::UserSessionDeleted => 0xC000_0203,
            Self::ConnectionRefused => 0xC000_0236,
            Self::NetworkUnreachable => 0xC000_023C,
            Self::HostUnreachable => 0xC000_023D,
            Self::Other(code) => code,
        }
    }

    /// Map a wire value back to a status
    pub fn from_code(code: u32) -> Self {
        match code {
            0x0000_0000 => Self::Success,
            0x8000_0006 => Self::NoMoreFiles,
            0xC000_0001 => Self::Unsuccessful,
            0xC000_0008 => Self::InvalidHandle,
            0xC000_000D => Self::InvalidParameter,
            0xC000_000F => Self::NoSuchFile,
            0xC000_0022 => Self::AccessDenied,
            0xC000_0034 => Self::ObjectNameNotFound,
            0xC000_0035 => Self::ObjectNameCollision,
            0xC000_003A => Self::ObjectPathNotFound,
            0xC000_007F => Self::DiskFull,
            0xC000_006D => Self::LogonFailure,
            0xC000_006E => Self::AccountRestriction,
            0xC000_0071 => Self::PasswordExpired,
            0xC000_00B5 => Self::IoTimeout,
            0xC000_00BA => Self::FileIsADirectory,
            0xC000_00BB => Self::NotSupported,
            0xC000_00CC => Self::BadNetworkName,
            0xC000_00C9 => Self::NetworkNameDeleted,
            0xC000_0103 => Self::NotADirectory,
            0xC000_0203 => Self::UserSessionDeleted,
            0xC000_0236 => Self::ConnectionRefused,
            0xC000_023C => Self::NetworkUnreachable,
            0xC000_023D => Self::HostUnreachable,
            code => Self::Other(code),
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Turn a status into a [`super::Reply`].
    pub fn check(self) -> super::Reply<()> {
        match self {
            Self::Success => Ok(()),
            status => Err(status),
        }
    }

    /// Normalize the error arm of a reply.
    ///
    /// A transport must never report `Success` as a failure; if it does, the reply is
    /// treated as `Unsuccessful`.
    pub(crate) fn failure(self) -> Self {
        match self {
            Self::Success => Self::Unsuccessful,
            status => status,
        }
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "STATUS_SUCCESS",
            Self::NoMoreFiles => "STATUS_NO_MORE_FILES",
            Self::Unsuccessful => "STATUS_UNSUCCESSFUL",
            Self::InvalidHandle => "STATUS_INVALID_HANDLE",
            Self::InvalidParameter => "STATUS_INVALID_PARAMETER",
            Self::NoSuchFile => "STATUS_NO_SUCH_FILE",
            Self::AccessDenied => "STATUS_ACCESS_DENIED",
            Self::ObjectNameNotFound => "STATUS_OBJECT_NAME_NOT_FOUND",
            Self::ObjectNameCollision => "STATUS_OBJECT_NAME_COLLISION",
            Self::ObjectPathNotFound => "STATUS_OBJECT_PATH_NOT_FOUND",
            Self::DiskFull => "STATUS_DISK_FULL",
            Self::LogonFailure => "STATUS_LOGON_FAILURE",
            Self::AccountRestriction => "STATUS_ACCOUNT_RESTRICTION",
            Self::PasswordExpired => "STATUS_PASSWORD_EXPIRED",
            Self::IoTimeout => "STATUS_IO_TIMEOUT",
            Self::FileIsADirectory => "STATUS_FILE_IS_A_DIRECTORY",
            Self::NotSupported => "STATUS_NOT_SUPPORTED",
            Self::BadNetworkName => "STATUS_BAD_NETWORK_NAME",
            Self::NetworkNameDeleted => "STATUS_NETWORK_NAME_DELETED",
            Self::NotADirectory => "STATUS_NOT_A_DIRECTORY",
            Self::UserSessionDeleted => "STATUS_USER_SESSION_DELETED",
            Self::ConnectionRefused => "STATUS_CONNECTION_REFUSED",
            Self::NetworkUnreachable => "STATUS_NETWORK_UNREACHABLE",
            Self::HostUnreachable => "STATUS_HOST_UNREACHABLE",
            Self::Other(code) => return write!(f, "NTSTATUS 0x{code:08X}"),
        };
        write!(f, "{name} (0x{:08X})", self.code())
    }
}

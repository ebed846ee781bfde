//! # transport
//!
//! The SMB2 primitives the probe is built on.
//!
//! A [`Transport`] owns exactly one network connection. Every primitive returns a [`Reply`]:
//! the `Ok` arm is `STATUS_SUCCESS` with the primitive's payload, the `Err` arm carries the
//! failing [`NtStatus`]. Callers cannot use a payload without checking the status first.
//!
//! Paths handed to a transport are relative to the connected share, use `\` as separator
//! and have no leading separator. The share root is the empty path.

use std::ops::BitOr;
use std::time::Duration;

mod status;

pub mod remote;
#[cfg(all(target_family = "unix", feature = "smbclient"))]
pub mod smb;

pub use status::NtStatus;

/// Result of a transport primitive
pub type Reply<T> = Result<T, NtStatus>;

/// Identifier of a connected tree (share)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TreeId(pub u32);

/// Identifier of an open file or directory object
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FileId(pub u64);

macro_rules! flags {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $value:expr),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u32);

        impl $name {
            $($(#[$fmeta])* pub const $flag: Self = Self($value);)*

            /// Whether every bit of `other` is set
            pub fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
    };
}

flags!(
    /// Access rights requested on create
    AccessMask {
        SYNCHRONIZE = 0x0010_0000,
        GENERIC_WRITE = 0x4000_0000,
        GENERIC_READ = 0x8000_0000,
    }
);

flags!(
    /// Sharing mode granted to other opens of the same object
    ShareAccess {
        NONE = 0x0,
        READ = 0x1,
        WRITE = 0x2,
        DELETE = 0x4,
    }
);

flags!(
    /// Options applied on create
    CreateOptions {
        DIRECTORY_FILE = 0x0000_0001,
        SYNCHRONOUS_IO_ALERT = 0x0000_0010,
        NON_DIRECTORY_FILE = 0x0000_0040,
    }
);

flags!(
    /// File attributes
    FileAttributes {
        READONLY = 0x0000_0001,
        HIDDEN = 0x0000_0002,
        DIRECTORY = 0x0000_0010,
        NORMAL = 0x0000_0080,
    }
);

/// What to do when the target of a create does or does not exist
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CreateDisposition {
    /// Replace if exists, create otherwise
    Supersede,
    /// Open if exists, fail otherwise
    Open,
    /// Fail if exists, create otherwise
    Create,
    /// Open if exists, create otherwise
    OpenIf,
    /// Overwrite if exists, fail otherwise
    Overwrite,
    /// Overwrite if exists, create otherwise
    OverwriteIf,
}

/// Arguments of the `create_file` primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub path: String,
    pub desired_access: AccessMask,
    pub file_attributes: FileAttributes,
    pub share_access: ShareAccess,
    pub disposition: CreateDisposition,
    pub options: CreateOptions,
}

impl CreateRequest {
    /// Whether the request targets a directory object
    pub fn is_directory(&self) -> bool {
        self.options.contains(CreateOptions::DIRECTORY_FILE)
    }
}

/// One record of a `FileDirectoryInformation` query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryInfo {
    pub file_name: String,
    pub file_attributes: FileAttributes,
    pub end_of_file: u64,
}

/// The SMB2 client primitives.
///
/// Implementations perform one blocking request per call. `connect` and `login` must not
/// block longer than the given timeout; a timeout is reported as [`NtStatus::IoTimeout`].
pub trait Transport {
    /// Open the network connection to `host:port`
    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Reply<()>;

    /// Session setup with the given credentials
    fn login(
        &mut self,
        domain: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Reply<()>;

    /// Connect to the named share
    fn tree_connect(&mut self, share: &str) -> Reply<TreeId>;

    /// Open or create a file or directory object
    fn create_file(&mut self, tree: TreeId, request: &CreateRequest) -> Reply<FileId>;

    /// Write `data` at `offset`; returns the number of bytes the server accepted
    fn write_file(&mut self, tree: TreeId, file: FileId, offset: u64, data: &[u8])
        -> Reply<usize>;

    /// Enumerate the directory behind `file`. An exhausted or empty directory is
    /// reported as [`NtStatus::NoMoreFiles`].
    fn query_directory(
        &mut self,
        tree: TreeId,
        file: FileId,
        pattern: &str,
    ) -> Reply<Vec<DirectoryInfo>>;

    /// Release an open object
    fn close_file(&mut self, tree: TreeId, file: FileId) -> Reply<()>;

    /// Disconnect from a share
    fn tree_disconnect(&mut self, tree: TreeId) -> Reply<()>;

    /// Tear down the authenticated session
    fn logoff(&mut self) -> Reply<()>;

    /// Close the network connection. Must be safe to call in any state.
    fn disconnect(&mut self);
}

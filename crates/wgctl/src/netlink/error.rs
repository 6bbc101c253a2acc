//! Error types for netlink exchanges and tunnel operations.

use std::io;
use std::path::PathBuf;

/// Result type for wgctl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding, exchanging or sequencing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations, process spawning or file access.
    /// Socket receive timeouts also surface here (`ErrorKind::TimedOut`).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attribute or message framing violation.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Key material with the wrong length or encoding.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Peer endpoint that is not `host:port` with a numeric port.
    #[error("peer endpoint is malformed: {0}")]
    InvalidEndpoint(String),

    /// Address family the wire format cannot carry.
    #[error("unsupported address family: {0}")]
    UnsupportedAddressFamily(String),

    /// Generic netlink family is not registered (module not loaded).
    #[error("generic netlink family not found: {name}")]
    FamilyNotFound {
        /// The family name that was looked up.
        name: String,
    },

    /// WireGuard device query failed.
    #[error("WireGuard device not found: {name}")]
    DeviceNotFound {
        /// Device selector as given.
        name: String,
    },

    /// Bring-up requested for a tunnel that is already up.
    #[error("tunnel interface {name} is already up")]
    AlreadyUp {
        /// Tunnel instance name.
        name: String,
    },

    /// Tear-down requested for a tunnel that is already down.
    #[error("tunnel interface {name} is already down")]
    AlreadyDown {
        /// Tunnel instance name.
        name: String,
    },

    /// Kernel refused a WireGuard SET_DEVICE request.
    #[error("kernel rejected device configuration: {message} (errno {errno})")]
    KernelRejected {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Interface name did not resolve to an index.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },

    /// A post-up or pre-down command exited unsuccessfully.
    #[error("hook `{command}` failed with exit code {}: {stderr}", display_exit_code(.exit_code))]
    HookFailed {
        /// The command line that was run.
        command: String,
        /// Exit code, `None` when killed by a signal.
        exit_code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Tunnel definition could not be read or failed validation.
    #[error("{0}")]
    Config(String),

    /// Tunnel definition is not valid YAML.
    #[error("could not parse configuration {}: {source}", .path.display())]
    ConfigSyntax {
        /// File that was read.
        path: PathBuf,
        /// Underlying parser error.
        source: serde_yaml::Error,
    },
}

fn display_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Create a kernel error from an errno value.
    pub fn from_errno(errno: i32) -> Self {
        let errno = errno.abs();
        Self::Kernel {
            errno,
            message: io::Error::from_raw_os_error(errno).to_string(),
        }
    }

    /// Create the error reported when SET_DEVICE is refused.
    pub fn rejected(errno: i32) -> Self {
        let errno = errno.abs();
        Self::KernelRejected {
            errno,
            message: io::Error::from_raw_os_error(errno).to_string(),
        }
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, ESRCH).
    pub fn is_not_found(&self) -> bool {
        match self.errno() {
            Some(errno) => matches!(errno, libc::ENOENT | libc::ENODEV | libc::ESRCH),
            None => matches!(
                self,
                Self::InterfaceNotFound { .. }
                    | Self::DeviceNotFound { .. }
                    | Self::FamilyNotFound { .. }
            ),
        }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. }
            | Self::KernelWithContext { errno, .. }
            | Self::KernelRejected { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        let err = Error::from_errno(-libc::EPERM);
        assert_eq!(err.errno(), Some(libc::EPERM));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_with_context() {
        let err = Error::from_errno(-libc::EEXIST).with_context("creating link wg0");
        assert_eq!(err.errno(), Some(libc::EEXIST));
        let msg = err.to_string();
        assert!(msg.contains("creating link wg0"));
        assert!(msg.contains("File exists"));
    }

    #[test]
    fn test_rejected_keeps_errno() {
        let err = Error::rejected(-libc::EINVAL);
        assert_eq!(err.errno(), Some(libc::EINVAL));
        assert!(err.to_string().starts_with("kernel rejected device configuration"));
        // context only wraps plain kernel errors
        let err = err.with_context("configuring wg0");
        assert!(matches!(err, Error::KernelRejected { .. }));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::from_errno(-libc::ENOENT).is_not_found());
        assert!(Error::from_errno(-libc::ENODEV).is_not_found());
        assert!(Error::from_errno(-libc::ESRCH).is_not_found());
        assert!(!Error::from_errno(-libc::EEXIST).is_not_found());
        assert!(Error::DeviceNotFound { name: "wg0".into() }.is_not_found());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::AlreadyUp { name: "wg0".into() };
        assert_eq!(err.to_string(), "tunnel interface wg0 is already up");

        let err = Error::HookFailed {
            command: "iptables -A FORWARD".into(),
            exit_code: Some(2),
            stderr: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "hook `iptables -A FORWARD` failed with exit code 2: permission denied"
        );

        let err = Error::Config("could not read private key file /nonexistent".into());
        assert_eq!(err.to_string(), "could not read private key file /nonexistent");
    }
}

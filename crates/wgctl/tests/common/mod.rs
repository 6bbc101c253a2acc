//! Common test utilities for integration tests.
//!
//! Tests run in the host network namespace, so every tunnel gets a name
//! unique to the test process and is deleted on drop.

use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

/// Global counter for unique interface names.
static TUNNEL_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A unique interface name, within the 15-byte `IFNAMSIZ` limit.
pub fn unique_name() -> String {
    let id = TUNNEL_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("wgt{}x{}", std::process::id() % 100_000, id)
}

/// A listening port unlikely to clash with tunnels already on the host.
pub fn unique_port() -> u16 {
    let id = TUNNEL_COUNTER.fetch_add(1, Ordering::SeqCst);
    40000 + ((std::process::id() + id * 7) % 20000) as u16
}

/// Deletes the named link on drop, whatever state the test left it in.
pub struct LinkGuard {
    pub name: String,
}

impl LinkGuard {
    pub fn new() -> Self {
        Self {
            name: unique_name(),
        }
    }
}

impl Drop for LinkGuard {
    fn drop(&mut self) {
        let _ = Command::new("ip")
            .args(["link", "del", &self.name])
            .output();
    }
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
///
/// Use this at the beginning of integration tests that require root privileges.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name() {
        let name1 = unique_name();
        let name2 = unique_name();
        assert_ne!(name1, name2);
        assert!(name1.len() <= 15, "{}", name1);
    }
}

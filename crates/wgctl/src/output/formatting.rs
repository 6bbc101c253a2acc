//! Formatting helpers for tunnel status output.
//!
//! # Example
//!
//! ```
//! use wgctl::output::formatting::{format_bytes, format_handshake};
//!
//! assert_eq!(format_bytes(1024), "1.00 KiB");
//! assert_eq!(format_handshake(None), "never");
//! ```

use std::net::SocketAddr;
use std::time::SystemTime;

use crate::netlink::genl::wireguard::Key;

/// Format a byte count in binary units (1 KiB = 1024 bytes).
///
/// ```
/// use wgctl::output::formatting::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1_048_576), "1.00 MiB");
/// assert_eq!(format_bytes(1_073_741_824), "1.00 GiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [(&str, f64); 4] = [
        ("TiB", 1024.0 * 1024.0 * 1024.0 * 1024.0),
        ("GiB", 1024.0 * 1024.0 * 1024.0),
        ("MiB", 1024.0 * 1024.0),
        ("KiB", 1024.0),
    ];

    let value = bytes as f64;
    for (unit, size) in UNITS {
        if value >= size {
            return format!("{:.2} {}", value / size, unit);
        }
    }
    format!("{} B", bytes)
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Format the time since the last handshake, or `never`.
pub fn format_handshake(last: Option<SystemTime>) -> String {
    let Some(last) = last else {
        return "never".to_string();
    };
    let Ok(elapsed) = SystemTime::now().duration_since(last) else {
        return "just now".to_string();
    };

    let secs = elapsed.as_secs();
    let (days, hours, minutes, seconds) = (
        secs / 86400,
        (secs % 86400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
    );

    let ago = if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        plural(seconds, "second")
    };
    format!("{} ago", ago)
}

/// Base64 form of a key.
pub fn format_key(key: &Key) -> String {
    key.to_base64()
}

/// Endpoint as `host:port`, or `(none)` before the peer was heard from.
pub fn format_endpoint(endpoint: Option<SocketAddr>) -> String {
    match endpoint {
        Some(addr) => addr.to_string(),
        None => "(none)".to_string(),
    }
}

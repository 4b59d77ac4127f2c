//! Environment-input helpers: hostname, user, platform, time.
//!
//! These feed the provenance fields of the per-file record and the chain of
//! custody. Hostname is read via `uname(2)` rather than an env var, since the
//! `HOSTNAME` environment variable is unreliable (unset by default in most
//! shells, stale after a rename).

use std::ffi::CStr;

use chrono::{DateTime, Utc};

/// The short hostname, as reported by the kernel.
pub fn hostname() -> String {
    unsafe {
        let mut uts: libc::utsname = std::mem::zeroed();
        if libc::uname(&mut uts) == 0 {
            let ptr = uts.nodename.as_ptr() as *const libc::c_char;
            let s = CStr::from_ptr(ptr).to_string_lossy().into_owned();
            if !s.is_empty() {
                return s;
            }
        }
    }
    "unknown-host".to_string()
}

/// The invoking user's login name.
pub fn username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// A short platform identifier (`linux`, `macos`, `windows`, ...).
pub fn platform() -> &'static str {
    std::env::consts::OS
}

/// Current UTC time, used for timestamp fields that must not be recorded as
/// local time (the per-file record and checkpoint are read by tools on other
/// machines).
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

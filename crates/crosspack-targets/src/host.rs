//! Host platform detection.

use std::env::consts::{ARCH, OS};

use crate::error::{Result, TargetError};
use crate::platform::{Arch, Os, PlatformToken};

/// Detect the token of the machine this process runs on.
pub fn detect_host() -> Result<PlatformToken> {
    detect_host_from(OS, ARCH)
}

/// Normalize raw OS and architecture names into a registered token.
///
/// Accepts both Rust's `std::env::consts` spellings and `uname`-style ones.
pub fn detect_host_from(os: &str, arch: &str) -> Result<PlatformToken> {
    let unsupported = || TargetError::UnsupportedHost {
        os: os.to_string(),
        arch: arch.to_string(),
    };

    let os_axis = normalize_os(os).ok_or_else(unsupported)?;
    let arch_axis = normalize_arch(arch).ok_or_else(unsupported)?;
    PlatformToken::from_parts(os_axis, arch_axis).ok_or_else(unsupported)
}

/// True iff host detection succeeds and yields `token`.
pub fn is_local_build(token: PlatformToken) -> bool {
    detect_host().is_ok_and(|host| host == token)
}

fn normalize_os(os: &str) -> Option<Os> {
    match os.to_ascii_lowercase().as_str() {
        "linux" => Some(Os::Linux),
        "macos" | "darwin" => Some(Os::Darwin),
        "windows" => Some(Os::Windows),
        _ => None,
    }
}

fn normalize_arch(arch: &str) -> Option<Arch> {
    match arch.to_ascii_lowercase().as_str() {
        "x86_64" | "amd64" | "x64" => Some(Arch::Amd64),
        "aarch64" | "arm64" => Some(Arch::Arm64),
        "armv7l" | "armv7" | "arm" => Some(Arch::Armv7),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_vendor_spellings() {
        assert_eq!(
            detect_host_from("linux", "x86_64").unwrap(),
            PlatformToken::LinuxAmd64
        );
        assert_eq!(
            detect_host_from("Linux", "amd64").unwrap(),
            PlatformToken::LinuxAmd64
        );
        assert_eq!(
            detect_host_from("macos", "aarch64").unwrap(),
            PlatformToken::DarwinArm64
        );
        assert_eq!(
            detect_host_from("Darwin", "arm64").unwrap(),
            PlatformToken::DarwinArm64
        );
        assert_eq!(
            detect_host_from("linux", "armv7l").unwrap(),
            PlatformToken::LinuxArmv7
        );
        assert_eq!(
            detect_host_from("windows", "x86_64").unwrap(),
            PlatformToken::WindowsAmd64
        );
    }

    #[test]
    fn rejects_unknown_axes() {
        assert!(matches!(
            detect_host_from("freebsd", "x86_64"),
            Err(TargetError::UnsupportedHost { .. })
        ));
        assert!(matches!(
            detect_host_from("linux", "riscv64"),
            Err(TargetError::UnsupportedHost { .. })
        ));
        // Both axes normalize, but the pair is not registered.
        assert!(matches!(
            detect_host_from("macos", "arm"),
            Err(TargetError::UnsupportedHost { .. })
        ));
    }

    #[test]
    fn detected_host_is_local() {
        if let Ok(host) = detect_host() {
            assert!(is_local_build(host));
            let other = PlatformToken::ALL
                .into_iter()
                .find(|t| *t != host)
                .unwrap();
            assert!(!is_local_build(other));
        }
    }
}

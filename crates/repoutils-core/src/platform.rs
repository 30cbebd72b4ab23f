//! Host descriptors used to seed the variable store's builtin names.

use std::env;

/// Operating system token (`linux`, `macos`, `windows`, …), matching
/// `std::env::consts::OS`.
#[must_use]
pub fn os_name() -> &'static str {
    std::env::consts::OS
}

/// CPU architecture token (`x86_64`, `aarch64`, …).
#[must_use]
pub fn arch_name() -> &'static str {
    std::env::consts::ARCH
}

/// Number of logical CPUs, used to size worker pools and as the `nproc`
/// builtin variable.
#[must_use]
pub fn nproc() -> usize {
    num_cpus::get()
}

/// The user's home directory, or an empty string if it cannot be determined.
#[must_use]
pub fn home_dir() -> String {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .unwrap_or_default()
}

/// The current working directory, or an empty string if it cannot be read.
#[must_use]
pub fn cwd() -> String {
    env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nproc_is_at_least_one() {
        assert!(nproc() >= 1);
    }

    #[test]
    fn os_and_arch_are_nonempty() {
        assert!(!os_name().is_empty());
        assert!(!arch_name().is_empty());
    }
}

//! Host-specific naming for build products.

/// Suffix appended to the produced executable: `elf` on POSIX hosts,
/// `exe` everywhere else.
#[cfg(unix)]
pub const EXECUTABLE_SUFFIX: &str = "elf";

#[cfg(not(unix))]
pub const EXECUTABLE_SUFFIX: &str = "exe";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_is_known() {
        assert!(EXECUTABLE_SUFFIX == "elf" || EXECUTABLE_SUFFIX == "exe");
    }
}

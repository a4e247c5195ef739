//! Final-success status classification.
//!
//! The insert decision (finality freeze) and the summary counts both consume
//! [`FINAL_SUCCESS_STATUSES`]. Keeping the set in one place guarantees the
//! write path and the read path can never disagree about which statuses are
//! terminal.

/// Statuses that mark a dedup key as terminally successful.
///
/// Once a row with one of these statuses exists for a dedup key, no further
/// row may be appended under that key.
pub const FINAL_SUCCESS_STATUSES: [&str; 4] = ["VERIFIED", "COMPLETED", "SETTLED", "OK"];

/// Returns `true` if `status` (already uppercased) is a final-success status.
#[must_use]
pub fn is_final_status(status: &str) -> bool {
    FINAL_SUCCESS_STATUSES.contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_statuses_are_recognized() {
        for status in FINAL_SUCCESS_STATUSES {
            assert!(is_final_status(status));
        }
    }

    #[test]
    fn non_final_statuses_are_rejected() {
        assert!(!is_final_status("PENDING"));
        assert!(!is_final_status("FAILED"));
        // Classification happens after normalization; lowercase never matches.
        assert!(!is_final_status("verified"));
        assert!(!is_final_status(""));
    }
}

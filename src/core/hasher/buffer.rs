//! Read-buffer sizing.

/// Files below this size use the small buffer
pub const SMALL_FILE_LIMIT: u64 = 64 * 1024;
/// Files below this size use the medium buffer
pub const MEDIUM_FILE_LIMIT: u64 = 10 * 1024 * 1024;

pub const SMALL_BUFFER: usize = 8 * 1024;
pub const MEDIUM_BUFFER: usize = 64 * 1024;
pub const LARGE_BUFFER: usize = 256 * 1024;

/// Pick a read-buffer size for a file of `file_size` bytes.
///
/// Small files get at most 8 KiB (never more than the file itself, never
/// less than one byte), files under 10 MiB get 64 KiB and anything larger
/// 256 KiB.
pub fn buffer_size_for(file_size: u64) -> usize {
    if file_size < SMALL_FILE_LIMIT {
        (file_size as usize).clamp(1, SMALL_BUFFER)
    } else if file_size < MEDIUM_FILE_LIMIT {
        MEDIUM_BUFFER
    } else {
        LARGE_BUFFER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_files_are_capped_at_their_size() {
        assert_eq!(buffer_size_for(100), 100);
        assert_eq!(buffer_size_for(20_000), SMALL_BUFFER);
        assert_eq!(buffer_size_for(SMALL_FILE_LIMIT - 1), SMALL_BUFFER);
    }

    #[test]
    fn empty_files_still_get_a_usable_buffer() {
        assert_eq!(buffer_size_for(0), 1);
    }

    #[test]
    fn tiers_switch_at_the_limits() {
        assert_eq!(buffer_size_for(SMALL_FILE_LIMIT), MEDIUM_BUFFER);
        assert_eq!(buffer_size_for(MEDIUM_FILE_LIMIT - 1), MEDIUM_BUFFER);
        assert_eq!(buffer_size_for(MEDIUM_FILE_LIMIT), LARGE_BUFFER);
        assert_eq!(buffer_size_for(u64::MAX), LARGE_BUFFER);
    }
}

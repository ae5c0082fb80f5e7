//! Streaming CRC-32 over any reader.

use std::io::{self, ErrorKind, Read};

/// Feed `reader` through a CRC-32 accumulator using `buffer` for each read.
///
/// After every chunk the cancel check runs first (returning `Ok(None)` when
/// it fires), then `progress` receives the cumulative byte count.
pub fn checksum_reader<R: Read>(
    reader: &mut R,
    buffer: &mut [u8],
    mut progress: Option<&mut dyn FnMut(u64)>,
    cancel: Option<&dyn Fn() -> bool>,
) -> io::Result<Option<u32>> {
    let mut hasher = crc32fast::Hasher::new();
    let mut total: u64 = 0;

    loop {
        let read = match reader.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        hasher.update(&buffer[..read]);
        total = total.saturating_add(read as u64);

        if let Some(is_cancelled) = cancel {
            if is_cancelled() {
                return Ok(None);
            }
        }
        if let Some(report) = progress.as_deref_mut() {
            report(total);
        }
    }

    Ok(Some(hasher.finalize()))
}

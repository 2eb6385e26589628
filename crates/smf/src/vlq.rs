//! Variable-length quantities: 7 data bits per byte, big-endian, high bit
//! set on every byte except the last.

/// Largest value representable in the 4 bytes SMF allows.
pub const MAX_VALUE: u32 = 0x0FFF_FFFF;

/// Maximum encoded length in bytes.
pub const MAX_BYTES: usize = 4;

/// Append `value` as a VLQ. Values above [`MAX_VALUE`] are saturated.
pub fn write_vlq(buf: &mut Vec<u8>, value: u32) {
    let mut value = value.min(MAX_VALUE);
    if value == 0 {
        buf.push(0);
        return;
    }

    let mut bytes = [0u8; MAX_BYTES];
    let mut len = 0;
    while value > 0 {
        bytes[len] = (value & 0x7F) as u8;
        value >>= 7;
        len += 1;
    }

    for i in (0..len).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        buf.push(bytes[i] | continuation);
    }
}

/// Number of bytes `write_vlq` produces for `value`.
pub fn encoded_len(value: u32) -> usize {
    match value.min(MAX_VALUE) {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        _ => 4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlqError {
    /// Input ended before the final byte
    Truncated,
    /// Continuation bit still set on the fourth byte
    TooLong,
}

/// Read a VLQ from `data` at `*pos`, advancing `pos` past it.
pub fn read_vlq(data: &[u8], pos: &mut usize) -> Result<u32, VlqError> {
    let mut value = 0u32;
    for _ in 0..MAX_BYTES {
        let byte = *data.get(*pos).ok_or(VlqError::Truncated)?;
        *pos += 1;
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(VlqError::TooLong)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_vlq(&mut buf, value);
        buf
    }

    #[test]
    fn vlq_encoding() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(127), vec![0x7F]);
        assert_eq!(encoded(128), vec![0x81, 0x00]);
        assert_eq!(encoded(480), vec![0x83, 0x60]);
        assert_eq!(encoded(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encoded(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(encoded(MAX_VALUE), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn oversized_values_saturate() {
        assert_eq!(encoded(u32::MAX), encoded(MAX_VALUE));
    }

    #[test]
    fn encoded_len_matches_writer() {
        for value in [0, 1, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152, MAX_VALUE] {
            assert_eq!(encoded_len(value), encoded(value).len(), "value {value}");
        }
    }

    #[test]
    fn reads_what_it_writes() {
        for value in [0, 64, 480, 100_000, MAX_VALUE] {
            let bytes = encoded(value);
            let mut pos = 0;
            assert_eq!(read_vlq(&bytes, &mut pos), Ok(value));
            assert_eq!(pos, bytes.len());
        }
    }

    #[test]
    fn read_errors() {
        let mut pos = 0;
        assert_eq!(read_vlq(&[0x81, 0x80], &mut pos), Err(VlqError::Truncated));

        let mut pos = 0;
        assert_eq!(
            read_vlq(&[0x81, 0x80, 0x80, 0x80, 0x00], &mut pos),
            Err(VlqError::TooLong)
        );
    }
}

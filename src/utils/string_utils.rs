//! String utility functions
//!
//! TIFF ASCII fields are byte strings. Text is mapped to and from bytes
//! with ISO-8859-1, so every byte has exactly one character and back.

/// Trims trailing null characters from a byte buffer
pub fn trim_trailing_nulls(buffer: &mut Vec<u8>) {
    while !buffer.is_empty() && buffer[buffer.len() - 1] == 0 {
        buffer.pop();
    }
}

/// Decodes ISO-8859-1 bytes, stopping at the first NUL
pub fn latin1_decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

/// Encodes text as ISO-8859-1; characters outside the range become `?`
pub fn latin1_encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c as u32 as u8 } else { b'?' })
        .collect()
}

/// Splits a NUL-separated list of strings, as used by InkNames
pub fn split_nul_list(bytes: &[u8]) -> Vec<String> {
    let mut buffer = bytes.to_vec();
    trim_trailing_nulls(&mut buffer);
    if buffer.is_empty() {
        return Vec::new();
    }
    buffer.split(|&b| b == 0).map(latin1_decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_round_trip() {
        let bytes: Vec<u8> = (1..=255u8).collect();
        let text = latin1_decode(&bytes);
        assert_eq!(text.chars().count(), 255);
        assert_eq!(latin1_encode(&text), bytes);
    }

    #[test]
    fn test_latin1_decode_stops_at_nul() {
        assert_eq!(latin1_decode(b"abc\0def"), "abc");
    }

    #[test]
    fn test_split_nul_list() {
        assert_eq!(split_nul_list(b"cyan\0magenta\0\0"), vec!["cyan", "magenta"]);
        assert!(split_nul_list(b"\0").is_empty());
    }
}

//! Zero-allocation parsing helpers shared by the line readers.

use memchr::memchr;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty, contains non-digit characters,
/// or does not fit in a u64.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Parse a comma-joined coordinate list such as `100,250,400,`.
///
/// Empty items (the trailing comma) are ignored. Returns None if any item
/// is not a number.
pub fn parse_u64_list(bytes: &[u8]) -> Option<Vec<u64>> {
    let mut values = Vec::new();
    let mut rest = bytes;
    loop {
        let item_len = memchr(b',', rest).unwrap_or(rest.len());
        let item = &rest[..item_len];
        if !item.is_empty() {
            values.push(parse_u64_fast(item)?);
        }
        if item_len == rest.len() {
            break;
        }
        rest = &rest[item_len + 1..];
    }
    Some(values)
}

/// Check if a line should be skipped (empty, comment, or header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#' || line.starts_with(b"track") || line.starts_with(b"browser")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"abc"), None);
        assert_eq!(parse_u64_fast(b"123abc"), None);
        assert_eq!(parse_u64_fast(b"-5"), None);
        assert_eq!(parse_u64_fast(b"18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_u64_fast(b"18446744073709551616"), None);
    }

    #[test]
    fn test_parse_u64_list() {
        assert_eq!(parse_u64_list(b"100,250,400,"), Some(vec![100, 250, 400]));
        assert_eq!(parse_u64_list(b"7"), Some(vec![7]));
        assert_eq!(parse_u64_list(b""), Some(vec![]));
        assert_eq!(parse_u64_list(b"1,x,3,"), None);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#comment"));
        assert!(should_skip_line(b"track name=foo"));
        assert!(should_skip_line(b"browser position chr1:1-100"));
        assert!(!should_skip_line(b"chr1\t100\t200"));
    }
}

/// Format milliseconds as "MM:SS.CC", or "HH:MM:SS.CC" once an hour has passed.
///
/// Negative input renders as zero. Every unit is floored, never rounded.
pub fn format_elapsed(ms: i64) -> String {
    let ms = ms.max(0) as u64;
    let total_secs = ms / 1000;
    let cs = (ms % 1000) / 10;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    if h > 0 {
        format!("{:02}:{:02}:{:02}.{:02}", h, m, s, cs)
    } else {
        format!("{:02}:{:02}.{:02}", m, s, cs)
    }
}

/// Same as [`format_elapsed`] for the unsigned values the clock produces.
pub fn format_elapsed_ms(ms: u64) -> String {
    format_elapsed(i64::try_from(ms).unwrap_or(i64::MAX))
}

/// Parse a string produced by [`format_elapsed`] back into milliseconds.
///
/// Only hundredths survive formatting, so the result is a multiple of 10.
pub fn parse_elapsed(text: &str) -> Option<u64> {
    let (clock, cs) = text.trim().split_once('.')?;
    if cs.len() != 2 {
        return None;
    }
    let cs: u64 = cs.parse().ok()?;

    let fields: Vec<&str> = clock.split(':').collect();
    let (h, m, s) = match fields.as_slice() {
        [m, s] => (0, parse_field(m)?, parse_field(s)?),
        [h, m, s] => (parse_field(h)?, parse_field(m)?, parse_field(s)?),
        _ => return None,
    };
    if m >= 60 || s >= 60 {
        return None;
    }
    Some(((h * 60 + m) * 60 + s) * 1000 + cs * 10)
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00.00");
        assert_eq!(format_elapsed(61_005), "01:01.00");
        assert_eq!(format_elapsed(3_661_000), "01:01:01.00");
        assert_eq!(format_elapsed(12_349), "00:12.34");
    }

    #[test]
    fn test_format_clamps_negative() {
        assert_eq!(format_elapsed(-1), "00:00.00");
        assert_eq!(format_elapsed(i64::MIN), "00:00.00");
    }

    #[test]
    fn test_format_hour_boundary() {
        assert_eq!(format_elapsed(3_599_999), "59:59.99");
        assert_eq!(format_elapsed(3_600_000), "01:00:00.00");
        assert_eq!(format_elapsed_ms(36_000_000), "10:00:00.00");
    }

    #[test]
    fn test_parse_elapsed() {
        assert_eq!(parse_elapsed("00:00.00"), Some(0));
        assert_eq!(parse_elapsed("01:01.00"), Some(61_000));
        assert_eq!(parse_elapsed("01:01:01.50"), Some(3_661_500));
        assert_eq!(parse_elapsed(&format_elapsed(12_349)), Some(12_340));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_elapsed(""), None);
        assert_eq!(parse_elapsed("12:34"), None);
        assert_eq!(parse_elapsed("aa:bb.cc"), None);
        assert_eq!(parse_elapsed("00:75.00"), None);
        assert_eq!(parse_elapsed("1:2:3:4.00"), None);
        assert_eq!(parse_elapsed("00:01.5"), None);
        assert_eq!(parse_elapsed("-1:00.00"), None);
    }
}

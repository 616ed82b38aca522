use std::time::Duration;

/// Parses a duration string into a number of milliseconds.
///
/// The input is a sequence of `<digits><unit>` pairs where unit is one of `s`, `m`, `h` or
/// `d`, e.g. `1m30s`. Returns `None` on malformed input or overflow.
///
/// # Examples
///
/// ```
/// use pkgsync_utils::time::parse_duration;
///
/// assert_eq!(parse_duration("1m30s"), Some(90_000));
/// ```
pub fn parse_duration(input: &str) -> Option<u128> {
    let mut total: u128 = 0;
    let mut chars = input.chars().peekable();

    while chars.peek().is_some() {
        let mut number_str = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                number_str.push(chars.next()?);
            } else {
                break;
            }
        }

        if number_str.is_empty() {
            return None;
        }

        let number: u128 = number_str.parse().ok()?;
        let multiplier = match chars.next()? {
            's' => 1000,
            'm' => 60 * 1000,
            'h' => 60 * 60 * 1000,
            'd' => 24 * 60 * 60 * 1000,
            _ => return None,
        };

        total = total.checked_add(number.checked_mul(multiplier)?)?;
    }

    Some(total)
}

/// Like [`parse_duration`] but yields a [`Duration`]; an empty or zero duration is `None`.
pub fn parse_timeout(input: &str) -> Option<Duration> {
    let millis = parse_duration(input.trim())?;
    if millis == 0 {
        return None;
    }
    u64::try_from(millis).ok().map(Duration::from_millis)
}

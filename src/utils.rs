use chrono::NaiveDate;

/// Derive the cache key for a canonical address: the five digits of the
/// leftmost `<two uppercase letters><whitespace><five digits>` token,
/// e.g. "TX 78758" in "3001 Esperanza Crossing, Austin, TX 78758, USA".
///
/// Both ends of the token must sit on a word boundary. Returns an empty
/// string when no token is found; callers treat that as one shared bucket.
pub fn postal_code_key(address: &str) -> String {
    const TOKEN_LEN: usize = 8;
    let bytes = address.as_bytes();
    if bytes.len() < TOKEN_LEN {
        return String::new();
    }

    for start in 0..=bytes.len() - TOKEN_LEN {
        let token = &bytes[start..start + TOKEN_LEN];
        let at_boundary = start == 0 || !is_word_byte(bytes[start - 1]);
        let ends_at_boundary = bytes
            .get(start + TOKEN_LEN)
            .map_or(true, |&b| !is_word_byte(b));

        if at_boundary
            && ends_at_boundary
            && token[..2].iter().all(u8::is_ascii_uppercase)
            && token[2].is_ascii_whitespace()
            && token[3..].iter().all(u8::is_ascii_digit)
        {
            return String::from_utf8_lossy(&token[3..]).into_owned();
        }
    }

    String::new()
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Whether a geocoded coordinate pair counts as "not found".
///
/// Known defect kept for compatibility: a real location on the equator or
/// the prime meridian is rejected too.
pub fn is_unresolved_coordinates(lat: f64, lon: f64) -> bool {
    lat == 0.0 || lon == 0.0
}

/// Format a Fahrenheit reading with one decimal, e.g. "78.6 F".
pub fn format_fahrenheit(value: f64) -> String {
    format!("{:.1} F", value)
}

/// Prefix an ISO date with its weekday ("Thu 2024-09-19"); other strings pass through.
pub fn format_forecast_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => format!("{} {}", parsed.format("%a"), date),
        Err(_) => date.to_string(),
    }
}

//! Small shared helpers

/// Current Unix timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Capitalize the first letter of each whitespace-separated word.
///
/// Customer names are stored normalized ("nguyen van a" → "Nguyen Van A").
pub fn capitalize_words(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip everything but ASCII digits from a phone number
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a local mobile number: exactly 10 digits, leading zero
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = normalize_phone(phone);
    digits.len() == 10 && digits.starts_with('0')
}

/// Truncate a string to at most `max_chars` characters (not bytes)
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

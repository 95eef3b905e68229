//! Small display and input-cleaning helpers.

/// Keep ASCII digits only.
pub fn clean_number(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Render a WhatsApp pairing code as `ABCD-1234`.
///
/// Codes that are not exactly 8 alphanumerics once cleaned are returned as given.
pub fn format_pairing_code(code: &str) -> String {
    let clean: String = code.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if clean.len() == 8 {
        format!("{}-{}", &clean[..4], &clean[4..]).to_uppercase()
    } else {
        code.to_string()
    }
}

/// `+<digits>`, or `None` when there is nothing to show.
pub fn format_phone(phone: Option<&str>) -> Option<String> {
    let digits = clean_number(phone?);
    if digits.is_empty() {
        None
    } else {
        Some(format!("+{digits}"))
    }
}

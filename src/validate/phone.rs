use phonenumber::country::Id;
use phonenumber::Mode;

/// Outcome of checking one phone number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneCheck {
    /// E.164 form, set only for valid numbers
    pub normalized: Option<String>,
    pub valid: bool,
}

impl PhoneCheck {
    fn invalid() -> Self {
        Self {
            normalized: None,
            valid: false,
        }
    }
}

/// Parses a phone number against the numbering plan
///
/// Numbers without a `+` country prefix are read as belonging to `region`.
/// Anything the numbering-plan metadata rejects, including text that does not
/// parse at all, is reported as invalid rather than as an error.
pub fn validate_phone(raw: &str, region: Id) -> PhoneCheck {
    let cleaned = sanitize(raw);
    if cleaned.trim_start_matches('+').is_empty() {
        return PhoneCheck::invalid();
    }

    // A `+` prefix carries its own country code; the default region applies
    // only to national-format numbers
    let region = if cleaned.starts_with('+') {
        None
    } else {
        Some(region)
    };

    match phonenumber::parse(region, &cleaned) {
        Ok(number) if phonenumber::is_valid(&number) => PhoneCheck {
            normalized: Some(number.format().mode(Mode::E164).to_string()),
            valid: true,
        },
        Ok(_) => PhoneCheck::invalid(),
        Err(e) => {
            tracing::debug!("Unparsable phone number '{}': {:?}", raw, e);
            PhoneCheck::invalid()
        }
    }
}

/// Keeps digits and a leading `+`, dropping labels, separators and icons
fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut cleaned = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c.is_ascii_digit() {
            cleaned.push(c);
        } else if c == '+' && cleaned.is_empty() {
            cleaned.push(c);
        }
    }
    cleaned
}

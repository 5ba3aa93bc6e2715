//! Field extraction from one rendered listing
//!
//! Every field is read on its own. A failed read is logged and leaves that
//! field absent; it never affects the other fields.

use crate::browser::ItemView;
use crate::model::{BusinessRecord, Field, FieldKind};
use url::Url;

/// Extracts a record from a rendered detail view
///
/// Only the raw fields are filled in; validity flags, the normalized phone
/// and the lead score are left for the validator.
pub fn extract(view: &dyn ItemView) -> BusinessRecord {
    BusinessRecord {
        name: read_text(view, FieldKind::Name),
        category: read_text(view, FieldKind::Category),
        address: read_text(view, FieldKind::Address),
        phone: read_text(view, FieldKind::Phone),
        website: read_text(view, FieldKind::Website).map(|site| unwrap_redirect(&site)),
        rating: read_parsed(view, FieldKind::Rating, parse_rating),
        review_count: read_parsed(view, FieldKind::Reviews, parse_review_count),
        ..BusinessRecord::absent()
    }
}

fn read_text(view: &dyn ItemView, kind: FieldKind) -> Field<String> {
    match view.read(kind) {
        Ok(Some(raw)) => {
            let text = clean_text(strip_label(&raw, kind));
            if text.is_empty() {
                Field::Absent
            } else {
                Field::Value(text)
            }
        }
        Ok(None) => {
            tracing::debug!("Field {} not shown", kind);
            Field::Absent
        }
        Err(e) => {
            tracing::warn!("Failed to extract {}: {}", kind, e);
            Field::Absent
        }
    }
}

fn read_parsed<T>(view: &dyn ItemView, kind: FieldKind, parse: fn(&str) -> Option<T>) -> Field<T> {
    match read_text(view, kind) {
        Field::Value(text) => match parse(&text) {
            Some(value) => Field::Value(value),
            None => {
                tracing::warn!("Unrecognized {} text '{}'", kind, text);
                Field::Absent
            }
        },
        Field::Absent => Field::Absent,
    }
}

/// Collapses runs of whitespace and trims the ends
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drops an accessibility label such as `Phone: ` from the front of a value
fn strip_label(text: &str, kind: FieldKind) -> &str {
    let label = match kind {
        FieldKind::Address => "address:",
        FieldKind::Phone => "phone:",
        FieldKind::Website => "website:",
        _ => return text,
    };

    let trimmed = text.trim_start();
    match trimmed.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => &trimmed[label.len()..],
        _ => text,
    }
}

/// Reads a rating from label text such as `4.5 stars`
///
/// Takes the first decimal number; values outside 0 to 5 are rejected.
pub fn parse_rating(text: &str) -> Option<f32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit()
                || (c == '.' && rest[i + 1..].starts_with(|n: char| n.is_ascii_digit())))
        })
        .map_or(rest.len(), |(i, _)| i);

    let value: f32 = rest[..end].parse().ok()?;
    (0.0..=5.0).contains(&value).then_some(value)
}

/// Reads a review count from text such as `(1,234 reviews)`
///
/// Takes the first integer, allowing comma digit grouping.
pub fn parse_review_count(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let mut digits = String::new();
    let mut chars = text[start..].chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c == ',' && chars.peek().map_or(false, |n| n.is_ascii_digit()) {
            continue;
        } else {
            break;
        }
    }

    digits.parse().ok()
}

/// Resolves a redirect-wrapped link (`.../url?q=<target>`) to its target
///
/// Links that are not redirect wrappers are returned unchanged.
pub fn unwrap_redirect(link: &str) -> String {
    if !link.contains("/url?") {
        return link.to_string();
    }

    let parsed = Url::parse(link).or_else(|_| {
        Url::parse("https://www.google.com").and_then(|base| base.join(link))
    });
    let Ok(url) = parsed else {
        return link.to_string();
    };

    url.query_pairs()
        .find(|(key, value)| (key == "q" || key == "url") && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserError, BrowserResult};
    use std::collections::HashMap;

    /// Item view backed by a map; `Err` entries simulate broken reads
    struct MapView(HashMap<FieldKind, Result<String, String>>);

    impl ItemView for MapView {
        fn read(&self, field: FieldKind) -> BrowserResult<Option<String>> {
            match self.0.get(&field) {
                Some(Ok(text)) => Ok(Some(text.clone())),
                Some(Err(message)) => Err(BrowserError::Element {
                    field,
                    message: message.clone(),
                }),
                None => Ok(None),
            }
        }
    }

    fn view(entries: &[(FieldKind, Result<&str, &str>)]) -> MapView {
        MapView(
            entries
                .iter()
                .map(|(k, v)| (*k, v.map(String::from).map_err(String::from)))
                .collect(),
        )
    }

    #[test]
    fn test_full_listing() {
        let view = view(&[
            (FieldKind::Name, Ok("  Blue Door\n Cafe ")),
            (FieldKind::Category, Ok("Coffee shop")),
            (FieldKind::Address, Ok("Address: 12 Pike St, Seattle, WA")),
            (FieldKind::Phone, Ok("Phone: (206) 555-0123 ")),
            (FieldKind::Website, Ok("bluedoor.example")),
            (FieldKind::Rating, Ok("4.6 stars ")),
            (FieldKind::Reviews, Ok("1,204 reviews")),
        ]);
        let record = extract(&view);

        assert_eq!(record.name, Field::Value("Blue Door Cafe".to_string()));
        assert_eq!(
            record.address,
            Field::Value("12 Pike St, Seattle, WA".to_string())
        );
        assert_eq!(record.phone, Field::Value("(206) 555-0123".to_string()));
        assert_eq!(record.website, Field::Value("bluedoor.example".to_string()));
        assert_eq!(record.rating, Field::Value(4.6));
        assert_eq!(record.review_count, Field::Value(1204));
        assert!(!record.phone_valid);
        assert_eq!(record.lead_score, 0);
    }

    #[test]
    fn test_failed_field_does_not_blank_others() {
        let view = view(&[
            (FieldKind::Name, Ok("Blue Door Cafe")),
            (FieldKind::Phone, Err("stale element")),
            (FieldKind::Rating, Err("detached")),
            (FieldKind::Reviews, Ok("(37)")),
        ]);
        let record = extract(&view);

        assert_eq!(record.name, Field::Value("Blue Door Cafe".to_string()));
        assert!(record.phone.is_absent());
        assert!(record.rating.is_absent());
        assert!(record.category.is_absent());
        assert_eq!(record.review_count, Field::Value(37));
    }

    #[test]
    fn test_empty_view_yields_absent_record() {
        let record = extract(&view(&[]));
        assert_eq!(record, BusinessRecord::absent());
        assert!(!record.has_any_field());
    }

    #[test]
    fn test_blank_and_unparsable_values_are_absent() {
        let view = view(&[
            (FieldKind::Name, Ok("   ")),
            (FieldKind::Rating, Ok("no rating")),
            (FieldKind::Reviews, Ok("reviews")),
        ]);
        let record = extract(&view);

        assert!(record.name.is_absent());
        assert!(record.rating.is_absent());
        assert!(record.review_count.is_absent());
    }

    #[test]
    fn test_website_redirect_is_unwrapped() {
        let view = view(&[(
            FieldKind::Website,
            Ok("Website: https://www.google.com/url?q=https://bluedoor.example/&sa=U"),
        )]);
        let record = extract(&view);
        assert_eq!(
            record.website,
            Field::Value("https://bluedoor.example/".to_string())
        );
    }

    #[test]
    fn test_unwrap_redirect() {
        assert_eq!(
            unwrap_redirect("/url?q=http%3A%2F%2Fbluedoor.example%2Fmenu&opi=1"),
            "http://bluedoor.example/menu"
        );
        assert_eq!(
            unwrap_redirect("https://bluedoor.example/"),
            "https://bluedoor.example/"
        );
        assert_eq!(unwrap_redirect("/url?sa=t"), "/url?sa=t");
    }

    #[test]
    fn test_strip_label_is_case_insensitive() {
        assert_eq!(strip_label("PHONE: 555", FieldKind::Phone), " 555");
        assert_eq!(strip_label("Phone: 555", FieldKind::Name), "Phone: 555");
        assert_eq!(strip_label("12 Pike St", FieldKind::Address), "12 Pike St");
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("4.5 stars"), Some(4.5));
        assert_eq!(parse_rating("Rated 3 out of 5"), Some(3.0));
        assert_eq!(parse_rating("4. stars"), Some(4.0));
        assert_eq!(parse_rating("7.2"), None);
        assert_eq!(parse_rating("none"), None);
    }

    #[test]
    fn test_parse_review_count() {
        assert_eq!(parse_review_count("(1,234)"), Some(1234));
        assert_eq!(parse_review_count("56 reviews"), Some(56));
        assert_eq!(parse_review_count("12, 5"), Some(12));
        assert_eq!(parse_review_count("no reviews"), None);
    }
}

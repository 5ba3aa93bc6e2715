use crate::model::field::{Field, ABSENT_MARKER};
use std::fmt;

/// Output column order, shared by the writer and the resume header check
pub const CSV_COLUMNS: [&str; 10] = [
    "name",
    "category",
    "address",
    "phone",
    "phone_valid",
    "website",
    "website_valid",
    "rating",
    "reviews",
    "lead_score",
];

/// The readable fields of one listing's detail view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Name,
    Category,
    Address,
    Phone,
    Website,
    Rating,
    Reviews,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Address => "address",
            Self::Phone => "phone",
            Self::Website => "website",
            Self::Rating => "rating",
            Self::Reviews => "reviews",
        }
    }

    /// Every field, in detail-view reading order
    pub fn all() -> [Self; 7] {
        [
            Self::Name,
            Self::Category,
            Self::Address,
            Self::Phone,
            Self::Website,
            Self::Rating,
            Self::Reviews,
        ]
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scraped business
///
/// The extractor fills the raw fields; the validator then sets the phone
/// normalisation, both validity flags and the lead score.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BusinessRecord {
    pub name: Field<String>,
    pub category: Field<String>,
    pub address: Field<String>,
    /// Phone text as shown on the listing
    pub phone: Field<String>,
    /// E.164 form, present only when the number is valid
    pub phone_normalized: Field<String>,
    pub phone_valid: bool,
    pub website: Field<String>,
    pub website_valid: bool,
    /// 0.0 to 5.0
    pub rating: Field<f32>,
    pub review_count: Field<u32>,
    /// 0 to 100
    pub lead_score: u8,
}

impl BusinessRecord {
    /// A record with every field set to the absent-marker
    pub fn absent() -> Self {
        Self::default()
    }

    /// True when at least one raw field was extracted
    pub fn has_any_field(&self) -> bool {
        FieldKind::all().iter().any(|&kind| self.has_field(kind))
    }

    /// True when the raw field for `kind` was extracted
    pub fn has_field(&self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::Name => self.name.is_present(),
            FieldKind::Category => self.category.is_present(),
            FieldKind::Address => self.address.is_present(),
            FieldKind::Phone => self.phone.is_present(),
            FieldKind::Website => self.website.is_present(),
            FieldKind::Rating => self.rating.is_present(),
            FieldKind::Reviews => self.review_count.is_present(),
        }
    }

    /// Case-insensitive key used for duplicate suppression
    ///
    /// Records without a name have no key and are never treated as duplicates.
    pub fn dedup_key(&self) -> Option<String> {
        self.name.value().and_then(|name| name_key(name))
    }

    /// Renders the record in `CSV_COLUMNS` order
    pub fn to_csv_row(&self) -> Vec<String> {
        let phone = match (&self.phone_normalized, self.phone_valid) {
            (Field::Value(normalized), true) => normalized.clone(),
            _ => self.phone.to_string(),
        };

        vec![
            self.name.to_string(),
            self.category.to_string(),
            self.address.to_string(),
            phone,
            format_bool(self.phone_valid).to_string(),
            self.website.to_string(),
            format_bool(self.website_valid).to_string(),
            self.rating.map(|r| format!("{:.1}", r)).to_string(),
            self.review_count.to_string(),
            self.lead_score.to_string(),
        ]
    }
}

/// Normalizes a business name for duplicate comparison
///
/// Returns None for blank names and for the absent-marker as it appears in
/// an existing output file.
pub fn name_key(name: &str) -> Option<String> {
    let key = name.trim().to_lowercase();
    if key.is_empty() || key == ABSENT_MARKER.to_lowercase() {
        None
    } else {
        Some(key)
    }
}

/// Boolean spelling used in the CSV output
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

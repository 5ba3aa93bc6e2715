use std::fmt;

/// Text written in place of a field that could not be extracted
pub const ABSENT_MARKER: &str = "N/A";

/// A best-effort extracted value
///
/// `Absent` is an explicit state, distinct from an empty string: it means the
/// extractor tried and could not read the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<T> {
    Value(T),
    Absent,
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Borrows the inner value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Self::Value(v) => Field::Value(f(v)),
            Self::Absent => Field::Absent,
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Absent,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{}", v),
            Self::Absent => f.write_str(ABSENT_MARKER),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_absent() {
        let field: Field<String> = Field::default();
        assert!(field.is_absent());
        assert_eq!(field.to_string(), "N/A");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Field::from(Some(3)), Field::Value(3));
        assert_eq!(Field::<u32>::from(None), Field::Absent);
    }

    #[test]
    fn test_empty_string_is_a_value() {
        let field = Field::Value(String::new());
        assert!(field.is_present());
        assert_eq!(field.to_string(), "");
    }

    #[test]
    fn test_map_preserves_absence() {
        let absent: Field<u32> = Field::Absent;
        assert_eq!(absent.map(|v| v * 2), Field::Absent);
        assert_eq!(Field::Value(4).map(|v| v * 2), Field::Value(8));
    }
}

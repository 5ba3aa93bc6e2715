//! Validation and lead scoring
//!
//! `Validator::validate` is total: phone parsing failures and website probe
//! failures become `false` flags, never errors.

mod phone;
mod scoring;
mod website;

pub use phone::{validate_phone, PhoneCheck};
pub use scoring::lead_score;
pub use website::{build_probe_client, check_website, normalize_website};

use crate::config::{ScoringConfig, ValidationConfig};
use crate::model::{BusinessRecord, Field};
use crate::{ConfigError, ScoutError};
use phonenumber::country::Id;
use reqwest::Client;

/// Validates and scores extracted records
pub struct Validator {
    region: Id,
    scoring: ScoringConfig,
    /// None when website probing is disabled
    client: Option<Client>,
}

impl Validator {
    /// Creates a validator from the validation and scoring sections
    pub fn new(validation: &ValidationConfig, scoring: ScoringConfig) -> Result<Self, ScoutError> {
        let region = validation.default_region.parse::<Id>().map_err(|_| {
            ConfigError::Validation(format!(
                "unknown default region '{}'",
                validation.default_region
            ))
        })?;

        let client = if validation.check_websites {
            Some(build_probe_client(validation)?)
        } else {
            None
        };

        Ok(Self {
            region,
            scoring,
            client,
        })
    }

    /// Fills in phone normalisation, validity flags and the lead score
    pub async fn validate(&self, mut record: BusinessRecord) -> BusinessRecord {
        let phone_check = match &record.phone {
            Field::Value(raw) => validate_phone(raw, self.region.clone()),
            Field::Absent => PhoneCheck {
                normalized: None,
                valid: false,
            },
        };
        record.phone_valid = phone_check.valid;
        record.phone_normalized = phone_check.normalized.into();

        record.website_valid = match (&record.website, &self.client) {
            (Field::Value(site), Some(client)) => check_website(client, site).await,
            _ => false,
        };

        record.lead_score = lead_score(&record, &self.scoring);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn offline_validator() -> Validator {
        let config = ValidationConfig {
            check_websites: false,
            ..ValidationConfig::default()
        };
        Validator::new(&config, ScoringConfig::default()).unwrap()
    }

    #[test]
    fn test_unknown_region_rejected() {
        let config = ValidationConfig {
            default_region: "??".to_string(),
            ..ValidationConfig::default()
        };
        assert!(Validator::new(&config, ScoringConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_absent_record_validates_to_defaults() {
        let record = offline_validator().validate(BusinessRecord::absent()).await;

        assert!(!record.phone_valid);
        assert!(record.phone_normalized.is_absent());
        assert!(!record.website_valid);
        assert_eq!(record.lead_score, 70);
    }

    #[tokio::test]
    async fn test_valid_phone_is_normalized() {
        let record = BusinessRecord {
            phone: Field::Value("(206) 555-0123".to_string()),
            ..BusinessRecord::absent()
        };
        let record = offline_validator().validate(record).await;

        assert!(record.phone_valid);
        assert_eq!(
            record.phone_normalized,
            Field::Value("+12065550123".to_string())
        );
        assert_eq!(record.phone, Field::Value("(206) 555-0123".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_phone_keeps_original_text() {
        let record = BusinessRecord {
            phone: Field::Value("12".to_string()),
            ..BusinessRecord::absent()
        };
        let record = offline_validator().validate(record).await;

        assert!(!record.phone_valid);
        assert!(record.phone_normalized.is_absent());
        assert_eq!(record.phone, Field::Value("12".to_string()));
    }

    #[tokio::test]
    async fn test_disabled_probe_marks_website_invalid() {
        let record = BusinessRecord {
            website: Field::Value("https://bluedoor.example".to_string()),
            ..BusinessRecord::absent()
        };
        let record = offline_validator().validate(record).await;

        assert!(!record.website_valid);
        assert_eq!(record.lead_score, 65);
    }

    #[tokio::test]
    async fn test_reachable_website_is_valid() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let validator =
            Validator::new(&ValidationConfig::default(), ScoringConfig::default()).unwrap();
        let record = BusinessRecord {
            website: Field::Value(server.uri()),
            ..BusinessRecord::absent()
        };
        let record = validator.validate(record).await;

        assert!(record.website_valid);
        assert_eq!(record.lead_score, 50);
    }
}

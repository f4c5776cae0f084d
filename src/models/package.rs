use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ValidationError, check_length};

pub const MIN_PACKAGE_WEIGHT: f64 = 0.1;
pub const MAX_DESCRIPTION_LEN: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub package_id: String,
    pub package_title: String,
    pub package_weight: f64,
    pub package_destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "isAllocated")]
    pub is_allocated: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Store identity of the owning driver.
    pub driver_id: Uuid,
}

impl Package {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_length("package_title", &self.package_title, 3, 15)?;

        if !self.package_weight.is_finite() || self.package_weight < MIN_PACKAGE_WEIGHT {
            return Err(ValidationError::invalid(
                "package_weight",
                format!("must be at least {MIN_PACKAGE_WEIGHT}"),
            ));
        }

        validate_destination(&self.package_destination)?;

        if let Some(description) = &self.description {
            check_length("description", description, 0, MAX_DESCRIPTION_LEN)?;
        }

        Ok(())
    }

    pub fn summary(&self) -> PackageSummary {
        PackageSummary {
            id: self.id,
            package_id: self.package_id.clone(),
            package_title: self.package_title.clone(),
            package_weight: self.package_weight,
            package_destination: self.package_destination.clone(),
            is_allocated: self.is_allocated,
        }
    }
}

pub fn validate_destination(destination: &str) -> Result<(), ValidationError> {
    check_length("package_destination", destination, 5, 15)
}

/// The package fields shown inside a driver listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageSummary {
    pub id: Uuid,
    pub package_id: String,
    pub package_title: String,
    pub package_weight: f64,
    pub package_destination: String,
    #[serde(rename = "isAllocated")]
    pub is_allocated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(title: &str, weight: f64, destination: &str) -> Package {
        Package {
            id: Uuid::new_v4(),
            package_id: "PAB-CD-123".to_string(),
            package_title: title.to_string(),
            package_weight: weight,
            package_destination: destination.to_string(),
            description: None,
            is_allocated: false,
            created_at: Utc::now(),
            driver_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn accepts_well_formed_package() {
        assert_eq!(package("Box1", 2.5, "Sydney").validate(), Ok(()));
    }

    #[test]
    fn weight_has_a_floor() {
        assert_eq!(package("Box1", 0.1, "Sydney").validate(), Ok(()));
        assert!(package("Box1", 0.05, "Sydney").validate().is_err());
        assert!(package("Box1", f64::NAN, "Sydney").validate().is_err());
    }

    #[test]
    fn title_and_destination_lengths_are_bounded() {
        assert!(package("Bx", 1.0, "Sydney").validate().is_err());
        assert!(package("A very long title", 1.0, "Sydney").validate().is_err());
        assert!(package("Box1", 1.0, "Rome").validate().is_err());
        assert!(
            package("Box1", 1.0, "Llanfairpwllgwyngyll")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn description_is_capped() {
        let mut p = package("Box1", 1.0, "Sydney");
        p.description = Some("x".repeat(30));
        assert_eq!(p.validate(), Ok(()));
        p.description = Some("x".repeat(31));
        assert!(p.validate().is_err());
    }
}

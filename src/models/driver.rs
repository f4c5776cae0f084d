use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::package::PackageSummary;
use crate::models::{ValidationError, check_length};

pub static DRIVER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^D\d{2}-\d{2}-[A-Z]{3}$").expect("valid driver id pattern"));

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Food,
    Furniture,
    Electronic,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Food => "food",
            Department::Furniture => "furniture",
            Department::Electronic => "electronic",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "food" => Ok(Department::Food),
            "furniture" => Ok(Department::Furniture),
            "electronic" => Ok(Department::Electronic),
            other => Err(ValidationError::invalid(
                "driver_department",
                format!("`{other}` is not one of food, furniture, electronic"),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub driver_id: String,
    pub driver_name: String,
    pub driver_licence: String,
    #[serde(rename = "driver_isActive")]
    pub is_active: bool,
    pub driver_department: Department,
    #[serde(rename = "driver_createdAt")]
    pub created_at: DateTime<Utc>,
    pub assigned_packages: Vec<Uuid>,
}

impl Driver {
    /// Checks every field the store schema constrains.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !DRIVER_ID_PATTERN.is_match(&self.driver_id) {
            return Err(ValidationError::invalid(
                "driver_id",
                format!("`{}` does not match Dxx-yy-XXX", self.driver_id),
            ));
        }

        check_length("driver_name", &self.driver_name, 3, 20)?;
        if !self.driver_name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid(
                "driver_name",
                "only alphabetic characters are allowed",
            ));
        }

        let licence_ok = self.driver_licence.len() == 5
            && self.driver_licence.chars().all(|c| c.is_ascii_alphanumeric());
        if !licence_ok {
            return Err(ValidationError::invalid(
                "driver_licence",
                "must be exactly 5 alphanumeric characters",
            ));
        }

        Ok(())
    }
}

/// Driver as listed through the API, with its packages expanded.
#[derive(Debug, Clone, Serialize)]
pub struct DriverView {
    pub id: Uuid,
    pub driver_id: String,
    pub driver_name: String,
    pub driver_licence: String,
    #[serde(rename = "driver_isActive")]
    pub is_active: bool,
    pub driver_department: Department,
    #[serde(rename = "driver_createdAt")]
    pub created_at: DateTime<Utc>,
    pub assigned_packages: Vec<PackageSummary>,
}

impl DriverView {
    pub fn new(driver: Driver, assigned_packages: Vec<PackageSummary>) -> Self {
        Self {
            id: driver.id,
            driver_id: driver.driver_id,
            driver_name: driver.driver_name,
            driver_licence: driver.driver_licence,
            is_active: driver.is_active,
            driver_department: driver.driver_department,
            created_at: driver.created_at,
            assigned_packages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentGroup {
    pub department: Department,
    pub drivers: Vec<Driver>,
}

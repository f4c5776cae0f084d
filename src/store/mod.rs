//! Record store seam.
//!
//! Operations are shaped after a document database: filters select
//! records, updates patch them, and mutating calls report how many
//! records they touched.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::driver::{DepartmentGroup, Driver};
use crate::models::package::Package;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {field} `{value}`")]
    Duplicate { field: &'static str, value: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverFilter {
    All,
    Identity(Uuid),
    DriverId(String),
    /// Drivers whose `assigned_packages` contains the package.
    Assigned(Uuid),
}

impl DriverFilter {
    pub fn matches(&self, driver: &Driver) -> bool {
        match self {
            DriverFilter::All => true,
            DriverFilter::Identity(id) => driver.id == *id,
            DriverFilter::DriverId(driver_id) => driver.driver_id == *driver_id,
            DriverFilter::Assigned(package) => driver.assigned_packages.contains(package),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PackageFilter {
    All,
    Identity(Uuid),
    PackageId(String),
    IdentityIn(Vec<Uuid>),
    /// Packages owned by the driver or listed in `assigned`.
    BelongingTo { driver: Uuid, assigned: Vec<Uuid> },
}

impl PackageFilter {
    pub fn matches(&self, package: &Package) -> bool {
        match self {
            PackageFilter::All => true,
            PackageFilter::Identity(id) => package.id == *id,
            PackageFilter::PackageId(package_id) => package.package_id == *package_id,
            PackageFilter::IdentityIn(ids) => ids.contains(&package.id),
            PackageFilter::BelongingTo { driver, assigned } => {
                package.driver_id == *driver || assigned.contains(&package.id)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverUpdate {
    PushPackage(Uuid),
    PullPackage(Uuid),
}

impl DriverUpdate {
    /// Applies the update, returning whether the record changed.
    pub fn apply(&self, driver: &mut Driver) -> bool {
        match self {
            DriverUpdate::PushPackage(package) => {
                if driver.assigned_packages.contains(package) {
                    return false;
                }
                driver.assigned_packages.push(*package);
                true
            }
            DriverUpdate::PullPackage(package) => {
                let before = driver.assigned_packages.len();
                driver.assigned_packages.retain(|id| id != package);
                driver.assigned_packages.len() != before
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PackageUpdate {
    Destination(String),
}

impl PackageUpdate {
    pub fn apply(&self, package: &mut Package) {
        match self {
            PackageUpdate::Destination(destination) => {
                package.package_destination = destination.clone();
            }
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_driver(&self, driver: Driver) -> Result<Uuid, StoreError>;
    async fn find_driver(&self, filter: &DriverFilter) -> Result<Option<Driver>, StoreError>;
    async fn find_drivers(&self, filter: &DriverFilter) -> Result<Vec<Driver>, StoreError>;
    async fn update_drivers(
        &self,
        filter: &DriverFilter,
        update: &DriverUpdate,
    ) -> Result<u64, StoreError>;
    async fn delete_driver(&self, filter: &DriverFilter) -> Result<u64, StoreError>;
    async fn count_drivers(&self) -> Result<u64, StoreError>;
    async fn drivers_by_department(&self) -> Result<Vec<DepartmentGroup>, StoreError>;

    async fn insert_package(&self, package: Package) -> Result<Uuid, StoreError>;
    async fn find_package(&self, filter: &PackageFilter) -> Result<Option<Package>, StoreError>;
    async fn find_packages(&self, filter: &PackageFilter) -> Result<Vec<Package>, StoreError>;
    /// Updates the first matching package; returns the number matched.
    async fn update_package(
        &self,
        filter: &PackageFilter,
        update: &PackageUpdate,
    ) -> Result<u64, StoreError>;
    async fn delete_package(&self, filter: &PackageFilter) -> Result<u64, StoreError>;
    async fn delete_packages(&self, filter: &PackageFilter) -> Result<u64, StoreError>;
    async fn count_packages(&self) -> Result<u64, StoreError>;
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::models::driver::{DepartmentGroup, Driver};
use crate::models::package::Package;
use crate::store::{
    DriverFilter, DriverUpdate, PackageFilter, PackageUpdate, RecordStore, StoreError,
};

/// In-process record store.
///
/// Business identifiers are indexed separately so the uniqueness check and
/// the claim happen under one shard lock. Index locks are always taken
/// before record locks.
#[derive(Default)]
pub struct MemoryStore {
    drivers: DashMap<Uuid, Driver>,
    driver_index: DashMap<String, Uuid>,
    packages: DashMap<Uuid, Package>,
    package_index: DashMap<String, Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn driver_keys(&self, filter: &DriverFilter) -> Vec<Uuid> {
        match filter {
            DriverFilter::Identity(id) => {
                self.drivers.contains_key(id).then_some(*id).into_iter().collect()
            }
            DriverFilter::DriverId(driver_id) => self
                .driver_index
                .get(driver_id)
                .map(|entry| *entry.value())
                .into_iter()
                .collect(),
            _ => self
                .drivers
                .iter()
                .filter(|entry| filter.matches(entry.value()))
                .map(|entry| *entry.key())
                .collect(),
        }
    }

    fn package_keys(&self, filter: &PackageFilter) -> Vec<Uuid> {
        match filter {
            PackageFilter::Identity(id) => {
                self.packages.contains_key(id).then_some(*id).into_iter().collect()
            }
            PackageFilter::PackageId(package_id) => self
                .package_index
                .get(package_id)
                .map(|entry| *entry.value())
                .into_iter()
                .collect(),
            _ => self
                .packages
                .iter()
                .filter(|entry| filter.matches(entry.value()))
                .map(|entry| *entry.key())
                .collect(),
        }
    }

    fn remove_driver(&self, id: &Uuid) -> bool {
        match self.drivers.remove(id) {
            Some((_, driver)) => {
                self.driver_index
                    .remove_if(&driver.driver_id, |_, indexed| indexed == id);
                true
            }
            None => false,
        }
    }

    fn remove_package(&self, id: &Uuid) -> bool {
        match self.packages.remove(id) {
            Some((_, package)) => {
                self.package_index
                    .remove_if(&package.package_id, |_, indexed| indexed == id);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_driver(&self, driver: Driver) -> Result<Uuid, StoreError> {
        match self.driver_index.entry(driver.driver_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                field: "driver_id",
                value: driver.driver_id,
            }),
            Entry::Vacant(slot) => {
                let id = driver.id;
                slot.insert(id);
                self.drivers.insert(id, driver);
                Ok(id)
            }
        }
    }

    async fn find_driver(&self, filter: &DriverFilter) -> Result<Option<Driver>, StoreError> {
        Ok(self
            .driver_keys(filter)
            .into_iter()
            .find_map(|id| self.drivers.get(&id).map(|entry| entry.value().clone())))
    }

    async fn find_drivers(&self, filter: &DriverFilter) -> Result<Vec<Driver>, StoreError> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by_key(|driver| driver.created_at);
        Ok(drivers)
    }

    async fn update_drivers(
        &self,
        filter: &DriverFilter,
        update: &DriverUpdate,
    ) -> Result<u64, StoreError> {
        let mut modified = 0;
        for id in self.driver_keys(filter) {
            if let Some(mut driver) = self.drivers.get_mut(&id) {
                if filter.matches(&driver) && update.apply(&mut driver) {
                    modified += 1;
                }
            }
        }
        Ok(modified)
    }

    async fn delete_driver(&self, filter: &DriverFilter) -> Result<u64, StoreError> {
        let deleted = self
            .driver_keys(filter)
            .first()
            .is_some_and(|id| self.remove_driver(id));
        Ok(u64::from(deleted))
    }

    async fn count_drivers(&self) -> Result<u64, StoreError> {
        Ok(self.drivers.len() as u64)
    }

    async fn drivers_by_department(&self) -> Result<Vec<DepartmentGroup>, StoreError> {
        let mut groups: BTreeMap<_, Vec<Driver>> = BTreeMap::new();
        for driver in self.find_drivers(&DriverFilter::All).await? {
            groups
                .entry(driver.driver_department)
                .or_default()
                .push(driver);
        }

        Ok(groups
            .into_iter()
            .map(|(department, drivers)| DepartmentGroup {
                department,
                drivers,
            })
            .collect())
    }

    async fn insert_package(&self, package: Package) -> Result<Uuid, StoreError> {
        match self.package_index.entry(package.package_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                field: "package_id",
                value: package.package_id,
            }),
            Entry::Vacant(slot) => {
                let id = package.id;
                slot.insert(id);
                self.packages.insert(id, package);
                Ok(id)
            }
        }
    }

    async fn find_package(&self, filter: &PackageFilter) -> Result<Option<Package>, StoreError> {
        Ok(self
            .package_keys(filter)
            .into_iter()
            .find_map(|id| self.packages.get(&id).map(|entry| entry.value().clone())))
    }

    async fn find_packages(&self, filter: &PackageFilter) -> Result<Vec<Package>, StoreError> {
        let mut packages: Vec<Package> = self
            .packages
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        packages.sort_by_key(|package| package.created_at);
        Ok(packages)
    }

    async fn update_package(
        &self,
        filter: &PackageFilter,
        update: &PackageUpdate,
    ) -> Result<u64, StoreError> {
        let Some(id) = self.package_keys(filter).first().copied() else {
            return Ok(0);
        };

        match self.packages.get_mut(&id) {
            Some(mut package) => {
                update.apply(&mut package);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_package(&self, filter: &PackageFilter) -> Result<u64, StoreError> {
        let deleted = self
            .package_keys(filter)
            .first()
            .is_some_and(|id| self.remove_package(id));
        Ok(u64::from(deleted))
    }

    async fn delete_packages(&self, filter: &PackageFilter) -> Result<u64, StoreError> {
        let deleted = self
            .package_keys(filter)
            .iter()
            .filter(|id| self.remove_package(id))
            .count();
        Ok(deleted as u64)
    }

    async fn count_packages(&self) -> Result<u64, StoreError> {
        Ok(self.packages.len() as u64)
    }
}

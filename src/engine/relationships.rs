//! Driver/package relationship maintenance.
//!
//! A package's `driver_id` is the authoritative side of the relationship.
//! The driver's `assigned_packages` list is kept in step with a second
//! write; the store offers no transaction spanning both collections, so a
//! failed second write is logged and counted rather than rolled back.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ValidationError;
use crate::models::driver::{DepartmentGroup, Department, Driver, DriverView};
use crate::models::package::{Package, PackageSummary, validate_destination};
use crate::state::AppState;
use crate::store::{DriverFilter, DriverUpdate, PackageFilter, PackageUpdate};

#[derive(Debug, Clone, Default)]
pub struct NewDriver {
    pub name: Option<String>,
    pub department: Option<String>,
    pub licence: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPackage {
    pub title: Option<String>,
    pub weight: Option<f64>,
    pub destination: Option<String>,
    pub description: Option<String>,
    pub is_allocated: Option<bool>,
    /// Store identity of the owning driver, as received.
    pub driver_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedRecord {
    pub id: Uuid,
    pub business_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverDeletion {
    pub deleted_driver_count: u64,
    pub deleted_package_count: u64,
}

pub async fn add_driver(state: &AppState, new: NewDriver) -> Result<CreatedRecord, AppError> {
    let (Some(name), Some(department), Some(licence)) = (
        present(new.name),
        present(new.department),
        present(new.licence),
    ) else {
        return Err(ValidationError::MissingFields(
            "All fields are required: driver_name, driver_department, driver_licence.".to_string(),
        )
        .into());
    };

    let driver = Driver {
        id: Uuid::new_v4(),
        driver_id: state.ids.driver_id(),
        driver_name: name,
        driver_licence: licence,
        is_active: new.is_active.unwrap_or(true),
        driver_department: department.parse::<Department>()?,
        created_at: Utc::now(),
        assigned_packages: Vec::new(),
    };
    driver.validate()?;

    let driver_id = driver.driver_id.clone();
    let id = state.store.insert_driver(driver).await?;

    state
        .metrics
        .records_created_total
        .with_label_values(&["driver"])
        .inc();
    info!(id = %id, driver_id = %driver_id, "driver added");

    Ok(CreatedRecord {
        id,
        business_id: driver_id,
    })
}

pub async fn add_package(state: &AppState, new: NewPackage) -> Result<CreatedRecord, AppError> {
    let start = Instant::now();

    let (Some(title), Some(weight), Some(destination), Some(raw_driver_id)) = (
        present(new.title),
        new.weight,
        present(new.destination),
        present(new.driver_id),
    ) else {
        return Err(ValidationError::MissingFields(
            "All fields are required: package_title, package_weight, package_destination, driver_id."
                .to_string(),
        )
        .into());
    };

    let owner = Uuid::parse_str(raw_driver_id.trim()).map_err(|err| {
        ValidationError::invalid("driver_id", format!("`{raw_driver_id}` is not a record id: {err}"))
    })?;

    let package = Package {
        id: Uuid::new_v4(),
        package_id: state
            .ids
            .package_id(new.first_name.as_deref(), new.last_name.as_deref()),
        package_title: title,
        package_weight: weight,
        package_destination: destination,
        description: present(new.description),
        is_allocated: new.is_allocated.unwrap_or(false),
        created_at: Utc::now(),
        driver_id: owner,
    };
    package.validate()?;

    if state
        .store
        .find_driver(&DriverFilter::Identity(owner))
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!("driver {owner} not found")));
    }

    let package_id = package.package_id.clone();
    let id = state.store.insert_package(package).await?;

    state
        .metrics
        .records_created_total
        .with_label_values(&["package"])
        .inc();

    match state
        .store
        .update_drivers(&DriverFilter::Identity(owner), &DriverUpdate::PushPackage(id))
        .await
    {
        Ok(_) => {}
        Err(err) => {
            warn!(
                error = %err,
                package = %id,
                driver = %owner,
                "package stored but not listed on its driver"
            );
            record_repair_failure(state, "add_package");
        }
    }

    observe(state, "add_package", start);
    info!(id = %id, package_id = %package_id, driver = %owner, "package added");

    Ok(CreatedRecord {
        id,
        business_id: package_id,
    })
}

/// Deletes the driver with the given business id along with every package
/// it owns or lists. Listed packages owned by another driver are pulled from
/// that driver's list too.
pub async fn delete_driver(state: &AppState, driver_id: &str) -> Result<DriverDeletion, AppError> {
    let start = Instant::now();

    let driver = state
        .store
        .find_driver(&DriverFilter::DriverId(driver_id.to_string()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;

    let cascade = PackageFilter::BelongingTo {
        driver: driver.id,
        assigned: driver.assigned_packages.clone(),
    };
    // Listed packages owned by someone else are also on their owner's list.
    let foreign: Vec<Uuid> = state
        .store
        .find_packages(&cascade)
        .await?
        .into_iter()
        .filter(|package| package.driver_id != driver.id)
        .map(|package| package.id)
        .collect();

    let deleted_package_count = state.store.delete_packages(&cascade).await?;

    for package in foreign {
        if let Err(err) = state
            .store
            .update_drivers(
                &DriverFilter::Assigned(package),
                &DriverUpdate::PullPackage(package),
            )
            .await
        {
            warn!(error = %err, package = %package, "package deleted but still listed on its owner");
            record_repair_failure(state, "delete_driver");
        }
    }

    let deleted_driver_count = match state
        .store
        .delete_driver(&DriverFilter::Identity(driver.id))
        .await
    {
        Ok(count) => count,
        Err(err) => {
            warn!(
                error = %err,
                driver_id = %driver_id,
                deleted_packages = deleted_package_count,
                "packages deleted but driver record remains"
            );
            record_repair_failure(state, "delete_driver");
            return Err(err.into());
        }
    };

    state
        .metrics
        .records_deleted_total
        .with_label_values(&["package"])
        .inc_by(deleted_package_count);
    state
        .metrics
        .records_deleted_total
        .with_label_values(&["driver"])
        .inc_by(deleted_driver_count);
    observe(state, "delete_driver", start);

    info!(
        driver_id = %driver_id,
        deleted_packages = deleted_package_count,
        "driver deleted"
    );

    Ok(DriverDeletion {
        deleted_driver_count,
        deleted_package_count,
    })
}

/// Deletes a package by store identity and pulls it from every driver
/// that lists it.
pub async fn delete_package(state: &AppState, id: Uuid) -> Result<u64, AppError> {
    let start = Instant::now();

    let deleted = state
        .store
        .delete_package(&PackageFilter::Identity(id))
        .await?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("package {id} not found")));
    }

    state
        .metrics
        .records_deleted_total
        .with_label_values(&["package"])
        .inc_by(deleted);

    match state
        .store
        .update_drivers(&DriverFilter::Assigned(id), &DriverUpdate::PullPackage(id))
        .await
    {
        Ok(modified) => debug!(package = %id, drivers = modified, "package references pulled"),
        Err(err) => {
            warn!(error = %err, package = %id, "package deleted but still listed on a driver");
            record_repair_failure(state, "delete_package");
        }
    }

    observe(state, "delete_package", start);
    info!(package = %id, "package deleted");

    Ok(deleted)
}

pub async fn delete_package_by_business_id(
    state: &AppState,
    package_id: &str,
) -> Result<u64, AppError> {
    let package = state
        .store
        .find_package(&PackageFilter::PackageId(package_id.to_string()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("package {package_id} not found")))?;

    delete_package(state, package.id).await
}

pub async fn update_package_destination(
    state: &AppState,
    package_id: &str,
    destination: &str,
) -> Result<(), AppError> {
    validate_destination(destination)?;

    let matched = state
        .store
        .update_package(
            &PackageFilter::PackageId(package_id.to_string()),
            &PackageUpdate::Destination(destination.to_string()),
        )
        .await?;

    if matched == 0 {
        return Err(AppError::NotFound(format!("package {package_id} not found")));
    }

    info!(package_id = %package_id, destination = %destination, "package destination updated");
    Ok(())
}

/// Every driver with its listed packages expanded. References that no
/// longer resolve are skipped.
pub async fn list_drivers(state: &AppState) -> Result<Vec<DriverView>, AppError> {
    let drivers = state.store.find_drivers(&DriverFilter::All).await?;

    let referenced: Vec<Uuid> = drivers
        .iter()
        .flat_map(|driver| driver.assigned_packages.iter().copied())
        .collect();
    let packages: HashMap<Uuid, PackageSummary> = state
        .store
        .find_packages(&PackageFilter::IdentityIn(referenced))
        .await?
        .iter()
        .map(|package| (package.id, package.summary()))
        .collect();

    Ok(drivers
        .into_iter()
        .map(|driver| {
            let assigned = driver
                .assigned_packages
                .iter()
                .filter_map(|id| packages.get(id).cloned())
                .collect();
            DriverView::new(driver, assigned)
        })
        .collect())
}

pub async fn list_packages(state: &AppState) -> Result<Vec<Package>, AppError> {
    Ok(state.store.find_packages(&PackageFilter::All).await?)
}

pub async fn drivers_by_department(state: &AppState) -> Result<Vec<DepartmentGroup>, AppError> {
    Ok(state.store.drivers_by_department().await?)
}

/// `(drivers, packages)`
pub async fn counts(state: &AppState) -> Result<(u64, u64), AppError> {
    Ok((
        state.store.count_drivers().await?,
        state.store.count_packages().await?,
    ))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn record_repair_failure(state: &AppState, operation: &str) {
    state
        .metrics
        .relationship_repair_failures_total
        .with_label_values(&[operation])
        .inc();
}

fn observe(state: &AppState, operation: &str, start: Instant) {
    state
        .metrics
        .relationship_op_latency_seconds
        .with_label_values(&[operation])
        .observe(start.elapsed().as_secs_f64());
}

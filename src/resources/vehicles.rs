//! Vehicle assignment for GPS devices
//!
//! The `asignar_vehiculo` action both lists the candidates for a device and
//! performs the assignment; `accion` in the body selects which.

use serde::{Deserialize, Serialize};

use crate::api::de;
use crate::error::{DashboardError, Result};

/// Vehicle a device can be attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(deserialize_with = "de::int_from_any")]
    pub id: i64,
    #[serde(rename = "nro_serie", default, deserialize_with = "de::string_from_any")]
    pub serial_number: String,
    #[serde(rename = "modelo", default, deserialize_with = "de::string_from_any")]
    pub model: String,
    #[serde(rename = "nro_interno", default, deserialize_with = "de::string_from_any")]
    pub internal_number: String,
    #[serde(rename = "patente", default, deserialize_with = "de::string_from_any")]
    pub plate: String,
    #[serde(
        rename = "FechaHoraRecepcionUltimaPos",
        default,
        deserialize_with = "de::opt_string_from_any"
    )]
    pub last_position_at: Option<String>,
    #[serde(rename = "ultimo_imei", default, deserialize_with = "de::opt_string_from_any")]
    pub last_imei: Option<String>,
}

impl Vehicle {
    /// Selector label, `<internal number> - <plate>`
    pub fn label(&self) -> String {
        format!("{} - {}", self.internal_number, self.plate)
    }
}

/// Vehicle owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(deserialize_with = "de::int_from_any")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::string_from_any")]
    pub rut: String,
    #[serde(rename = "nombre", default, deserialize_with = "de::string_from_any")]
    pub name: String,
}

/// Candidates offered when assigning a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentOptions {
    #[serde(rename = "vehiculos", default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(rename = "propietarios", default)]
    pub owners: Vec<Owner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentStep {
    #[serde(rename = "listar")]
    List,
    #[serde(rename = "asignar_existente")]
    AssignExisting,
    #[serde(rename = "crear_nuevo")]
    CreateNew,
}

/// Body of an `asignar_vehiculo` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleAssignment {
    #[serde(rename = "id_equipo")]
    pub device_id: i64,
    #[serde(rename = "accion")]
    pub step: AssignmentStep,
    #[serde(rename = "id_vehiculo", skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    #[serde(rename = "patente", skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(rename = "nro_interno", skip_serializing_if = "Option::is_none")]
    pub internal_number: Option<String>,
    #[serde(rename = "rut_propietario", skip_serializing_if = "Option::is_none")]
    pub owner_rut: Option<String>,
    #[serde(rename = "fecha_vencimiento", skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<String>,
}

impl VehicleAssignment {
    fn bare(device_id: i64, step: AssignmentStep) -> Self {
        Self {
            device_id,
            step,
            vehicle_id: None,
            plate: None,
            internal_number: None,
            owner_rut: None,
            expires_on: None,
        }
    }

    /// Ask for the vehicles and owners a device can be assigned to
    pub fn list(device_id: i64) -> Self {
        Self::bare(device_id, AssignmentStep::List)
    }

    /// Attach the device to a vehicle that already exists
    pub fn existing(device_id: i64, vehicle_id: i64) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            ..Self::bare(device_id, AssignmentStep::AssignExisting)
        }
    }

    /// Create a vehicle and attach the device to it
    pub fn new_vehicle(device_id: i64, vehicle: NewVehicle) -> Result<Self> {
        let errors = vehicle.validate();
        if !errors.is_empty() {
            return Err(DashboardError::Validation(errors));
        }
        let expires_on = Some(vehicle.expires_on.trim().to_string()).filter(|d| !d.is_empty());
        Ok(Self {
            plate: Some(vehicle.plate.trim().to_string()),
            internal_number: Some(vehicle.internal_number.trim().to_string()),
            owner_rut: Some(vehicle.owner_rut.trim().to_string()),
            expires_on,
            ..Self::bare(device_id, AssignmentStep::CreateNew)
        })
    }
}

/// Vehicle entered by hand when none of the listed ones fits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVehicle {
    pub plate: String,
    pub internal_number: String,
    pub owner_rut: String,
    /// Optional, `YYYY-MM-DD`
    pub expires_on: String,
}

impl NewVehicle {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.plate.trim().is_empty() {
            errors.push("plate is required".to_string());
        }
        if self.internal_number.trim().is_empty() {
            errors.push("internal number is required".to_string());
        }
        if self.owner_rut.trim().is_empty() {
            errors.push("owner RUT is required".to_string());
        }
        errors
    }
}

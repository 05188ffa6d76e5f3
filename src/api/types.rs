//! Response and request schemas for the property-management API.
//!
//! Field names follow the API's camelCase JSON. Money travels as decimal
//! strings; some endpoints send bare numbers, so amounts accept either.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Accept `"1450.00"` or `1450` for a money field.
fn amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Amount {
    Text(String),
    Number(serde_json::Number),
  }

  Ok(match Amount::deserialize(deserializer)? {
    Amount::Text(s) => s,
    Amount::Number(n) => n.to_string(),
  })
}

/// A managed property
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
  pub id: u64,
  pub name: String,
  pub address: String,
  #[serde(default)]
  pub city: Option<String>,
  #[serde(default)]
  pub property_type: Option<String>,
  #[serde(default)]
  pub unit_count: Option<u32>,
}

/// A rentable unit inside a property
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
  pub id: u64,
  pub property_id: u64,
  pub label: String,
  #[serde(default)]
  pub bedrooms: Option<u32>,
  #[serde(default)]
  pub status: Option<String>, // "vacant", "occupied", "turnover"
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
  pub id: u64,
  pub first_name: String,
  pub last_name: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
}

impl Tenant {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
  pub id: u64,
  pub property_id: u64,
  #[serde(default)]
  pub unit_id: Option<u64>,
  pub tenant_id: u64,
  pub start_date: NaiveDate,
  #[serde(default)]
  pub end_date: Option<NaiveDate>,
  #[serde(deserialize_with = "amount")]
  pub rent_amount: String,
  pub status: String,
}

/// Rent invoice issued against a lease
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
  pub id: u64,
  pub lease_id: u64,
  pub due_date: NaiveDate,
  #[serde(deserialize_with = "amount")]
  pub amount: String,
  pub status: String, // "open", "paid", "overdue"
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
  pub id: u64,
  pub property_id: u64,
  pub category: String,
  #[serde(deserialize_with = "amount")]
  pub amount: String,
  pub incurred_on: NaiveDate,
  #[serde(default)]
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequest {
  pub id: u64,
  pub property_id: u64,
  #[serde(default)]
  pub unit_id: Option<u64>,
  pub title: String,
  pub status: String, // "open", "in_progress", "resolved"
  #[serde(default)]
  pub priority: Option<String>,
}

/// Member of an owner's team
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
  pub id: u64,
  pub email: String,
  pub role: String,
  #[serde(default)]
  pub name: Option<String>,
}

/// Pending invitation to join an owner's team
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
  pub id: u64,
  pub email: String,
  pub role: String,
  pub status: String,
  #[serde(default)]
  pub expires_at: Option<String>,
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
  pub name: String,
  pub address: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUnit {
  pub label: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bedrooms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenant {
  pub first_name: String,
  pub last_name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLease {
  pub property_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub unit_id: Option<u64>,
  pub tenant_id: u64,
  pub start_date: NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_date: Option<NaiveDate>,
  pub rent_amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
  pub property_id: u64,
  pub category: String,
  pub amount: String,
  pub incurred_on: NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaintenanceRequest {
  pub property_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub unit_id: Option<u64>,
  pub title: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitation {
  pub email: String,
  pub role: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_lease_accepts_string_or_number_rent() {
    let lease: Lease = serde_json::from_value(json!({
      "id": 1, "propertyId": 2, "tenantId": 3,
      "startDate": "2026-01-01", "rentAmount": 1200, "status": "active"
    }))
    .unwrap();
    assert_eq!(lease.rent_amount, "1200");
    assert_eq!(lease.unit_id, None);

    let lease: Lease = serde_json::from_value(json!({
      "id": 1, "propertyId": 2, "tenantId": 3,
      "startDate": "2026-01-01", "rentAmount": "1200.50", "status": "active"
    }))
    .unwrap();
    assert_eq!(lease.rent_amount, "1200.50");
  }

  #[test]
  fn test_missing_required_field_fails() {
    let result: Result<Lease, _> = serde_json::from_value(json!({
      "id": 1, "tenantId": 3, "startDate": "2026-01-01",
      "rentAmount": "10", "status": "active"
    }));
    assert!(result.is_err());
  }

  #[test]
  fn test_new_lease_serializes_camel_case() {
    let body = serde_json::to_value(NewLease {
      property_id: 10,
      unit_id: None,
      tenant_id: 20,
      start_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
      end_date: None,
      rent_amount: "1450.00".to_string(),
    })
    .unwrap();
    assert_eq!(
      body,
      json!({
        "propertyId": 10,
        "tenantId": 20,
        "startDate": "2026-11-01",
        "rentAmount": "1450.00"
      })
    );
  }

  #[test]
  fn test_tenant_full_name() {
    let tenant: Tenant = serde_json::from_value(json!({
      "id": 4, "firstName": "Ada", "lastName": "Okafor"
    }))
    .unwrap();
    assert_eq!(tenant.full_name(), "Ada Okafor");
  }
}

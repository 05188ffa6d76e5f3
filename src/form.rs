//! Client-side validation for create forms.
//!
//! A schema turns the raw text of a form into a typed request body, or
//! reports a message per field. Nothing invalid reaches the network.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::api::types::{
  NewExpense, NewInvitation, NewLease, NewMaintenanceRequest, NewProperty, NewTenant, NewUnit,
};

/// One input on a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
  pub name: &'static str,
  pub label: &'static str,
  pub hint: &'static str,
}

impl Field {
  pub const fn new(name: &'static str, label: &'static str) -> Self {
    Self {
      name,
      label,
      hint: "",
    }
  }

  pub const fn hint(mut self, hint: &'static str) -> Self {
    self.hint = hint;
    self
  }
}

/// Raw text entered per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<&'static str, String>);

impl FormValues {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
    self.0.insert(name, value.into());
  }

  pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
    self.set(name, value);
    self
  }

  /// Trimmed value, empty if never set
  pub fn get(&self, name: &str) -> &str {
    self.0.get(name).map(|v| v.trim()).unwrap_or("")
  }
}

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) need attention", .0.len())]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a message; the first message per field wins.
  pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
    self.0.entry(field).or_insert_with(|| message.into());
  }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.0.get(field).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
    self.0.iter().map(|(k, v)| (*k, v.as_str()))
  }
}

/// A form's fields and the rules that turn them into a request body.
pub trait FormSchema {
  type Output;

  const TITLE: &'static str;
  const FIELDS: &'static [Field];

  fn validate(values: &FormValues) -> Result<Self::Output, FieldErrors>;
}

/// Collects field errors while parsing values.
struct Check<'a> {
  values: &'a FormValues,
  errors: FieldErrors,
}

impl<'a> Check<'a> {
  fn new(values: &'a FormValues) -> Self {
    Self {
      values,
      errors: FieldErrors::new(),
    }
  }

  fn fail(&mut self, field: &'static str, message: impl Into<String>) {
    self.errors.add(field, message);
  }

  fn optional(&self, field: &'static str) -> Option<String> {
    let value = self.values.get(field);
    (!value.is_empty()).then(|| value.to_string())
  }

  fn required(&mut self, field: &'static str) -> Option<String> {
    let value = self.optional(field);
    if value.is_none() {
      self.fail(field, "Required");
    }
    value
  }

  fn id(&mut self, field: &'static str) -> Option<u64> {
    let raw = self.required(field)?;
    self.parse_id(field, &raw)
  }

  fn optional_id(&mut self, field: &'static str) -> Option<u64> {
    let raw = self.optional(field)?;
    self.parse_id(field, &raw)
  }

  fn parse_id(&mut self, field: &'static str, raw: &str) -> Option<u64> {
    match raw.parse::<u64>() {
      Ok(id) if id > 0 => Some(id),
      _ => {
        self.fail(field, "Must be a positive whole number");
        None
      }
    }
  }

  fn date(&mut self, field: &'static str) -> Option<NaiveDate> {
    let raw = self.required(field)?;
    self.parse_date(field, &raw)
  }

  fn optional_date(&mut self, field: &'static str) -> Option<NaiveDate> {
    let raw = self.optional(field)?;
    self.parse_date(field, &raw)
  }

  fn parse_date(&mut self, field: &'static str, raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
      Ok(date) => Some(date),
      Err(_) => {
        self.fail(field, "Use the format YYYY-MM-DD");
        None
      }
    }
  }

  /// A positive amount with at most two decimals, normalized to two.
  fn money(&mut self, field: &'static str) -> Option<String> {
    let raw = self.required(field)?;
    match normalize_amount(&raw) {
      Some(amount) => Some(amount),
      None => {
        self.fail(field, "Enter an amount like 1450.00");
        None
      }
    }
  }

  fn email(&mut self, field: &'static str) -> Option<String> {
    let raw = self.required(field)?;
    let valid = raw
      .split_once('@')
      .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if valid {
      Some(raw)
    } else {
      self.fail(field, "Enter a valid email address");
      None
    }
  }

  fn one_of(&mut self, field: &'static str, allowed: &[&str]) -> Option<String> {
    let raw = self.required(field)?.to_lowercase();
    if allowed.contains(&raw.as_str()) {
      Some(raw)
    } else {
      self.fail(field, format!("One of: {}", allowed.join(", ")));
      None
    }
  }

  fn finish<T>(self, output: Option<T>) -> Result<T, FieldErrors> {
    match output {
      Some(output) if self.errors.is_empty() => Ok(output),
      _ => Err(self.errors),
    }
  }
}

fn normalize_amount(raw: &str) -> Option<String> {
  let raw = raw.strip_prefix('$').unwrap_or(raw).replace(',', "");
  let (whole, cents) = match raw.split_once('.') {
    Some((whole, cents)) => (whole, cents),
    None => (raw.as_str(), ""),
  };
  let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
  if whole.is_empty() || !digits(whole) || !digits(cents) || cents.len() > 2 {
    return None;
  }
  let whole: u64 = whole.parse().ok()?;
  let cents = format!("{:0<2}", cents);
  (whole > 0 || cents != "00").then(|| format!("{}.{}", whole, cents))
}

pub struct PropertyForm;

impl FormSchema for PropertyForm {
  type Output = NewProperty;

  const TITLE: &'static str = "New property";
  const FIELDS: &'static [Field] = &[
    Field::new("name", "Name"),
    Field::new("address", "Address"),
    Field::new("city", "City").hint("optional"),
  ];

  fn validate(values: &FormValues) -> Result<NewProperty, FieldErrors> {
    let mut check = Check::new(values);
    let name = check.required("name");
    let address = check.required("address");
    let city = check.optional("city");

    let output = match (name, address) {
      (Some(name), Some(address)) => Some(NewProperty {
        name,
        address,
        city,
      }),
      _ => None,
    };
    check.finish(output)
  }
}

pub struct UnitForm;

impl FormSchema for UnitForm {
  type Output = NewUnit;

  const TITLE: &'static str = "New unit";
  const FIELDS: &'static [Field] = &[
    Field::new("label", "Label").hint("e.g. 2B"),
    Field::new("bedrooms", "Bedrooms").hint("optional"),
  ];

  fn validate(values: &FormValues) -> Result<NewUnit, FieldErrors> {
    let mut check = Check::new(values);
    let label = check.required("label");
    let bedrooms = match check.optional("bedrooms") {
      Some(raw) => match raw.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
          check.fail("bedrooms", "Must be a whole number");
          None
        }
      },
      None => None,
    };

    let output = label.map(|label| NewUnit { label, bedrooms });
    check.finish(output)
  }
}

pub struct TenantForm;

impl FormSchema for TenantForm {
  type Output = NewTenant;

  const TITLE: &'static str = "New tenant";
  const FIELDS: &'static [Field] = &[
    Field::new("firstName", "First name"),
    Field::new("lastName", "Last name"),
    Field::new("email", "Email").hint("optional"),
    Field::new("phone", "Phone").hint("optional"),
  ];

  fn validate(values: &FormValues) -> Result<NewTenant, FieldErrors> {
    let mut check = Check::new(values);
    let first_name = check.required("firstName");
    let last_name = check.required("lastName");
    let email = match check.optional("email") {
      Some(_) => check.email("email"),
      None => None,
    };
    let phone = check.optional("phone");

    let output = match (first_name, last_name) {
      (Some(first_name), Some(last_name)) => Some(NewTenant {
        first_name,
        last_name,
        email,
        phone,
      }),
      _ => None,
    };
    check.finish(output)
  }
}

pub struct LeaseForm;

impl FormSchema for LeaseForm {
  type Output = NewLease;

  const TITLE: &'static str = "New lease";
  const FIELDS: &'static [Field] = &[
    Field::new("propertyId", "Property id"),
    Field::new("unitId", "Unit id").hint("optional"),
    Field::new("tenantId", "Tenant id"),
    Field::new("startDate", "Start date").hint("YYYY-MM-DD"),
    Field::new("endDate", "End date").hint("YYYY-MM-DD, optional"),
    Field::new("rentAmount", "Monthly rent"),
  ];

  fn validate(values: &FormValues) -> Result<NewLease, FieldErrors> {
    let mut check = Check::new(values);
    let property_id = check.id("propertyId");
    let unit_id = check.optional_id("unitId");
    let tenant_id = check.id("tenantId");
    let start_date = check.date("startDate");
    let end_date = check.optional_date("endDate");
    let rent_amount = check.money("rentAmount");

    if let (Some(start), Some(end)) = (start_date, end_date) {
      if end <= start {
        check.fail("endDate", "End date must be after start date");
      }
    }

    let output = match (property_id, tenant_id, start_date, rent_amount) {
      (Some(property_id), Some(tenant_id), Some(start_date), Some(rent_amount)) => {
        Some(NewLease {
          property_id,
          unit_id,
          tenant_id,
          start_date,
          end_date,
          rent_amount,
        })
      }
      _ => None,
    };
    check.finish(output)
  }
}

pub struct ExpenseForm;

impl FormSchema for ExpenseForm {
  type Output = NewExpense;

  const TITLE: &'static str = "Record expense";
  const FIELDS: &'static [Field] = &[
    Field::new("propertyId", "Property id"),
    Field::new("category", "Category").hint("e.g. repairs, utilities"),
    Field::new("amount", "Amount"),
    Field::new("incurredOn", "Date").hint("YYYY-MM-DD"),
    Field::new("description", "Description").hint("optional"),
  ];

  fn validate(values: &FormValues) -> Result<NewExpense, FieldErrors> {
    let mut check = Check::new(values);
    let property_id = check.id("propertyId");
    let category = check.required("category");
    let amount = check.money("amount");
    let incurred_on = check.date("incurredOn");
    let description = check.optional("description");

    let output = match (property_id, category, amount, incurred_on) {
      (Some(property_id), Some(category), Some(amount), Some(incurred_on)) => Some(NewExpense {
        property_id,
        category,
        amount,
        incurred_on,
        description,
      }),
      _ => None,
    };
    check.finish(output)
  }
}

pub struct MaintenanceForm;

impl FormSchema for MaintenanceForm {
  type Output = NewMaintenanceRequest;

  const TITLE: &'static str = "New maintenance request";
  const FIELDS: &'static [Field] = &[
    Field::new("propertyId", "Property id"),
    Field::new("unitId", "Unit id").hint("optional"),
    Field::new("title", "Title"),
    Field::new("priority", "Priority").hint("low, normal, urgent"),
  ];

  fn validate(values: &FormValues) -> Result<NewMaintenanceRequest, FieldErrors> {
    let mut check = Check::new(values);
    let property_id = check.id("propertyId");
    let unit_id = check.optional_id("unitId");
    let title = check.required("title");
    let priority = match check.optional("priority") {
      Some(_) => check.one_of("priority", &["low", "normal", "urgent"]),
      None => None,
    };

    let output = match (property_id, title) {
      (Some(property_id), Some(title)) => Some(NewMaintenanceRequest {
        property_id,
        unit_id,
        title,
        priority,
      }),
      _ => None,
    };
    check.finish(output)
  }
}

pub struct InvitationForm;

impl FormSchema for InvitationForm {
  type Output = NewInvitation;

  const TITLE: &'static str = "Invite team member";
  const FIELDS: &'static [Field] = &[
    Field::new("email", "Email"),
    Field::new("role", "Role").hint("manager, accountant, viewer"),
  ];

  fn validate(values: &FormValues) -> Result<NewInvitation, FieldErrors> {
    let mut check = Check::new(values);
    let email = check.email("email");
    let role = check.one_of("role", &["manager", "accountant", "viewer"]);

    let output = match (email, role) {
      (Some(email), Some(role)) => Some(NewInvitation { email, role }),
      _ => None,
    };
    check.finish(output)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lease_values() -> FormValues {
    FormValues::new()
      .with("propertyId", "10")
      .with("tenantId", "20")
      .with("startDate", "2026-11-01")
      .with("endDate", "2027-10-31")
      .with("rentAmount", "1450")
  }

  #[test]
  fn test_valid_lease() {
    let lease = LeaseForm::validate(&lease_values()).unwrap();
    assert_eq!(lease.property_id, 10);
    assert_eq!(lease.unit_id, None);
    assert_eq!(lease.rent_amount, "1450.00");
    assert_eq!(lease.end_date, NaiveDate::from_ymd_opt(2027, 10, 31));
  }

  #[test]
  fn test_lease_end_before_start_rejected() {
    let values = lease_values().with("endDate", "2026-10-01");
    let errors = LeaseForm::validate(&values).unwrap_err();
    assert_eq!(
      errors.get("endDate"),
      Some("End date must be after start date")
    );
    assert_eq!(errors.len(), 1);
  }

  #[test]
  fn test_lease_reports_every_bad_field() {
    let values = FormValues::new()
      .with("propertyId", "abc")
      .with("startDate", "11/01/2026")
      .with("rentAmount", "12.345");
    let errors = LeaseForm::validate(&values).unwrap_err();
    assert_eq!(errors.get("propertyId"), Some("Must be a positive whole number"));
    assert_eq!(errors.get("tenantId"), Some("Required"));
    assert_eq!(errors.get("startDate"), Some("Use the format YYYY-MM-DD"));
    assert!(errors.get("rentAmount").is_some());
    assert!(errors.get("endDate").is_none());
  }

  #[test]
  fn test_normalize_amount() {
    assert_eq!(normalize_amount("1450").as_deref(), Some("1450.00"));
    assert_eq!(normalize_amount("$1,450.5").as_deref(), Some("1450.50"));
    assert_eq!(normalize_amount("0.99").as_deref(), Some("0.99"));
    assert_eq!(normalize_amount("0"), None);
    assert_eq!(normalize_amount("-5"), None);
    assert_eq!(normalize_amount("1.234"), None);
    assert_eq!(normalize_amount(".50"), None);
  }

  #[test]
  fn test_invitation_role_and_email() {
    let values = FormValues::new()
      .with("email", "sam@example.com")
      .with("role", "Manager");
    let invitation = InvitationForm::validate(&values).unwrap();
    assert_eq!(invitation.role, "manager");

    let values = FormValues::new().with("email", "sam").with("role", "owner");
    let errors = InvitationForm::validate(&values).unwrap_err();
    assert_eq!(errors.get("email"), Some("Enter a valid email address"));
    assert_eq!(errors.get("role"), Some("One of: manager, accountant, viewer"));
  }

  #[test]
  fn test_optional_fields_may_be_blank() {
    let values = FormValues::new()
      .with("firstName", " Ada ")
      .with("lastName", "Okafor")
      .with("email", "  ");
    let tenant = TenantForm::validate(&values).unwrap();
    assert_eq!(tenant.first_name, "Ada");
    assert_eq!(tenant.email, None);
  }

  #[test]
  fn test_fields_cover_validated_names() {
    for field in LeaseForm::FIELDS {
      assert!(!field.label.is_empty());
    }
    let names: Vec<_> = MaintenanceForm::FIELDS.iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["propertyId", "unitId", "title", "priority"]);
  }
}

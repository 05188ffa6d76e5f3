//! How each API collection appears as a list.

use crate::api::keys;
use crate::api::types::{
  Expense, Invitation, Invoice, Lease, MaintenanceRequest, Property, TeamMember, Tenant, Unit,
};
use crate::api::Write;
use crate::form::{
  ExpenseForm, InvitationForm, LeaseForm, MaintenanceForm, PropertyForm, TenantForm, UnitForm,
};
use crate::query::QueryKey;
use crate::ui::components::FormPanel;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::View;
use ratatui::prelude::*;

use super::listing::{ListView, Listing, RowAction, Scope};
use super::Context;

const NO_OWNER: &str = "No owner configured. Set owner_id in the config or pass --owner.";

fn id_span(id: u64) -> Span<'static> {
  Span::styled(format!("#{:<6}", id), Style::default().fg(Color::Cyan))
}

fn status_span(status: &str, width: usize) -> Span<'static> {
  Span::styled(
    format!("{:<width$}", truncate(status, width), width = width),
    Style::default().fg(status_color(status)),
  )
}

fn owner(scope: &Scope) -> Result<u64, &'static str> {
  scope.owner_id.ok_or(NO_OWNER)
}

impl Listing for Property {
  const TITLE: &'static str = "Properties";

  fn key(_scope: &Scope) -> Result<QueryKey, &'static str> {
    Ok(keys::properties())
  }

  fn row(&self) -> Line<'static> {
    let units = self
      .unit_count
      .map(|n| format!("{} units", n))
      .unwrap_or_default();
    Line::from(vec![
      id_span(self.id),
      Span::raw(" "),
      Span::styled(
        format!("{:<28}", truncate(&self.name, 28)),
        Style::default().bold(),
      ),
      Span::raw(" "),
      Span::raw(format!("{:<36}", truncate(&self.address, 36))),
      Span::styled(units, Style::default().fg(Color::DarkGray)),
    ])
  }

  fn label(&self) -> String {
    self.name.clone()
  }

  fn create_form(_scope: &Scope) -> Option<FormPanel> {
    Some(FormPanel::new::<PropertyForm>(Write::CreateProperty))
  }

  fn delete(&self, _scope: &Scope) -> Option<Write> {
    Some(Write::DeleteProperty {
      property_id: self.id,
    })
  }

  fn open(&self, ctx: &Context) -> Option<Box<dyn View>> {
    let scope = Scope {
      property_id: Some(self.id),
      ..ctx.scope()
    };
    Some(Box::new(ListView::<Unit>::new(ctx.clone(), scope)))
  }
}

impl Listing for Unit {
  const TITLE: &'static str = "Units";

  fn key(scope: &Scope) -> Result<QueryKey, &'static str> {
    scope
      .property_id
      .map(keys::property_units)
      .ok_or("Open units from a property with Enter.")
  }

  fn row(&self) -> Line<'static> {
    let bedrooms = self
      .bedrooms
      .map(|n| format!("{} bd", n))
      .unwrap_or_default();
    Line::from(vec![
      id_span(self.id),
      Span::raw(" "),
      Span::styled(format!("{:<10}", truncate(&self.label, 10)), Style::default().bold()),
      Span::raw(format!("{:<8}", bedrooms)),
      status_span(self.status.as_deref().unwrap_or(""), 12),
    ])
  }

  fn label(&self) -> String {
    format!("unit {}", self.label)
  }

  fn create_form(scope: &Scope) -> Option<FormPanel> {
    let property_id = scope.property_id?;
    Some(FormPanel::new::<UnitForm>(move |unit| Write::CreateUnit {
      property_id,
      unit,
    }))
  }

  fn delete(&self, _scope: &Scope) -> Option<Write> {
    Some(Write::DeleteUnit {
      property_id: self.property_id,
      unit_id: self.id,
    })
  }
}

impl Listing for Tenant {
  const TITLE: &'static str = "Tenants";

  fn key(_scope: &Scope) -> Result<QueryKey, &'static str> {
    Ok(keys::tenants())
  }

  fn row(&self) -> Line<'static> {
    Line::from(vec![
      id_span(self.id),
      Span::raw(" "),
      Span::styled(
        format!("{:<28}", truncate(&self.full_name(), 28)),
        Style::default().bold(),
      ),
      Span::raw(" "),
      Span::raw(format!("{:<30}", self.email.clone().unwrap_or_default())),
      Span::styled(
        self.phone.clone().unwrap_or_default(),
        Style::default().fg(Color::DarkGray),
      ),
    ])
  }

  fn label(&self) -> String {
    self.full_name()
  }

  fn create_form(_scope: &Scope) -> Option<FormPanel> {
    Some(FormPanel::new::<TenantForm>(Write::CreateTenant))
  }

  fn delete(&self, _scope: &Scope) -> Option<Write> {
    Some(Write::DeleteTenant { tenant_id: self.id })
  }
}

impl Listing for Lease {
  const TITLE: &'static str = "Leases";
  const DELETE_VERB: &'static str = "End";

  fn key(_scope: &Scope) -> Result<QueryKey, &'static str> {
    Ok(keys::leases())
  }

  fn row(&self) -> Line<'static> {
    let term = match self.end_date {
      Some(end) => format!("{} → {}", self.start_date, end),
      None => format!("{} → open", self.start_date),
    };
    Line::from(vec![
      id_span(self.id),
      Span::raw(" "),
      status_span(&self.status, 12),
      Span::raw(format!(
        "property {:<5} tenant {:<5} ",
        self.property_id, self.tenant_id
      )),
      Span::raw(format!("{:<26}", term)),
      Span::styled(
        format!("{:>10}", self.rent_amount),
        Style::default().fg(Color::Yellow),
      ),
    ])
  }

  fn label(&self) -> String {
    format!("lease #{}", self.id)
  }

  fn create_form(_scope: &Scope) -> Option<FormPanel> {
    Some(FormPanel::new::<LeaseForm>(Write::CreateLease))
  }

  fn delete(&self, _scope: &Scope) -> Option<Write> {
    (self.status == "active").then(|| Write::EndLease {
      lease_id: self.id,
      property_id: self.property_id,
    })
  }
}

impl Listing for Invoice {
  const TITLE: &'static str = "Invoices";

  fn key(_scope: &Scope) -> Result<QueryKey, &'static str> {
    Ok(keys::invoices())
  }

  fn row(&self) -> Line<'static> {
    Line::from(vec![
      id_span(self.id),
      Span::raw(" "),
      status_span(&self.status, 10),
      Span::raw(format!("lease {:<6} due {} ", self.lease_id, self.due_date)),
      Span::styled(
        format!("{:>10}", self.amount),
        Style::default().fg(Color::Yellow),
      ),
    ])
  }

  fn label(&self) -> String {
    format!("invoice #{}", self.id)
  }

  fn action(&self, _scope: &Scope) -> Option<RowAction> {
    (self.status != "paid").then(|| RowAction {
      key: "p",
      label: "mark paid",
      write: Write::MarkInvoicePaid {
        invoice_id: self.id,
      },
    })
  }
}

impl Listing for Expense {
  const TITLE: &'static str = "Expenses";

  fn key(_scope: &Scope) -> Result<QueryKey, &'static str> {
    Ok(keys::expenses())
  }

  fn row(&self) -> Line<'static> {
    Line::from(vec![
      id_span(self.id),
      Span::raw(" "),
      Span::raw(format!("{} ", self.incurred_on)),
      Span::styled(
        format!("{:<14}", truncate(&self.category, 14)),
        Style::default().bold(),
      ),
      Span::raw(format!("property {:<5} ", self.property_id)),
      Span::styled(
        format!("{:>10} ", self.amount),
        Style::default().fg(Color::Yellow),
      ),
      Span::styled(
        truncate(self.description.as_deref().unwrap_or(""), 40),
        Style::default().fg(Color::DarkGray),
      ),
    ])
  }

  fn label(&self) -> String {
    format!("{} expense #{}", self.category, self.id)
  }

  fn create_form(scope: &Scope) -> Option<FormPanel> {
    let form = FormPanel::new::<ExpenseForm>(Write::CreateExpense);
    Some(match scope.property_id {
      Some(id) => form.prefill("propertyId", id.to_string()),
      None => form,
    })
  }

  fn delete(&self, _scope: &Scope) -> Option<Write> {
    Some(Write::DeleteExpense {
      expense_id: self.id,
      property_id: self.property_id,
    })
  }
}

/// Next step in a request's workflow
fn next_status(status: &str) -> Option<&'static str> {
  match status {
    "open" => Some("in_progress"),
    "in_progress" => Some("resolved"),
    _ => None,
  }
}

impl Listing for MaintenanceRequest {
  const TITLE: &'static str = "Maintenance";

  fn key(_scope: &Scope) -> Result<QueryKey, &'static str> {
    Ok(keys::maintenance())
  }

  fn row(&self) -> Line<'static> {
    let priority = self.priority.clone().unwrap_or_else(|| "normal".to_string());
    Line::from(vec![
      id_span(self.id),
      Span::raw(" "),
      status_span(&self.status, 12),
      status_span(&priority, 8),
      Span::raw(format!("property {:<5} ", self.property_id)),
      Span::raw(truncate(&self.title, 50)),
    ])
  }

  fn label(&self) -> String {
    format!("request #{}", self.id)
  }

  fn create_form(scope: &Scope) -> Option<FormPanel> {
    let form = FormPanel::new::<MaintenanceForm>(Write::CreateMaintenance);
    Some(match scope.property_id {
      Some(id) => form.prefill("propertyId", id.to_string()),
      None => form,
    })
  }

  fn action(&self, _scope: &Scope) -> Option<RowAction> {
    let status = next_status(&self.status)?;
    Some(RowAction {
      key: "s",
      label: "advance status",
      write: Write::SetMaintenanceStatus {
        request_id: self.id,
        property_id: self.property_id,
        status: status.to_string(),
      },
    })
  }
}

impl Listing for TeamMember {
  const TITLE: &'static str = "Team";
  const DELETE_VERB: &'static str = "Remove";

  fn key(scope: &Scope) -> Result<QueryKey, &'static str> {
    owner(scope).map(keys::team)
  }

  fn row(&self) -> Line<'static> {
    Line::from(vec![
      id_span(self.id),
      Span::raw(" "),
      Span::styled(
        format!("{:<24}", truncate(self.name.as_deref().unwrap_or("-"), 24)),
        Style::default().bold(),
      ),
      Span::raw(format!("{:<32}", truncate(&self.email, 32))),
      Span::styled(self.role.clone(), Style::default().fg(Color::Magenta)),
    ])
  }

  fn label(&self) -> String {
    self.email.clone()
  }

  fn delete(&self, scope: &Scope) -> Option<Write> {
    Some(Write::RemoveMember {
      owner_id: scope.owner_id?,
      member_id: self.id,
    })
  }
}

impl Listing for Invitation {
  const TITLE: &'static str = "Invitations";
  const DELETE_VERB: &'static str = "Revoke invitation for";

  fn key(scope: &Scope) -> Result<QueryKey, &'static str> {
    owner(scope).map(keys::invitations)
  }

  fn row(&self) -> Line<'static> {
    Line::from(vec![
      id_span(self.id),
      Span::raw(" "),
      status_span(&self.status, 10),
      Span::raw(format!("{:<32}", truncate(&self.email, 32))),
      Span::styled(
        format!("{:<12}", self.role),
        Style::default().fg(Color::Magenta),
      ),
      Span::styled(
        self.expires_at.clone().unwrap_or_default(),
        Style::default().fg(Color::DarkGray),
      ),
    ])
  }

  fn label(&self) -> String {
    self.email.clone()
  }

  fn create_form(scope: &Scope) -> Option<FormPanel> {
    let owner_id = scope.owner_id?;
    Some(FormPanel::new::<InvitationForm>(move |invitation| {
      Write::SendInvitation {
        owner_id,
        invitation,
      }
    }))
  }

  fn delete(&self, scope: &Scope) -> Option<Write> {
    let owner_id = scope.owner_id?;
    (self.status == "pending").then(|| Write::RevokeInvitation {
      owner_id,
      invitation_id: self.id,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn owner_scope() -> Scope {
    Scope {
      owner_id: Some(5),
      property_id: None,
    }
  }

  #[test]
  fn test_team_lists_need_an_owner() {
    assert_eq!(TeamMember::key(&Scope::default()), Err(NO_OWNER));
    assert_eq!(Invitation::key(&owner_scope()), Ok(keys::invitations(5)));
    assert!(Invitation::create_form(&Scope::default()).is_none());
  }

  #[test]
  fn test_units_are_scoped_to_a_property() {
    let scope = Scope {
      property_id: Some(3),
      ..Scope::default()
    };
    assert_eq!(Unit::key(&scope), Ok(keys::property_units(3)));
    assert!(Unit::key(&Scope::default()).is_err());
  }

  #[test]
  fn test_only_pending_invitations_can_be_revoked() {
    let mut invitation: Invitation = serde_json::from_value(json!({
      "id": 7, "email": "sam@example.com", "role": "viewer", "status": "pending"
    }))
    .unwrap();
    assert_eq!(
      invitation.delete(&owner_scope()),
      Some(Write::RevokeInvitation {
        owner_id: 5,
        invitation_id: 7
      })
    );
    invitation.status = "accepted".to_string();
    assert_eq!(invitation.delete(&owner_scope()), None);
  }

  #[test]
  fn test_maintenance_status_advances_until_resolved() {
    let mut request: MaintenanceRequest = serde_json::from_value(json!({
      "id": 2, "propertyId": 9, "title": "Leaking tap", "status": "open"
    }))
    .unwrap();
    let action = request.action(&Scope::default()).unwrap();
    assert_eq!(action.key, "s");
    assert_eq!(
      action.write,
      Write::SetMaintenanceStatus {
        request_id: 2,
        property_id: 9,
        status: "in_progress".to_string()
      }
    );

    request.status = "resolved".to_string();
    assert!(request.action(&Scope::default()).is_none());
  }

  #[test]
  fn test_paid_invoice_has_no_action() {
    let invoice: Invoice = serde_json::from_value(json!({
      "id": 1, "leaseId": 4, "dueDate": "2026-11-01", "amount": 1450, "status": "paid"
    }))
    .unwrap();
    assert!(invoice.action(&Scope::default()).is_none());
  }

  #[test]
  fn test_scoped_expense_form_prefills_property() {
    let scope = Scope {
      property_id: Some(12),
      ..Scope::default()
    };
    let form = Expense::create_form(&scope).unwrap();
    assert_eq!(form.values().get("propertyId"), "12");
  }
}

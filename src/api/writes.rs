//! Every write the client performs, with the keys it makes stale.
//!
//! Invalidation sets are built from [`super::keys`], so adding a write means
//! declaring what it touches once, here.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::client::ApiClient;
use super::keys;
use super::types::{
  NewExpense, NewInvitation, NewLease, NewMaintenanceRequest, NewProperty, NewTenant, NewUnit,
};
use crate::query::{MutationCallbacks, MutationRunner, QueryError, QueryKey};

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
  CreateProperty(NewProperty),
  DeleteProperty {
    property_id: u64,
  },
  CreateUnit {
    property_id: u64,
    unit: NewUnit,
  },
  DeleteUnit {
    property_id: u64,
    unit_id: u64,
  },
  CreateTenant(NewTenant),
  DeleteTenant {
    tenant_id: u64,
  },
  CreateLease(NewLease),
  EndLease {
    lease_id: u64,
    property_id: u64,
  },
  MarkInvoicePaid {
    invoice_id: u64,
  },
  CreateExpense(NewExpense),
  DeleteExpense {
    expense_id: u64,
    property_id: u64,
  },
  CreateMaintenance(NewMaintenanceRequest),
  SetMaintenanceStatus {
    request_id: u64,
    property_id: u64,
    status: String,
  },
  SendInvitation {
    owner_id: u64,
    invitation: NewInvitation,
  },
  RevokeInvitation {
    owner_id: u64,
    invitation_id: u64,
  },
  RemoveMember {
    owner_id: u64,
    member_id: u64,
  },
}

impl Write {
  pub fn method(&self) -> Method {
    match self {
      Write::CreateProperty(_)
      | Write::CreateUnit { .. }
      | Write::CreateTenant(_)
      | Write::CreateLease(_)
      | Write::CreateExpense(_)
      | Write::CreateMaintenance(_)
      | Write::SendInvitation { .. } => Method::POST,
      Write::MarkInvoicePaid { .. } | Write::SetMaintenanceStatus { .. } => Method::PATCH,
      Write::EndLease { .. } => Method::PUT,
      Write::DeleteProperty { .. }
      | Write::DeleteUnit { .. }
      | Write::DeleteTenant { .. }
      | Write::DeleteExpense { .. }
      | Write::RevokeInvitation { .. }
      | Write::RemoveMember { .. } => Method::DELETE,
    }
  }

  pub fn path(&self) -> String {
    match self {
      Write::CreateProperty(_) => keys::properties().to_path(),
      Write::DeleteProperty { property_id } => keys::property(*property_id).to_path(),
      Write::CreateUnit { property_id, .. } => keys::property_units(*property_id).to_path(),
      Write::DeleteUnit { unit_id, .. } => format!("{}/{}", keys::UNITS, unit_id),
      Write::CreateTenant(_) => keys::tenants().to_path(),
      Write::DeleteTenant { tenant_id } => keys::tenants().with(*tenant_id).to_path(),
      Write::CreateLease(_) => keys::leases().to_path(),
      Write::EndLease { lease_id, .. } => keys::leases().with(*lease_id).with("end").to_path(),
      Write::MarkInvoicePaid { invoice_id } => keys::invoices().with(*invoice_id).to_path(),
      Write::CreateExpense(_) => keys::expenses().to_path(),
      Write::DeleteExpense { expense_id, .. } => keys::expenses().with(*expense_id).to_path(),
      Write::CreateMaintenance(_) => keys::maintenance().to_path(),
      Write::SetMaintenanceStatus { request_id, .. } => {
        keys::maintenance().with(*request_id).to_path()
      }
      Write::SendInvitation { owner_id, .. } => keys::invitations(*owner_id).to_path(),
      Write::RevokeInvitation {
        owner_id,
        invitation_id,
      } => keys::invitations(*owner_id).with(*invitation_id).to_path(),
      Write::RemoveMember {
        owner_id,
        member_id,
      } => keys::team(*owner_id).with(*member_id).to_path(),
    }
  }

  /// JSON request body, if the write carries one.
  pub fn body(&self) -> Result<Option<Value>, QueryError> {
    fn json(body: &impl Serialize) -> Result<Option<Value>, QueryError> {
      Ok(Some(serde_json::to_value(body)?))
    }

    match self {
      Write::CreateProperty(body) => json(body),
      Write::CreateUnit { unit, .. } => json(unit),
      Write::CreateTenant(body) => json(body),
      Write::CreateLease(body) => json(body),
      Write::CreateExpense(body) => json(body),
      Write::CreateMaintenance(body) => json(body),
      Write::SendInvitation { invitation, .. } => json(invitation),
      Write::MarkInvoicePaid { .. } => Ok(Some(serde_json::json!({ "status": "paid" }))),
      Write::SetMaintenanceStatus { status, .. } => {
        Ok(Some(serde_json::json!({ "status": status })))
      }
      _ => Ok(None),
    }
  }

  /// Keys to mark stale once the write has succeeded.
  pub fn invalidates(&self) -> Vec<QueryKey> {
    match self {
      Write::CreateProperty(_) => vec![keys::properties()],
      // Cascades to everything filed under the property
      Write::DeleteProperty { property_id } => vec![
        keys::properties(),
        keys::property(*property_id),
        keys::leases(),
        keys::invoices(),
        keys::expenses(),
        keys::maintenance(),
      ],
      Write::CreateUnit { property_id, .. } => {
        vec![keys::properties(), keys::property(*property_id)]
      }
      Write::DeleteUnit { property_id, .. } => vec![
        keys::properties(),
        keys::property(*property_id),
        keys::leases(),
      ],
      Write::CreateTenant(_) => vec![keys::tenants()],
      Write::DeleteTenant { .. } => vec![keys::tenants(), keys::leases()],
      Write::CreateLease(lease) => vec![
        keys::leases(),
        keys::property(lease.property_id),
        keys::invoices(),
      ],
      Write::EndLease { property_id, .. } => vec![
        keys::leases(),
        keys::property(*property_id),
        keys::invoices(),
      ],
      Write::MarkInvoicePaid { .. } => vec![keys::invoices()],
      Write::CreateExpense(expense) => {
        vec![keys::expenses(), keys::property(expense.property_id)]
      }
      Write::DeleteExpense { property_id, .. } => {
        vec![keys::expenses(), keys::property(*property_id)]
      }
      Write::CreateMaintenance(request) => {
        vec![keys::maintenance(), keys::property(request.property_id)]
      }
      Write::SetMaintenanceStatus { property_id, .. } => {
        vec![keys::maintenance(), keys::property(*property_id)]
      }
      Write::SendInvitation { owner_id, .. } | Write::RevokeInvitation { owner_id, .. } => {
        vec![keys::invitations(*owner_id)]
      }
      // Removing a member can also void their open invitations
      Write::RemoveMember { owner_id, .. } => vec![keys::owner(*owner_id)],
    }
  }

  /// Short label for logs and the status line.
  pub fn describe(&self) -> &'static str {
    match self {
      Write::CreateProperty(_) => "create property",
      Write::DeleteProperty { .. } => "delete property",
      Write::CreateUnit { .. } => "create unit",
      Write::DeleteUnit { .. } => "delete unit",
      Write::CreateTenant(_) => "create tenant",
      Write::DeleteTenant { .. } => "delete tenant",
      Write::CreateLease(_) => "create lease",
      Write::EndLease { .. } => "end lease",
      Write::MarkInvoicePaid { .. } => "mark invoice paid",
      Write::CreateExpense(_) => "record expense",
      Write::DeleteExpense { .. } => "delete expense",
      Write::CreateMaintenance(_) => "open maintenance request",
      Write::SetMaintenanceStatus { .. } => "update maintenance request",
      Write::SendInvitation { .. } => "send invitation",
      Write::RevokeInvitation { .. } => "revoke invitation",
      Write::RemoveMember { .. } => "remove team member",
    }
  }
}

impl<O> MutationRunner<O>
where
  O: Clone + Send + Sync + 'static,
{
  /// Issue a typed write through `api` and invalidate what it touches.
  pub async fn run_write(
    &self,
    api: &ApiClient,
    write: &Write,
    callbacks: MutationCallbacks<O>,
  ) -> Result<O, QueryError>
  where
    O: serde::de::DeserializeOwned,
  {
    let request = async {
      let value = api.send(write).await?;
      O::deserialize(value).map_err(QueryError::from)
    };
    self.run(request, &write.invalidates(), callbacks).await
  }
}

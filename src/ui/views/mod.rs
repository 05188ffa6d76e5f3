mod listing;
mod resources;

use crate::api::types::{
  Expense, Invitation, Invoice, Lease, MaintenanceRequest, Property, TeamMember, Tenant,
};
use crate::api::ApiClient;
use crate::query::QueryClient;
use crate::ui::view::View;

pub use listing::{ListView, Listing, Scope};

/// Handles every view needs: the shared cache and the API
#[derive(Clone)]
pub struct Context {
  pub client: QueryClient,
  pub api: ApiClient,
  pub owner_id: Option<u64>,
}

impl Context {
  pub fn scope(&self) -> Scope {
    Scope {
      owner_id: self.owner_id,
      property_id: None,
    }
  }
}

/// Build the root view for a `:` command, if the command names one
pub fn root_view(command: &str, ctx: &Context) -> Option<Box<dyn View>> {
  fn list<R: Listing>(ctx: &Context) -> Box<dyn View> {
    Box::new(ListView::<R>::new(ctx.clone(), ctx.scope()))
  }

  let view = match command {
    "properties" => list::<Property>(ctx),
    "leases" => list::<Lease>(ctx),
    "tenants" => list::<Tenant>(ctx),
    "invoices" => list::<Invoice>(ctx),
    "expenses" => list::<Expense>(ctx),
    "maintenance" => list::<MaintenanceRequest>(ctx),
    "team" => list::<TeamMember>(ctx),
    "invitations" => list::<Invitation>(ctx),
    _ => return None,
  };
  Some(view)
}

//! Typed query key builders, one per endpoint.
//!
//! Views and invalidation sets both build keys here, so a read and the write
//! that should refresh it cannot drift apart.

use crate::query::QueryKey;
use crate::query_key;

pub const PROPERTIES: &str = "/api/properties";
pub const UNITS: &str = "/api/units";
pub const TENANTS: &str = "/api/tenants";
pub const LEASES: &str = "/api/leases";
pub const INVOICES: &str = "/api/invoices";
pub const EXPENSES: &str = "/api/expenses";
pub const MAINTENANCE: &str = "/api/maintenance-requests";
pub const OWNERS: &str = "/api/owners";

pub fn properties() -> QueryKey {
  query_key![PROPERTIES]
}

/// Everything cached about one property (its tree, its units).
pub fn property(id: u64) -> QueryKey {
  query_key![PROPERTIES, id]
}

pub fn property_tree(id: u64) -> QueryKey {
  property(id).with("tree")
}

pub fn property_units(id: u64) -> QueryKey {
  property(id).with("units")
}

pub fn tenants() -> QueryKey {
  query_key![TENANTS]
}

pub fn leases() -> QueryKey {
  query_key![LEASES]
}

pub fn invoices() -> QueryKey {
  query_key![INVOICES]
}

pub fn expenses() -> QueryKey {
  query_key![EXPENSES]
}

pub fn maintenance() -> QueryKey {
  query_key![MAINTENANCE]
}

/// Everything cached about one owner (team, invitations).
pub fn owner(id: u64) -> QueryKey {
  query_key![OWNERS, id]
}

pub fn team(owner_id: u64) -> QueryKey {
  owner(owner_id).with("team")
}

pub fn invitations(owner_id: u64) -> QueryKey {
  owner(owner_id).with("invitations")
}

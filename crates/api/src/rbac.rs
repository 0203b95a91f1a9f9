//! Role-based access control table.

use std::fmt;

use store::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Customer,
    Inventory,
    Cart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Update,
    Delete,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Customer => "customer",
            Resource::Inventory => "inventory",
            Resource::Cart => "cart",
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Update => "update",
            Action::Delete => "delete",
        })
    }
}

const ADMIN: &[UserRole] = &[UserRole::Admin];
const CUSTOMER: &[UserRole] = &[UserRole::Customer];
const ANYONE: &[UserRole] = &[UserRole::Customer, UserRole::Admin];

const PERMISSIONS: &[(Resource, Action, &[UserRole])] = &[
    (Resource::Customer, Action::Delete, ADMIN),
    (Resource::Inventory, Action::Read, ANYONE),
    (Resource::Inventory, Action::Write, ADMIN),
    (Resource::Inventory, Action::Update, ADMIN),
    (Resource::Inventory, Action::Delete, ADMIN),
    (Resource::Cart, Action::Read, CUSTOMER),
    (Resource::Cart, Action::Write, CUSTOMER),
    (Resource::Cart, Action::Update, CUSTOMER),
    (Resource::Cart, Action::Delete, CUSTOMER),
];

/// Roles allowed to perform `action` on `resource`. Empty when nobody is.
pub fn allowed_roles(resource: Resource, action: Action) -> &'static [UserRole] {
    PERMISSIONS
        .iter()
        .find(|(r, a, _)| *r == resource && *a == action)
        .map(|(_, _, roles)| *roles)
        .unwrap_or(&[])
}

pub fn authorize(resource: Resource, action: Action, role: UserRole) -> bool {
    allowed_roles(resource, action).contains(&role)
}

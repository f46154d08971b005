//! Role-derived permission lattice.
//!
//! Permissions are a pure function of role and are recomputed on every
//! request; nothing here is ever persisted.  The lattice is strictly
//! additive: student ⊂ lecturer ⊂ admin.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User role carried in the identity token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Lecturer,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
            Role::Admin => "admin",
        };
        f.write_str(s)
    }
}

/// Everything a role can be allowed to do.  No per-user overrides exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadContent,
    WriteOwnContent,
    SaveContent,
    CreateContent,
    ManageModules,
    ManageUsers,
    ManageSystemConfig,
}

const STUDENT: &[Permission] = &[
    Permission::ReadContent,
    Permission::WriteOwnContent,
    Permission::SaveContent,
];

const LECTURER: &[Permission] = &[
    Permission::ReadContent,
    Permission::WriteOwnContent,
    Permission::SaveContent,
    Permission::CreateContent,
    Permission::ManageModules,
];

const ADMIN: &[Permission] = &[
    Permission::ReadContent,
    Permission::WriteOwnContent,
    Permission::SaveContent,
    Permission::CreateContent,
    Permission::ManageModules,
    Permission::ManageUsers,
    Permission::ManageSystemConfig,
];

impl Role {
    /// The full permission set derived from this role.
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Student => STUDENT,
            Role::Lecturer => LECTURER,
            Role::Admin => ADMIN,
        }
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

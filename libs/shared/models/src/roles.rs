use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Portal roles, ordered from least to most privileged.
///
/// `Citizen` has no admin rank and never satisfies a staff minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    #[serde(alias = "atendente")]
    Attendant,
    Supervisor,
    Admin,
    #[serde(alias = "proprietario")]
    Owner,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Citizen,
        Role::Attendant,
        Role::Supervisor,
        Role::Admin,
        Role::Owner,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Role::Citizen => 0,
            Role::Attendant => 1,
            Role::Supervisor => 2,
            Role::Admin => 3,
            Role::Owner => 4,
        }
    }

    pub fn meets_minimum(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub fn is_staff(self) -> bool {
        self != Role::Citizen
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Attendant => "attendant",
            Role::Supervisor => "supervisor",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Citizen => "Cidadão",
            Role::Attendant => "Atendente",
            Role::Supervisor => "Supervisor",
            Role::Admin => "Administrador",
            Role::Owner => "Proprietário",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citizen" => Ok(Role::Citizen),
            "attendant" | "atendente" => Ok(Role::Attendant),
            "supervisor" => Ok(Role::Supervisor),
            "admin" => Ok(Role::Admin),
            "owner" | "proprietario" => Ok(Role::Owner),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

pub fn meets_minimum(actual: Role, required: Role) -> bool {
    actual.meets_minimum(required)
}

/// Check for roles that arrive as raw strings. Unrecognised roles never pass.
pub fn role_str_meets_minimum(actual: &str, required: Role) -> bool {
    actual
        .parse::<Role>()
        .map(|role| role.meets_minimum(required))
        .unwrap_or(false)
}

//! The active viewer and role-based view gating.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of a dashboard user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    #[default]
    Teacher,
    Student,
    Parent,
    Secretary,
}

impl Role {
    /// Teachers and administrators rate students and see trend reports.
    pub fn can_evaluate_students(self) -> bool {
        matches!(self, Role::Teacher | Role::Administrator)
    }

    /// Teachers and administrators publish exams and see class results.
    pub fn can_manage_exams(self) -> bool {
        matches!(self, Role::Teacher | Role::Administrator)
    }

    pub fn can_take_exams(self) -> bool {
        matches!(self, Role::Student)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Administrator => write!(f, "administrator"),
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
            Role::Parent => write!(f, "parent"),
            Role::Secretary => write!(f, "secretary"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "administrator" | "admin" => Ok(Role::Administrator),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            "secretary" => Ok(Role::Secretary),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The user currently looking at the dashboard. Never mutated by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

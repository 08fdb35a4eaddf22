use serde::{Deserialize, Serialize};

/// Account category. Wire names follow the remote API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "PUBLIK")]
    Public,
    #[serde(rename = "MAHASISWA")]
    Student,
    #[serde(rename = "STAFF_DOSEN")]
    StaffFaculty,
}

impl Role {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::Public => "PUBLIK",
            Role::Student => "MAHASISWA",
            Role::StaffFaculty => "STAFF_DOSEN",
        }
    }

    /// Accepts the wire names and the English aliases, case-insensitive.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PUBLIK" | "PUBLIC" => Some(Role::Public),
            "MAHASISWA" | "STUDENT" => Some(Role::Student),
            "STAFF_DOSEN" | "STAFF_FACULTY" | "STAFF" => Some(Role::StaffFaculty),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Snapshot of the authenticated user, replaced wholesale on every auth event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub identity_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

//! Resource collections exposed by the case-management API

use std::fmt;

/// Named REST collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    CaseFiles,
    Visits,
    FamilyMembers,
    Projects,
    ProjectMembers,
}

impl Resource {
    pub const ALL: [Self; 6] = [
        Self::Users,
        Self::CaseFiles,
        Self::Visits,
        Self::FamilyMembers,
        Self::Projects,
        Self::ProjectMembers,
    ];

    /// Collection path relative to the API base URL.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Users => "usuarios/",
            Self::CaseFiles => "expedientes/",
            Self::Visits => "visitas/",
            Self::FamilyMembers => "familiares/",
            Self::Projects => "proyectos/",
            Self::ProjectMembers => "proyecto-usuarios/",
        }
    }

    /// Instance path, e.g. `expedientes/42/`.
    pub fn item(self, id: impl fmt::Display) -> String {
        format!("{}{}/", self.collection(), id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection().trim_end_matches('/'))
    }
}

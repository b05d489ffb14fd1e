/// Permission requirement for gating navigation and UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredPermissions {
    One(String),
    /// Every listed permission must be granted.
    All(Vec<String>),
}

impl From<&str> for RequiredPermissions {
    fn from(p: &str) -> Self {
        Self::One(p.to_string())
    }
}

impl From<String> for RequiredPermissions {
    fn from(p: String) -> Self {
        Self::One(p)
    }
}

impl From<Vec<String>> for RequiredPermissions {
    fn from(ps: Vec<String>) -> Self {
        Self::All(ps)
    }
}

impl From<&[&str]> for RequiredPermissions {
    fn from(ps: &[&str]) -> Self {
        Self::All(ps.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RequiredPermissions {
    fn from(ps: [&str; N]) -> Self {
        Self::All(ps.iter().map(|p| p.to_string()).collect())
    }
}

/// True when every required permission is present in `granted`.
pub fn has_permission(granted: &[String], required: impl Into<RequiredPermissions>) -> bool {
    let is_granted = |p: &str| granted.iter().any(|g| g == p);

    match required.into() {
        RequiredPermissions::One(p) => is_granted(p.as_str()),
        RequiredPermissions::All(ps) => ps.iter().all(|p| is_granted(p.as_str())),
    }
}

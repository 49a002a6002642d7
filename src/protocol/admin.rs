//! Admin membership capability.

use std::collections::BTreeSet;

/// Host-provided privileged-address check
pub trait AdminSet {
    fn is_member(&self, id: &str) -> bool;
}

/// Fixed admin set, usually built from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticAdminSet {
    members: BTreeSet<String>,
}

impl StaticAdminSet {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    pub fn single(admin: impl Into<String>) -> Self {
        Self::new([admin.into()])
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl AdminSet for StaticAdminSet {
    fn is_member(&self, id: &str) -> bool {
        self.members.contains(id)
    }
}

//! Rotation records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::staff::Role;

/// One generated break order, split by role.
///
/// Records are immutable once created. The persisted field names match the
/// history layout (`pharmacists`, `clerks`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationRecord {
    /// Records saved as the last order before ids existed carry no id.
    #[serde(default)]
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "pharmacists")]
    pub pharmacist_order: Vec<String>,
    #[serde(rename = "clerks")]
    pub clerk_order: Vec<String>,
}

/// One slot of a staggered reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealStep<'a> {
    pub role: Role,
    /// 1-based position in the role's order.
    pub position: usize,
    pub name: &'a str,
}

impl RotationRecord {
    pub fn new(timestamp: String, pharmacist_order: Vec<String>, clerk_order: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            timestamp,
            pharmacist_order,
            clerk_order,
        }
    }

    /// Names in break order for a role.
    pub fn order_for(&self, role: Role) -> &[String] {
        match role {
            Role::Pharmacist => &self.pharmacist_order,
            Role::Clerk => &self.clerk_order,
        }
    }

    /// Total number of scheduled people.
    pub fn len(&self) -> usize {
        self.pharmacist_order.len() + self.clerk_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots in reveal order, alternating pharmacist and clerk columns
    /// until both are exhausted.
    pub fn reveal_sequence(&self) -> Vec<RevealStep<'_>> {
        let mut steps = Vec::with_capacity(self.len());
        let longest = self.pharmacist_order.len().max(self.clerk_order.len());

        for idx in 0..longest {
            for role in Role::ALL {
                if let Some(name) = self.order_for(role).get(idx) {
                    steps.push(RevealStep {
                        role,
                        position: idx + 1,
                        name,
                    });
                }
            }
        }

        steps
    }
}

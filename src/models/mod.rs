//! Data models for staff, presence counts, and rotation records.

pub mod rotation;
pub mod staff;

pub use rotation::{RevealStep, RotationRecord};
pub use staff::{ParseRoleError, PresenceSummary, Role, RoleCount, StaffId, StaffMember};

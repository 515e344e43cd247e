//! Roster and rotation store.
//!
//! Owns the roster, the presence set, and rotation history. Every successful
//! mutation is written back to the key-value backend before returning.

use std::fmt::Write as _;

use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{PresenceSummary, Role, RoleCount, RotationRecord, StaffId, StaffMember};
use crate::shuffle::shuffled;
use crate::storage::{KEY_CHECKS, KEY_HISTORY, KEY_LAST_ORDER, KEY_STAFF, KeyValueStore};


/// Default chrono format for rotation timestamps.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Store behavior settings.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub timestamp_format: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// State as of the start of a mutation.
struct Snapshot {
    staff: Vec<StaffMember>,
    presence: Vec<StaffId>,
    history: Vec<RotationRecord>,
    last_rotation: Option<RotationRecord>,
}

/// Roster, presence, and history with write-through persistence.
pub struct RosterStore<S: KeyValueStore, R: Rng = StdRng> {
    storage: S,
    rng: R,
    options: StoreOptions,
    staff: Vec<StaffMember>,
    presence: Vec<StaffId>,
    history: Vec<RotationRecord>,
    last_rotation: Option<RotationRecord>,
}

impl<S: KeyValueStore> RosterStore<S, StdRng> {
    /// Open with an entropy-seeded generator.
    pub fn open_default(storage: S, options: StoreOptions) -> Result<Self> {
        Self::open(storage, StdRng::from_entropy(), options)
    }
}

impl<S: KeyValueStore, R: Rng> RosterStore<S, R> {
    /// Load persisted state from `storage`.
    ///
    /// Missing keys start empty. Blobs that fail to parse are logged and
    /// treated as empty. Presence ids that no longer match a roster entry
    /// are dropped.
    pub fn open(storage: S, rng: R, options: StoreOptions) -> Result<Self> {
        let staff: Vec<StaffMember> = load_or_default(&storage, KEY_STAFF)?;
        let raw_presence: Vec<StaffId> = load_or_default(&storage, KEY_CHECKS)?;
        let history: Vec<RotationRecord> = load_or_default(&storage, KEY_HISTORY)?;
        let last_rotation: Option<RotationRecord> = load_or_default(&storage, KEY_LAST_ORDER)?;

        let mut presence: Vec<StaffId> = Vec::with_capacity(raw_presence.len());
        for id in raw_presence {
            if staff.iter().any(|s| s.id == id) && !presence.contains(&id) {
                presence.push(id);
            }
        }

        info!(
            "Loaded {} staff, {} present, {} history records",
            staff.len(),
            presence.len(),
            history.len()
        );

        Ok(Self {
            storage,
            rng,
            options,
            staff,
            presence,
            history,
            last_rotation,
        })
    }

    /// Backing key-value store.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ---- queries ----

    /// All staff in insertion order.
    pub fn roster(&self) -> &[StaffMember] {
        &self.staff
    }

    /// Staff with the given role, in roster order.
    pub fn staff_by_role(&self, role: Role) -> Vec<&StaffMember> {
        self.staff.iter().filter(|s| s.role == role).collect()
    }

    pub fn get(&self, id: &StaffId) -> Option<&StaffMember> {
        self.staff.iter().find(|s| &s.id == id)
    }

    /// Find a staff member by exact id, unique case-insensitive name, or
    /// unique id prefix, in that order.
    pub fn resolve(&self, query: &str) -> Result<&StaffMember> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::not_found("empty staff reference"));
        }

        if let Some(member) = self.staff.iter().find(|s| s.id.as_str() == query) {
            return Ok(member);
        }

        // Names win over id prefixes: short names can look like hex
        let lowered = query.to_lowercase();
        let by_name: Vec<_> = self.staff.iter().filter(|s| s.name.to_lowercase() == lowered).collect();
        match by_name.as_slice() {
            [member] => return Ok(*member),
            [] => {}
            matches => {
                return Err(AppError::not_found(format!(
                    "'{query}' is ambiguous ({} staff share that name)",
                    matches.len()
                )));
            }
        }

        let by_prefix: Vec<_> = self.staff.iter().filter(|s| s.id.as_str().starts_with(query)).collect();
        match by_prefix.as_slice() {
            [member] => Ok(*member),
            [] => Err(AppError::not_found(format!("no staff member matches '{query}'"))),
            matches => Err(AppError::not_found(format!(
                "'{query}' is ambiguous ({} ids start with it)",
                matches.len()
            ))),
        }
    }

    /// Present ids in the order they were marked.
    pub fn presence(&self) -> &[StaffId] {
        &self.presence
    }

    pub fn is_present(&self, id: &StaffId) -> bool {
        self.presence.contains(id)
    }

    /// Present staff in roster order.
    pub fn present_staff(&self) -> Vec<&StaffMember> {
        self.staff.iter().filter(|s| self.is_present(&s.id)).collect()
    }

    pub fn presence_summary(&self) -> PresenceSummary {
        let count = |role: Role| {
            let members = self.staff_by_role(role);
            RoleCount {
                present: members.iter().filter(|s| self.is_present(&s.id)).count(),
                total: members.len(),
            }
        };
        PresenceSummary {
            pharmacists: count(Role::Pharmacist),
            clerks: count(Role::Clerk),
        }
    }

    /// Rotation history, most recent first.
    pub fn history(&self) -> &[RotationRecord] {
        &self.history
    }

    /// Most recently generated rotation, kept even after history is cleared.
    pub fn last_rotation(&self) -> Option<&RotationRecord> {
        self.last_rotation.as_ref()
    }

    // ---- roster ----

    /// Add a staff member. New members are not marked present.
    pub fn add_staff(&mut self, name: &str, role: Role) -> Result<StaffMember> {
        let name = validate_name(name)?;
        let member = StaffMember {
            id: self.fresh_id(),
            name,
            role,
        };

        let snapshot = self.snapshot();
        self.staff.push(member.clone());
        self.commit(snapshot)?;

        info!("Added {} '{}' ({})", member.role, member.name, member.id);
        Ok(member)
    }

    /// Rename and/or change the role of a staff member.
    pub fn update_staff(&mut self, id: &StaffId, name: &str, role: Role) -> Result<()> {
        let idx = self.index_of(id)?;
        let name = validate_name(name)?;

        let snapshot = self.snapshot();
        let member = &mut self.staff[idx];
        member.name = name;
        member.role = role;
        self.commit(snapshot)?;

        let member = &self.staff[idx];
        info!("Updated staff {}: '{}' ({})", member.id, member.name, member.role);
        Ok(())
    }

    /// Remove a staff member and their presence mark.
    pub fn remove_staff(&mut self, id: &StaffId) -> Result<StaffMember> {
        let idx = self.index_of(id)?;

        let snapshot = self.snapshot();
        let removed = self.staff.remove(idx);
        self.presence.retain(|p| p != id);
        self.commit(snapshot)?;

        info!("Removed staff '{}' ({})", removed.name, removed.id);
        Ok(removed)
    }

    // ---- presence ----

    pub fn set_present(&mut self, id: &StaffId, present: bool) -> Result<()> {
        self.index_of(id)?;

        let snapshot = self.snapshot();
        let already = self.is_present(id);
        if present && !already {
            self.presence.push(id.clone());
        } else if !present && already {
            self.presence.retain(|p| p != id);
        }
        self.commit(snapshot)?;

        debug!("Presence of {} set to {}", id, present);
        Ok(())
    }

    /// Flip presence for a staff member. Returns the new state.
    pub fn toggle_present(&mut self, id: &StaffId) -> Result<bool> {
        let present = !self.is_present(id);
        self.set_present(id, present)?;
        Ok(present)
    }

    /// Mark everyone present (roster order) or nobody.
    pub fn set_all_present(&mut self, present: bool) -> Result<()> {
        let snapshot = self.snapshot();
        self.presence = if present {
            self.staff.iter().map(|s| s.id.clone()).collect()
        } else {
            Vec::new()
        };
        self.commit(snapshot)?;

        info!("Presence set to {} of {} staff", self.presence.len(), self.staff.len());
        Ok(())
    }

    // ---- rotation ----

    /// Shuffle present staff per role and record the result.
    ///
    /// Each role is permuted independently; a role with nobody present gets
    /// an empty order.
    pub fn generate_rotation(&mut self) -> Result<RotationRecord> {
        if self.presence.is_empty() {
            warn!("Rotation requested with nobody present");
            return Err(AppError::EmptySelection);
        }

        let timestamp = self.timestamp()?;

        let (pharmacists, clerks): (Vec<&StaffMember>, Vec<&StaffMember>) = self
            .staff
            .iter()
            .filter(|s| self.presence.contains(&s.id))
            .partition(|s| s.role == Role::Pharmacist);

        let pharmacist_names: Vec<String> = pharmacists.into_iter().map(|s| s.name.clone()).collect();
        let clerk_names: Vec<String> = clerks.into_iter().map(|s| s.name.clone()).collect();

        let pharmacist_order = shuffled(pharmacist_names, &mut self.rng);
        let clerk_order = shuffled(clerk_names, &mut self.rng);

        let record = RotationRecord::new(timestamp, pharmacist_order, clerk_order);
        let snapshot = self.snapshot();
        self.history.insert(0, record.clone());
        self.last_rotation = Some(record.clone());
        self.commit(snapshot)?;

        info!(
            "Generated rotation {}: {} pharmacists, {} clerks",
            record.id,
            record.pharmacist_order.len(),
            record.clerk_order.len()
        );
        Ok(record)
    }

    /// Drop all history. The last rotation stays viewable.
    pub fn clear_history(&mut self) -> Result<()> {
        let count = self.history.len();
        let snapshot = self.snapshot();
        self.history.clear();
        self.commit(snapshot)?;

        info!("Cleared {} history records", count);
        Ok(())
    }

    // ---- internals ----

    fn index_of(&self, id: &StaffId) -> Result<usize> {
        self.staff
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| AppError::not_found(format!("staff {id}")))
    }

    fn fresh_id(&self) -> StaffId {
        loop {
            let id = StaffId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn timestamp(&self) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", Local::now().format(&self.options.timestamp_format)).map_err(|_| {
            AppError::config(format!(
                "invalid timestamp format '{}'",
                self.options.timestamp_format
            ))
        })?;
        Ok(out)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            staff: self.staff.clone(),
            presence: self.presence.clone(),
            history: self.history.clone(),
            last_rotation: self.last_rotation.clone(),
        }
    }

    /// Persist the current state. On failure the in-memory state is put back
    /// to `snapshot` and a best-effort write of it is attempted.
    fn commit(&mut self, snapshot: Snapshot) -> Result<()> {
        let Err(e) = self.persist() else {
            return Ok(());
        };

        warn!("Persist failed, rolling back: {}", e);
        self.staff = snapshot.staff;
        self.presence = snapshot.presence;
        self.history = snapshot.history;
        self.last_rotation = snapshot.last_rotation;
        if let Err(restore_err) = self.persist() {
            warn!("Could not rewrite previous state: {}", restore_err);
        }
        Err(e)
    }

    fn persist(&mut self) -> Result<()> {
        save(&mut self.storage, KEY_STAFF, &self.staff)?;
        save(&mut self.storage, KEY_CHECKS, &self.presence)?;
        save(&mut self.storage, KEY_HISTORY, &self.history)?;
        match &self.last_rotation {
            Some(record) => save(&mut self.storage, KEY_LAST_ORDER, record)?,
            None => self.storage.remove(KEY_LAST_ORDER)?,
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Staff name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn load_or_default<S, T>(storage: &S, key: &str) -> Result<T>
where
    S: KeyValueStore,
    T: DeserializeOwned + Default,
{
    let Some(raw) = storage.get(key)? else {
        debug!("No stored value for {}", key);
        return Ok(T::default());
    };

    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(e) => {
            warn!("Ignoring unreadable value for {}: {}", key, e);
            Ok(T::default())
        }
    }
}

fn save<S: KeyValueStore, T: Serialize + ?Sized>(storage: &mut S, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

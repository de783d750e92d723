// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduled class model (weekly timetable entry at a branch).

use crate::db::repository::{SortKey, TenantScoped};
use crate::models::{BranchId, ClassId, TenantId, UserId};
use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Audience level of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassLevel {
    #[default]
    AllLevels,
    Beginner,
    Intermediate,
    Advanced,
    Kids,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingClass {
    pub id: ClassId,
    pub tenant_id: TenantId,
    pub branch_id: BranchId,
    pub coach_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub weekday: Weekday,
    /// Local start time, `HH:MM`.
    pub start_time: String,
    pub duration_minutes: u32,
    pub capacity: u32,
    pub level: ClassLevel,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPatch {
    pub coach_id: Option<UserId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub weekday: Option<Weekday>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub capacity: Option<u32>,
    pub level: Option<ClassLevel>,
    pub active: Option<bool>,
}

/// Check an `HH:MM` 24-hour clock string.
pub fn is_valid_start_time(value: &str) -> bool {
    chrono::NaiveTime::parse_from_str(value, "%H:%M").is_ok() && value.len() == 5
}

impl TenantScoped for TrainingClass {
    type Id = ClassId;
    type Patch = ClassPatch;

    const TABLE: &'static str = crate::db::collections::CLASSES;

    fn id(&self) -> ClassId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        if let Some(description) = &self.description {
            fields.push(description);
        }
        fields
    }

    fn status_label(&self) -> &'static str {
        if self.active {
            "active"
        } else {
            "inactive"
        }
    }

    fn branch_id(&self) -> Option<BranchId> {
        Some(self.branch_id)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::text(&self.name)),
            "weekday" => Some(SortKey::Number(i64::from(
                self.weekday.num_days_from_monday(),
            ))),
            "startTime" | "start_time" => Some(SortKey::text(&self.start_time)),
            "capacity" => Some(SortKey::Number(i64::from(self.capacity))),
            _ => None,
        }
    }

    fn apply_patch(&mut self, patch: ClassPatch) {
        if let Some(coach_id) = patch.coach_id {
            self.coach_id = coach_id;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(weekday) = patch.weekday {
            self.weekday = weekday;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(duration) = patch.duration_minutes {
            self.duration_minutes = duration;
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = capacity;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_time_format() {
        assert!(is_valid_start_time("06:30"));
        assert!(is_valid_start_time("23:59"));
        assert!(!is_valid_start_time("6:30"));
        assert!(!is_valid_start_time("24:00"));
        assert!(!is_valid_start_time("noon"));
    }
}

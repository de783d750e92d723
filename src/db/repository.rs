// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generic tenant-scoped repository.
//!
//! Every read and write takes a [`TenantId`] (or, for `create`, reads it from
//! the row itself) and every predicate conjoins `tenant_id == <param>`. There
//! is no method that touches a row without a tenant predicate, apart from the
//! tenant-domain lookup used to resolve a login namespace.
//!
//! A row owned by another tenant is indistinguishable from a missing row:
//! lookups return `None`, updates return `None`, deletes return `false`.

use crate::error::AppError;
use crate::models::{BranchId, TenantId};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::Arc;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// Comparable value extracted from a row for sorting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Number(i64),
    Text(String),
    Time(DateTime<Utc>),
}

impl SortKey {
    /// Case-insensitive text key.
    pub fn text(value: &str) -> Self {
        SortKey::Text(value.to_lowercase())
    }
}

/// Namespace of an entity's unique key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueScope {
    /// Unique within the owning tenant (e.g. user email).
    Tenant,
    /// Unique across all tenants (e.g. tenant domain).
    Global,
}

/// An entity stored under a tenant.
pub trait TenantScoped: Clone + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;
    type Patch;

    /// Table name, used in logs.
    const TABLE: &'static str;
    const UNIQUE_SCOPE: UniqueScope = UniqueScope::Tenant;

    fn id(&self) -> Self::Id;
    fn tenant_id(&self) -> TenantId;
    fn created_at(&self) -> DateTime<Utc>;
    /// Stamp the modification time.
    fn touch(&mut self, now: DateTime<Utc>);
    /// Fields matched by the `search` filter.
    fn search_fields(&self) -> Vec<&str>;
    /// Value matched by the `status` filter.
    fn status_label(&self) -> &'static str;

    fn branch_id(&self) -> Option<BranchId> {
        None
    }

    /// Key for a whitelisted sort field; `None` falls back to creation time.
    fn sort_key(&self, _field: &str) -> Option<SortKey> {
        None
    }

    /// Key enforced unique by the store within [`Self::UNIQUE_SCOPE`].
    fn unique_key(&self) -> Option<String> {
        None
    }

    fn apply_patch(&mut self, patch: Self::Patch);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// 1-indexed page window plus sort instructions.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: None,
            sort_order: SortOrder::Desc,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.limit as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Case-insensitive substring match over the entity's search fields.
    pub search: Option<String>,
    /// Exact (case-insensitive) match on the entity's status label.
    pub status: Option<String>,
    pub branch_id: Option<BranchId>,
}

impl Filters {
    fn matches<T: TenantScoped>(&self, row: &T) -> bool {
        if let Some(status) = &self.status {
            if !row.status_label().eq_ignore_ascii_case(status) {
                return false;
            }
        }
        if let Some(branch_id) = self.branch_id {
            if row.branch_id() != Some(branch_id) {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                return row
                    .search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle));
            }
        }
        true
    }
}

/// One page of results plus the filtered total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Count of all rows matching the filters, independent of the window.
    pub total: u64,
}

struct Table<T: TenantScoped> {
    rows: DashMap<T::Id, T>,
    /// (owning tenant for tenant-scoped keys, key) -> row id
    unique: DashMap<(Option<TenantId>, String), T::Id>,
}

/// Tenant-scoped CRUD over one entity type.
///
/// Cheap to clone; clones share the same table.
pub struct Repository<T: TenantScoped> {
    table: Arc<Table<T>>,
}

impl<T: TenantScoped> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<T: TenantScoped> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TenantScoped> Repository<T> {
    pub fn new() -> Self {
        Self {
            table: Arc::new(Table {
                rows: DashMap::new(),
                unique: DashMap::new(),
            }),
        }
    }

    fn index_key(row: &T) -> Option<(Option<TenantId>, String)> {
        let key = row.unique_key()?;
        let scope = match T::UNIQUE_SCOPE {
            UniqueScope::Tenant => Some(row.tenant_id()),
            UniqueScope::Global => None,
        };
        Some((scope, key))
    }

    fn conflict(key: &str) -> AppError {
        AppError::Conflict(format!("{} '{}' already exists", T::TABLE, key))
    }

    /// List rows of `tenant_id` matching `filters`, one page at a time.
    pub async fn find_all(
        &self,
        tenant_id: TenantId,
        pagination: &Pagination,
        filters: &Filters,
    ) -> Result<Page<T>, AppError> {
        let mut matching: Vec<T> = self
            .table
            .rows
            .iter()
            .filter(|row| row.tenant_id() == tenant_id && filters.matches(row.value()))
            .map(|row| row.value().clone())
            .collect();

        let total = matching.len() as u64;
        let sort_by = pagination.sort_by.as_deref();
        matching.sort_by(|a, b| {
            let ordering = compare_rows(a, b, sort_by);
            match pagination.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let items = matching
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit as usize)
            .collect();

        Ok(Page { items, total })
    }

    /// Look up a row by id within `tenant_id`.
    pub async fn find_by_id(&self, id: T::Id, tenant_id: TenantId) -> Result<Option<T>, AppError> {
        Ok(self
            .table
            .rows
            .get(&id)
            .filter(|row| row.tenant_id() == tenant_id)
            .map(|row| row.value().clone()))
    }

    /// First row of `tenant_id` satisfying `predicate`.
    pub async fn find_one<F>(&self, tenant_id: TenantId, predicate: F) -> Result<Option<T>, AppError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self
            .table
            .rows
            .iter()
            .find(|row| row.tenant_id() == tenant_id && predicate(row.value()))
            .map(|row| row.value().clone()))
    }

    /// Look up a row of `tenant_id` through its unique key.
    pub async fn find_by_unique_key(
        &self,
        tenant_id: TenantId,
        key: &str,
    ) -> Result<Option<T>, AppError> {
        let scope = match T::UNIQUE_SCOPE {
            UniqueScope::Tenant => Some(tenant_id),
            UniqueScope::Global => None,
        };
        let Some(id) = self
            .table
            .unique
            .get(&(scope, key.to_lowercase()))
            .map(|entry| *entry.value())
        else {
            return Ok(None);
        };
        self.find_by_id(id, tenant_id).await
    }

    /// Insert a new row under the tenant named inside it.
    ///
    /// The unique key is reserved in the store's index before the row becomes
    /// visible, so two racing creates for the same key cannot both succeed.
    pub async fn create(&self, row: T) -> Result<T, AppError> {
        let id = row.id();
        if self.table.rows.contains_key(&id) {
            return Err(AppError::Conflict(format!("{} {} already exists", T::TABLE, id)));
        }

        if let Some(key) = Self::index_key(&row) {
            match self.table.unique.entry(key) {
                Entry::Occupied(entry) => return Err(Self::conflict(&entry.key().1)),
                Entry::Vacant(entry) => {
                    entry.insert(id);
                }
            }
        }

        self.table.rows.insert(id, row.clone());
        tracing::debug!(table = T::TABLE, id = %id, tenant_id = %row.tenant_id(), "Row created");
        Ok(row)
    }

    /// Apply `patch` to the row matching both `id` and `tenant_id`.
    pub async fn update(
        &self,
        id: T::Id,
        tenant_id: TenantId,
        patch: T::Patch,
    ) -> Result<Option<T>, AppError> {
        self.update_with(id, tenant_id, |row| row.apply_patch(patch))
            .await
    }

    /// Mutate the row matching both `id` and `tenant_id` in one step.
    ///
    /// The row stays locked while `mutate` runs and the new value is written
    /// only if its unique key is still free, so the row is never observed
    /// half-updated.
    pub async fn update_with<F>(
        &self,
        id: T::Id,
        tenant_id: TenantId,
        mutate: F,
    ) -> Result<Option<T>, AppError>
    where
        F: FnOnce(&mut T),
    {
        self.update_if(id, tenant_id, |row| {
            mutate(row);
            true
        })
        .await
    }

    /// Like [`Self::update_with`], but `mutate` reports whether it changed
    /// anything. When it returns `false` nothing is written and the stored
    /// row is returned as is.
    pub async fn update_if<F>(
        &self,
        id: T::Id,
        tenant_id: TenantId,
        mutate: F,
    ) -> Result<Option<T>, AppError>
    where
        F: FnOnce(&mut T) -> bool,
    {
        let Some(mut current) = self.table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if current.tenant_id() != tenant_id {
            return Ok(None);
        }

        let mut updated = current.clone();
        if !mutate(&mut updated) {
            return Ok(Some(current.clone()));
        }
        updated.touch(Utc::now());

        if updated.id() != id || updated.tenant_id() != tenant_id {
            return Err(AppError::BadRequest(
                "Row identity and tenant are immutable".to_string(),
            ));
        }

        let old_key = Self::index_key(&current);
        let new_key = Self::index_key(&updated);
        if new_key != old_key {
            if let Some(key) = new_key {
                match self.table.unique.entry(key) {
                    Entry::Occupied(entry) => return Err(Self::conflict(&entry.key().1)),
                    Entry::Vacant(entry) => {
                        entry.insert(id);
                    }
                }
            }
            if let Some(key) = old_key {
                self.table.unique.remove(&key);
            }
        }

        *current = updated.clone();
        Ok(Some(updated))
    }

    /// Remove the row matching both `id` and `tenant_id`.
    ///
    /// Returns `false` for a missing row and for another tenant's row alike.
    pub async fn delete(&self, id: T::Id, tenant_id: TenantId) -> Result<bool, AppError> {
        let removed = self
            .table
            .rows
            .remove_if(&id, |_, row| row.tenant_id() == tenant_id);

        let Some((_, row)) = removed else {
            return Ok(false);
        };
        if let Some(key) = Self::index_key(&row) {
            self.table.unique.remove_if(&key, |_, owner| *owner == id);
        }
        tracing::debug!(table = T::TABLE, id = %id, tenant_id = %tenant_id, "Row deleted");
        Ok(true)
    }

    /// Number of rows of `tenant_id` matching `filters`.
    pub async fn count(&self, tenant_id: TenantId, filters: &Filters) -> Result<u64, AppError> {
        Ok(self
            .table
            .rows
            .iter()
            .filter(|row| row.tenant_id() == tenant_id && filters.matches(row.value()))
            .count() as u64)
    }

    /// Drop every row (process teardown and test isolation).
    pub(crate) fn clear(&self) {
        self.table.rows.clear();
        self.table.unique.clear();
    }

    /// Resolve a globally-unique key to its row without a tenant predicate.
    ///
    /// Only meaningful for [`UniqueScope::Global`] entities; used to map a
    /// login namespace (tenant domain) to its tenant.
    pub(crate) fn find_by_global_key(&self, key: &str) -> Option<T> {
        if T::UNIQUE_SCOPE != UniqueScope::Global {
            return None;
        }
        let id = *self.table.unique.get(&(None, key.to_lowercase()))?.value();
        self.table.rows.get(&id).map(|row| row.value().clone())
    }
}

fn compare_rows<T: TenantScoped>(a: &T, b: &T, sort_by: Option<&str>) -> Ordering {
    let keyed = sort_by.and_then(|field| match (a.sort_key(field), b.sort_key(field)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        (Some(_), None) => Some(Ordering::Greater),
        (None, Some(_)) => Some(Ordering::Less),
        (None, None) => None,
    });
    keyed
        .filter(|ordering| *ordering != Ordering::Equal)
        .unwrap_or_else(|| a.created_at().cmp(&b.created_at()))
}

//! Tree serial allocation
//!
//! Serials are dot-separated, zero-padded ordinals (`001.002.014`). A node's
//! serial is always its parent's serial plus one segment, and siblings never
//! share the last segment. Allocation reads the projection table and then
//! writes, so it assumes a single writer per batch.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, info, warn};

use crate::config::ReconcileConfig;
use crate::entity::{department, tree_department};
use crate::error::{SyncError, SyncResult};
use crate::hierarchy::segment::PATH_SEPARATOR;

/// Serial of the organization root
pub const ROOT_SERIAL: &str = "001";

pub struct SerialAllocator<'a> {
    config: &'a ReconcileConfig,
}

impl<'a> SerialAllocator<'a> {
    pub fn new(config: &'a ReconcileConfig) -> Self {
        Self { config }
    }

    /// Serial for `node`. Never fails: lookup errors fall back to [`ROOT_SERIAL`].
    pub async fn assign<C: ConnectionTrait>(&self, db: &C, node: &department::Model) -> String {
        match self.try_assign(db, node).await {
            Ok(serial) => serial,
            Err(e) => {
                warn!(
                    "Serial allocation failed for {} (level {}), falling back to {}: {}",
                    node.code, node.level, ROOT_SERIAL, e
                );
                ROOT_SERIAL.to_string()
            }
        }
    }

    async fn try_assign<C: ConnectionTrait>(
        &self,
        db: &C,
        node: &department::Model,
    ) -> SyncResult<String> {
        if node.level <= 1 {
            return Ok(ROOT_SERIAL.to_string());
        }

        let current = tree_department::Entity::find_by_id(node.id)
            .one(db)
            .await?
            .map(|t| t.serial);

        if node.level == 2 {
            self.assign_top(db, node, current.as_deref()).await
        } else {
            self.assign_child(db, node, current.as_deref()).await
        }
    }

    /// Level 2: derive from projected descendants, else keep, else allocate under root
    async fn assign_top<C: ConnectionTrait>(
        &self,
        db: &C,
        node: &department::Model,
        current: Option<&str>,
    ) -> SyncResult<String> {
        let prefix = format!("{}.", ROOT_SERIAL);
        let rows = tree_department::Entity::find()
            .filter(tree_department::Column::Serial.starts_with(&prefix))
            .order_by_asc(tree_department::Column::Serial)
            .all(db)
            .await?;

        let others: Vec<&tree_department::Model> = rows.iter().filter(|r| r.id != node.id).collect();
        let taken_top: HashSet<&str> = others
            .iter()
            .filter(|r| r.level == 2)
            .map(|r| r.serial.as_str())
            .collect();

        if let Some(serial) = derive_from_descendants(&others, &node.name, &taken_top) {
            info!("Derived serial {} for {} from existing sub-departments", serial, node.code);
            return Ok(serial);
        }

        if let Some(cur) = current {
            if top_suffix(cur).is_some() && !taken_top.contains(cur) {
                debug!("Keeping serial {} for {}", cur, node.code);
                return Ok(cur.to_string());
            }
        }

        // Deeper rows count too, so orphaned subtrees keep their prefix
        let used: HashSet<u32> = others.iter().filter_map(|r| top_suffix(&r.serial)).collect();
        let next = smallest_unused(&used, self.config.start_suffix());
        let serial = format!("{}.{:03}", ROOT_SERIAL, next);
        info!("Allocated serial {} for {}", serial, node.code);
        Ok(serial)
    }

    /// Level 3 and below: keep a still-valid serial, else next free slot under the parent
    async fn assign_child<C: ConnectionTrait>(
        &self,
        db: &C,
        node: &department::Model,
        current: Option<&str>,
    ) -> SyncResult<String> {
        let parent_code = node
            .parent_code
            .as_deref()
            .ok_or_else(|| SyncError::ParentNotProjected(node.code.clone()))?;

        let parent = department::Entity::find()
            .filter(department::Column::Code.eq(parent_code))
            .one(db)
            .await?
            .ok_or_else(|| SyncError::ParentNotProjected(parent_code.to_string()))?;

        let parent_serial = tree_department::Entity::find_by_id(parent.id)
            .one(db)
            .await?
            .map(|t| t.serial)
            .ok_or_else(|| SyncError::ParentNotProjected(parent_code.to_string()))?;

        if !is_well_formed(&parent_serial) {
            return Err(SyncError::MalformedSerial(parent_serial));
        }

        let prefix = format!("{}.", parent_serial);
        let child_depth = parent_serial.split('.').count() + 1;

        let rows = tree_department::Entity::find()
            .filter(tree_department::Column::Serial.starts_with(&prefix))
            .filter(tree_department::Column::Id.ne(node.id))
            .all(db)
            .await?;

        // Direct children only; deeper descendants share the prefix
        let used: HashSet<u32> = rows
            .iter()
            .filter(|r| r.serial_depth() == child_depth)
            .filter_map(|r| last_segment(&r.serial))
            .collect();

        if let Some(cur) = current {
            if cur.starts_with(&prefix) && cur.split('.').count() == child_depth {
                if let Some(n) = last_segment(cur) {
                    if !used.contains(&n) {
                        debug!("Keeping serial {} for {}", cur, node.code);
                        return Ok(cur.to_string());
                    }
                }
            }
        }

        let next = smallest_unused(&used, 1);
        let serial = format!("{}.{:03}", parent_serial, next);
        info!("Allocated serial {} for {}", serial, node.code);
        Ok(serial)
    }
}

/// Pick the level-2 prefix of the best matching descendant.
///
/// A descendant matches when a token of its full name equals `short_name`
/// or starts with it. Exact matches rank before prefix matches, then lower
/// serials first. Prefixes already held by another level-2 node are skipped.
fn derive_from_descendants(
    rows: &[&tree_department::Model],
    short_name: &str,
    taken_top: &HashSet<&str>,
) -> Option<String> {
    let name = short_name.trim();
    if name.is_empty() {
        return None;
    }

    let mut candidates: Vec<(u8, &str)> = rows
        .iter()
        .filter(|r| r.level > 2)
        .filter_map(|r| {
            let tokens: Vec<&str> = r.full_name.split(PATH_SEPARATOR).map(str::trim).collect();
            if tokens.iter().any(|t| *t == name) {
                Some((0, r.serial.as_str()))
            } else if tokens.iter().any(|t| t.starts_with(name)) {
                Some((1, r.serial.as_str()))
            } else {
                None
            }
        })
        .collect();
    candidates.sort();

    candidates.into_iter().find_map(|(_, serial)| {
        let suffix = top_suffix(serial)?;
        let derived = format!("{}.{:03}", ROOT_SERIAL, suffix);
        if taken_top.contains(derived.as_str()) {
            None
        } else {
            Some(derived)
        }
    })
}

/// Second segment of a serial under the root, if numeric
fn top_suffix(serial: &str) -> Option<u32> {
    let mut segs = serial.split('.');
    if segs.next()? != ROOT_SERIAL {
        return None;
    }
    segs.next()?.parse().ok()
}

fn last_segment(serial: &str) -> Option<u32> {
    serial.rsplit('.').next()?.parse().ok()
}

fn is_well_formed(serial: &str) -> bool {
    !serial.is_empty()
        && serial
            .split('.')
            .all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
}

fn smallest_unused(used: &HashSet<u32>, start: u32) -> u32 {
    let mut n = start.max(1);
    while used.contains(&n) {
        n += 1;
    }
    n
}

//! Ancestor chain resolution
//!
//! Guarantees a path and all of its ancestors exist before anything is
//! written beneath them, whatever order the snapshot lists paths in.

use std::collections::HashSet;

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{BootstrapDepartment, ReconcileConfig};
use crate::entity::{department, tree_department};
use crate::error::{OptionExt, SyncError, SyncResult};
use crate::hierarchy::projection::sync_projection;
use crate::hierarchy::segment::DepartmentPath;

/// Snapshot attributes carried by a department row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeAttrs {
    pub company_key: Option<String>,
    pub dep_no: Option<String>,
    pub dep_code: Option<String>,
    pub description: Option<String>,
}

pub struct AncestorResolver<'a> {
    config: &'a ReconcileConfig,
}

impl<'a> AncestorResolver<'a> {
    pub fn new(config: &'a ReconcileConfig) -> Self {
        Self { config }
    }

    /// Make sure `path` and every proper ancestor of it exist.
    ///
    /// Walks upward until an existing node is found, then creates the
    /// missing nodes root first. Idempotent. An override table that leads
    /// the walk back to a path it already visited is rejected.
    pub async fn ensure_chain<C: ConnectionTrait>(&self, db: &C, path: &str) -> SyncResult<()> {
        let target =
            DepartmentPath::parse(path).ok_or_else(|| SyncError::InvalidPath(path.to_string()))?;

        let mut missing = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(target);
        while let Some(p) = cursor {
            if !visited.insert(p.code().to_string()) {
                return Err(SyncError::InvalidPath(format!(
                    "{} (parent overrides loop back to {})",
                    path,
                    p.code()
                )));
            }
            if find_by_code(db, p.code()).await?.is_some() {
                break;
            }
            cursor = p
                .parent_path_with(&self.config.parent_overrides)
                .as_deref()
                .and_then(DepartmentPath::parse);
            missing.push(p);
        }

        while let Some(p) = missing.pop() {
            let parent_code = p.parent_path_with(&self.config.parent_overrides);
            let level = level_for(db, self.config, &p, parent_code.as_deref()).await?;
            create_node(db, self.config, &p, parent_code, level, NodeAttrs::default())
                .await
                .map_err(|e| SyncError::AncestorCreate {
                    path: p.code().to_string(),
                    source: Box::new(e),
                })?;
            info!("Created missing ancestor department {}", p.code());
        }
        Ok(())
    }

    /// Ensure one configured bootstrap department. Returns whether it was created.
    pub async fn ensure_bootstrap<C: ConnectionTrait>(
        &self,
        db: &C,
        entry: &BootstrapDepartment,
    ) -> SyncResult<bool> {
        let path = DepartmentPath::parse(&entry.code)
            .ok_or_else(|| SyncError::InvalidPath(entry.code.clone()))?;
        if find_by_code(db, path.code()).await?.is_some() {
            debug!("Bootstrap department {} already present", path.code());
            return Ok(false);
        }

        let explicit_parent = entry.parent.as_deref().and_then(DepartmentPath::parse);
        let (parent_code, level) = match explicit_parent {
            Some(parent) => {
                self.ensure_chain(db, parent.code()).await?;
                let parent_node = find_by_code(db, parent.code())
                    .await?
                    .ok_or_not_found(parent.code())?;
                (Some(parent.code().to_string()), parent_node.level + 1)
            }
            None => {
                let parent = path.parent_path();
                if let Some(parent) = parent.as_deref() {
                    self.ensure_chain(db, parent).await?;
                }
                (parent, path.level(self.config.level_offset))
            }
        };

        create_node(db, self.config, &path, parent_code, level, NodeAttrs::default()).await?;
        info!("Created bootstrap department {}", path.code());
        Ok(true)
    }
}

/// Level of a node under `parent_code`.
///
/// A parent taken from the override table sits one level above the node;
/// otherwise the segment count decides.
pub(crate) async fn level_for<C: ConnectionTrait>(
    db: &C,
    config: &ReconcileConfig,
    path: &DepartmentPath,
    parent_code: Option<&str>,
) -> SyncResult<i32> {
    match parent_code {
        Some(parent) if path.parent_path().as_deref() != Some(parent) => {
            let parent_node = find_by_code(db, parent).await?.ok_or_not_found(parent)?;
            Ok(parent_node.level + 1)
        }
        _ => Ok(path.level(config.level_offset)),
    }
}

pub(crate) async fn find_by_code<C: ConnectionTrait>(
    db: &C,
    code: &str,
) -> SyncResult<Option<department::Model>> {
    Ok(department::Entity::find()
        .filter(department::Column::Code.eq(code))
        .one(db)
        .await?)
}

/// Insert a department row with a fresh identifier and project it
pub(crate) async fn create_node<C: ConnectionTrait>(
    db: &C,
    config: &ReconcileConfig,
    path: &DepartmentPath,
    parent_code: Option<String>,
    level: i32,
    attrs: NodeAttrs,
) -> SyncResult<(department::Model, tree_department::Model)> {
    let node = department::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(path.code().to_string()),
        parent_code: Set(parent_code),
        name: Set(path.short_name().to_string()),
        full_name: Set(path.code().to_string()),
        level: Set(level),
        company_key: Set(attrs.company_key),
        dep_no: Set(attrs.dep_no),
        dep_code: Set(attrs.dep_code),
        manager: Set(config.manager.clone()),
        description: Set(attrs.description),
    }
    .insert(db)
    .await?;

    let projected = sync_projection(db, config, &node).await?;
    Ok((node, projected))
}

//! Tree projection sync
//!
//! Mirrors a department node into `hr_tree_department`, where the parent is
//! referenced by identifier and the position by serial.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};
use uuid::Uuid;

use crate::config::ReconcileConfig;
use crate::entity::{department, tree_department};
use crate::error::SyncResult;
use crate::hierarchy::serial::SerialAllocator;

/// Insert or update the projection row of `node` and return it
pub async fn sync_projection<C: ConnectionTrait>(
    db: &C,
    config: &ReconcileConfig,
    node: &department::Model,
) -> SyncResult<tree_department::Model> {
    let parent_id = resolve_parent_id(db, config, node).await?;
    let serial = SerialAllocator::new(config).assign(db, node).await;

    let existing = tree_department::Entity::find_by_id(node.id).one(db).await?;
    let model = match existing {
        Some(row) => {
            let mut am = row.into_active_model();
            am.parent_id = Set(parent_id);
            am.level = Set(node.level);
            am.serial = Set(serial.clone());
            am.name = Set(node.name.clone());
            am.full_name = Set(node.full_name.clone());
            am.short_code = Set(node.dep_code.clone());
            am.description = Set(node.description.clone());
            am.owner_id = Set(config.owner_id);
            am.enabled = Set(true);
            am.is_company = Set(false);
            am.update(db).await?
        }
        None => {
            tree_department::ActiveModel {
                id: Set(node.id),
                parent_id: Set(parent_id),
                sort_index: Set(0),
                level: Set(node.level),
                serial: Set(serial.clone()),
                name: Set(node.name.clone()),
                full_name: Set(node.full_name.clone()),
                short_code: Set(node.dep_code.clone()),
                description: Set(node.description.clone()),
                owner_id: Set(config.owner_id),
                enabled: Set(true),
                is_company: Set(false),
            }
            .insert(db)
            .await?
        }
    };

    tracing::info!(
        "Projected {} ({}) parent={:?} serial={}",
        node.name,
        node.code,
        parent_id,
        serial
    );
    Ok(model)
}

/// Level-2 nodes without a parent path hang off the configured root
async fn resolve_parent_id<C: ConnectionTrait>(
    db: &C,
    config: &ReconcileConfig,
    node: &department::Model,
) -> SyncResult<Option<Uuid>> {
    match node.parent_code.as_deref() {
        Some(parent_code) => {
            let parent = department::Entity::find()
                .filter(department::Column::Code.eq(parent_code))
                .one(db)
                .await?;
            if parent.is_none() {
                tracing::warn!(
                    "Parent department {} of {} not found, projecting without parent",
                    parent_code,
                    node.code
                );
            }
            Ok(parent.map(|p| p.id))
        }
        None if node.level == 2 => Ok(Some(config.root_id)),
        None => Ok(None),
    }
}

//! Per-path department reconciliation

use sea_orm::{ActiveModelTrait, ConnectionTrait, IntoActiveModel, Set};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ReconcileConfig;
use crate::error::{SyncError, SyncResult};
use crate::hierarchy::ancestor::{
    create_node, find_by_code, level_for, AncestorResolver, NodeAttrs,
};
use crate::hierarchy::obsolete::ObsolescenceDetector;
use crate::hierarchy::projection::sync_projection;
use crate::hierarchy::segment::DepartmentPath;
use crate::source::{non_blank, SourceRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The path is obsolete in this snapshot and was left untouched
    Skipped,
    Reconciled { id: Uuid, serial: String },
}

pub struct DepartmentUpserter<'a> {
    config: &'a ReconcileConfig,
    detector: &'a ObsolescenceDetector<'a>,
}

impl<'a> DepartmentUpserter<'a> {
    pub fn new(config: &'a ReconcileConfig, detector: &'a ObsolescenceDetector<'a>) -> Self {
        Self { config, detector }
    }

    /// Reconcile the department named by `row`'s path.
    ///
    /// Ensures the parent chain, inserts or updates the node and merges its
    /// projection. An ancestor failure fails the node as well.
    pub async fn reconcile<C: ConnectionTrait>(&self, db: &C, row: &SourceRow) -> SyncResult<Outcome> {
        let path = DepartmentPath::parse(row.path())
            .ok_or_else(|| SyncError::InvalidPath(row.dep_name.clone()))?;

        if self.detector.is_obsolete(path.code()) {
            info!("Skipping obsolete department {}", path.code());
            return Ok(Outcome::Skipped);
        }

        let parent_code = path.parent_path_with(&self.config.parent_overrides);
        if let Some(parent) = parent_code.as_deref() {
            AncestorResolver::new(self.config)
                .ensure_chain(db, parent)
                .await?;
        }
        let level = level_for(db, self.config, &path, parent_code.as_deref()).await?;

        let attrs = NodeAttrs {
            company_key: non_blank(&row.company_key),
            dep_no: non_blank(&row.dep_no),
            dep_code: non_blank(&row.dep_code),
            description: non_blank(&row.dep_no),
        };

        let projected = match find_by_code(db, path.code()).await? {
            Some(existing) => {
                debug!("Updating department {}", path.code());
                let mut am = existing.into_active_model();
                am.parent_code = Set(parent_code);
                am.name = Set(path.short_name().to_string());
                am.full_name = Set(path.code().to_string());
                am.level = Set(level);
                am.company_key = Set(attrs.company_key);
                am.dep_no = Set(attrs.dep_no);
                am.dep_code = Set(attrs.dep_code);
                am.manager = Set(self.config.manager.clone());
                am.description = Set(attrs.description);
                let node = am.update(db).await?;
                sync_projection(db, self.config, &node).await?
            }
            None => {
                info!("Creating department {}", path.code());
                create_node(db, self.config, &path, parent_code, level, attrs).await?.1
            }
        };

        Ok(Outcome::Reconciled {
            id: projected.id,
            serial: projected.serial,
        })
    }
}

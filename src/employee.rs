//! Employee directory binding
//!
//! Resolves each snapshot row against the reconciled department table and
//! creates or updates the account, profile and identity records keyed by
//! the login (work card) number.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EmployeeConfig;
use crate::entity::{account, account_identity, department, user};
use crate::error::SyncResult;
use crate::source::{non_blank, SourceRow};

/// Hash the configured default credential once for a whole batch
pub fn hash_default_password(config: &EmployeeConfig) -> SyncResult<String> {
    Ok(bcrypt::hash(&config.default_password, config.password_hash_cost)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindAction {
    Created,
    Updated,
    /// Blank login key
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOutcome {
    pub action: BindAction,
    /// Data-integrity problems found along the way; the row still went through
    pub warnings: Vec<String>,
}

pub struct EmployeeBinder<'a> {
    config: &'a EmployeeConfig,
    password_hash: &'a str,
}

impl<'a> EmployeeBinder<'a> {
    pub fn new(config: &'a EmployeeConfig, password_hash: &'a str) -> Self {
        Self {
            config,
            password_hash,
        }
    }

    pub async fn bind<C>(&self, db: &C, row: &SourceRow) -> SyncResult<BindOutcome>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let login = row.workcard.trim();
        if login.is_empty() {
            debug!("Skipping employee {} without a work card", row.emp_name.trim());
            return Ok(BindOutcome {
                action: BindAction::Skipped,
                warnings: Vec::new(),
            });
        }

        let mut warnings = Vec::new();
        let dept = self.resolve_department(db, row, &mut warnings).await?;

        let existing = user::Entity::find()
            .filter(user::Column::LoginName.eq(login))
            .one(db)
            .await?;

        let action = match existing {
            Some(profile) => {
                self.update(db, row, profile, dept.as_ref()).await?;
                BindAction::Updated
            }
            None => {
                self.create(db, row, login, dept.as_ref()).await?;
                BindAction::Created
            }
        };

        Ok(BindOutcome { action, warnings })
    }

    /// Exact short-code match, lowest path first
    async fn resolve_department<C: ConnectionTrait>(
        &self,
        db: &C,
        row: &SourceRow,
        warnings: &mut Vec<String>,
    ) -> SyncResult<Option<department::Model>> {
        let dep_code = row.dep_code.trim();
        let mut matches = department::Entity::find()
            .filter(department::Column::DepCode.eq(dep_code))
            .order_by_asc(department::Column::Code)
            .all(db)
            .await?;

        if matches.len() > 1 {
            let codes: Vec<&str> = matches.iter().map(|d| d.code.as_str()).collect();
            warnings.push(format!(
                "Short code {} matches {} departments ({}), using {}",
                dep_code,
                matches.len(),
                codes.join(", "),
                codes[0]
            ));
        }

        if matches.is_empty() {
            warnings.push(format!(
                "No department with short code {} for {}, department left empty",
                dep_code,
                row.path()
            ));
            return Ok(None);
        }
        Ok(Some(matches.swap_remove(0)))
    }

    async fn create<C>(
        &self,
        db: &C,
        row: &SourceRow,
        login: &str,
        dept: Option<&department::Model>,
    ) -> SyncResult<()>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let name = row.emp_name.trim().to_string();
        let mobile = non_blank(&row.mobile);
        let txn = db.begin().await?;

        let account = account::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.clone()),
            login_name: Set(login.to_string()),
            password: Set(self.password_hash.to_string()),
            email: Set(String::new()),
            mobile: Set(mobile.clone()),
            created_at: Set(chrono::Utc::now().timestamp()),
            enabled: Set(true),
            language: Set(self.config.language.clone()),
        }
        .insert(&txn)
        .await?;

        let profile = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.clone()),
            login_name: Set(login.to_string()),
            password: Set(self.password_hash.to_string()),
            department_id: Set(dept.map(|d| d.id)),
            mobile: Set(mobile),
            email: Set(String::new()),
            enabled: Set(true),
            on_guard: Set(true),
            language: Set(self.config.language.clone()),
            user_no: Set(non_blank(&row.emp_id).unwrap_or_else(|| login.to_string())),
        }
        .insert(&txn)
        .await?;

        account_identity::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            account_id: Set(account.id),
            identity_type_id: Set(self.config.identity_type_id.clone()),
            entity_id: Set(profile.id),
            is_default: Set(true),
            sort_index: Set(0),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(
            "Created employee {} ({}) in {}",
            profile.name,
            login,
            dept.map(|d| d.code.as_str()).unwrap_or("-")
        );
        Ok(())
    }

    /// Name and mobile always follow the snapshot; the department only moves
    /// when the resolved one sits above the configured depth threshold.
    async fn update<C: ConnectionTrait>(
        &self,
        db: &C,
        row: &SourceRow,
        profile: user::Model,
        dept: Option<&department::Model>,
    ) -> SyncResult<()> {
        let name = row.emp_name.trim().to_string();
        let mobile = non_blank(&row.mobile);
        let login = profile.login_name.clone();

        let mut am = profile.into_active_model();
        am.name = Set(name.clone());
        am.mobile = Set(mobile.clone());
        match dept {
            Some(d) if d.level < self.config.level_threshold => {
                am.department_id = Set(Some(d.id));
            }
            Some(d) => {
                debug!(
                    "Keeping department of {}: {} is at level {} (threshold {})",
                    login, d.code, d.level, self.config.level_threshold
                );
            }
            None => {}
        }
        am.update(db).await?;

        if let Some(acc) = account::Entity::find()
            .filter(account::Column::LoginName.eq(login.as_str()))
            .one(db)
            .await?
        {
            let mut am = acc.into_active_model();
            am.name = Set(name);
            am.mobile = Set(mobile);
            am.update(db).await?;
        }

        debug!("Updated employee {}", login);
        Ok(())
    }
}

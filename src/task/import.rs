//! Import job implementation
//!
//! One snapshot file is one batch: parse, archive raw rows, reconcile
//! departments, bind employees, all inside a single transaction. Each
//! department path and each employee row runs in its own savepoint so a
//! failing row is rolled back and logged while its siblings continue.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::employee::{hash_default_password, BindAction, EmployeeBinder};
use crate::entity::error_log::RecordType;
use crate::error::{SyncError, SyncResult};
use crate::event_log::{self, ErrorEvent};
use crate::hierarchy::{AncestorResolver, DepartmentUpserter, ObsolescenceDetector, Outcome};
use crate::raw::{archive_raw_rows, file_digest};
use crate::source::{eligible_rows, parse_rows, unique_by_path, SourceRow};

/// Per-pass counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Outcome of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub file_name: String,
    pub raw_rows: usize,
    pub departments: Tally,
    pub employees: Tally,
}

/// Where snapshot files come from
#[async_trait::async_trait]
pub trait FileSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Files ready for import, in processing order
    async fn fetch(&self) -> anyhow::Result<Vec<PathBuf>>;
}

/// Picks up files with a given extension from a local directory.
///
/// Remote transfers drop files here; the directory is created on first use.
#[derive(Debug, Clone)]
pub struct LocalDirSource {
    dir: PathBuf,
    extension: String,
}

impl LocalDirSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

#[async_trait::async_trait]
impl FileSource for LocalDirSource {
    fn source_name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self) -> anyhow::Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.metadata().await?.is_file() && self.matches(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

pub struct ImportJob {
    db: DatabaseConnection,
    config: Arc<Config>,
}

impl ImportJob {
    pub fn new(db: DatabaseConnection, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    /// Run one batch for `path`, then move the file to the archive directory.
    ///
    /// Parse and raw-ingestion failures abort the batch with nothing
    /// committed and the file left in place.
    pub async fn process_file(&self, path: &Path) -> SyncResult<BatchSummary> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("Importing {}", path.display());

        let bytes = tokio::fs::read(path).await?;
        let digest = file_digest(&bytes);

        let rows = match decode(&bytes).and_then(parse_rows) {
            Ok(rows) => rows,
            Err(e) => {
                event_log::record(
                    &self.db,
                    ErrorEvent::from_error(RecordType::Raw, &e).file(file_name.as_str()),
                )
                .await;
                return Err(SyncError::BatchFatal(format!("parsing {} failed: {}", file_name, e)));
            }
        };

        let summary = self.run_batch(&rows, &file_name, &digest).await?;
        info!(
            "Imported {}: {} raw rows, departments {:?}, employees {:?}",
            file_name, summary.raw_rows, summary.departments, summary.employees
        );

        self.archive_file(path, &file_name).await;
        Ok(summary)
    }

    async fn run_batch(
        &self,
        rows: &[SourceRow],
        file_name: &str,
        digest: &str,
    ) -> SyncResult<BatchSummary> {
        let txn = self.db.begin().await?;

        if let Err(e) = archive_raw_rows(&txn, rows, file_name, digest).await {
            if let Err(re) = txn.rollback().await {
                error!("Rollback after raw ingestion failure failed: {}", re);
            }
            event_log::record(
                &self.db,
                ErrorEvent::from_error(RecordType::Raw, &e).file(file_name),
            )
            .await;
            return Err(SyncError::BatchFatal(format!(
                "raw ingestion of {} failed: {}",
                file_name, e
            )));
        }

        let eligible = eligible_rows(rows, &self.config.import.enabled_states);
        debug!("{} of {} rows eligible for reconciliation", eligible.len(), rows.len());

        let departments = self.department_pass(&txn, &eligible, file_name).await?;
        let employees = self.employee_pass(&txn, &eligible, file_name).await?;

        txn.commit().await?;
        Ok(BatchSummary {
            file_name: file_name.to_string(),
            raw_rows: rows.len(),
            departments,
            employees,
        })
    }

    async fn department_pass(
        &self,
        txn: &DatabaseTransaction,
        rows: &[SourceRow],
        file_name: &str,
    ) -> SyncResult<Tally> {
        let rc = &self.config.reconcile;

        let resolver = AncestorResolver::new(rc);
        for entry in &rc.bootstrap {
            let sp = txn.begin().await?;
            match resolver.ensure_bootstrap(&sp, entry).await {
                Ok(_) => sp.commit().await?,
                Err(e) => {
                    sp.rollback().await?;
                    event_log::record(
                        txn,
                        ErrorEvent::from_error(RecordType::Department, &e)
                            .key(entry.code.as_str())
                            .file(file_name),
                    )
                    .await;
                }
            }
        }

        let detector = ObsolescenceDetector::new(rows, &rc.active_status_name);
        let upserter = DepartmentUpserter::new(rc, &detector);
        let mut tally = Tally::default();

        for row in unique_by_path(rows) {
            tally.processed += 1;
            let sp = txn.begin().await?;
            match upserter.reconcile(&sp, row).await {
                Ok(outcome) => {
                    sp.commit().await?;
                    match outcome {
                        Outcome::Skipped => tally.skipped += 1,
                        Outcome::Reconciled { .. } => tally.succeeded += 1,
                    }
                }
                Err(e) => {
                    sp.rollback().await?;
                    tally.failed += 1;
                    event_log::record(
                        txn,
                        ErrorEvent::from_error(RecordType::Department, &e)
                            .key(row.path())
                            .payload(row.payload())
                            .file(file_name),
                    )
                    .await;
                }
            }
        }
        Ok(tally)
    }

    async fn employee_pass(
        &self,
        txn: &DatabaseTransaction,
        rows: &[SourceRow],
        file_name: &str,
    ) -> SyncResult<Tally> {
        let config = self.config.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || hash_default_password(&config.employee))
                .await
                .map_err(|e| SyncError::Internal(format!("password hashing task failed: {}", e)))??;

        let binder = EmployeeBinder::new(&self.config.employee, &password_hash);
        let mut tally = Tally::default();

        for row in rows {
            tally.processed += 1;
            let sp = txn.begin().await?;
            match binder.bind(&sp, row).await {
                Ok(outcome) => {
                    sp.commit().await?;
                    match outcome.action {
                        BindAction::Skipped => tally.skipped += 1,
                        BindAction::Created | BindAction::Updated => tally.succeeded += 1,
                    }
                    for warning in outcome.warnings {
                        event_log::record(
                            txn,
                            ErrorEvent::new(RecordType::Employee, warning)
                                .key(row.workcard.trim())
                                .payload(row.payload())
                                .file(file_name),
                        )
                        .await;
                    }
                }
                Err(e) => {
                    sp.rollback().await?;
                    tally.failed += 1;
                    event_log::record(
                        txn,
                        ErrorEvent::from_error(RecordType::Employee, &e)
                            .key(row.workcard.trim())
                            .payload(row.payload())
                            .file(file_name),
                    )
                    .await;
                }
            }
        }
        Ok(tally)
    }

    /// Copy to the archive directory under a timestamp prefix, then delete the original.
    ///
    /// Best effort: failures are logged and the file stays where it was.
    async fn archive_file(&self, path: &Path, file_name: &str) -> Option<PathBuf> {
        let archive_dir = &self.config.import.archive_path;
        if let Err(e) = tokio::fs::create_dir_all(archive_dir).await {
            warn!("Failed to create archive directory {}: {}", archive_dir.display(), e);
            return None;
        }

        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let target = archive_dir.join(format!("{}-{}", stamp, file_name));

        if let Err(e) = tokio::fs::copy(path, &target).await {
            warn!("Failed to archive {} to {}: {}", path.display(), target.display(), e);
            return None;
        }
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Archived {} but could not remove it: {}", path.display(), e);
        }

        info!("Archived {} to {}", file_name, target.display());
        Some(target)
    }

    /// Import every file the source currently offers. A failed file is
    /// logged and left for the next run.
    pub async fn run_once(&self, source: &dyn FileSource) -> anyhow::Result<Vec<BatchSummary>> {
        let files = source.fetch().await?;
        if files.is_empty() {
            debug!("No files from {} source", source.source_name());
            return Ok(Vec::new());
        }

        let mut summaries = Vec::with_capacity(files.len());
        for file in files {
            match self.process_file(&file).await {
                Ok(summary) => summaries.push(summary),
                Err(e) if e.is_fatal() => {
                    error!("Import of {} aborted: {}", file.display(), e.cause_chain())
                }
                Err(e) => error!("Import of {} failed: {}", file.display(), e.cause_chain()),
            }
        }
        Ok(summaries)
    }

    /// Scan the source every `import.interval_secs` until the task is dropped.
    pub async fn run(&self, source: &dyn FileSource) {
        let period = Duration::from_secs(self.config.import.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            "Import scheduler started, scanning {} source every {}s",
            source.source_name(),
            period.as_secs()
        );

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once(source).await {
                error!("Import run failed: {}", e);
            }
        }
    }
}

fn decode(bytes: &[u8]) -> SyncResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| SyncError::BatchFatal(format!("snapshot is not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;
    use crate::entity::{department, error_log, raw_import, tree_department, user};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
        Set,
    };
    use std::collections::HashMap;
    use tempfile::TempDir;
    use uuid::Uuid;

    const SNAPSHOT: &str = "CPNYID,DEP_NO,DEP_CODE,DEP_NAME,STATE_NO,STATE_NAME,EMP_ID,EMP_NAME,WORKCARD,INADATE,QUITDATE,MOBILE\n\
        C1,10,D10,Sales,A,在職,1,Alice,W001,20200115,,0911\n\
        C1,11,D11,Sales-North,A,在職,2,Bob,W002,20200115,,0922\n\
        C1,12,D12,Ops-Support-Desk,A,在職,3,Carol,W003,,,0933\n\
        C1,13,D13,Ops-Support-Desk,X,離職,4,Dan,W004,,,0944\n\
        C1,14,,Ghost,A,在職,5,Eve,W005,,,\n";

    fn test_config(dir: &TempDir) -> Arc<Config> {
        let mut config = Config::default();
        config.import.local_path = dir.path().join("in");
        config.import.archive_path = dir.path().join("archive");
        config.reconcile.bootstrap = Vec::new();
        config.employee.password_hash_cost = 4;
        Arc::new(config)
    }

    async fn drop_file(config: &Config, name: &str, content: &[u8]) -> PathBuf {
        tokio::fs::create_dir_all(&config.import.local_path).await.unwrap();
        let path = config.import.local_path.join(name);
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    async fn serials(db: &DatabaseConnection) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for n in department::Entity::find().all(db).await.unwrap() {
            let t = tree_department::Entity::find_by_id(n.id).one(db).await.unwrap().unwrap();
            out.insert(n.code, t.serial);
        }
        out
    }

    #[tokio::test]
    async fn test_process_file_reconciles_and_archives() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let db = test_database().await;
        let job = ImportJob::new(db.clone(), config.clone());

        let path = drop_file(&config, "hr.csv", SNAPSHOT.as_bytes()).await;
        let summary = job.process_file(&path).await.unwrap();

        assert_eq!(summary.raw_rows, 5);
        assert_eq!(
            summary.departments,
            Tally { processed: 3, succeeded: 3, failed: 0, skipped: 0 }
        );
        assert_eq!(
            summary.employees,
            Tally { processed: 3, succeeded: 3, failed: 0, skipped: 0 }
        );

        // Sales, Sales-North, Ops, Ops-Support, Ops-Support-Desk
        assert_eq!(department::Entity::find().count(&db).await.unwrap(), 5);
        assert_eq!(raw_import::Entity::find().count(&db).await.unwrap(), 5);
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 3);

        assert!(!path.exists());
        let archived: Vec<_> = std::fs::read_dir(&config.import.archive_path)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(archived.len(), 1);
        assert!(archived[0].ends_with("-hr.csv"));
        assert_eq!(archived[0].len(), "yyyyMMddHHmmss-hr.csv".len());
    }

    #[tokio::test]
    async fn test_reimport_is_stable() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let db = test_database().await;
        let job = ImportJob::new(db.clone(), config.clone());

        let path = drop_file(&config, "hr.csv", SNAPSHOT.as_bytes()).await;
        job.process_file(&path).await.unwrap();
        let first = serials(&db).await;

        let path = drop_file(&config, "hr.csv", SNAPSHOT.as_bytes()).await;
        let summary = job.process_file(&path).await.unwrap();

        assert_eq!(summary.employees.succeeded, 3);
        assert_eq!(serials(&db).await, first);
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 3);
        assert_eq!(raw_import::Entity::find().count(&db).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_failed_employee_is_isolated_and_logged() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let db = test_database().await;
        let job = ImportJob::new(db.clone(), config.clone());

        // A stray account with Bob's login makes his account insert collide
        crate::entity::account::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Stray".to_string()),
            login_name: Set("W002".to_string()),
            password: Set(String::new()),
            email: Set(String::new()),
            mobile: Set(None),
            created_at: Set(0),
            enabled: Set(true),
            language: Set("zh-TW".to_string()),
        }
        .insert(&db)
        .await
        .unwrap();

        let path = drop_file(&config, "hr.csv", SNAPSHOT.as_bytes()).await;
        let summary = job.process_file(&path).await.unwrap();

        assert_eq!(summary.employees.failed, 1);
        assert_eq!(summary.employees.succeeded, 2);
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 2);

        let events = error_log::Entity::find()
            .filter(error_log::Column::RecordType.eq("EMPLOYEE"))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].record_key.as_deref(), Some("W002"));
        assert_eq!(events[0].file_name.as_deref(), Some("hr.csv"));
        assert!(events[0].payload.as_deref().unwrap().contains("Bob"));
    }

    /// Reject inserts of `code` at the database, mid ancestor chain
    async fn reject_department(db: &DatabaseConnection, code: &str) {
        db.execute_unprepared(&format!(
            "CREATE TRIGGER reject_department BEFORE INSERT ON hr_department \
             WHEN NEW.code = '{}' BEGIN SELECT RAISE(ABORT, 'department rejected'); END",
            code
        ))
        .await
        .unwrap();
    }

    async fn department_exists(db: &DatabaseConnection, code: &str) -> bool {
        department::Entity::find()
            .filter(department::Column::Code.eq(code))
            .one(db)
            .await
            .unwrap()
            .is_some()
    }

    #[tokio::test]
    async fn test_failed_department_chain_is_rolled_back_and_logged() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let db = test_database().await;
        let job = ImportJob::new(db.clone(), config.clone());
        reject_department(&db, "Ops-Support").await;

        let path = drop_file(&config, "hr.csv", SNAPSHOT.as_bytes()).await;
        let summary = job.process_file(&path).await.unwrap();

        assert_eq!(
            summary.departments,
            Tally { processed: 3, succeeded: 2, failed: 1, skipped: 0 }
        );

        // Ops was created before Ops-Support failed; the savepoint takes it back
        assert!(!department_exists(&db, "Ops").await);
        assert!(!department_exists(&db, "Ops-Support").await);
        assert!(!department_exists(&db, "Ops-Support-Desk").await);
        assert!(department_exists(&db, "Sales").await);
        assert!(department_exists(&db, "Sales-North").await);
        assert_eq!(tree_department::Entity::find().count(&db).await.unwrap(), 2);

        let events = error_log::Entity::find()
            .filter(error_log::Column::RecordType.eq("DEPARTMENT"))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].record_key.as_deref(), Some("Ops-Support-Desk"));
        assert!(events[0].error_message.contains("Ops-Support"));
        assert!(events[0].stack_trace.as_deref().unwrap().contains("caused by"));

        // Carol still gets an account, without a department
        assert_eq!(summary.employees.succeeded, 3);
        let carol = user::Entity::find()
            .filter(user::Column::LoginName.eq("W003"))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(carol.department_id, None);
    }

    #[tokio::test]
    async fn test_unrecordable_events_do_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let db = test_database().await;
        let job = ImportJob::new(db.clone(), config.clone());
        reject_department(&db, "Ops-Support").await;
        db.execute_unprepared("DROP TABLE hr_import_error_log").await.unwrap();

        let path = drop_file(&config, "hr.csv", SNAPSHOT.as_bytes()).await;
        let summary = job.process_file(&path).await.unwrap();

        assert_eq!(summary.departments.failed, 1);
        assert!(department_exists(&db, "Sales-North").await);
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 3);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_bad_bootstrap_entry_is_logged() {
        let dir = TempDir::new().unwrap();
        let mut config = (*test_config(&dir)).clone();
        config.reconcile.bootstrap = vec![
            crate::config::BootstrapDepartment { code: "  ".to_string(), parent: None },
            crate::config::BootstrapDepartment { code: "Board".to_string(), parent: None },
        ];
        let config = Arc::new(config);
        let db = test_database().await;
        let job = ImportJob::new(db.clone(), config.clone());

        let path = drop_file(&config, "hr.csv", SNAPSHOT.as_bytes()).await;
        job.process_file(&path).await.unwrap();

        let board = department::Entity::find()
            .filter(department::Column::Code.eq("Board"))
            .one(&db)
            .await
            .unwrap();
        assert!(board.is_some());
        let events = error_log::Entity::find()
            .filter(error_log::Column::RecordType.eq("DEPARTMENT"))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(events, 1);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_fatal_and_kept() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let db = test_database().await;
        let job = ImportJob::new(db.clone(), config.clone());

        let path = drop_file(&config, "broken.csv", &[0xff, 0xfe, 0x00, 0x41]).await;
        let err = job.process_file(&path).await.unwrap_err();

        assert!(matches!(err, SyncError::BatchFatal(_)));
        assert!(path.exists());
        assert_eq!(raw_import::Entity::find().count(&db).await.unwrap(), 0);
        let raw_events = error_log::Entity::find()
            .filter(error_log::Column::RecordType.eq("RAW"))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(raw_events, 1);
    }

    #[tokio::test]
    async fn test_local_dir_source_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.CSV"), "x").unwrap();
        std::fs::write(dir.path().join("a.csv"), "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let source = LocalDirSource::new(dir.path(), ".csv");
        let files = source.fetch().await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.CSV"]);
    }

    #[tokio::test]
    async fn test_run_once_processes_pending_files() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let db = test_database().await;
        let job = ImportJob::new(db.clone(), config.clone());

        drop_file(&config, "hr.csv", SNAPSHOT.as_bytes()).await;
        drop_file(&config, "readme.txt", b"ignored").await;

        let source = LocalDirSource::new(&config.import.local_path, &config.import.file_extension);
        let summaries = job.run_once(&source).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].file_name, "hr.csv");

        // Nothing left to pick up
        assert!(job.run_once(&source).await.unwrap().is_empty());
        assert!(config.import.local_path.join("readme.txt").exists());
    }
}

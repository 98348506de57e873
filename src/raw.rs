//! Raw row archival
//!
//! Every parsed row of a snapshot is written to `hr_import_raw` before any
//! reconciliation happens, stamped with the source file and its digest.

use sea_orm::{ConnectionTrait, EntityTrait, Set};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entity::raw_import;
use crate::error::SyncResult;
use crate::source::{non_blank, parse_compact_date, SourceRow};

const INSERT_CHUNK: usize = 500;

/// Hex SHA-256 of a file body
pub fn file_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Insert all `rows`, returning how many were written
pub async fn archive_raw_rows<C: ConnectionTrait>(
    db: &C,
    rows: &[SourceRow],
    file_name: &str,
    digest: &str,
) -> SyncResult<usize> {
    let imported_at = chrono::Utc::now().timestamp();

    for chunk in rows.chunks(INSERT_CHUNK) {
        let models = chunk.iter().map(|r| to_active_model(r, file_name, digest, imported_at));
        raw_import::Entity::insert_many(models).exec(db).await?;
    }

    tracing::info!("Archived {} raw rows from {}", rows.len(), file_name);
    Ok(rows.len())
}

fn to_active_model(
    row: &SourceRow,
    file_name: &str,
    digest: &str,
    imported_at: i64,
) -> raw_import::ActiveModel {
    raw_import::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_key: Set(non_blank(&row.company_key)),
        dep_no: Set(non_blank(&row.dep_no)),
        dep_code: Set(non_blank(&row.dep_code)),
        dep_name: Set(non_blank(&row.dep_name)),
        state_no: Set(non_blank(&row.state_no)),
        state_name: Set(non_blank(&row.state_name)),
        emp_id: Set(non_blank(&row.emp_id)),
        emp_name: Set(non_blank(&row.emp_name)),
        workcard: Set(non_blank(&row.workcard)),
        hire_date: Set(parse_compact_date(&row.hire_date)),
        quit_date: Set(parse_compact_date(&row.quit_date)),
        stop_w: Set(non_blank(&row.stop_w)),
        start_w: Set(non_blank(&row.start_w)),
        modified_date: Set(parse_compact_date(&row.modified_date)),
        position_name: Set(non_blank(&row.position_name)),
        mobile: Set(non_blank(&row.mobile)),
        title_name: Set(non_blank(&row.title_name)),
        workplace_name: Set(non_blank(&row.workplace_name)),
        file_name: Set(file_name.to_string()),
        file_digest: Set(digest.to_string()),
        imported_at: Set(imported_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;
    use crate::source::row;
    use chrono::NaiveDate;
    use sea_orm::PaginatorTrait;

    #[test]
    fn test_file_digest() {
        assert_eq!(
            file_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_archive_maps_blanks_and_dates() {
        let db = test_database().await;
        let mut r = row("Sales", "10", "D10", "在職", "W1");
        r.hire_date = "20200115".to_string();
        r.quit_date = "2020/01/15".to_string();
        r.title_name = "  ".to_string();

        let n = archive_raw_rows(&db, &[r], "hr.csv", "cafe").await.unwrap();
        assert_eq!(n, 1);

        let stored = raw_import::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(stored.hire_date, NaiveDate::from_ymd_opt(2020, 1, 15));
        assert_eq!(stored.quit_date, None);
        assert_eq!(stored.title_name, None);
        assert_eq!(stored.dep_name.as_deref(), Some("Sales"));
        assert_eq!(stored.file_digest, "cafe");
    }

    #[tokio::test]
    async fn test_archive_spans_chunks() {
        let db = test_database().await;
        let rows: Vec<SourceRow> = (0..INSERT_CHUNK + 3)
            .map(|i| row("Sales", "10", "D10", "在職", &format!("W{}", i)))
            .collect();

        archive_raw_rows(&db, &rows, "hr.csv", "cafe").await.unwrap();
        assert_eq!(
            raw_import::Entity::find().count(&db).await.unwrap(),
            (INSERT_CHUNK + 3) as u64
        );
    }
}

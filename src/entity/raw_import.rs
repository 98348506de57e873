//! RawImport entity - 原始导入数据表
//!
//! 每次导入时逐行保存解析到的原始数据
//! 表名: hr_import_raw

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_import_raw")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub company_key: Option<String>,
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub dep_no: Option<String>,
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub dep_code: Option<String>,
    #[sea_orm(column_type = "String(Some(200))", nullable)]
    pub dep_name: Option<String>,
    #[sea_orm(column_type = "String(Some(20))", nullable)]
    pub state_no: Option<String>,
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub state_name: Option<String>,
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub emp_id: Option<String>,
    #[sea_orm(column_type = "String(Some(100))", nullable)]
    pub emp_name: Option<String>,
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub workcard: Option<String>,

    /// 入职日期
    pub hire_date: Option<Date>,
    /// 离职日期
    pub quit_date: Option<Date>,

    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub stop_w: Option<String>,
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub start_w: Option<String>,

    /// 变动日期
    pub modified_date: Option<Date>,

    #[sea_orm(column_type = "String(Some(100))", nullable)]
    pub position_name: Option<String>,
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub mobile: Option<String>,
    #[sea_orm(column_type = "String(Some(100))", nullable)]
    pub title_name: Option<String>,
    #[sea_orm(column_type = "String(Some(100))", nullable)]
    pub workplace_name: Option<String>,

    /// 来源文件名
    #[sea_orm(column_type = "String(Some(255))")]
    pub file_name: String,

    /// 来源文件 SHA-256
    #[sea_orm(column_type = "String(Some(64))")]
    pub file_digest: String,

    /// 导入时间 (Unix 时间戳)
    pub imported_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! ErrorLog entity - 导入错误记录表
//!
//! 表名: hr_import_error_log

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 记录类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// 原始数据写入
    Raw,
    /// 部门
    Department,
    /// 员工
    Employee,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Raw => "RAW",
            RecordType::Department => "DEPARTMENT",
            RecordType::Employee => "EMPLOYEE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_import_error_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 来源文件名
    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub file_name: Option<String>,

    /// RAW | DEPARTMENT | EMPLOYEE
    #[sea_orm(column_type = "String(Some(20))")]
    pub record_type: String,

    /// 部门代码或员工编号
    #[sea_orm(column_type = "String(Some(200))", nullable)]
    pub record_key: Option<String>,

    /// 出错数据 (JSON)
    #[sea_orm(column_type = "Text", nullable)]
    pub payload: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub error_message: String,

    /// 错误原因链
    #[sea_orm(column_type = "Text", nullable)]
    pub stack_trace: Option<String>,

    /// 处理时间 (Unix 时间戳)
    pub processed_at: i64,

    #[sea_orm(column_type = "String(Some(50))")]
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! TreeDepartment entity - 部门树投影表
//!
//! 下游系统使用的部门树, id 与 hr_department 一致
//! 表名: hr_tree_department

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_tree_department")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 父节点ID
    #[sea_orm(nullable)]
    pub parent_id: Option<Uuid>,

    /// 排序
    pub sort_index: i32,

    /// 层级
    pub level: i32,

    /// 树序号, 例如 001.002.014
    #[sea_orm(column_type = "String(Some(100))")]
    pub serial: String,

    /// 部门简称
    #[sea_orm(column_type = "String(Some(200))")]
    pub name: String,

    /// 部门全称
    #[sea_orm(column_type = "String(Some(200))")]
    pub full_name: String,

    /// 部门代码
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub short_code: Option<String>,

    /// 描述
    #[sea_orm(column_type = "String(Some(500))", nullable)]
    pub description: Option<String>,

    /// 负责用户ID
    pub owner_id: Uuid,

    pub enabled: bool,

    pub is_company: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Number of dot-separated segments in the serial
    pub fn serial_depth(&self) -> usize {
        self.serial.split('.').count()
    }
}

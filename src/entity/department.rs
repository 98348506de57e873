//! Department entity - 部门表
//!
//! 以完整部门路径 (code) 作为业务主键的扁平部门表
//! 表名: hr_department

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_department")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 完整部门路径 (唯一)
    #[sea_orm(column_type = "String(Some(200))", unique)]
    pub code: String,

    /// 父部门路径 (顶级部门为空)
    #[sea_orm(column_type = "String(Some(200))", nullable)]
    pub parent_code: Option<String>,

    /// 部门简称 (路径最后一段)
    #[sea_orm(column_type = "String(Some(200))")]
    pub name: String,

    /// 部门全称 (冗余字段)
    #[sea_orm(column_type = "String(Some(200))")]
    pub full_name: String,

    /// 部门层级
    pub level: i32,

    /// 公司代码
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub company_key: Option<String>,

    /// 部门编号
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub dep_no: Option<String>,

    /// 部门代码
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub dep_code: Option<String>,

    /// 负责人
    #[sea_orm(column_type = "String(Some(100))")]
    pub manager: String,

    /// 描述
    #[sea_orm(column_type = "String(Some(500))", nullable)]
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// 父子关系通过 parent_code 手动查询处理

impl ActiveModelBehavior for ActiveModel {}

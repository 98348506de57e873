//! User entity - 员工资料表
//!
//! 表名: hr_user

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 姓名
    #[sea_orm(column_type = "String(Some(100))")]
    pub name: String,

    /// 登录名 (唯一)
    #[sea_orm(column_type = "String(Some(50))", unique)]
    pub login_name: String,

    /// 密码 (bcrypt 哈希)
    #[sea_orm(column_type = "String(Some(128))")]
    #[serde(skip_serializing)]
    pub password: String,

    /// 部门ID
    #[sea_orm(nullable)]
    pub department_id: Option<Uuid>,

    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub mobile: Option<String>,

    #[sea_orm(column_type = "String(Some(100))")]
    pub email: String,

    pub enabled: bool,

    /// 在岗
    pub on_guard: bool,

    #[sea_orm(column_type = "String(Some(16))")]
    pub language: String,

    /// 员工编号
    #[sea_orm(column_type = "String(Some(50))")]
    pub user_no: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// 跨模块关系通过手动查询处理

impl ActiveModelBehavior for ActiveModel {}

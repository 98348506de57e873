//! Account entity - 登录账号表
//!
//! 表名: hr_account

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 姓名
    #[sea_orm(column_type = "String(Some(100))")]
    pub name: String,

    /// 登录名 (唯一, 创建后不可变)
    #[sea_orm(column_type = "String(Some(50))", unique)]
    pub login_name: String,

    /// 密码 (bcrypt 哈希)
    #[sea_orm(column_type = "String(Some(128))")]
    #[serde(skip_serializing)]
    pub password: String,

    #[sea_orm(column_type = "String(Some(100))")]
    pub email: String,

    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub mobile: Option<String>,

    /// 创建时间 (Unix 时间戳)
    pub created_at: i64,

    pub enabled: bool,

    #[sea_orm(column_type = "String(Some(16))")]
    pub language: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! AccountIdentity entity - 账号身份表
//!
//! 表名: hr_account_identity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_account_identity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(Some(100))")]
    pub name: String,

    /// 账号ID
    pub account_id: Uuid,

    /// 身份类型
    #[sea_orm(column_type = "String(Some(50))")]
    pub identity_type_id: String,

    /// 对应员工资料ID
    pub entity_id: Uuid,

    pub is_default: bool,

    pub sort_index: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

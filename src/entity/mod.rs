//! Entity module - SeaORM 实体定义
//!
//! 包含所有数据库表对应的实体模型

pub mod account;
pub mod account_identity;
pub mod department;
pub mod error_log;
pub mod raw_import;
pub mod tree_department;
pub mod user;

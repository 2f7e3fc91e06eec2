//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了任务记录的数据模型以及对应的 Sea-ORM 实体。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 记录标识符
///
/// 由持久化存储分配，分配后不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 任务记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub task: String,
    #[serde(default)]
    pub completed: bool,
}

/// 待持久化的新记录（尚未分配标识符）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub task: String,
    pub completed: bool,
}

impl NewRecord {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            completed: false,
        }
    }
}

/// `records` 表的 Sea-ORM 实体
pub mod entity {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "records")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub task: String,
        pub completed: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for super::Record {
        fn from(model: Model) -> Self {
            Self {
                id: super::RecordId(i64::from(model.id)),
                task: model.task,
                completed: model.completed,
            }
        }
    }
}

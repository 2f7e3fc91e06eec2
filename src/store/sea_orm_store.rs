//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于Sea-ORM的记录存储，支持SQLite、PostgreSQL和MySQL。

use super::DurableStore;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::record::entity::{self, Entity as RecordEntity};
use crate::record::{NewRecord, Record};
use crate::utils::redaction::RedactedUrl;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryOrder, Schema, Set,
};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Sea-ORM记录存储
#[derive(Debug, Clone)]
pub struct SeaOrmRecordStore {
    connection: DatabaseConnection,
}

impl SeaOrmRecordStore {
    /// 根据配置连接数据库并确保 `records` 表存在
    ///
    /// # 参数
    ///
    /// * `config` - 存储配置
    #[instrument(skip(config), level = "info")]
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let url = config.connection_string.expose_secret();
        let mut opt = ConnectOptions::new(url.to_string());
        // 内存SQLite每个连接都是独立的库，只能使用单连接
        let max_connections = if url.starts_with("sqlite") && url.contains(":memory:") {
            1
        } else {
            config.max_connections
        };
        opt.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_millis(config.connection_timeout_ms))
            .sqlx_logging(false);

        let connection = Database::connect(opt).await?;
        info!("Connected to durable store at {}", RedactedUrl(url));

        let store = Self::from_connection(connection);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// 使用已有连接创建存储（不执行建表）
    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// 建表（已存在时跳过）
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let backend = self.connection.get_database_backend();
        let schema = Schema::new(backend);
        let mut stmt = schema.create_table_from_entity(RecordEntity);
        stmt.if_not_exists();
        self.connection.execute(backend.build(&stmt)).await?;
        debug!("records table ensured");
        Ok(())
    }
}

#[async_trait]
impl DurableStore for SeaOrmRecordStore {
    #[instrument(skip(self, record), level = "debug")]
    async fn create(&self, record: NewRecord) -> StoreResult<Record> {
        let model = entity::ActiveModel {
            task: Set(record.task),
            completed: Set(record.completed),
            ..Default::default()
        };
        let saved = model.insert(&self.connection).await?;
        Ok(saved.into())
    }

    #[instrument(skip(self), level = "debug")]
    async fn list_all(&self) -> StoreResult<Vec<Record>> {
        let models = RecordEntity::find()
            .order_by_asc(entity::Column::Id)
            .all(&self.connection)
            .await?;
        Ok(models.into_iter().map(Record::from).collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.connection.ping().await.map_err(StoreError::from)
    }

    async fn close(&self) -> StoreResult<()> {
        self.connection.clone().close().await?;
        info!("Durable store connection closed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.connection.get_database_backend() {
            sea_orm::DatabaseBackend::Sqlite => "sqlite",
            sea_orm::DatabaseBackend::Postgres => "postgres",
            sea_orm::DatabaseBackend::MySql => "mysql",
            #[allow(unreachable_patterns)]
            _ => "sql",
        }
    }
}

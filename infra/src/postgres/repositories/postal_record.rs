use sqlx::Connection as _;
use time::OffsetDateTime;

use domain::{
    DomainResult,
    models::{CacheEntry, PostalCode},
    repositories::PostalRecordCache,
};

use super::{PgRepository, repository_error};

/// 住所キャッシュテーブル
const CACHE_TABLE: &str = "ceps";

pub type PgPostalRecordCache = PgRepository<CacheEntry>;

#[derive(Debug, sqlx::FromRow)]
struct CacheRow {
    payload: String,
    updated_at: OffsetDateTime,
}

#[async_trait::async_trait]
impl PostalRecordCache for PgPostalRecordCache {
    async fn read(&self, key: &PostalCode) -> DomainResult<Option<CacheEntry>> {
        let row = sqlx::query_as::<_, CacheRow>(&format!(
            r#"
            SELECT payload::text AS payload, updated_at
            FROM {}
            WHERE cep = $1
            "#,
            CACHE_TABLE
        ))
        .bind(key.digits())
        .fetch_optional(&self.pool)
        .await
        .map_err(repository_error)?;
        Ok(row.map(|row| CacheEntry {
            key: key.clone(),
            payload: row.payload,
            updated_at: row.updated_at,
        }))
    }

    async fn upsert(&self, entry: &CacheEntry) -> DomainResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (cep, payload, updated_at)
            VALUES ($1, $2::jsonb, $3)
            ON CONFLICT (cep)
            DO UPDATE SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
            "#,
            CACHE_TABLE
        ))
        .bind(entry.key.digits())
        .bind(&entry.payload)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repository_error)?;
        Ok(())
    }

    async fn ping(&self) -> DomainResult<()> {
        let mut conn = self.pool.acquire().await.map_err(repository_error)?;
        conn.ping().await.map_err(repository_error)
    }
}

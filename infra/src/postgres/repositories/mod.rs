mod postal_record;

pub use postal_record::*;

use std::marker::PhantomData;

use sqlx::PgPool;

use domain::DomainError;

/// PostgreSQLリポジトリ
pub struct PgRepository<T> {
    pub pool: PgPool,
    pub _marker: PhantomData<T>,
}

impl<T> PgRepository<T> {
    /// PostgreSQLリポジトリを構築する。
    ///
    /// # 引数
    ///
    /// * `pool`: PostgreSQLコネクションプール
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

/// SQLxのエラーをリポジトリエラーに変換する。
pub fn repository_error(e: sqlx::Error) -> DomainError {
    DomainError::Repository(e.to_string().into())
}

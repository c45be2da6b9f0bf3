use crate::{
    DomainResult,
    models::{CacheEntry, PostalCode},
};

/// 住所キャッシュリポジトリ
///
/// 郵便番号をキーに、シリアライズした住所と最終書き込み日時を保存する。
#[async_trait::async_trait]
pub trait PostalRecordCache: Sync + Send {
    /// 郵便番号に対応するキャッシュエントリを取得する。
    ///
    /// # 戻り値
    ///
    /// キャッシュエントリが存在しない場合は`None`を返す。
    /// キャッシュエントリが存在しないことはエラーではない。
    async fn read(&self, key: &PostalCode) -> DomainResult<Option<CacheEntry>>;

    /// キャッシュエントリを登録する。
    ///
    /// 同じキーのキャッシュエントリが存在する場合は上書きする。
    async fn upsert(&self, entry: &CacheEntry) -> DomainResult<()>;

    /// キャッシュストアとの接続を確認する。
    async fn ping(&self) -> DomainResult<()>;
}

use time::{Duration, OffsetDateTime, UtcOffset};
use tokio::time::{Instant, timeout_at};

use domain::{
    DomainError, DomainResult,
    clients::{HttpClient, HttpResponse},
    models::{CacheEntry, PostalCode, PostalRecord},
    repositories::PostalRecordCache,
};

use crate::Clock;

/// HTTPステータスコード: Not Found
const STATUS_NOT_FOUND: u16 = 404;
/// このステータスコード以上はエラー
const STATUS_ERROR_THRESHOLD: u16 = 400;

/// 郵便番号ユースケース
///
/// キャッシュアサイドで郵便番号から住所を検索する。
/// キャッシュに有効な住所が存在しない場合は郵便番号プロバイダーに問い合わせて、
/// 取得した住所をキャッシュに書き戻す。
pub struct PostalCodeUseCase<C, H>
where
    C: PostalRecordCache,
    H: HttpClient,
{
    /// 住所キャッシュリポジトリ
    pub cache: C,
    /// HTTPクライアント
    pub http_client: H,
    /// 郵便番号プロバイダーのベースURL
    pub provider_url: String,
    /// キャッシュの生存期間
    ///
    /// 0以下の場合、キャッシュは期限切れにならない。
    pub cache_ttl: Duration,
    /// 現在日時を返す関数
    pub clock: Clock,
}

impl<C, H> PostalCodeUseCase<C, H>
where
    C: PostalRecordCache,
    H: HttpClient,
{
    /// 郵便番号ユースケースを作成する。
    pub fn new(
        cache: C,
        http_client: H,
        provider_url: impl Into<String>,
        cache_ttl: Duration,
        clock: Clock,
    ) -> Self {
        Self {
            cache,
            http_client,
            provider_url: provider_url.into(),
            cache_ttl,
            clock,
        }
    }

    /// 郵便番号から住所を取得する。
    ///
    /// # 引数
    ///
    /// * `raw` - 郵便番号（数字以外の文字は無視する）
    /// * `deadline` - 期限。キャッシュの読み込み、プロバイダーへの問い合わせ、
    ///   キャッシュへの書き込みのいずれかの途中で期限を過ぎた場合は`DomainError::Timeout`を返す。
    #[tracing::instrument(skip(self, deadline))]
    pub async fn get(&self, raw: &str, deadline: Instant) -> DomainResult<PostalRecord> {
        let code = PostalCode::new(raw)?;
        timeout_at(deadline, self.resolve(&code))
            .await
            .map_err(|_| {
                DomainError::Timeout(format!("lookup of CEP {} exceeded its deadline", code).into())
            })?
    }

    /// キャッシュストアとの接続を確認する。
    ///
    /// 郵便番号プロバイダーには問い合わせない。
    #[tracing::instrument(skip(self, deadline))]
    pub async fn ping(&self, deadline: Instant) -> DomainResult<()> {
        timeout_at(deadline, self.cache.ping())
            .await
            .map_err(|_| DomainError::Timeout("cache ping exceeded its deadline".into()))?
    }

    async fn resolve(&self, code: &PostalCode) -> DomainResult<PostalRecord> {
        if let Some(cached) = self.load_from_cache(code).await? {
            tracing::debug!(cep = %code, "cache hit");
            return Ok(cached);
        }
        tracing::debug!(cep = %code, "cache miss");

        let fresh = self.fetch_from_provider(code).await?;

        // キャッシュへの書き込みに失敗しても、取得した住所を返す
        if let Err(e) = self.save_to_cache(code, &fresh).await {
            tracing::warn!(cep = %code, error = %e, "failed to persist CEP cache");
        }
        Ok(fresh)
    }

    /// キャッシュから有効な住所を取得する。
    ///
    /// キャッシュエントリが存在しない、または期限切れの場合は`None`を返す。
    async fn load_from_cache(&self, code: &PostalCode) -> DomainResult<Option<PostalRecord>> {
        let entry = self
            .cache
            .read(code)
            .await
            .map_err(|e| DomainError::CacheRead(e.to_string().into()))?;
        let Some(entry) = entry else {
            return Ok(None);
        };
        if self.is_stale(entry.updated_at) {
            return Ok(None);
        }
        serde_json::from_str::<PostalRecord>(&entry.payload)
            .map(Some)
            .map_err(|e| DomainError::CacheRead(e.to_string().into()))
    }

    fn is_stale(&self, updated_at: OffsetDateTime) -> bool {
        self.cache_ttl.is_positive() && (self.clock)() - updated_at > self.cache_ttl
    }

    async fn fetch_from_provider(&self, code: &PostalCode) -> DomainResult<PostalRecord> {
        let url = format!(
            "{}/{}/json/",
            self.provider_url.trim_end_matches('/'),
            code.digits()
        );
        let HttpResponse { status, body } = self.http_client.get(&url).await?;
        if status == STATUS_NOT_FOUND {
            return Err(postal_code_not_found(code));
        }
        if status >= STATUS_ERROR_THRESHOLD {
            return Err(DomainError::Upstream {
                status,
                message: "unexpected status".into(),
            });
        }

        let mut record =
            serde_json::from_slice::<PostalRecord>(&body).map_err(|e| DomainError::Upstream {
                status,
                message: format!("malformed response body: {}", e).into(),
            })?;
        // プロバイダーはステータスコード200で、ボディにエラーフラグを設定して返すことがある
        if record.not_found {
            return Err(postal_code_not_found(code));
        }
        if record.code.is_empty() {
            record.code = code.formatted();
        }
        Ok(record)
    }

    async fn save_to_cache(&self, code: &PostalCode, record: &PostalRecord) -> DomainResult<()> {
        let payload =
            serde_json::to_string(record).map_err(|e| DomainError::Unexpected(e.to_string().into()))?;
        let entry = CacheEntry {
            key: code.clone(),
            payload,
            updated_at: (self.clock)().to_offset(UtcOffset::UTC),
        };
        self.cache.upsert(&entry).await
    }
}

fn postal_code_not_found(code: &PostalCode) -> DomainError {
    DomainError::NotFound(format!("CEP {}", code).into())
}

use garde::Validate as _;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::{DomainError, DomainResult};

/// 郵便番号の桁数
pub const POSTAL_CODE_DIGITS: usize = 8;

const INVALID_POSTAL_CODE: &str = "invalid CEP: expected exactly 8 digits";

/// 郵便番号
///
/// 区切り文字を含まない8桁の数字で構成される。
/// キャッシュのキー及びプロバイダーへの問い合わせに使用する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, garde::Validate)]
pub struct PostalCode(#[garde(ascii, length(chars, min = 8, max = 8))] String);

impl PostalCode {
    /// 入力値から数字以外の文字を取り除いて、郵便番号を構築する。
    ///
    /// 数字以外の文字を取り除いた結果が8桁でない場合はエラーを返す。
    pub fn new(raw: &str) -> DomainResult<Self> {
        let digits = raw.chars().filter(|ch| ch.is_ascii_digit()).collect();
        let code = Self(digits);
        match code.validate() {
            Ok(_) => Ok(code),
            Err(_) => Err(DomainError::InvalidKey(INVALID_POSTAL_CODE.into())),
        }
    }

    /// 郵便番号の数字を返す。
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// ハイフンで区切られた正規形式（`NNNNN-NNN`）を返す。
    pub fn formatted(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl std::fmt::Display for PostalCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::convert::TryFrom<&str> for PostalCode {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::ops::Deref for PostalCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// 住所
///
/// フィールド名はViaCEPのJSONと互換性を保つため、ViaCEPのフィールド名でシリアライズする。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalRecord {
    /// 郵便番号
    #[serde(rename = "cep", deserialize_with = "null_as_default")]
    pub code: String,
    /// 通り
    #[serde(rename = "logradouro", deserialize_with = "null_as_default")]
    pub street: String,
    /// 補足
    #[serde(rename = "complemento", deserialize_with = "null_as_default")]
    pub complement: String,
    /// 地区
    #[serde(rename = "bairro", deserialize_with = "null_as_default")]
    pub district: String,
    /// 市区町村
    #[serde(rename = "localidade", deserialize_with = "null_as_default")]
    pub city: String,
    /// 州
    #[serde(rename = "uf", deserialize_with = "null_as_default")]
    pub region: String,
    /// IBGEコード
    #[serde(deserialize_with = "null_as_default")]
    pub ibge: String,
    /// GIAコード
    #[serde(deserialize_with = "null_as_default")]
    pub gia: String,
    /// 市外局番
    #[serde(rename = "ddd", deserialize_with = "null_as_default")]
    pub area_code: String,
    /// SIAFIコード
    #[serde(deserialize_with = "null_as_default")]
    pub siafi: String,
    /// 単位
    #[serde(rename = "unidade", deserialize_with = "null_as_default")]
    pub unit: String,
    /// プロバイダーが郵便番号を知らないことを示すフラグ
    #[serde(
        rename = "erro",
        deserialize_with = "null_as_default",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub not_found: bool,
}

/// `null`をデフォルト値として読み込む。
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// キャッシュエントリ
///
/// `payload`はシリアライズした住所で、キャッシュストアはその内容を解釈しない。
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// キー
    pub key: PostalCode,
    /// シリアライズした住所
    pub payload: String,
    /// 最終書き込み日時（UTC）
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("12345-678", Some("12345678"))]
    #[case("12345678", Some("12345678"))]
    #[case(" 12.345-678 ", Some("12345678"))]
    #[case("CEP 01001000", Some("01001000"))]
    #[case("12-345", None)]
    #[case("1234567", None)]
    #[case("123456789", None)]
    #[case("", None)]
    #[case("abcdefgh", None)]
    #[case("１２３４５６７８", None)]
    fn postal_code_is_normalized(#[case] raw: &str, #[case] expected: Option<&str>) {
        let result = PostalCode::new(raw);
        match expected {
            Some(digits) => assert_eq!(result.unwrap().digits(), digits),
            None => assert!(matches!(result, Err(DomainError::InvalidKey(_)))),
        }
    }

    #[rstest::rstest]
    #[case("12345-678")]
    #[case("(76) 543 210")]
    #[case("00000000")]
    fn normalizing_twice_yields_the_same_postal_code(#[case] raw: &str) {
        let once = PostalCode::new(raw).unwrap();
        let twice = PostalCode::new(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn postal_code_is_formatted_with_hyphen() {
        let code = PostalCode::new("76543210").unwrap();
        assert_eq!(code.formatted(), "76543-210");
    }

    #[test]
    fn postal_record_uses_provider_field_names() {
        let body = r#"{
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "complemento": "lado ímpar",
            "bairro": "Sé",
            "localidade": "São Paulo",
            "uf": "SP",
            "estado": "São Paulo",
            "ibge": "3550308",
            "gia": "1004",
            "ddd": "11",
            "siafi": "7107"
        }"#;
        let record = serde_json::from_str::<PostalRecord>(body).unwrap();
        assert_eq!(record.code, "01001-000");
        assert_eq!(record.street, "Praça da Sé");
        assert_eq!(record.district, "Sé");
        assert_eq!(record.city, "São Paulo");
        assert_eq!(record.region, "SP");
        assert_eq!(record.area_code, "11");
        assert_eq!(record.unit, "");
        assert!(!record.not_found);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["logradouro"], "Praça da Sé");
        assert_eq!(value["ddd"], "11");
        assert!(value.get("erro").is_none());
    }

    #[test]
    fn soft_not_found_marker_is_decoded() {
        let record = serde_json::from_str::<PostalRecord>(r#"{"erro": true}"#).unwrap();
        assert!(record.not_found);
        assert!(record.code.is_empty());
    }

    #[test]
    fn null_fields_are_decoded_as_empty() {
        let body = r#"{
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "complemento": null,
            "gia": null,
            "unidade": null,
            "erro": null
        }"#;
        let record = serde_json::from_str::<PostalRecord>(body).unwrap();
        assert_eq!(record.code, "01001-000");
        assert_eq!(record.street, "Praça da Sé");
        assert_eq!(record.complement, "");
        assert_eq!(record.gia, "");
        assert_eq!(record.unit, "");
        assert!(!record.not_found);
    }
}

//! 値オブジェクト
//!
//! 接続クエリや受信イベントから取り出した生の文字列は、ここで検証されてから
//! ドメイン層に入る。検証に通った値は不変。

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::ValueObjectError;

/// RoomId / ClientId の最大長
const MAX_ID_LENGTH: usize = 64;
/// 表示名の最大長（文字数）
const MAX_DISPLAY_NAME_LENGTH: usize = 50;
/// メッセージ本文の最大長（文字数）
pub const MAX_MESSAGE_LENGTH: usize = 4000;

fn validate_token(field: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    if value.len() > MAX_ID_LENGTH {
        return Err(ValueObjectError::TooLong {
            field,
            max: MAX_ID_LENGTH,
        });
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValueObjectError::InvalidCharacters(field));
    }
    Ok(())
}

/// ルーム ID（不透明なトークン）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_token("room_id", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// RoomId の生成
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// UUID v4 から新しい RoomId を生成する
    pub fn generate() -> RoomId {
        RoomId(uuid::Uuid::new_v4().to_string())
    }
}

/// クライアント ID（クライアント側で生成される不透明な ID）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_token("client_id", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 表示名
///
/// 前後の空白は取り除いて保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty("username"));
        }
        if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            return Err(ValueObjectError::TooLong {
                field: "username",
                max: MAX_DISPLAY_NAME_LENGTH,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// メッセージ本文
///
/// 空白のみの本文は拒否するが、保持する値はトリムしない（キャッシュキーは原文そのまま）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("text"));
        }
        if value.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ValueObjectError::TooLong {
                field: "text",
                max: MAX_MESSAGE_LENGTH,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageText {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（UTC, ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 対応言語
///
/// ここに無いコードは参加時に拒否される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ru,
    Ja,
    Ko,
    Zh,
    Ar,
    Hi,
    He,
    Th,
    Vi,
    Tr,
    Pl,
    Nl,
    Sv,
    Da,
    No,
    Fi,
}

impl Language {
    pub const ALL: [Language; 22] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::It,
        Language::Pt,
        Language::Ru,
        Language::Ja,
        Language::Ko,
        Language::Zh,
        Language::Ar,
        Language::Hi,
        Language::He,
        Language::Th,
        Language::Vi,
        Language::Tr,
        Language::Pl,
        Language::Nl,
        Language::Sv,
        Language::Da,
        Language::No,
        Language::Fi,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
            Language::Ru => "ru",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Zh => "zh",
            Language::Ar => "ar",
            Language::Hi => "hi",
            Language::He => "he",
            Language::Th => "th",
            Language::Vi => "vi",
            Language::Tr => "tr",
            Language::Pl => "pl",
            Language::Nl => "nl",
            Language::Sv => "sv",
            Language::Da => "da",
            Language::No => "no",
            Language::Fi => "fi",
        }
    }

    /// 英語での言語名（翻訳プロンプトと言語一覧 API で使う）
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
            Language::It => "Italian",
            Language::Pt => "Portuguese",
            Language::Ru => "Russian",
            Language::Ja => "Japanese",
            Language::Ko => "Korean",
            Language::Zh => "Chinese",
            Language::Ar => "Arabic",
            Language::Hi => "Hindi",
            Language::He => "Hebrew",
            Language::Th => "Thai",
            Language::Vi => "Vietnamese",
            Language::Tr => "Turkish",
            Language::Pl => "Polish",
            Language::Nl => "Dutch",
            Language::Sv => "Swedish",
            Language::Da => "Danish",
            Language::No => "Norwegian",
            Language::Fi => "Finnish",
        }
    }
}

impl FromStr for Language {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.code() == s)
            .ok_or_else(|| ValueObjectError::UnsupportedLanguage(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Isbn;

/// 書籍カテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Unknown,
    Fiction,
    NonFiction,
    Science,
    Technology,
    History,
    Others,
}

impl Category {
    /// 永続化用の文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Unknown => "UNKNOWN",
            Category::Fiction => "FICTION",
            Category::NonFiction => "NON_FICTION",
            Category::Science => "SCIENCE",
            Category::Technology => "TECHNOLOGY",
            Category::History => "HISTORY",
            Category::Others => "OTHERS",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(Category::Unknown),
            "FICTION" => Ok(Category::Fiction),
            "NON_FICTION" => Ok(Category::NonFiction),
            "SCIENCE" => Ok(Category::Science),
            "TECHNOLOGY" => Ok(Category::Technology),
            "HISTORY" => Ok(Category::History),
            "OTHERS" => Ok(Category::Others),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

/// 書籍レコード - 蔵書在庫の集約
///
/// `available` は貸出可能な冊数。Loan Lifecycle Engine は貸出遷移に
/// 紐づく +1/-1 の差分でのみ `available` を変更する。
/// スキーマは `available <= quantity` を強制しないが、エンジン自身の
/// 操作で [0, quantity] の範囲を外れることはない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub category: Category,
    /// 総冊数（>= 0）
    pub quantity: i32,
    /// 貸出可能冊数（>= 0）。新規貸出の唯一のゲート
    pub available: i32,
    pub price: f64,
    pub active: bool,
    pub created_at: NaiveDate,
}

impl Book {
    /// 貸出可能な在庫があるか
    pub fn has_loanable_copy(&self) -> bool {
        self.available > 0
    }
}

use crate::domain::{Book, Isbn};
use async_trait::async_trait;

use super::Result;

/// 蔵書在庫ストアポート（ユニットオブワーク内で使用）
///
/// Bookレコードの永続化と取得を担う。クロス集約の不変条件は
/// ストアではなくエンジンが強制する。`available` の変更は
/// 貸出遷移に紐づく +1/-1 の差分操作のみ。
#[async_trait]
pub trait BookInventoryStore: Send {
    /// ISBNで書籍を取得する
    async fn find_book(&mut self, isbn: &Isbn) -> Result<Option<Book>>;

    /// 貸出可能冊数を1減らす
    ///
    /// 在庫が残っている行だけを対象にするガード付き更新。
    /// 行がヒットしたかどうかを返す。在庫1冊に対する同時貸出の
    /// 直列化ポイントであり、負けた側は false を観測する。
    async fn reserve_copy(&mut self, isbn: &Isbn) -> Result<bool>;

    /// 貸出可能冊数を1増やす（返却・未返却貸出の削除時）
    ///
    /// 行がヒットしたかどうかを返す。ヒットしない場合、エンジンは
    /// 永続化失敗として扱う。
    async fn release_copy(&mut self, isbn: &Isbn) -> Result<bool>;
}

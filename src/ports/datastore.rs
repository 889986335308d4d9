use async_trait::async_trait;

use super::{BookInventoryStore, LoanStore, Result};

/// スコープ付きユニットオブワーク
///
/// 貸出レコードと書籍レコードへの複数の書き込みを、全部適用するか
/// 全部捨てるかの単位にまとめる。commit / rollback はセッションを
/// 消費し、中途半端なコミット状態を残さない。
#[async_trait]
pub trait UnitOfWork: BookInventoryStore + LoanStore + Send {
    /// 積まれた書き込みをすべて確定する
    async fn commit(self: Box<Self>) -> Result<()>;

    /// 積まれた書き込みをすべて破棄する
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// データストアポート
///
/// エンジン操作ごとに1つのユニットオブワークを払い出す。
/// 下層ストアのトランザクション分離が、同一行への競合する
/// 同時書き込みの直列化を提供する。
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
}

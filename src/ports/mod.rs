pub mod book_store;
pub mod datastore;
pub mod loan_store;
pub mod member_directory;

pub use book_store::BookInventoryStore;
pub use datastore::{Datastore, UnitOfWork};
pub use loan_store::LoanStore;
pub use member_directory::{MemberDirectory, MemberRecord};

/// ポート層の共通Result型
///
/// 永続化層の失敗は型を固定せず、アプリケーション層で
/// `LoanServiceError::Persistence` にラップされる。
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::str::FromStr;

use crate::domain::{Book, Category, Isbn, Loan, LoanId, LoanStatus, MemberId};
use crate::ports::book_store::BookInventoryStore;
use crate::ports::loan_store::LoanStore;
use crate::ports::{Datastore, Result, UnitOfWork};

/// Convert an invalid column value into a port-level error
fn invalid_data(detail: impl Into<String>) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        detail.into(),
    ))
}

/// Map a PostgreSQL row to a Book
///
/// The category and isbn columns are validated on the way out so that
/// corrupt rows surface as errors instead of silently defaulting.
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let isbn: String = row.try_get("isbn")?;
    let isbn = Isbn::new(isbn).map_err(|e| invalid_data(format!("invalid isbn column: {}", e)))?;

    let category: String = row.try_get("category")?;
    let category = Category::from_str(&category).map_err(invalid_data)?;

    Ok(Book {
        isbn,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        category,
        quantity: row.try_get("quantity")?,
        available: row.try_get("available")?,
        price: row.try_get("price")?,
        active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Map a PostgreSQL row to a Loan
///
/// `book_title` comes from a LEFT JOIN on books and may be NULL when the
/// book row has been removed. Member names live in the member context;
/// the application layer resolves them through the member directory.
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let isbn: String = row.try_get("isbn")?;
    let isbn = Isbn::new(isbn).map_err(|e| invalid_data(format!("invalid isbn column: {}", e)))?;

    let status: String = row.try_get("status")?;
    let status = LoanStatus::from_str(&status).map_err(invalid_data)?;

    Ok(Loan {
        id: LoanId::from_uuid(row.try_get("id")?),
        member_id: MemberId::from_uuid(row.try_get("member_id")?),
        isbn,
        borrow_date: row.try_get("borrow_date")?,
        due_date: row.try_get("due_date")?,
        return_date: row.try_get("return_date")?,
        status,
        fine_amount: row.try_get("fine_amount")?,
        created_at: row.try_get("created_at")?,
        member_name: None,
        book_title: row.try_get("book_title")?,
    })
}

const SELECT_LOAN: &str = r#"
    SELECT
        l.id,
        l.member_id,
        l.isbn,
        l.borrow_date,
        l.due_date,
        l.return_date,
        l.status,
        l.fine_amount,
        l.created_at,
        b.title AS book_title
    FROM loans l
    LEFT JOIN books b ON l.isbn = b.isbn
"#;

/// PostgreSQL implementation of the Datastore port
///
/// Each unit of work maps to one database transaction, so the store's
/// transaction isolation serializes conflicting writes to the same
/// book or loan row across concurrent loan desks.
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    /// Create a new PgDatastore from a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// One database transaction scoped to a single engine operation
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookInventoryStore for PgUnitOfWork {
    async fn find_book(&mut self, isbn: &Isbn) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT isbn, title, author, category, quantity, available, price, is_active, created_at
            FROM books
            WHERE isbn = $1
            "#,
        )
        .bind(isbn.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// Guarded decrement - the serialization point for concurrent
    /// registrations against the last copy. The losing transaction
    /// hits no row and reports false.
    async fn reserve_copy(&mut self, isbn: &Isbn) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available = available - 1
            WHERE isbn = $1 AND available > 0
            "#,
        )
        .bind(isbn.as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn release_copy(&mut self, isbn: &Isbn) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available = available + 1
            WHERE isbn = $1
            "#,
        )
        .bind(isbn.as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LoanStore for PgUnitOfWork {
    async fn insert_loan(&mut self, loan: &Loan) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO loans (
                id, member_id, isbn, borrow_date, due_date,
                return_date, status, fine_amount, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(loan.id.value())
        .bind(loan.member_id.value())
        .bind(loan.isbn.as_str())
        .bind(loan.borrow_date)
        .bind(loan.due_date)
        .bind(loan.return_date)
        .bind(loan.status.as_str())
        .bind(loan.fine_amount)
        .bind(loan.created_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(invalid_data("Creating loan affected no rows"));
        }

        Ok(())
    }

    async fn find_loan(&mut self, id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!("{} WHERE l.id = $1", SELECT_LOAN))
            .bind(id.value())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET member_id = $1,
                isbn = $2,
                borrow_date = $3,
                due_date = $4,
                return_date = $5,
                status = $6,
                fine_amount = $7
            WHERE id = $8
            "#,
        )
        .bind(loan.member_id.value())
        .bind(loan.isbn.as_str())
        .bind(loan.borrow_date)
        .bind(loan.due_date)
        .bind(loan.return_date)
        .bind(loan.status.as_str())
        .bind(loan.fine_amount)
        .bind(loan.id.value())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_loan(&mut self, id: LoanId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id.value())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_loans(&mut self) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!("{} ORDER BY l.created_at DESC", SELECT_LOAN))
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn list_loans_by_member(&mut self, member_id: MemberId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.member_id = $1 ORDER BY l.created_at DESC",
            SELECT_LOAN
        ))
        .bind(member_id.value())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn list_loans_by_isbn(&mut self, isbn: &Isbn) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.isbn = $1 ORDER BY l.created_at DESC",
            SELECT_LOAN
        ))
        .bind(isbn.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn list_loans_by_status(&mut self, status: LoanStatus) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.status = $1 ORDER BY l.created_at DESC",
            SELECT_LOAN
        ))
        .bind(status.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn find_active_loan(
        &mut self,
        member_id: MemberId,
        isbn: &Isbn,
    ) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!(
            "{} WHERE l.member_id = $1 AND l.isbn = $2 AND l.status IN ('borrowed', 'overdue') LIMIT 1",
            SELECT_LOAN
        ))
        .bind(member_id.value())
        .bind(isbn.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// Shared test fixtures: an in-memory datastore with real unit-of-work
// semantics (rollback restores the pre-transaction state), plus builders
// for books and service dependencies.

// Each test binary uses a different subset of these fixtures.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rusty_loan_desk::adapters::mock::MockMemberDirectory;
use rusty_loan_desk::application::loan::ServiceDependencies;
use rusty_loan_desk::config::LoanPolicy;
use rusty_loan_desk::domain::{Book, Category, Isbn, Loan, LoanId, MemberId};
use rusty_loan_desk::ports::{
    BookInventoryStore, Datastore, LoanStore, MemberDirectory, Result, UnitOfWork,
};

type Shared<T> = Arc<Mutex<T>>;

/// In-memory Datastore with transactional units of work
///
/// Writes apply directly to the shared maps; each write pushes an undo
/// record, and rollback replays the undo log in reverse. Failure
/// injection flags let tests force specific writes to error.
#[derive(Default)]
pub struct MemoryDatastore {
    books: Shared<HashMap<Isbn, Book>>,
    loans: Shared<HashMap<LoanId, Loan>>,
    /// Counts loan rows actually rewritten by update_loan
    pub loan_update_count: Arc<AtomicUsize>,
    /// When set, every update_loan call fails
    pub fail_loan_updates: Arc<AtomicBool>,
    /// When set, every reserve_copy call fails
    pub fail_reserve: Arc<AtomicBool>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_book(&self, book: Book) {
        self.books.lock().unwrap().insert(book.isbn.clone(), book);
    }

    pub fn remove_book(&self, isbn: &Isbn) {
        self.books.lock().unwrap().remove(isbn);
    }

    /// Seed a loan row without going through the service
    pub fn add_loan(&self, loan: Loan) {
        self.loans.lock().unwrap().insert(loan.id, loan);
    }

    pub fn get_book(&self, isbn: &Isbn) -> Option<Book> {
        self.books.lock().unwrap().get(isbn).cloned()
    }

    pub fn get_loan(&self, id: LoanId) -> Option<Loan> {
        self.loans.lock().unwrap().get(&id).cloned()
    }

    pub fn loan_count(&self) -> usize {
        self.loans.lock().unwrap().len()
    }

    pub fn loan_updates(&self) -> usize {
        self.loan_update_count.load(Ordering::SeqCst)
    }
}

enum Undo {
    Book(Isbn, Option<Book>),
    Loan(LoanId, Option<Loan>),
}

struct MemoryUnitOfWork {
    books: Shared<HashMap<Isbn, Book>>,
    loans: Shared<HashMap<LoanId, Loan>>,
    undo: Vec<Undo>,
    loan_update_count: Arc<AtomicUsize>,
    fail_loan_updates: Arc<AtomicBool>,
    fail_reserve: Arc<AtomicBool>,
}

impl MemoryUnitOfWork {
    // Mirrors the title join the SQL adapter does on loan reads
    fn attach_title(&self, mut loan: Loan) -> Loan {
        if loan.book_title.is_none() {
            loan.book_title = self
                .books
                .lock()
                .unwrap()
                .get(&loan.isbn)
                .map(|b| b.title.clone());
        }
        loan
    }

    fn record_book(&mut self, isbn: &Isbn) {
        let prior = self.books.lock().unwrap().get(isbn).cloned();
        self.undo.push(Undo::Book(isbn.clone(), prior));
    }

    fn record_loan(&mut self, id: LoanId) {
        let prior = self.loans.lock().unwrap().get(&id).cloned();
        self.undo.push(Undo::Loan(id, prior));
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(MemoryUnitOfWork {
            books: Arc::clone(&self.books),
            loans: Arc::clone(&self.loans),
            undo: Vec::new(),
            loan_update_count: Arc::clone(&self.loan_update_count),
            fail_loan_updates: Arc::clone(&self.fail_loan_updates),
            fail_reserve: Arc::clone(&self.fail_reserve),
        }))
    }
}

#[async_trait]
impl BookInventoryStore for MemoryUnitOfWork {
    async fn find_book(&mut self, isbn: &Isbn) -> Result<Option<Book>> {
        Ok(self.books.lock().unwrap().get(isbn).cloned())
    }

    async fn reserve_copy(&mut self, isbn: &Isbn) -> Result<bool> {
        if self.fail_reserve.load(Ordering::SeqCst) {
            return Err("injected reserve_copy failure".into());
        }
        self.record_book(isbn);
        let mut books = self.books.lock().unwrap();
        match books.get_mut(isbn) {
            Some(book) if book.available > 0 => {
                book.available -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_copy(&mut self, isbn: &Isbn) -> Result<bool> {
        self.record_book(isbn);
        let mut books = self.books.lock().unwrap();
        match books.get_mut(isbn) {
            Some(book) => {
                book.available += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LoanStore for MemoryUnitOfWork {
    async fn insert_loan(&mut self, loan: &Loan) -> Result<()> {
        self.record_loan(loan.id);
        self.loans.lock().unwrap().insert(loan.id, loan.clone());
        Ok(())
    }

    async fn find_loan(&mut self, id: LoanId) -> Result<Option<Loan>> {
        let loan = self.loans.lock().unwrap().get(&id).cloned();
        Ok(loan.map(|l| self.attach_title(l)))
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<bool> {
        if self.fail_loan_updates.load(Ordering::SeqCst) {
            return Err("injected update_loan failure".into());
        }
        self.record_loan(loan.id);
        let mut loans = self.loans.lock().unwrap();
        if loans.contains_key(&loan.id) {
            loans.insert(loan.id, loan.clone());
            self.loan_update_count.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_loan(&mut self, id: LoanId) -> Result<bool> {
        self.record_loan(id);
        Ok(self.loans.lock().unwrap().remove(&id).is_some())
    }

    async fn list_loans(&mut self) -> Result<Vec<Loan>> {
        let mut loans: Vec<Loan> = self.loans.lock().unwrap().values().cloned().collect();
        loans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(loans.into_iter().map(|l| self.attach_title(l)).collect())
    }

    async fn list_loans_by_member(&mut self, member_id: MemberId) -> Result<Vec<Loan>> {
        let mut loans = self.list_loans().await?;
        loans.retain(|l| l.member_id == member_id);
        Ok(loans)
    }

    async fn list_loans_by_isbn(&mut self, isbn: &Isbn) -> Result<Vec<Loan>> {
        let mut loans = self.list_loans().await?;
        loans.retain(|l| &l.isbn == isbn);
        Ok(loans)
    }

    async fn list_loans_by_status(
        &mut self,
        status: rusty_loan_desk::domain::LoanStatus,
    ) -> Result<Vec<Loan>> {
        let mut loans = self.list_loans().await?;
        loans.retain(|l| l.status == status);
        Ok(loans)
    }

    async fn find_active_loan(
        &mut self,
        member_id: MemberId,
        isbn: &Isbn,
    ) -> Result<Option<Loan>> {
        Ok(self
            .loans
            .lock()
            .unwrap()
            .values()
            .find(|l| l.member_id == member_id && &l.isbn == isbn && l.is_active())
            .cloned())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        // Replay the undo log in reverse so later writes unwind first
        while let Some(op) = self.undo.pop() {
            match op {
                Undo::Book(isbn, Some(book)) => {
                    self.books.lock().unwrap().insert(isbn, book);
                }
                Undo::Book(isbn, None) => {
                    self.books.lock().unwrap().remove(&isbn);
                }
                Undo::Loan(id, Some(loan)) => {
                    self.loans.lock().unwrap().insert(id, loan);
                }
                Undo::Loan(id, None) => {
                    self.loans.lock().unwrap().remove(&id);
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn isbn(value: &str) -> Isbn {
    Isbn::new(value).unwrap()
}

/// A loanable fiction book with the given stock
pub fn book(isbn_value: &str, quantity: i32, available: i32) -> Book {
    Book {
        isbn: isbn(isbn_value),
        title: "The Left Hand of Darkness".to_string(),
        author: "Ursula K. Le Guin".to_string(),
        category: Category::Fiction,
        quantity,
        available,
        price: 1200.0,
        active: true,
        created_at: date(2024, 1, 1),
    }
}

/// Wire a service around the given store with one active member seeded
pub fn service_deps(
    datastore: Arc<MemoryDatastore>,
    member_id: MemberId,
) -> ServiceDependencies {
    let directory = MockMemberDirectory::new();
    directory.add_member(member_id, "Ada Lovelace");
    service_deps_with_directory(datastore, Arc::new(directory))
}

pub fn service_deps_with_directory(
    datastore: Arc<MemoryDatastore>,
    member_directory: Arc<dyn MemberDirectory>,
) -> ServiceDependencies {
    ServiceDependencies {
        datastore,
        member_directory,
        policy: LoanPolicy::default(),
    }
}

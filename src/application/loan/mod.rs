mod errors;
mod loan_service;
mod overdue_sweep;

pub use errors::{LoanServiceError, Result};
pub use loan_service::{
    ServiceDependencies, delete_loan, find_loan_by_id, find_loans_by_isbn, find_loans_by_member,
    find_loans_by_status, get_all_loans, mark_return, register_loan,
};

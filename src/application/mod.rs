pub mod authorization;
pub mod loan;

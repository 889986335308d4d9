pub mod book;
pub mod commands;
pub mod loan;
pub mod value_objects;

pub use book::*;
pub use loan::*;
pub use value_objects::*;

//! Infrastructure layer storing [`Rental`]s and looking up their
//! collaborators.

#[cfg(doc)]
use crate::domain::Rental;

pub mod database;

pub use self::database::Database;
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};

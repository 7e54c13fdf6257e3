//! In-memory [`Database`] implementation for tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Update},
    Date,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{
        customer, equipment,
        rental::{self, Overdue, PaymentStatus},
        Customer, Equipment, Rental,
    },
    infra::{database, Database},
};

/// Stored entities.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`Rental`]s.
    pub rentals: HashMap<rental::Id, Rental>,

    /// Stored [`Equipment`].
    pub equipment: HashMap<equipment::Id, Equipment>,

    /// Stored [`Customer`]s.
    pub customers: HashMap<customer::Id, Customer>,

    /// Whether [`Insert`]s of [`Rental`]s are rejected with an [`Error`].
    pub rejects_inserts: bool,
}

/// In-memory [`Database`].
///
/// A [`Transact`]ed [`Memory`] works on a snapshot of the [`State`], which is
/// written back on [`Commit`] only.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Committed [`State`].
    committed: Arc<Mutex<State>>,

    /// [`State`] of the current transaction, if any.
    tx: Option<Arc<Mutex<State>>>,
}

impl Memory {
    /// Creates a new [`Memory`] holding the provided [`State`].
    #[must_use]
    pub fn new(state: State) -> Self {
        Self {
            committed: Arc::new(Mutex::new(state)),
            tx: None,
        }
    }

    /// Returns a copy of the committed [`State`].
    #[must_use]
    pub fn committed(&self) -> State {
        lock(&self.committed).clone()
    }

    /// Makes all the following [`Insert`]s of [`Rental`]s fail.
    pub fn reject_inserts(&self) {
        lock(&self.committed).rejects_inserts = true;
    }

    /// Returns the [`State`] this [`Memory`] currently operates on.
    fn state(&self) -> MutexGuard<'_, State> {
        lock(self.tx.as_ref().unwrap_or(&self.committed))
    }
}

/// Locks the provided [`State`] ignoring poisoning.
fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`Memory`] error.
#[derive(Clone, Copy, Debug, Display, StdError)]
#[display("`Memory` rejected the write")]
pub struct Error;

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.tx.is_some() {
            return Ok(self.clone());
        }
        let snapshot = self.committed();
        Ok(Self {
            committed: Arc::clone(&self.committed),
            tx: Some(Arc::new(Mutex::new(snapshot))),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        if let Some(tx) = &self.tx {
            *lock(&self.committed) = lock(tx).clone();
        }
        Ok(())
    }
}

impl Database<Lock<By<Rental, rental::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Rental, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<Rental>, rental::Id>>> for Memory {
    type Ok = Option<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rental>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().rentals.get(by.inner()).cloned())
    }
}

impl Database<Insert<Rental>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rental): Insert<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if state.rejects_inserts {
            return Err(tracerr::new!(database::Error::from(Error)));
        }
        _ = state.rentals.insert(rental.id, rental);
        Ok(())
    }
}

impl Database<Update<Rental>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rental): Update<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().rentals.insert(rental.id, rental);
        Ok(())
    }
}

impl Database<Update<By<Overdue, Date>>> for Memory {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Overdue, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();
        let mut marked = 0;
        for rental in self.state().rentals.values_mut() {
            if rental.is_overdue(today) {
                rental.payment.status = PaymentStatus::Overdue;
                marked += 1;
            }
        }
        Ok(marked)
    }
}

impl<IDs> Database<Select<By<HashMap<equipment::Id, Equipment>, IDs>>>
    for Memory
where
    IDs: AsRef<[equipment::Id]>,
{
    type Ok = HashMap<equipment::Id, Equipment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<equipment::Id, Equipment>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let state = self.state();
        Ok(by
            .inner()
            .as_ref()
            .iter()
            .filter_map(|id| state.equipment.get(id))
            .map(|e| (e.id, e.clone()))
            .collect())
    }
}

impl Database<Select<By<Option<Customer>, customer::Id>>> for Memory {
    type Ok = Option<Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Customer>, customer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().customers.get(by.inner()).cloned())
    }
}

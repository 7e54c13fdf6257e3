//! GraphQL API definitions.

pub mod equipment;
mod mutation;
mod query;
pub mod rental;
pub mod scalar;

use juniper::EmptySubscription;

use crate::Context;

pub use self::{
    equipment::Equipment, mutation::Mutation, query::Query, rental::Rental,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

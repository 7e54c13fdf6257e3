//! [`Query`] collection related to [`Equipment`].

use std::collections::HashMap;

use common::operations::By;

use crate::domain::{equipment, Equipment};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries [`Equipment`] by their [`equipment::Id`]s.
///
/// Unknown [`equipment::Id`]s are omitted from the result.
pub type ByIds = DatabaseQuery<
    By<HashMap<equipment::Id, Equipment>, Vec<equipment::Id>>,
>;

//! In-memory repository
//!
//! Mirrors the Postgres store's behavior (ids start at 1 and are never
//! reused, lists come back ordered by id). Used by tests and for running
//! the server without a database.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::repository::{DbError, ReferenceCheck, Repository, Store, Updated};
use crate::models::{Entity, ManagerTeam, Match, Player, Reference};

/// One table: rows keyed by id plus the id sequence
#[derive(Debug)]
pub struct Table<R> {
    next_id: i64,
    rows: BTreeMap<i64, R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Tables {
    matches: Table<Match>,
    teams: Table<ManagerTeam>,
    players: Table<Player>,
}

/// Maps an entity to its table inside [`Tables`]
pub trait MemoryBacked: Entity {
    fn table(tables: &mut Tables) -> &mut Table<Self::Record>;
}

impl MemoryBacked for Match {
    fn table(tables: &mut Tables) -> &mut Table<Match> {
        &mut tables.matches
    }
}

impl MemoryBacked for ManagerTeam {
    fn table(tables: &mut Tables) -> &mut Table<ManagerTeam> {
        &mut tables.teams
    }
}

impl MemoryBacked for Player {
    fn table(tables: &mut Tables) -> &mut Table<Player> {
        &mut tables.players
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Every mutation below completes before it can panic, so a
        // poisoned lock still guards consistent data.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<E: MemoryBacked> Repository<E> for MemoryStore {
    async fn list(&self) -> Result<Vec<E::Record>, DbError> {
        let mut tables = self.lock();
        Ok(E::table(&mut tables).rows.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<E::Record, DbError> {
        let mut tables = self.lock();
        E::table(&mut tables)
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::not_found::<E>(id))
    }

    async fn insert(&self, fields: &E::Fields, image: Option<&str>) -> Result<i64, DbError> {
        let mut tables = self.lock();
        let table = E::table(&mut tables);

        let id = table.next_id;
        table.next_id += 1;
        table
            .rows
            .insert(id, E::assemble(id, fields.clone(), image.map(str::to_owned)));
        Ok(id)
    }

    async fn update(
        &self,
        id: i64,
        fields: &E::Fields,
        image: Option<&str>,
    ) -> Result<Updated<E::Record>, DbError> {
        let mut tables = self.lock();
        let row = E::table(&mut tables)
            .rows
            .get_mut(&id)
            .ok_or_else(|| DbError::not_found::<E>(id))?;

        let previous = E::image(row).map(str::to_owned);
        let kept = match image {
            Some(image) => Some(image.to_owned()),
            None => previous.clone(),
        };
        *row = E::assemble(id, fields.clone(), kept);

        Ok(Updated {
            record: row.clone(),
            replaced_image: if image.is_some() { previous } else { None },
        })
    }

    async fn delete(&self, id: i64) -> Result<Option<String>, DbError> {
        let mut tables = self.lock();
        E::table(&mut tables)
            .rows
            .remove(&id)
            .map(|row| E::image(&row).map(str::to_owned))
            .ok_or_else(|| DbError::not_found::<E>(id))
    }
}

#[async_trait]
impl ReferenceCheck for MemoryStore {
    async fn reference_exists(&self, reference: &Reference<'_>) -> Result<bool, DbError> {
        let tables = self.lock();
        let exists = match *reference {
            Reference::Match { name } => tables.matches.rows.values().any(|m| m.name == name),
            Reference::Team {
                team_name,
                match_name,
            } => tables
                .teams
                .rows
                .values()
                .any(|t| t.team_name == team_name && t.match_name == match_name),
        };
        Ok(exists)
    }
}

impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}

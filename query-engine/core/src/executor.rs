//! Sequential execution of predicate sets against a store.

use crate::CoreResult;
use entity_model::{
    filter::{Filter, PathCompare, PredicateSet},
    EntitySpec, FieldValue, ID_FIELD,
};
use query_connector::{dedup_by_id, Record, Store};

/// What the final pass produces. Earlier passes always filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminal {
    #[default]
    Collect,
    First,
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Records(Vec<Record>),
    Record(Option<Record>),
    Count(usize),
}

impl Outcome {
    fn empty(terminal: Terminal) -> Self {
        match terminal {
            Terminal::Collect => Outcome::Records(Vec::new()),
            Terminal::First => Outcome::Record(None),
            Terminal::Count => Outcome::Count(0),
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Outcome::Records(records) => records,
            Outcome::Record(record) => record.into_iter().collect(),
            Outcome::Count(_) => Vec::new(),
        }
    }
}

/// Applies `sets` one after the other, each pass restricted to the records the previous one
/// returned. Records repeated by relation fan-out are removed between passes.
#[tracing::instrument(skip_all, fields(entity = %entity.name, store = store.name(), passes = sets.len()))]
pub async fn execute(store: &dyn Store, entity: &EntitySpec, sets: &[PredicateSet], terminal: Terminal) -> CoreResult<Outcome> {
    let Some((last, passes)) = sets.split_last() else {
        return finish(store, entity, Filter::empty(), terminal).await;
    };

    let mut previous: Option<Vec<FieldValue>> = None;

    for (idx, set) in passes.iter().enumerate() {
        let filter = restrict(previous.take(), set.filter.clone());
        let records = dedup_by_id(store.filter(entity, &filter).await?);

        tracing::debug!(pass = idx, matched = records.len(), "filter pass");

        if records.is_empty() {
            return Ok(Outcome::empty(terminal));
        }

        previous = Some(records.iter().filter_map(|r| r.id().cloned()).collect());
    }

    finish(store, entity, restrict(previous, last.filter.clone()), terminal).await
}

async fn finish(store: &dyn Store, entity: &EntitySpec, filter: Filter, terminal: Terminal) -> CoreResult<Outcome> {
    let outcome = match terminal {
        Terminal::Count => Outcome::Count(store.count(entity, &filter).await?),
        Terminal::First => Outcome::Record(dedup_by_id(store.filter(entity, &filter).await?).into_iter().next()),
        Terminal::Collect => Outcome::Records(dedup_by_id(store.filter(entity, &filter).await?)),
    };

    Ok(outcome)
}

fn restrict(ids: Option<Vec<FieldValue>>, filter: Filter) -> Filter {
    match ids {
        Some(ids) => ID_FIELD.is_in(ids).conjoin(filter),
        None => filter,
    }
}

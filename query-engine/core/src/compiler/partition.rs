use entity_model::filter::{FieldPath, Filter, PredicateSet};

/// Compiled comparisons, grouped into filtering passes.
///
/// Comparisons on single-valued paths share one group. Comparisons under the same to-many
/// relation share a group unless they were given as separate members.
#[derive(Debug, Default)]
pub(super) struct Partition {
    single: Vec<Filter>,
    groups: Vec<Group>,
}

#[derive(Debug)]
struct Group {
    relation: FieldPath,
    filters: Vec<Filter>,
    /// Separate member groups never absorb later comparisons.
    sealed: bool,
}

impl Partition {
    pub(super) fn push(&mut self, relation: Option<&FieldPath>, filter: Filter) {
        let Some(relation) = relation else {
            self.single.push(filter);
            return;
        };

        match self.groups.iter_mut().find(|g| !g.sealed && &g.relation == relation) {
            Some(group) => group.filters.push(filter),
            None => self.groups.push(Group {
                relation: relation.clone(),
                filters: vec![filter],
                sealed: false,
            }),
        }
    }

    /// Appends the groups of a separately compiled member, sealed.
    pub(super) fn push_member(&mut self, member: Partition) {
        debug_assert!(member.single.is_empty());

        self.groups.extend(member.groups.into_iter().map(|mut group| {
            group.sealed = true;
            group
        }));
    }

    /// All filters, provided they are confined to `relation`.
    pub(super) fn into_confined(self, relation: Option<&FieldPath>) -> Option<Vec<Filter>> {
        match relation {
            None if self.groups.is_empty() => Some(self.single),
            Some(relation) if self.single.is_empty() && self.groups.iter().all(|g| &g.relation == relation) => {
                Some(self.groups.into_iter().flat_map(|g| g.filters).collect())
            }
            _ => None,
        }
    }

    /// The ordered passes. Single-valued comparisons are conjoined into the first one.
    pub(super) fn into_sets(self) -> Vec<PredicateSet> {
        let single = conjunction(self.single);

        if self.groups.is_empty() {
            return vec![PredicateSet::new(None, single)];
        }

        self.groups
            .into_iter()
            .enumerate()
            .map(|(idx, group)| {
                let filter = conjunction(group.filters);
                let filter = if idx == 0 { single.clone().conjoin(filter) } else { filter };

                PredicateSet::new(Some(group.relation), filter)
            })
            .collect()
    }
}

pub(super) fn conjunction(mut filters: Vec<Filter>) -> Filter {
    match filters.len() {
        0 => Filter::empty(),
        1 => filters.remove(0),
        _ => Filter::and(filters),
    }
}

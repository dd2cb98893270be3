use entity_model::{FieldObject, FieldValue, ID_FIELD};

/// A stored row of an entity.
///
/// To-one references are stored as `{field}_id`, to-many references as the list of member
/// identities under the field name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub values: FieldObject,
}

impl Record {
    pub fn new(values: FieldObject) -> Self {
        Record { values }
    }

    pub fn id(&self) -> Option<&FieldValue> {
        self.values.get(ID_FIELD).filter(|id| !id.is_null())
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn into_values(self) -> FieldObject {
        self.values
    }
}

impl From<FieldObject> for Record {
    fn from(values: FieldObject) -> Self {
        Record::new(values)
    }
}

/// Removes repeated records, keeping the first occurrence of every identity.
///
/// Relation fan-out makes a store return one record per matching join row.
pub fn dedup_by_id(records: Vec<Record>) -> Vec<Record> {
    let mut seen: Vec<FieldValue> = Vec::with_capacity(records.len());
    let mut unique = Vec::with_capacity(records.len());

    for record in records {
        match record.id() {
            Some(id) if seen.contains(id) => continue,
            Some(id) => seen.push(id.clone()),
            None => (),
        }

        unique.push(record);
    }

    unique
}

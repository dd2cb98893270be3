use crate::CoreResult;
use entity_model::{EntitySpec, FieldObject, FieldValue, ID_FIELD};
use field_value::deep_merge;
use query_connector::Store;
use std::mem;

/// Merges incoming document fields into the stored documents of the updated record.
///
/// Keys missing from the incoming document keep their stored values. Fields that are not
/// documents are replaced as usual.
pub async fn merge_documents_on_update(store: &dyn Store, entity: &EntitySpec, mut values: FieldObject) -> CoreResult<FieldObject> {
    let Some(id) = values.get(ID_FIELD).filter(|id| !id.is_null()).cloned() else {
        return Ok(values);
    };

    let documents: Vec<String> = entity
        .document_fields()
        .filter(|f| values.contains_key(&f.name))
        .map(|f| f.name.clone())
        .collect();

    if documents.is_empty() {
        return Ok(values);
    }

    let Some(existing) = store.get(entity, &id).await? else {
        return Ok(values);
    };

    for name in documents {
        let stored = existing.get(&name).cloned().unwrap_or(FieldValue::Null);

        if let Some(incoming) = values.get_mut(&name) {
            let new = mem::replace(incoming, FieldValue::Null);
            *incoming = deep_merge(stored, new);
        }
    }

    Ok(values)
}

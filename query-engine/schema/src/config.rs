use crate::FilterProfile;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub filter_profile: FilterProfile,
}

impl SchemaConfig {
    pub fn with_profile(filter_profile: FilterProfile) -> Self {
        SchemaConfig { filter_profile }
    }
}

use super::loader;
use super::schema::{BaseTemplateFile, RegistryEntry};
use crate::model::types::BaseLetter;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct InternalTemplate {
    pub schema: BaseTemplateFile,
}

pub struct DataStore {
    pub templates_by_letter: HashMap<BaseLetter, InternalTemplate>,
    pub registry: HashMap<String, RegistryEntry>,
}

static STORE: OnceLock<DataStore> = OnceLock::new();

pub fn get_store() -> &'static DataStore {
    STORE.get_or_init(loader::load_all)
}

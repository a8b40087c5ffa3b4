use super::schema::{BaseTemplateFile, RegistryFile};
use super::store::{DataStore, InternalTemplate};
use std::collections::HashMap;

pub fn load_all() -> DataStore {
    let mut templates_by_letter = HashMap::new();

    macro_rules! load_template {
        ($path:literal) => {
            let content = include_str!(concat!("../../templates/", $path));
            let schema: BaseTemplateFile = toml::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse template file '{}': {}", $path, e));

            check_template(&schema, $path);

            let letter = schema.info.letter;
            if templates_by_letter
                .insert(letter, InternalTemplate { schema })
                .is_some()
            {
                panic!("Duplicate template for base letter: {}", letter);
            }
        };
    }

    load_template!("bases/A.toml");
    load_template!("bases/C.toml");
    load_template!("bases/G.toml");
    load_template!("bases/T.toml");
    load_template!("bases/U.toml");
    load_template!("bases/I.toml");

    let content = include_str!("../../templates/registry.toml");
    let registry_file: RegistryFile = toml::from_str(content)
        .unwrap_or_else(|e| panic!("Failed to parse template file 'registry.toml': {}", e));

    let mut registry = HashMap::new();
    for entry in registry_file.residues {
        if !templates_by_letter.contains_key(&entry.parent) {
            panic!(
                "Registry entry '{}' names parent '{}' without a template",
                entry.name, entry.parent
            );
        }
        let name = entry.name.clone();
        if registry.insert(name.clone(), entry).is_some() {
            panic!("Duplicate registry entry: {}", name);
        }
    }

    DataStore {
        templates_by_letter,
        registry,
    }
}

/// Every name referenced by the ring, substituent, and polar tables must be a declared atom.
fn check_template(schema: &BaseTemplateFile, path: &str) {
    let declared = |name: &str| schema.atoms.iter().any(|a| a.name == name);

    let referenced = schema
        .ring
        .perimeter
        .iter()
        .chain(std::iter::once(&schema.info.glycosidic))
        .chain(schema.substituents.iter().flat_map(|s| [&s.ring, &s.atom]))
        .chain(schema.polar.iter().map(|p| &p.name));

    for name in referenced {
        if !declared(name) {
            panic!("Template '{}' references undeclared atom '{}'", path, name);
        }
    }

    if schema.ring.perimeter.len() < 3 {
        panic!("Template '{}' declares fewer than three ring atoms", path);
    }
}

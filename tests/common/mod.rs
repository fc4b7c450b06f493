//! Shared fixtures for integration tests

#![allow(dead_code)]

use facetql::{CompiledSchema, ProjectConfig, SchemaCompiler};

/// Load a project from tests/fixtures/<name>
pub fn load_fixture(name: &str) -> ProjectConfig {
    let path = format!("tests/fixtures/{}", name);
    ProjectConfig::load(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Compile a fixture with default settings
pub fn compile_fixture(name: &str) -> CompiledSchema {
    SchemaCompiler::default()
        .compile_project(&load_fixture(name))
        .unwrap_or_else(|e| panic!("Failed to compile fixture {}: {}", name, e))
}

/// Body of `type <name> { ... }` in an SDL document
pub fn type_block<'a>(sdl: &'a str, name: &str) -> &'a str {
    let header = format!("type {} ", name);
    let start = sdl
        .find(&header)
        .unwrap_or_else(|| panic!("type {} not found in SDL", name));
    let end = sdl[start..]
        .find("\n}")
        .map(|i| start + i + 2)
        .unwrap_or(sdl.len());
    &sdl[start..end]
}

/// Parse an SDL document, panicking with the parser error, and return the
/// declared type names in document order
pub fn parsed_type_names(sdl: &str) -> Vec<String> {
    use graphql_parser::schema::{parse_schema, Definition, TypeDefinition};

    let document = parse_schema::<String>(sdl).unwrap_or_else(|e| panic!("SDL does not parse: {}\n{}", e, sdl));
    document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::TypeDefinition(def) => Some(match def {
                TypeDefinition::Scalar(t) => t.name.clone(),
                TypeDefinition::Object(t) => t.name.clone(),
                TypeDefinition::Interface(t) => t.name.clone(),
                TypeDefinition::Union(t) => t.name.clone(),
                TypeDefinition::Enum(t) => t.name.clone(),
                TypeDefinition::InputObject(t) => t.name.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Field names of an object type, read through the GraphQL parser
pub fn parsed_object_fields(sdl: &str, name: &str) -> Vec<String> {
    use graphql_parser::schema::{parse_schema, Definition, TypeDefinition};

    let document = parse_schema::<String>(sdl).unwrap_or_else(|e| panic!("SDL does not parse: {}", e));
    document
        .definitions
        .iter()
        .find_map(|definition| match definition {
            Definition::TypeDefinition(TypeDefinition::Object(t)) if t.name == name => {
                Some(t.fields.iter().map(|f| f.name.clone()).collect())
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("object type {} not found", name))
}

//! SDL scaffolding from a persistence model.
//!
//! Produces the conventional fragment for a model: the object type, list
//! and single-item queries, create/update inputs, and create/update/delete
//! mutations, all guarded by `@requireAuth`. Custom scalars and persistence
//! enums used by the model are declared in the fragment too, so it builds
//! on its own.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::model::{ModelField, PersistenceModel, PersistenceSchema};
use crate::naming::{camel_case, pluralize};

/// A generated fragment and the file name it should be written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldedFragment {
    pub domain: String,
    pub file_name: String,
    pub sdl: String,
}

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Maps a persistence scalar type to its GraphQL counterpart.
#[must_use]
pub fn graphql_scalar_for(persistence_type: &str) -> &str {
    match persistence_type {
        "String" => "String",
        "Int" => "Int",
        "BigInt" => "BigInt",
        "Float" | "Decimal" => "Float",
        "Boolean" => "Boolean",
        "DateTime" => "DateTime",
        "Json" => "JSON",
        "Bytes" => "Byte",
        other => other,
    }
}

/// Generates the conventional SDL fragment for `model`.
#[must_use]
pub fn scaffold_sdl(model: &PersistenceModel, schema: &PersistenceSchema) -> ScaffoldedFragment {
    let singular = camel_case(&model.name);
    let plural = pluralize(&singular);
    let name = &model.name;
    let id = model.id_field();
    let id_type = id
        .map(|f| graphql_scalar_for(&f.ty).to_string())
        .unwrap_or_else(|| "Int".to_string());

    let mut sdl = String::new();

    let _ = writeln!(sdl, "type {name} {{");
    for field in &model.fields {
        let _ = writeln!(sdl, "  {}: {}", field.name, output_type(field, schema));
    }
    sdl.push_str("}\n\n");

    for declaration in supporting_types(model, schema) {
        sdl.push_str(&declaration);
        sdl.push('\n');
    }

    let _ = writeln!(sdl, "type Query {{");
    let _ = writeln!(sdl, "  {plural}: [{name}!]! @requireAuth");
    if id.is_some() {
        let _ = writeln!(sdl, "  {singular}(id: {id_type}!): {name} @requireAuth");
    }
    sdl.push_str("}\n\n");

    let inputs: Vec<&ModelField> = model
        .fields
        .iter()
        .filter(|f| !f.id && !schema.is_model(&f.ty))
        .collect();

    let _ = writeln!(sdl, "input Create{name}Input {{");
    for field in &inputs {
        let _ = writeln!(sdl, "  {}: {}", field.name, output_type(field, schema));
    }
    sdl.push_str("}\n\n");

    let _ = writeln!(sdl, "input Update{name}Input {{");
    for field in &inputs {
        let _ = writeln!(sdl, "  {}: {}", field.name, optional_type(field));
    }
    sdl.push_str("}\n\n");

    let _ = writeln!(sdl, "type Mutation {{");
    let _ = writeln!(sdl, "  create{name}(input: Create{name}Input!): {name}! @requireAuth");
    if id.is_some() {
        let _ = writeln!(
            sdl,
            "  update{name}(id: {id_type}!, input: Update{name}Input!): {name}! @requireAuth"
        );
        let _ = writeln!(sdl, "  delete{name}(id: {id_type}!): {name}! @requireAuth");
    }
    sdl.push_str("}\n");

    ScaffoldedFragment {
        file_name: format!("{plural}.sdl"),
        domain: plural,
        sdl,
    }
}

/// `scalar` and `enum` declarations for every non-model, non-built-in type
/// the model uses, sorted by name.
fn supporting_types(model: &PersistenceModel, schema: &PersistenceSchema) -> Vec<String> {
    let used: BTreeSet<&str> = model
        .fields
        .iter()
        .map(|f| f.ty.as_str())
        .filter(|ty| !schema.is_model(ty))
        .collect();

    let mut enums = Vec::new();
    let mut scalars = BTreeSet::new();
    for ty in used {
        match schema.enum_values(ty) {
            Some(values) => {
                let mut block = format!("enum {ty} {{\n");
                for value in values {
                    let _ = writeln!(block, "  {value}");
                }
                block.push_str("}\n");
                enums.push(block);
            }
            None => {
                let scalar = graphql_scalar_for(ty);
                if !BUILTIN_SCALARS.contains(&scalar) {
                    scalars.insert(format!("scalar {scalar}\n"));
                }
            }
        }
    }
    scalars.into_iter().chain(enums).collect()
}

fn output_type(field: &ModelField, schema: &PersistenceSchema) -> String {
    let base = graphql_scalar_for(&field.ty);
    let relation = schema.is_model(&field.ty);
    match (field.list, field.optional || relation) {
        (true, _) => format!("[{base}]!"),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}!"),
    }
}

fn optional_type(field: &ModelField) -> String {
    let base = graphql_scalar_for(&field.ty);
    if field.list {
        format!("[{base}]")
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::SchemaFragment;
    use crate::naming::validate_naming;

    fn schema() -> PersistenceSchema {
        PersistenceSchema::parse_prisma(
            r#"
            model Category {
              id      Int      @id
              name    String
              created DateTime
              parent  Category?
              notes   String?
              status  Status
              payload Json?
            }

            enum Status {
              DRAFT
              PUBLISHED
            }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_scaffold_names() {
        let schema = schema();
        let fragment = scaffold_sdl(schema.model("Category").unwrap(), &schema);
        assert_eq!(fragment.domain, "categories");
        assert_eq!(fragment.file_name, "categories.sdl");
        assert!(fragment.sdl.contains("categories: [Category!]! @requireAuth"));
        assert!(fragment.sdl.contains("category(id: Int!): Category @requireAuth"));
        assert!(fragment.sdl.contains("deleteCategory(id: Int!): Category! @requireAuth"));
        assert!(fragment.sdl.contains("  created: DateTime!\n"));
        assert!(fragment.sdl.contains("  notes: String\n"));
    }

    #[test]
    fn test_scaffold_inputs_skip_id_and_relations() {
        let schema = schema();
        let fragment = scaffold_sdl(schema.model("Category").unwrap(), &schema);
        let create = fragment
            .sdl
            .split("input CreateCategoryInput {")
            .nth(1)
            .and_then(|rest| rest.split('}').next())
            .unwrap();
        assert!(!create.contains("id:"));
        assert!(!create.contains("parent:"));
        assert!(create.contains("name: String!"));
    }

    #[test]
    fn test_scaffold_declares_custom_scalars_and_enums() {
        let schema = schema();
        let sdl = scaffold_sdl(schema.model("Category").unwrap(), &schema).sdl;
        assert!(sdl.contains("scalar DateTime\n"));
        assert!(sdl.contains("scalar JSON\n"));
        assert!(sdl.contains("enum Status {\n  DRAFT\n  PUBLISHED\n}\n"));
        assert!(!sdl.contains("scalar String"));
        assert!(!sdl.contains("scalar Category"));

        let fragment = SchemaFragment::parse("categories", sdl).unwrap();
        assert!(fragment.type_names().contains("DateTime"));
        assert!(fragment.type_names().contains("Status"));
    }

    #[test]
    fn test_scaffold_passes_naming_validation() {
        let schema = schema();
        let scaffolded = scaffold_sdl(schema.model("Category").unwrap(), &schema);
        let fragment = SchemaFragment::parse(scaffolded.domain, scaffolded.sdl).unwrap();
        assert!(validate_naming(&[fragment], &schema, "computed").is_ok());
    }
}

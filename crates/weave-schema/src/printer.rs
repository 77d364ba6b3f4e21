//! Canonical SDL printing for a merged definition.
//!
//! Root types come first (Query, Mutation, Subscription), every other type
//! follows sorted by name, and fields keep merge order. Root operations are
//! printed with their effective annotation so the fail-closed default is
//! visible in the output. Other fields carry the annotation written on them
//! or on their declaration block, since blocks from different fragments are
//! flattened into one.

use std::fmt::Write;

use crate::fragment::TypeKind;
use crate::merger::{MergedDefinition, MergedField, MergedType};
use crate::operation::{OperationKind, is_root_type};

pub(crate) fn print(definition: &MergedDefinition) -> String {
    let mut roots: Vec<&MergedType> = OperationKind::ALL
        .into_iter()
        .filter_map(|k| definition.get_type(k.root_type_name()))
        .collect();
    let mut others: Vec<&MergedType> = definition
        .types()
        .filter(|t| !is_root_type(&t.name))
        .collect();
    others.sort_by(|a, b| a.name.cmp(&b.name));
    roots.extend(others);

    let blocks: Vec<String> = roots.into_iter().map(print_type).collect();
    blocks.join("\n")
}

fn print_type(ty: &MergedType) -> String {
    let mut out = String::new();
    if let Some(description) = &ty.description {
        print_description(&mut out, description, "");
    }

    match ty.kind {
        TypeKind::Scalar => {
            let _ = writeln!(out, "scalar {}", ty.name);
        }
        TypeKind::Union => {
            let _ = writeln!(out, "union {} = {}", ty.name, ty.members.join(" | "));
        }
        TypeKind::Enum => {
            let _ = writeln!(out, "enum {} {{", ty.name);
            for value in &ty.members {
                let _ = writeln!(out, "  {value}");
            }
            out.push_str("}\n");
        }
        TypeKind::Object | TypeKind::Interface | TypeKind::InputObject => {
            let _ = write!(out, "{} {}", ty.kind.keyword(), ty.name);
            if !ty.implements.is_empty() {
                let _ = write!(out, " implements {}", ty.implements.join(" & "));
            }
            out.push_str(" {\n");
            let root = is_root_type(&ty.name);
            for field in ty.fields.values() {
                print_field(&mut out, field, root);
            }
            out.push_str("}\n");
        }
    }
    out
}

fn print_field(out: &mut String, field: &MergedField, root: bool) {
    let decl = &field.decl;
    if let Some(description) = &decl.description {
        print_description(out, description, "  ");
    }

    let _ = write!(out, "  {}", decl.name);
    if !decl.arguments.is_empty() {
        let arguments: Vec<String> = decl
            .arguments
            .iter()
            .map(|a| match &a.default_value {
                Some(default) => format!("{}: {} = {default}", a.name, a.ty),
                None => format!("{}: {}", a.name, a.ty),
            })
            .collect();
        let _ = write!(out, "({})", arguments.join(", "));
    }
    let _ = write!(out, ": {}", decl.ty);

    if root {
        let _ = write!(out, " {}", field.effective_annotation().annotation);
    } else if let Some(annotation) = field.explicit_annotation() {
        let _ = write!(out, " {annotation}");
    }
    for directive in &decl.directives {
        let _ = write!(out, " {directive}");
    }
    out.push('\n');
}

fn print_description(out: &mut String, description: &str, indent: &str) {
    let _ = writeln!(out, "{indent}\"\"\"");
    for line in description.lines() {
        let _ = writeln!(out, "{indent}{line}");
    }
    let _ = writeln!(out, "{indent}\"\"\"");
}

#[cfg(test)]
mod tests {
    use crate::fragment::SchemaFragment;
    use crate::merger::{MergedDefinition, SchemaMerger};

    #[test]
    fn test_print_canonical_order() {
        let merged = SchemaMerger::merge(&[
            SchemaFragment::parse(
                "car",
                r#"
                type Car { id: ID!, make: String }
                enum Color { RED }
                type Query { cars(limit: Int = 10): [Car!]! @skipAuth }
                "#,
            )
            .unwrap(),
            SchemaFragment::parse(
                "owner",
                "type Mutation { addOwner(name: String!): Int @requireAuth(roles: \"admin\") }",
            )
            .unwrap(),
        ])
        .unwrap();

        let expected = "\
type Query {
  cars(limit: Int = 10): [Car!]! @skipAuth
}

type Mutation {
  addOwner(name: String!): Int @requireAuth(roles: [\"admin\"])
}

type Car {
  id: ID!
  make: String
}

enum Color {
  RED
}
";
        assert_eq!(merged.to_sdl(), expected);
    }

    #[test]
    fn test_print_default_annotation_explicitly() {
        let merged = SchemaMerger::merge(&[SchemaFragment::parse(
            "car",
            "type Query { cars: [String] }",
        )
        .unwrap()])
        .unwrap();
        assert!(merged.to_sdl().contains("cars: [String] @requireAuth"));
    }

    fn annotations(merged: &MergedDefinition) -> Vec<(String, String, Option<String>)> {
        let mut out: Vec<_> = merged
            .types()
            .flat_map(|ty| {
                ty.fields.values().map(|field| {
                    (
                        ty.name.clone(),
                        field.decl.name.clone(),
                        field.explicit_annotation().map(ToString::to_string),
                    )
                })
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_printed_sdl_keeps_block_annotations_and_directive_arguments() {
        let merged = SchemaMerger::merge(&[
            SchemaFragment::parse(
                "car",
                r#"
                type Car @requireAuth(roles: "admin") {
                  vin: String
                  make: String @skipAuth
                  model: String @deprecated(reason: "use make")
                }
                type Query { cars: [Car!]! @skipAuth }
                "#,
            )
            .unwrap(),
            SchemaFragment::parse("garage", "extend type Car { bay: Int }").unwrap(),
        ])
        .unwrap();

        let sdl = merged.to_sdl();
        assert!(sdl.contains(r#"  vin: String @requireAuth(roles: ["admin"])"#));
        assert!(sdl.contains("  make: String @skipAuth\n"));
        assert!(sdl.contains(
            r#"  model: String @requireAuth(roles: ["admin"]) @deprecated(reason: "use make")"#
        ));
        assert!(sdl.contains("  bay: Int\n"));

        let reparsed =
            SchemaMerger::merge(&[SchemaFragment::parse("printed", sdl.as_str()).unwrap()])
                .unwrap();
        assert_eq!(annotations(&reparsed), annotations(&merged));
        assert_eq!(reparsed.to_sdl(), sdl);
    }
}

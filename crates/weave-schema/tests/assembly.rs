//! End-to-end tests for discovery, naming validation and merge on disk.

use std::fs;
use std::path::Path;

use weave_schema::{
    AccessAnnotation, AssemblyConfig, BuildError, OperationKind, assemble_from_config,
};

const PRISMA: &str = r#"
model Car {
  id   Int    @id @default(autoincrement())
  make String
}

model Owner {
  id   Int    @id
  name String
}
"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn config_for(root: &Path) -> AssemblyConfig {
    let mut config = AssemblyConfig::with_root(root.join("graphql"));
    config.persistence_schema = Some(root.join("db/schema.prisma"));
    config
}

#[test]
fn test_assembles_fragment_tree() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "db/schema.prisma", PRISMA);
    write(
        dir.path(),
        "graphql/cars.sdl",
        "type Car { id: ID!, make: String }\ntype Query { cars: [Car!]! }",
    );
    write(
        dir.path(),
        "graphql/owners.sdl.graphql",
        "type Owner { id: ID!, name: String, label: String @computed }\n\
         type Query { owners: [Owner!]! @requireAuth(roles: \"admin\") }",
    );

    let assembly = assemble_from_config(&config_for(dir.path())).unwrap();
    assert_eq!(assembly.fragments.len(), 2);

    let cars = assembly
        .definition
        .effective_annotation(OperationKind::Query, "cars")
        .unwrap();
    assert_eq!(cars.annotation, AccessAnnotation::require_auth());

    let owners = assembly
        .definition
        .effective_annotation(OperationKind::Query, "owners")
        .unwrap();
    assert_eq!(owners.annotation.roles(), &["admin".to_string()]);
}

#[test]
fn test_naming_mismatch_lists_field() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "db/schema.prisma", PRISMA);
    write(
        dir.path(),
        "graphql/car.sdl",
        "type Car { id: ID, make: String, mileage: Int }",
    );

    let err = assemble_from_config(&config_for(dir.path())).unwrap_err();
    match err {
        BuildError::NamingMismatch { mismatches } => {
            let listed: Vec<String> = mismatches.iter().map(ToString::to_string).collect();
            assert_eq!(listed, ["car.mileage"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_conflict_attributes_both_fragments_in_discovery_order() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "db/schema.prisma", PRISMA);
    write(dir.path(), "graphql/a/cars.sdl", "type Car { id: ID, make: String }");
    write(dir.path(), "graphql/b/garages.sdl", "extend type Car { make: Int }");

    let err = assemble_from_config(&config_for(dir.path())).unwrap_err();
    let BuildError::SchemaConflict { first, second, .. } = err else {
        panic!("expected schema conflict");
    };
    assert_eq!(first, "cars");
    assert_eq!(second, "garages");
}

#[test]
fn test_repeated_builds_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "db/schema.prisma", PRISMA);
    write(
        dir.path(),
        "graphql/cars.sdl",
        "type Car { id: ID!, make: String }\ntype Query { cars: [Car!]! @skipAuth }",
    );
    write(
        dir.path(),
        "graphql/owners.sdl",
        "type Owner { id: ID!, name: String }\ntype Mutation { addOwner(name: String!): Owner }",
    );

    let config = config_for(dir.path());
    let first = assemble_from_config(&config).unwrap().definition.to_sdl();
    let second = assemble_from_config(&config).unwrap().definition.to_sdl();
    assert_eq!(first, second);
    assert!(first.starts_with("type Query {"));
}

#[test]
fn test_without_persistence_schema_naming_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "graphql/car.sdl", "type Car { anything: Int }");

    let config = AssemblyConfig::with_root(dir.path().join("graphql"));
    assert!(assemble_from_config(&config).is_ok());
}

#[test]
fn test_extension_discovered_before_base_declaration() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "graphql/a/garage.sdl", "extend type Car { id: ID!, bay: Int }");
    write(
        dir.path(),
        "graphql/cars.sdl",
        "type Car { id: ID!, make: String }\ntype Query { cars: [Car!]! }",
    );

    let assembly = assemble_from_config(&AssemblyConfig::with_root(dir.path().join("graphql")))
        .unwrap();
    let domains: Vec<&str> = assembly.fragments.iter().map(|f| f.domain()).collect();
    assert_eq!(domains, ["garage", "cars"]);

    let car = assembly.definition.get_type("Car").unwrap();
    assert_eq!(car.declared_by, "cars");
    assert_eq!(car.fields["id"].domain, "cars");
    assert_eq!(car.fields["bay"].domain, "garage");
}

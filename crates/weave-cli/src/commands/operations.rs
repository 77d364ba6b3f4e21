use anyhow::Result;
use serde::Serialize;
use weave_schema::{
    AnnotationSource, AssemblyConfig, MergedDefinition, OperationKind, assemble_from_config,
};

use crate::cli::OutputFormat;
use crate::output::table;

#[derive(Debug, Serialize)]
struct OperationRow {
    kind: OperationKind,
    name: String,
    domain: String,
    annotation: String,
    source: AnnotationSource,
}

pub fn operations(config: &AssemblyConfig, format: OutputFormat) -> Result<()> {
    let assembly = assemble_from_config(config)?;
    let rows = rows(&assembly.definition);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table if rows.is_empty() => println!("No operations declared."),
        OutputFormat::Table => {
            let records = rows
                .into_iter()
                .map(|r| {
                    [
                        r.kind.to_string(),
                        r.name,
                        r.domain,
                        r.annotation,
                        r.source.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                table(["Kind", "Operation", "Domain", "Annotation", "Source"], records)
            );
        }
    }
    Ok(())
}

fn rows(definition: &MergedDefinition) -> Vec<OperationRow> {
    definition
        .operations()
        .into_iter()
        .map(|op| {
            let effective = op.field.effective_annotation();
            OperationRow {
                kind: op.kind,
                name: op.name().to_string(),
                domain: op.domain().to_string(),
                annotation: effective.annotation.to_string(),
                source: effective.source,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_schema::{SchemaFragment, SchemaMerger};

    #[test]
    fn test_rows_show_effective_annotation() {
        let fragments = [
            SchemaFragment::parse("cars", "type Query { cars: [Int] @skipAuth }").unwrap(),
            SchemaFragment::parse(
                "owners",
                r#"type Query @requireAuth(roles: "admin") { owners: [Int] }
                   type Mutation { addOwner: Int }"#,
            )
            .unwrap(),
        ];
        let definition = SchemaMerger::merge(&fragments).unwrap();
        let rows = rows(&definition);

        let summary: Vec<(String, &str, String)> = rows
            .iter()
            .map(|r| (r.name.clone(), r.domain.as_str(), r.annotation.clone()))
            .collect();
        assert_eq!(
            summary,
            [
                ("cars".to_string(), "cars", "@skipAuth".to_string()),
                ("owners".to_string(), "owners", "@requireAuth(roles: [\"admin\"])".to_string()),
                ("addOwner".to_string(), "owners", "@requireAuth".to_string()),
            ]
        );
        assert_eq!(rows[1].source, AnnotationSource::Type);
        assert_eq!(rows[2].source, AnnotationSource::Default);
    }
}

use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;
use weave_graphql::GraphQLError;
use weave_schema::BuildError;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Prints a build error with one line per listed item.
pub fn print_build_error(err: &BuildError) {
    print_error(&format!("[{}] {err}", err.error_code()));
    match err {
        BuildError::NamingMismatch { mismatches } => {
            for m in mismatches {
                eprintln!(
                    "    {} {} (model {})",
                    "-".dimmed(),
                    m.to_string().bold(),
                    m.model
                );
            }
        }
        BuildError::UnboundOperation { operations } => {
            for op in operations {
                eprintln!(
                    "    {} {}.{} (domain {})",
                    "-".dimmed(),
                    op.kind,
                    op.name.bold(),
                    op.domain
                );
            }
        }
        BuildError::Discovery { .. } | BuildError::SchemaConflict { .. } => {}
    }
}

pub fn print_graphql_error(err: &GraphQLError) {
    match err {
        GraphQLError::Build(build) => print_build_error(build),
        other => print_error(&format!("[{}] {other}", other.error_code())),
    }
}

/// Renders rows under `header` as a rounded table.
pub fn table<const N: usize>(header: [&str; N], rows: Vec<[String; N]>) -> String {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    builder.build().with(Style::rounded()).to_string()
}

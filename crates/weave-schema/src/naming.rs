//! Naming conventions.
//!
//! A domain name (`car`, `cars`, `user_profile`) deterministically maps to
//! its schema fragment file, its resolver fragment id and its persistence
//! model name. The mapping is a pure function so it can be tested without a
//! filesystem.

use tracing::debug;

use crate::error::{BuildError, FieldMismatch};
use crate::fragment::{SchemaFragment, TypeKind};
use crate::model::PersistenceSchema;

/// File suffixes recognised as schema fragments, longest first.
pub const SDL_SUFFIXES: [&str; 2] = [".sdl.graphql", ".sdl"];

/// Identifiers expected for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentNames {
    pub domain: String,
    /// `<domain>.sdl`
    pub schema_file: String,
    /// `<domain>`
    pub resolver_id: String,
    /// PascalCase singular of the domain, e.g. `Car`.
    pub model_name: String,
}

impl FragmentNames {
    #[must_use]
    pub fn for_domain(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            schema_file: format!("{domain}.sdl"),
            resolver_id: domain.to_string(),
            model_name: model_name_for(domain),
        }
    }
}

/// Extracts the domain from a fragment file name (`cars.sdl` -> `cars`).
#[must_use]
pub fn domain_from_file_name(file_name: &str) -> Option<&str> {
    SDL_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .filter(|domain| !domain.is_empty())
}

/// PascalCase singular model name for a domain.
#[must_use]
pub fn model_name_for(domain: &str) -> String {
    pascal_case(&singularize(domain))
}

/// Naive English singular: `categories` -> `category`, `boxes` -> `box`,
/// `cars` -> `car`. Words ending in `ss`, `us` or `is` are left alone.
#[must_use]
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies")
        && !stem.is_empty()
    {
        return format!("{stem}y");
    }
    for suffix in ["sses", "xes", "ches", "shes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    word.strip_suffix('s')
        .filter(|stem| !stem.is_empty())
        .unwrap_or(word)
        .to_string()
}

/// Naive English plural, the inverse of [`singularize`].
#[must_use]
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.ends_with('y')
        && !matches!(lower.chars().rev().nth(1), Some('a' | 'e' | 'i' | 'o' | 'u'))
    {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// `user_profile` / `user-profile` / `userProfile` -> `UserProfile`.
#[must_use]
pub fn pascal_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `UserProfile` -> `userProfile`.
#[must_use]
pub fn camel_case(name: &str) -> String {
    let pascal = pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Checks every fragment's primary type against its persistence model.
///
/// The primary type of domain `d` is the object type named like the model
/// for `d` (case-insensitive). Fields carrying `computed_marker` are
/// derived and exempt. Domains without a persistence model are skipped.
/// All mismatches are collected before failing.
///
/// # Errors
///
/// Returns [`BuildError::NamingMismatch`] listing every unmatched field.
pub fn validate_naming(
    fragments: &[SchemaFragment],
    persistence: &PersistenceSchema,
    computed_marker: &str,
) -> Result<(), BuildError> {
    let mut mismatches = Vec::new();

    for fragment in fragments {
        let names = FragmentNames::for_domain(fragment.domain());
        let model = persistence
            .model(&names.model_name)
            .or_else(|| persistence.model(&pascal_case(fragment.domain())));
        let Some(model) = model else {
            debug!(
                domain = fragment.domain(),
                model = %names.model_name,
                "No persistence model for domain, skipping naming validation"
            );
            continue;
        };

        let primary = fragment.types().iter().filter(|t| {
            t.kind == TypeKind::Object && t.name.eq_ignore_ascii_case(&model.name)
        });
        for ty in primary {
            for field in &ty.fields {
                if field.has_directive(computed_marker) || model.field(&field.name).is_some() {
                    continue;
                }
                mismatches.push(FieldMismatch {
                    domain: fragment.domain().to_string(),
                    type_name: ty.name.clone(),
                    field: field.name.clone(),
                    model: model.name.clone(),
                });
            }
        }
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(BuildError::NamingMismatch { mismatches })
    }
}

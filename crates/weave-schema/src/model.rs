//! Persistence model schema.
//!
//! The persistence layer is consumed read-only: a mapping from model name to
//! its fields. It can be read from a Prisma-style `schema.prisma`, or from a
//! TOML/JSON document with the same shape as [`PersistenceSchema`].

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BuildError;

static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(model|enum|type|view|datasource|generator)\s+(\w+)\s*\{\s*$")
        .expect("block pattern is valid")
});

/// One field of a persistence model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelField {
    pub name: String,
    /// Scalar, enum or model type name, without `?` / `[]` modifiers.
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub id: bool,
}

impl ModelField {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            optional: false,
            list: false,
            id: false,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    #[must_use]
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }
}

/// A named persistence model and its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceModel {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<ModelField>,
}

impl PersistenceModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: ModelField) -> Self {
        self.fields.push(field);
        self
    }

    /// Case-insensitive field lookup.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// The field marked as primary key, if any.
    #[must_use]
    pub fn id_field(&self) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.id)
    }
}

/// Read-only view of every persistence model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceSchema {
    #[serde(default)]
    models: IndexMap<String, PersistenceModel>,
    /// Enum name to its values, in declaration order.
    #[serde(default)]
    enums: IndexMap<String, Vec<String>>,
}

impl PersistenceSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_model(mut self, model: PersistenceModel) -> Self {
        self.models.insert(model.name.clone(), model);
        self
    }

    #[must_use]
    pub fn with_enum<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enums
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Case-insensitive model lookup.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&PersistenceModel> {
        self.models
            .get(name)
            .or_else(|| self.models.values().find(|m| m.name.eq_ignore_ascii_case(name)))
    }

    pub fn models(&self) -> impl Iterator<Item = &PersistenceModel> {
        self.models.values()
    }

    #[must_use]
    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    #[must_use]
    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Loads a persistence schema, choosing the format by file extension
    /// (`.prisma`, `.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Discovery`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BuildError::discovery_at(path, format!("cannot read persistence schema: {e}"))
        })?;

        let schema = match path.extension().and_then(|e| e.to_str()) {
            Some("prisma") => Self::parse_prisma(&text),
            Some("toml") => toml::from_str(&text)
                .map_err(|e| BuildError::discovery(format!("invalid persistence schema: {e}"))),
            Some("json") => serde_json::from_str(&text)
                .map_err(|e| BuildError::discovery(format!("invalid persistence schema: {e}"))),
            other => Err(BuildError::discovery(format!(
                "unsupported persistence schema format: {}",
                other.unwrap_or("<none>")
            ))),
        }
        .map_err(|e| e.with_path(path))?;

        debug!(
            path = %path.display(),
            models = schema.models.len(),
            "Persistence schema loaded"
        );
        Ok(schema)
    }

    /// Parses the `model` and `enum` blocks of a Prisma schema.
    ///
    /// Datasource, generator and composite type blocks are skipped, as are
    /// comments and block attributes (`@@id`, `@@map`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Discovery`] for unterminated or malformed blocks.
    pub fn parse_prisma(text: &str) -> Result<Self, BuildError> {
        let mut schema = Self::new();
        let mut current: Option<(String, String)> = None;
        let mut model = PersistenceModel::new("");
        let mut values: Vec<String> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            let Some((keyword, name)) = current.clone() else {
                let captures = BLOCK_START.captures(line).ok_or_else(|| {
                    BuildError::discovery(format!(
                        "line {line_no}: expected a block, found `{line}`"
                    ))
                })?;
                let keyword = captures[1].to_string();
                let name = captures[2].to_string();
                if keyword == "model" {
                    model = PersistenceModel::new(name.clone());
                }
                values.clear();
                current = Some((keyword, name));
                continue;
            };

            if line == "}" {
                match keyword.as_str() {
                    "model" => {
                        let finished = std::mem::replace(&mut model, PersistenceModel::new(""));
                        schema.models.insert(finished.name.clone(), finished);
                    }
                    "enum" => {
                        schema.enums.insert(name, std::mem::take(&mut values));
                    }
                    _ => {}
                }
                current = None;
                continue;
            }

            if line.starts_with("@@") {
                continue;
            }
            match keyword.as_str() {
                "model" => {
                    model.fields.push(parse_model_field(line).ok_or_else(|| {
                        BuildError::discovery(format!(
                            "line {line_no}: malformed field in model {name}: `{line}`"
                        ))
                    })?);
                }
                "enum" => {
                    if let Some(value) = line.split_whitespace().next() {
                        values.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        if let Some((keyword, name)) = current {
            return Err(BuildError::discovery(format!("unterminated {keyword} block {name}")));
        }

        Ok(schema)
    }
}

/// Cuts a trailing `//` comment. `//` inside a string literal is kept.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '/' if !in_string && line[index + 1..].starts_with('/') => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_model_field(line: &str) -> Option<ModelField> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next()?;
    let raw_type = tokens.next()?;
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let (ty, list) = match raw_type.strip_suffix("[]") {
        Some(inner) => (inner, true),
        None => (raw_type, false),
    };
    let (ty, optional) = match ty.strip_suffix('?') {
        Some(inner) => (inner, true),
        None => (ty, false),
    };

    Some(ModelField {
        name: name.to_string(),
        ty: ty.to_string(),
        optional,
        list,
        id: tokens.any(|t| t == "@id" || t.starts_with("@id(")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRISMA: &str = r#"
        datasource db {
          provider = "sqlite"
          url      = env("DATABASE_URL")
        }

        // Fleet cars
        model Car {
          id      Int      @id @default(autoincrement())
          make    String
          color   Color?
          owner   User?    @relation(fields: [ownerId], references: [id])
          ownerId Int?
          tags    String[]
          @@map("cars")
        }

        enum Color {
          RED
          GREEN @map("green") // lowercase in storage
          @@map("colors")
        }

        model User {
          id   Int  @id
          cars Car[]
        }
    "#;

    #[test]
    fn test_parse_prisma_models() {
        let schema = PersistenceSchema::parse_prisma(PRISMA).unwrap();
        let car = schema.model("Car").unwrap();
        assert_eq!(car.fields.len(), 6);
        assert!(car.field("id").unwrap().id);
        assert!(car.field("color").unwrap().optional);
        assert!(car.field("tags").unwrap().list);
        assert_eq!(car.field("owner").unwrap().ty, "User");
        assert!(schema.is_enum("Color"));
        assert_eq!(
            schema.enum_values("Color").unwrap(),
            ["RED".to_string(), "GREEN".to_string()]
        );
        assert!(schema.is_model("User"));
    }

    #[test]
    fn test_comment_marker_inside_string_is_kept() {
        let schema = PersistenceSchema::parse_prisma(
            r#"
            model Site {
              url  String @default("http://example.org") @id // primary
              name String // display name
            }
            "#,
        )
        .unwrap();
        let site = schema.model("Site").unwrap();
        assert!(site.field("url").unwrap().id);
        assert_eq!(site.fields.len(), 2);
        assert_eq!(strip_comment(r#"a "x\"//y" // z"#), r#"a "x\"//y" "#);
    }

    #[test]
    fn test_model_lookup_is_case_insensitive() {
        let schema = PersistenceSchema::parse_prisma(PRISMA).unwrap();
        assert!(schema.model("car").is_some());
        assert!(schema.model("CAR").unwrap().field("MAKE").is_some());
        assert!(schema.model("Truck").is_none());
    }

    #[test]
    fn test_unterminated_block() {
        let err = PersistenceSchema::parse_prisma("model Car {\n id Int @id\n").unwrap_err();
        assert!(err.to_string().contains("unterminated model block Car"));
    }

    #[test]
    fn test_malformed_field() {
        let err = PersistenceSchema::parse_prisma("model Car {\n id\n}\n").unwrap_err();
        assert!(matches!(err, BuildError::Discovery { .. }));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let text = r#"
            [models.Car]
            name = "Car"
            fields = [
              { name = "id", type = "Int", id = true },
              { name = "make", type = "String" },
            ]

            [enums]
            Color = ["RED", "GREEN"]
        "#;
        let schema: PersistenceSchema = toml::from_str(text).unwrap();
        assert_eq!(schema.model("car").unwrap().id_field().unwrap().name, "id");
        assert_eq!(schema.enum_values("Color").unwrap().len(), 2);
    }
}

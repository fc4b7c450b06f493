//! Schema Builder
//!
//! Collects SDL fragments by category and renders them in a fixed order, so
//! the output does not depend on the order fragments were added in. The
//! builder is a plain value: every `add_*` call consumes it and returns the
//! extended builder, and `build` only reads.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use super::utils::{clean_type_def, extract_type_names};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdlCategory {
    Directive,
    Scalar,
    Enum,
    Interface,
    Union,
    Input,
    Type,
    Schema,
}

impl SdlCategory {
    /// Render order. Declarations come before anything that references them.
    pub const RENDER_ORDER: [SdlCategory; 8] = [
        SdlCategory::Directive,
        SdlCategory::Scalar,
        SdlCategory::Enum,
        SdlCategory::Interface,
        SdlCategory::Union,
        SdlCategory::Input,
        SdlCategory::Type,
        SdlCategory::Schema,
    ];

    /// Guess the category of a raw fragment.
    ///
    /// Rules are tried in this order and the first match wins:
    /// `scalar`, `enum`, `interface`, `input`, `union`, `directive`,
    /// `schema {`, falling back to `type`. Keywords only count at the start
    /// of a line, so a field named `enumValue` or a comment mentioning an
    /// enum does not reclassify an object type. A fragment declaring several
    /// kinds lands in the first matching category.
    pub fn detect(type_def: &str) -> SdlCategory {
        DETECTION_RULES
            .iter()
            .find(|(pattern, _)| pattern.is_match(type_def))
            .map(|(_, category)| *category)
            .unwrap_or(SdlCategory::Type)
    }
}

impl fmt::Display for SdlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SdlCategory::Directive => "directive",
            SdlCategory::Scalar => "scalar",
            SdlCategory::Enum => "enum",
            SdlCategory::Interface => "interface",
            SdlCategory::Union => "union",
            SdlCategory::Input => "input",
            SdlCategory::Type => "type",
            SdlCategory::Schema => "schema",
        };
        write!(f, "{}", name)
    }
}

lazy_static! {
    static ref DETECTION_RULES: Vec<(Regex, SdlCategory)> = vec![
        (Regex::new(r"(?m)^\s*(?:extend\s+)?scalar\s").unwrap(), SdlCategory::Scalar),
        (Regex::new(r"(?m)^\s*(?:extend\s+)?enum\s").unwrap(), SdlCategory::Enum),
        (Regex::new(r"(?m)^\s*(?:extend\s+)?interface\s").unwrap(), SdlCategory::Interface),
        (Regex::new(r"(?m)^\s*(?:extend\s+)?input\s").unwrap(), SdlCategory::Input),
        (Regex::new(r"(?m)^\s*(?:extend\s+)?union\s").unwrap(), SdlCategory::Union),
        (Regex::new(r"(?m)^\s*directive\s").unwrap(), SdlCategory::Directive),
        (Regex::new(r"(?m)^\s*(?:extend\s+)?schema\s*\{").unwrap(), SdlCategory::Schema),
    ];
}

/// One cleaned SDL fragment and its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFragment {
    pub category: SdlCategory,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaBuilder {
    fragments: Vec<SchemaFragment>,
    schema: Option<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scalar(self, type_def: &str) -> Self {
        self.add(SdlCategory::Scalar, type_def)
    }

    pub fn add_enum(self, type_def: &str) -> Self {
        self.add(SdlCategory::Enum, type_def)
    }

    pub fn add_interface(self, type_def: &str) -> Self {
        self.add(SdlCategory::Interface, type_def)
    }

    pub fn add_type(self, type_def: &str) -> Self {
        self.add(SdlCategory::Type, type_def)
    }

    pub fn add_input(self, type_def: &str) -> Self {
        self.add(SdlCategory::Input, type_def)
    }

    pub fn add_union(self, type_def: &str) -> Self {
        self.add(SdlCategory::Union, type_def)
    }

    pub fn add_directive(self, type_def: &str) -> Self {
        self.add(SdlCategory::Directive, type_def)
    }

    /// Set the schema root. A later call replaces an earlier one.
    pub fn set_schema(mut self, type_def: &str) -> Self {
        let cleaned = clean_type_def(type_def);
        if self.schema.is_some() {
            debug!("Replacing schema root definition");
        }
        self.schema = if cleaned.is_empty() { None } else { Some(cleaned) };
        self
    }

    /// Append a fragment under an explicit category
    pub fn add(mut self, category: SdlCategory, type_def: &str) -> Self {
        if category == SdlCategory::Schema {
            return self.set_schema(type_def);
        }

        let text = clean_type_def(type_def);
        if !text.is_empty() {
            self.fragments.push(SchemaFragment { category, text });
        }
        self
    }

    /// Add several fragments, detecting each one's category.
    ///
    /// A fragment whose declared type names were all added before is skipped.
    pub fn add_multiple<I, S>(self, type_defs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut declared = self.declared_type_names();
        let mut builder = self;

        for type_def in type_defs {
            let text = clean_type_def(type_def.as_ref());
            if text.is_empty() {
                continue;
            }

            let names = extract_type_names(&text);
            if !names.is_empty() && names.iter().all(|n| declared.contains(n)) {
                debug!("Skipping duplicate SDL fragment declaring {:?}", names);
                continue;
            }
            declared.extend(names);

            let category = SdlCategory::detect(&text);
            builder = builder.add(category, &text);
        }

        builder
    }

    /// Render all fragments in `RENDER_ORDER`, separated by a blank line.
    ///
    /// Within a category fragments are ordered by their text, so the output
    /// only depends on which fragments were added.
    pub fn build(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();

        for category in SdlCategory::RENDER_ORDER {
            if category == SdlCategory::Schema {
                parts.extend(self.schema.as_deref());
                continue;
            }

            let mut texts: Vec<&str> = self.fragments(category).collect();
            texts.sort_unstable();
            texts.dedup();
            parts.extend(texts);
        }

        parts.join("\n\n")
    }

    pub fn reset(self) -> Self {
        Self::default()
    }

    pub fn fragments(&self, category: SdlCategory) -> impl Iterator<Item = &str> + '_ {
        self.fragments
            .iter()
            .filter(move |f| f.category == category)
            .map(|f| f.text.as_str())
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn declared_type_names(&self) -> HashSet<String> {
        self.fragments
            .iter()
            .flat_map(|f| extract_type_names(&f.text))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty() && self.schema.is_none()
    }
}

//! Annotation tag scanning.
//!
//! Material and node data are declared inline in shader text with tag lines:
//!
//! ```glsl
//! $MATERIAL_VARIABLE vec3 albedo;
//! $MATERIAL_VARIABLE float opacity[4];
//! $NODE_VARIABLE     mat4 model_matrix;
//! $MATERIAL_TEXTURE  diffuse
//! $NODE_TEXTURE      shadow_map
//! ```
//!
//! A tag must start a line (after leading whitespace) and be followed by
//! whitespace or the end of the line. [`extract`] removes the tag lines for
//! one tag and parses them; every other line is kept verbatim, so removed
//! lines shift the line numbers reported by the shader compiler.

use std::fmt;

use shadertag_core::descriptor::BlockScope;
use shadertag_core::error::MaterialResult;
use shadertag_core::profiling::profile_scope;
use shadertag_core::variable::{ShaderVariable, TextureSlot};

use crate::parser::{parse_texture, parse_variable};

/// An annotation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `$MATERIAL_VARIABLE <type> <name>;`
    MaterialVariable,
    /// `$NODE_VARIABLE <type> <name>;`
    NodeVariable,
    /// `$MATERIAL_TEXTURE <name>`
    MaterialTexture,
    /// `$NODE_TEXTURE <name>`
    NodeTexture,
}

impl Tag {
    /// The order in which one preprocessing call extracts the tags.
    ///
    /// Duplicate names are reported against this order.
    pub const PROCESSING_ORDER: [Self; 4] = [
        Self::MaterialVariable,
        Self::NodeVariable,
        Self::MaterialTexture,
        Self::NodeTexture,
    ];

    /// The literal tag text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MaterialVariable => "$MATERIAL_VARIABLE",
            Self::NodeVariable => "$NODE_VARIABLE",
            Self::MaterialTexture => "$MATERIAL_TEXTURE",
            Self::NodeTexture => "$NODE_TEXTURE",
        }
    }

    /// Owner of the declared data.
    pub fn scope(self) -> BlockScope {
        match self {
            Self::MaterialVariable | Self::MaterialTexture => BlockScope::Material,
            Self::NodeVariable | Self::NodeTexture => BlockScope::Node,
        }
    }

    /// Whether lines with this tag declare textures.
    pub fn is_texture(self) -> bool {
        matches!(self, Self::MaterialTexture | Self::NodeTexture)
    }

    /// Returns the declaration text after the tag if `trimmed_line` is a line
    /// of this tag.
    fn match_line(self, trimmed_line: &str) -> Option<&str> {
        let rest = trimmed_line.strip_prefix(self.as_str())?;
        match rest.chars().next() {
            None => Some(rest),
            Some(c) if c.is_whitespace() => Some(rest.trim_start()),
            Some(_) => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed tag line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// A uniform-block field.
    Variable(ShaderVariable),
    /// A texture slot.
    Texture(TextureSlot),
}

/// Output of one [`extract`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
    /// The input with the tag lines removed.
    pub remaining_source: String,
}

impl Extraction {
    /// The variable declarations, in source order.
    pub fn into_variables(self) -> Vec<ShaderVariable> {
        self.declarations
            .into_iter()
            .filter_map(|d| match d {
                Declaration::Variable(v) => Some(v),
                Declaration::Texture(_) => None,
            })
            .collect()
    }

    /// The texture declarations, in source order.
    pub fn into_textures(self) -> Vec<TextureSlot> {
        self.declarations
            .into_iter()
            .filter_map(|d| match d {
                Declaration::Texture(t) => Some(t),
                Declaration::Variable(_) => None,
            })
            .collect()
    }
}

/// Removes every `tag` line from `source` and parses it.
///
/// Fails on the first declaration that does not parse; nothing is returned
/// in that case.
pub fn extract(source: &str, tag: Tag) -> MaterialResult<Extraction> {
    profile_scope!("extract_annotations");

    let mut extraction = Extraction {
        declarations: Vec::new(),
        remaining_source: String::with_capacity(source.len()),
    };

    for line in source.split_inclusive('\n') {
        let trimmed = line.trim();
        let Some(declaration) = tag.match_line(trimmed) else {
            extraction.remaining_source.push_str(line);
            continue;
        };

        let parsed = if tag.is_texture() {
            Declaration::Texture(parse_texture(declaration)?)
        } else {
            Declaration::Variable(parse_variable(declaration)?)
        };
        log::trace!("{tag}: {parsed:?}");
        extraction.declarations.push(parsed);
    }

    Ok(extraction)
}

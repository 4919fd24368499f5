//! Declaration parsing for single annotation lines.
//!
//! Input is the text after the tag:
//!
//! - variables: `<type> <name>;` or `<type> <name>[<digits>];`
//! - textures: `<name>`, optionally followed by `;`

use shadertag_core::data_type::ShaderDataType;
use shadertag_core::error::{MaterialError, MaterialResult};
use shadertag_core::variable::{ShaderVariable, TextureSlot, is_valid_identifier};

/// Whitespace-separated tokens, ignoring a lone `;`.
fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split_whitespace().filter(|t| *t != ";")
}

/// Parses a variable declaration such as `float opacity[4];`.
///
/// The semantic binding is always unset; it is only assigned through
/// [`MaterialDefinition`](shadertag_core::definition::MaterialDefinition)
/// edits.
pub fn parse_variable(line: &str) -> MaterialResult<ShaderVariable> {
    let declaration = || line.trim().to_string();
    let mut tokens = tokens(line);

    let type_token = tokens.next().ok_or_else(|| MaterialError::MissingName {
        declaration: declaration(),
    })?;
    let data_type =
        ShaderDataType::from_glsl_name(type_token).ok_or_else(|| MaterialError::UnknownType {
            type_name: type_token.to_string(),
            declaration: declaration(),
        })?;

    let name_token = tokens.next().ok_or_else(|| MaterialError::MissingName {
        declaration: declaration(),
    })?;

    if let Some(extra) = tokens.next() {
        return Err(MaterialError::UnexpectedToken {
            token: extra.to_string(),
            declaration: declaration(),
        });
    }

    let (name, count) = match name_token.split_once('[') {
        Some((name, dimension)) => {
            let count = parse_array_dimension(dimension).ok_or_else(|| {
                MaterialError::MalformedArraySyntax {
                    declaration: declaration(),
                }
            })?;
            (name, count)
        }
        None => (name_token.strip_suffix(';').unwrap_or(name_token), 1),
    };

    if !is_valid_identifier(name) {
        return Err(MaterialError::InvalidName(name.to_string()));
    }

    Ok(ShaderVariable::new(name, data_type).with_count(count))
}

/// Parses `<digits>]` with an optional trailing `;`.
fn parse_array_dimension(text: &str) -> Option<u32> {
    let (digits, rest) = text.split_once(']')?;
    if !(rest.is_empty() || rest == ";") {
        return None;
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&count| count >= 1)
}

/// Parses a texture declaration such as `diffuse`.
///
/// Texture arrays come from the number of declarations, so any `[` or `]`
/// is rejected.
pub fn parse_texture(line: &str) -> MaterialResult<TextureSlot> {
    let declaration = line.trim();
    if declaration.contains(['[', ']']) {
        return Err(MaterialError::TextureArrayNotSupported {
            declaration: declaration.to_string(),
        });
    }

    let mut tokens = tokens(declaration);
    let (Some(token), None) = (tokens.next(), tokens.next()) else {
        return Err(MaterialError::TextureSyntax {
            declaration: declaration.to_string(),
        });
    };

    let name = token.strip_suffix(';').unwrap_or(token);
    if !is_valid_identifier(name) {
        return Err(MaterialError::InvalidName(name.to_string()));
    }
    Ok(TextureSlot::new(name))
}

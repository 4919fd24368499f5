//! Name uniqueness across material and node declarations.
//!
//! Material variables, node variables, material textures and node textures
//! share one namespace, because every name becomes a `#define` alias in the
//! generated shader. The names of the generated blocks and texture arrays
//! are off limits too: an alias named after a block label would rewrite
//! every other alias into that block.

use std::collections::HashSet;

use crate::descriptor::BlockScope;
use crate::error::{MaterialError, MaterialResult};
use crate::variable::{ShaderVariable, TextureSlot};

/// Check that every name yielded by `names` is unique.
///
/// Fails with [`MaterialError::DuplicateName`] on the first name seen twice.
pub fn validate_unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> MaterialResult {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(MaterialError::DuplicateName(name.to_string()));
        }
    }
    Ok(())
}

/// Check that names are unique across all four declaration lists.
///
/// Lists are visited in processing order: material variables, node
/// variables, material textures, node textures.
pub fn validate_unique(
    material_vars: &[ShaderVariable],
    node_vars: &[ShaderVariable],
    material_textures: &[TextureSlot],
    node_textures: &[TextureSlot],
) -> MaterialResult {
    let names = material_vars
        .iter()
        .chain(node_vars)
        .map(|v| v.name.as_str())
        .chain(
            material_textures
                .iter()
                .chain(node_textures)
                .map(|t| t.name.as_str()),
        );
    validate_unique_names(names)
}

/// Names declared by the generated code of one scope: the block instance,
/// the block type and the texture array.
pub fn generated_names(block_label: &str, texture_label: &str) -> [String; 3] {
    [
        block_label.to_string(),
        format!("{block_label}_block"),
        texture_label.to_string(),
    ]
}

/// Whether `name` is declared by generated code under the default labels.
pub fn is_default_generated_name(name: &str) -> bool {
    BlockScope::ALL.iter().any(|scope| {
        name == scope.block_label()
            || name == scope.texture_label()
            || name.strip_suffix("_block") == Some(scope.block_label())
    })
}

/// Check that no name yielded by `names` appears in `reserved`.
///
/// Fails with [`MaterialError::ReservedName`] on the first hit.
pub fn validate_not_reserved<'a>(
    names: impl IntoIterator<Item = &'a str>,
    reserved: &[String],
) -> MaterialResult {
    for name in names {
        if reserved.iter().any(|r| r == name) {
            return Err(MaterialError::ReservedName(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::ShaderDataType;

    #[test]
    fn test_unique_names_pass() {
        let material = vec![ShaderVariable::new("albedo", ShaderDataType::Vec3)];
        let node = vec![ShaderVariable::new("model", ShaderDataType::MAT4)];
        let textures = vec![TextureSlot::new("diffuse")];
        assert!(validate_unique(&material, &node, &textures, &[]).is_ok());
    }

    #[test]
    fn test_duplicate_across_variable_and_texture() {
        let material = vec![ShaderVariable::new("x", ShaderDataType::Float)];
        let node_textures = vec![TextureSlot::new("x")];
        assert_eq!(
            validate_unique(&material, &[], &[], &node_textures),
            Err(MaterialError::DuplicateName("x".to_string()))
        );
    }

    #[test]
    fn test_first_duplicate_reported() {
        let names = ["a", "b", "b", "a"];
        assert_eq!(
            validate_unique_names(names),
            Err(MaterialError::DuplicateName("b".to_string()))
        );
    }

    #[test]
    fn test_empty_lists() {
        assert!(validate_unique(&[], &[], &[], &[]).is_ok());
    }

    #[test]
    fn test_generated_names() {
        assert_eq!(
            generated_names("node", "node_textures"),
            ["node".to_string(), "node_block".to_string(), "node_textures".to_string()]
        );
        for name in ["material", "material_block", "material_textures", "node", "node_block"] {
            assert!(is_default_generated_name(name), "{name}");
        }
        assert!(!is_default_generated_name("node_id"));
        assert!(!is_default_generated_name("block"));
    }

    #[test]
    fn test_reserved_label_rejected() {
        let reserved = generated_names("instance", "instance_textures");
        assert!(validate_not_reserved(["id", "model"], &reserved).is_ok());
        assert_eq!(
            validate_not_reserved(["id", "instance_block"], &reserved),
            Err(MaterialError::ReservedName("instance_block".to_string()))
        );
    }
}

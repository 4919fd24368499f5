//! End-to-end tests for annotated shader preprocessing.
//!
//! Each test runs annotated GLSL through [`preprocess`] and checks the
//! generated source, the extracted declarations and the derived
//! [`MaterialDefinition`].

use rstest::rstest;

use shadertag_core::data_type::ShaderDataType;
use shadertag_core::definition::{MaterialDefinition, MaterialDomain};
use shadertag_core::descriptor::{BlockScope, DescriptorKind};
use shadertag_core::error::{MaterialError, MaterialErrorKind};
use shadertag_core::layout::BlockLayout;
use shadertag_core::variable::{SemanticBinding, ShaderVariable};
use shadertag_shader::annotation::{Tag, extract};
use shadertag_shader::codegen::{emit_texture_block, emit_uniform_block};
use shadertag_shader::preprocess::{PreprocessConfig, Preprocessor, ShaderStage, preprocess};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const LIT_SHADER: &str = "\
$MATERIAL_VARIABLE vec3 albedo;
$MATERIAL_VARIABLE float opacity[4];
$NODE_VARIABLE mat4 model_matrix;
$NODE_VARIABLE uint node_id;
$MATERIAL_TEXTURE diffuse
$MATERIAL_TEXTURE normal_map;

layout(location = 0) out vec4 out_color;

void main() {
    out_color = vec4(albedo, opacity[0]) * texture(diffuse, vec2(0.0));
}
";

// ============================================================================
// Full pipeline
// ============================================================================

#[test]
fn test_lit_shader_pipeline() {
    init_logging();

    let result = preprocess(LIT_SHADER, ShaderStage::Fragment).unwrap();

    assert_eq!(
        result.material_variables,
        vec![
            ShaderVariable::new("albedo", ShaderDataType::Vec3),
            ShaderVariable::new("opacity", ShaderDataType::Float).with_count(4),
        ]
    );
    assert_eq!(result.node_variables.len(), 2);
    assert_eq!(result.material_textures.len(), 2);
    assert!(result.node_textures.is_empty());

    assert_eq!(result.material_layout().offsets, vec![0, 16]);
    assert_eq!(result.material_layout().size, 80);
    assert_eq!(result.node_layout().offsets, vec![0, 64]);
    assert_eq!(result.node_layout().size, 80);

    let text = &result.compiled_source;
    assert!(text.starts_with("#version 450\n"));
    assert!(text.contains(
        "layout(std140, set = 1, binding = 0) uniform material_block {\n    vec3 albedo;\n    float opacity[4];\n} material;\n"
    ));
    assert!(text.contains("#define node_id node.node_id\n"));
    assert!(text.contains(
        "layout(set = 1, binding = 1) uniform sampler2D material_textures[2];\n\
         #define diffuse material_textures[0]\n\
         #define normal_map material_textures[1]\n"
    ));
    assert!(!text.contains("node_textures"));
    assert!(!text.contains("$MATERIAL"));
    assert!(!text.contains("$NODE"));
    assert!(text.ends_with(
        "layout(location = 0) out vec4 out_color;\n\nvoid main() {\n    out_color = vec4(albedo, opacity[0]) * texture(diffuse, vec2(0.0));\n}\n"
    ));
}

#[test]
fn test_material_block_size_from_definition() {
    let source = "$MATERIAL_VARIABLE vec3 albedo;\n$MATERIAL_VARIABLE float opacity[4];\n";
    let result = preprocess(source, ShaderStage::Fragment).unwrap();
    let def = result.to_material_definition(MaterialDomain::Opaque).unwrap();

    assert_eq!(def.offset_of(BlockScope::Material, "albedo"), Some(0));
    assert_eq!(def.offset_of(BlockScope::Material, "opacity"), Some(16));
    assert_eq!(def.material_uniform_block_size(), 80);
}

#[test]
fn test_untagged_source_keeps_body() {
    let body = "void main() {\n\tgl_Position = vec4(0.0);\n}\n";
    let result = preprocess(body, ShaderStage::Vertex).unwrap();
    assert!(result.compiled_source.ends_with(body));
    assert!(result.compiled_source.contains("layout(location = 3) in vec4 in_color;"));
    assert_eq!(result.material_layout(), &BlockLayout::default());
    assert!(
        result
            .compiled_source
            .contains("uniform material_block {\n} material;\n")
    );
    assert!(
        result
            .compiled_source
            .contains("uniform node_block {\n} node;\n")
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_duplicate_across_variable_and_texture() {
    init_logging();
    let source = "$MATERIAL_VARIABLE float x;\n$NODE_TEXTURE x\n";
    assert_eq!(
        preprocess(source, ShaderStage::Fragment),
        Err(MaterialError::DuplicateName("x".to_string()))
    );
}

#[rstest]
#[case::texture_array("$MATERIAL_TEXTURE diffuse[2]\n", MaterialErrorKind::TextureArrayNotSupported)]
#[case::texture_two_tokens("$NODE_TEXTURE sampler2D shadow\n", MaterialErrorKind::TextureSyntax)]
#[case::sampler_variable("$MATERIAL_VARIABLE sampler2D tex;\n", MaterialErrorKind::UnknownType)]
#[case::bad_dimension("$NODE_VARIABLE vec4 bones[N];\n", MaterialErrorKind::MalformedArraySyntax)]
#[case::duplicate_node_vars(
    "$NODE_VARIABLE uint id;\n$NODE_VARIABLE float id;\n",
    MaterialErrorKind::DuplicateName
)]
#[case::duplicate_material_and_node(
    "$NODE_VARIABLE uint id;\n$MATERIAL_VARIABLE uint id;\n",
    MaterialErrorKind::DuplicateName
)]
#[case::max_length_array("$MATERIAL_VARIABLE float x[4294967295];\n", MaterialErrorKind::BlockTooLarge)]
#[case::huge_matrix_array("$NODE_VARIABLE mat4 bones[100000000];\n", MaterialErrorKind::BlockTooLarge)]
#[case::block_label_name(
    "$NODE_VARIABLE uint node;\n$NODE_VARIABLE uint id;\n",
    MaterialErrorKind::ReservedName
)]
#[case::block_type_name("$MATERIAL_VARIABLE float material_block;\n", MaterialErrorKind::ReservedName)]
#[case::texture_label_name("$NODE_TEXTURE material_textures\n", MaterialErrorKind::ReservedName)]
#[case::keyword_name("$MATERIAL_VARIABLE float uniform;\n", MaterialErrorKind::InvalidName)]
#[case::type_as_texture("$MATERIAL_TEXTURE sampler2D\n", MaterialErrorKind::InvalidName)]
fn test_preprocess_errors(#[case] source: &str, #[case] kind: MaterialErrorKind) {
    init_logging();
    let err = preprocess(source, ShaderStage::Fragment).unwrap_err();
    assert_eq!(err.kind(), kind);
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_texture_array_error_message() {
    let err = preprocess("$MATERIAL_TEXTURE diffuse[2]\n", ShaderStage::Fragment).unwrap_err();
    assert_eq!(
        err,
        MaterialError::TextureArrayNotSupported {
            declaration: "diffuse[2]".to_string()
        }
    );
}

// ============================================================================
// Extraction and code generation properties
// ============================================================================

#[rstest]
#[case::empty("")]
#[case::no_trailing_newline("void main() {}")]
#[case::crlf("void main()\r\n{\r\n}\r\n")]
#[case::blank_lines("\n\n\t\n")]
fn test_extract_tag_free_source_is_identity(#[case] source: &str) {
    for tag in Tag::PROCESSING_ORDER {
        let extraction = extract(source, tag).unwrap();
        assert!(extraction.declarations.is_empty());
        assert_eq!(extraction.remaining_source, source);
    }
}

#[test]
fn test_empty_lists_emit_one_block_and_no_textures() {
    let block = emit_uniform_block(&[], "material", 1, 0);
    assert_eq!(block.matches("uniform material_block").count(), 1);
    assert_eq!(block.matches(';').count(), 1);
    assert_eq!(emit_texture_block(&[], "material_textures", 1, 1), "");
}

#[test]
fn test_swap_changes_only_swapped_range() {
    let vars = vec![
        ShaderVariable::new("a", ShaderDataType::Vec4),
        ShaderVariable::new("b", ShaderDataType::Float),
        ShaderVariable::new("c", ShaderDataType::Float),
        ShaderVariable::new("d", ShaderDataType::Float),
        ShaderVariable::new("e", ShaderDataType::Vec4),
    ];
    let mut swapped = vars.clone();
    swapped.swap(1, 3);

    let before = BlockLayout::compute(&vars);
    let after = BlockLayout::compute(&swapped);
    for name in ["a", "c", "e"] {
        assert_eq!(
            before.offset_of_name(&vars, name),
            after.offset_of_name(&swapped, name)
        );
    }
    assert_eq!(after.offset_of_name(&swapped, "b"), Some(24));
    assert_eq!(after.offset_of_name(&swapped, "d"), Some(16));
    assert_eq!(before.size, after.size);
}

#[test]
fn test_swap_of_differently_aligned_types() {
    let vars = vec![
        ShaderVariable::new("a", ShaderDataType::Vec4),
        ShaderVariable::new("b", ShaderDataType::Vec2),
        ShaderVariable::new("c", ShaderDataType::Float),
        ShaderVariable::new("d", ShaderDataType::Float),
        ShaderVariable::new("e", ShaderDataType::Vec4),
    ];
    let mut swapped = vars.clone();
    swapped.swap(1, 3);

    let before = BlockLayout::compute(&vars);
    let after = BlockLayout::compute(&swapped);
    assert_eq!(before.offsets, vec![0, 16, 24, 28, 32]);
    assert_eq!(after.offsets, vec![0, 16, 20, 24, 32]);

    // Only the swapped range [1, 3] moves; the vec4 fields on either side stay put.
    for name in ["a", "e"] {
        assert_eq!(
            before.offset_of_name(&vars, name),
            after.offset_of_name(&swapped, name)
        );
    }
    assert_eq!(after.offset_of_name(&swapped, "b"), Some(24));
    assert_eq!(after.offset_of_name(&swapped, "c"), Some(20));
    assert_eq!(after.offset_of_name(&swapped, "d"), Some(16));
    assert_eq!(before.size, after.size);

    // Padding in front of a vec2 can push the fields after the swapped range.
    let mut pushed = vec![
        ShaderVariable::new("a", ShaderDataType::Vec4),
        ShaderVariable::new("b", ShaderDataType::Float),
        ShaderVariable::new("c", ShaderDataType::Vec2),
        ShaderVariable::new("d", ShaderDataType::Float),
        ShaderVariable::new("e", ShaderDataType::Vec4),
    ];
    let before = BlockLayout::compute(&pushed);
    assert_eq!(before.offsets, vec![0, 16, 24, 32, 48]);
    assert_eq!(before.size, 64);
    pushed.swap(1, 2);
    let after = BlockLayout::compute(&pushed);
    assert_eq!(after.offsets, vec![0, 16, 24, 28, 32]);
    assert_eq!(after.size, 48);
}

// ============================================================================
// Material definition round trip
// ============================================================================

#[test]
fn test_semantic_binding_lookup_after_preprocess() {
    let source = "$NODE_VARIABLE mat4 model_matrix;\n";
    let result = preprocess(source, ShaderStage::Vertex).unwrap();
    let mut def = result.to_material_definition(MaterialDomain::Opaque).unwrap();

    def.set_semantic_binding(BlockScope::Node, 0, Some(SemanticBinding::NodeModelMatrix))
        .unwrap();
    assert_eq!(
        def.lookup_binding(BlockScope::Node, SemanticBinding::NodeModelMatrix),
        Some(0)
    );
    assert_eq!(
        def.lookup_binding(BlockScope::Node, SemanticBinding::NodeId),
        None
    );
}

#[test]
fn test_descriptor_geometry() {
    let result = preprocess(LIT_SHADER, ShaderStage::Fragment).unwrap();
    let (material, node) = result.descriptor_entries();

    assert_eq!(material.len(), 2);
    assert_eq!((material[0].set_index, material[0].binding_index), (1, 0));
    assert_eq!(material[0].kind, DescriptorKind::Uniform);
    assert_eq!((material[1].set_index, material[1].binding_index), (1, 1));
    assert_eq!(material[1].kind, DescriptorKind::Sampler);
    assert_eq!(material[1].count, 2);

    assert_eq!(node.len(), 1);
    assert_eq!((node[0].set_index, node[0].binding_index), (2, 0));
}

#[test]
fn test_definition_serde_through_toml() {
    let result = preprocess(LIT_SHADER, ShaderStage::Fragment).unwrap();
    let def = result
        .to_material_definition(MaterialDomain::Transparent)
        .unwrap();

    let text = toml::to_string(&def).unwrap();
    let restored: MaterialDefinition = toml::from_str(&text).unwrap();
    assert_eq!(restored, def);
    assert_eq!(restored.material_uniform_block_size(), 80);
}

#[test]
fn test_config_loaded_from_toml() {
    init_logging();
    let config = PreprocessConfig::from_toml_str(
        r#"
glsl_version = 460
emit_vertex_inputs = false
node_block_label = "instance"
"#,
    )
    .unwrap();
    let result = Preprocessor::new(config)
        .preprocess("$NODE_VARIABLE uint node_id;\n", ShaderStage::Vertex)
        .unwrap();

    assert!(result.compiled_source.starts_with("#version 460\n"));
    assert!(!result.compiled_source.contains("in_position"));
    assert!(
        result
            .compiled_source
            .contains("#define node_id instance.node_id\n")
    );
}

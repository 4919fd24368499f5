use criterion::{Criterion, black_box, criterion_group, criterion_main};

use shadertag_shader::annotation::{Tag, extract};
use shadertag_shader::codegen::{PreviewLanguage, emit_struct_preview};
use shadertag_shader::preprocess::{ShaderStage, preprocess};

const TYPES: [&str; 6] = ["float", "vec2", "vec3", "vec4", "mat4", "uint"];

fn annotated_source(variables: usize, body_lines: usize) -> String {
    let mut source = String::new();
    for i in 0..variables {
        let ty = TYPES[i % TYPES.len()];
        if i % 4 == 0 {
            source.push_str(&format!("$MATERIAL_VARIABLE {ty} m{i}[4];\n"));
        } else {
            source.push_str(&format!("$NODE_VARIABLE {ty} n{i};\n"));
        }
    }
    for i in 0..variables / 4 {
        source.push_str(&format!("$MATERIAL_TEXTURE tex{i}\n"));
    }
    source.push_str("void main() {\n");
    for i in 0..body_lines {
        source.push_str(&format!("    float t{i} = float({i}) * 0.5;\n"));
    }
    source.push_str("}\n");
    source
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn bench_extract_large_body(c: &mut Criterion) {
    let source = annotated_source(16, 2000);
    c.bench_function("extract_material_variables_2000_lines", |b| {
        b.iter(|| extract(black_box(&source), Tag::MaterialVariable));
    });
}

// ---------------------------------------------------------------------------
// Full preprocessing
// ---------------------------------------------------------------------------

fn bench_preprocess_small(c: &mut Criterion) {
    let source = annotated_source(8, 50);
    c.bench_function("preprocess_8_vars", |b| {
        b.iter(|| preprocess(black_box(&source), ShaderStage::Fragment));
    });
}

fn bench_preprocess_large(c: &mut Criterion) {
    let source = annotated_source(128, 2000);
    c.bench_function("preprocess_128_vars", |b| {
        b.iter(|| preprocess(black_box(&source), ShaderStage::Vertex));
    });
}

// ---------------------------------------------------------------------------
// Struct preview
// ---------------------------------------------------------------------------

fn bench_struct_preview(c: &mut Criterion) {
    let Ok(result) = preprocess(&annotated_source(64, 0), ShaderStage::Fragment) else {
        return;
    };
    c.bench_function("struct_preview_rust", |b| {
        b.iter(|| {
            emit_struct_preview(
                black_box(&result.node_variables),
                "NodeBlock",
                PreviewLanguage::Rust,
            )
        });
    });
}

criterion_group!(
    benches,
    bench_extract_large_body,
    bench_preprocess_small,
    bench_preprocess_large,
    bench_struct_preview,
);
criterion_main!(benches);

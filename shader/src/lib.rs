//! # ShaderTag Shader
//!
//! Preprocessor for GLSL annotated with material and node tags.
//!
//! - [`annotation`] - tag line scanning
//! - [`parser`] - declaration parsing
//! - [`codegen`] - uniform block, texture array and struct preview generation
//! - [`preprocess`] - the full annotated-source to GLSL pipeline

pub mod annotation;
pub mod codegen;
pub mod parser;
pub mod preprocess;

pub use annotation::{Declaration, Extraction, Tag, extract};
pub use codegen::{PreviewLanguage, emit_struct_preview, emit_texture_block, emit_uniform_block};
pub use parser::{parse_texture, parse_variable};
pub use preprocess::{
    DEFAULT_SCENE_HEADER, PreprocessConfig, PreprocessResult, Preprocessor, ShaderStage,
    preprocess,
};

/// Shader library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the library version. Call once at startup.
pub fn init() {
    log::info!("ShaderTag Shader v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

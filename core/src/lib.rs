//! # ShaderTag Core
//!
//! Material data model shared by the shader preprocessor and editing tools:
//! shader data types, uniform block layout, descriptor-set geometry and the
//! serializable [`MaterialDefinition`](definition::MaterialDefinition).

pub mod data_type;
pub mod definition;
pub mod descriptor;
pub mod edit;
pub mod error;
pub mod layout;
pub mod namespace;
pub mod profiling;
pub mod variable;

pub use data_type::{ScalarKind, ShaderDataType};
pub use definition::{MaterialDefinition, MaterialDomain};
pub use descriptor::{BlockScope, DescriptorKind, DescriptorSetEntry, ShaderStageFlags};
pub use error::{MaterialError, MaterialErrorKind, MaterialResult};
pub use layout::BlockLayout;
pub use variable::{SemanticBinding, ShaderVariable, TextureSlot};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the library version. Call once at startup.
pub fn init() {
    log::info!("ShaderTag Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

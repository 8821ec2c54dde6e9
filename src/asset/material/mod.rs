pub use builder::{build_material, InvalidSetting, Settings, TextureInterpolation};
pub use builder_base::BuiltMaterialData;
pub use nodes::{
    BuiltNode, BuiltNodeSocketRef, ColorSpace, ImageSource, NodeSocketId, Placeholder, Value,
};
pub use params::{BlendMode, FieldSpec, ParameterModel, ParameterWarning, Transform, SCHEMA};

mod builder;
mod builder_base;
mod definitions;
mod nodes;
pub mod params;

use std::str::FromStr;

use glam::Vec2;
use rgb::RGB;
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    builder_base::{InputLink, MaterialBuilder},
    definitions::{groups, shaders},
    nodes::{ColorSpace, ImageSource, Placeholder, Ref, Value},
    params::{BlendMode, ParameterModel, ParameterWarning, Transform},
    BuiltMaterialData,
};
use crate::{
    error::Warning,
    filesystem::{TextureLookup, TexturePath},
};

const WHITE: RGB<f32> = RGB {
    r: 1.0,
    g: 1.0,
    b: 1.0,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid texture interpolation `{0}`, expected Linear, Closest, Cubic or Smart")]
pub struct InvalidSetting(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureInterpolation {
    #[default]
    Linear,
    Closest,
    Cubic,
    Smart,
}

impl FromStr for TextureInterpolation {
    type Err = InvalidSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Linear" => Ok(Self::Linear),
            "Closest" => Ok(Self::Closest),
            "Cubic" => Ok(Self::Cubic),
            "Smart" => Ok(Self::Smart),
            _ => Err(InvalidSetting(s.to_owned())),
        }
    }
}

impl TextureInterpolation {
    pub fn as_str(self) -> &'static str {
        match self {
            TextureInterpolation::Linear => "Linear",
            TextureInterpolation::Closest => "Closest",
            TextureInterpolation::Cubic => "Cubic",
            TextureInterpolation::Smart => "Smart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Honor `$nocull` by enabling backface culling on everything else.
    pub allow_culling: bool,
    pub texture_interpolation: TextureInterpolation,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_culling: true,
            texture_interpolation: TextureInterpolation::default(),
        }
    }
}

fn color_value(color: RGB<f32>) -> Value {
    Value::Color(color.alpha(1.0).into())
}

fn average(color: RGB<f32>) -> f32 {
    (color.r + color.g + color.b) / 3.0
}

/// Blinn-Phong exponent to an approximately matching GGX roughness.
fn phong_exponent_to_roughness(exponent: f32) -> f32 {
    (2.0 / (exponent.max(0.0) + 2.0)).sqrt()
}

struct VertexLitBuilder<'a> {
    builder: MaterialBuilder,
    params: &'a ParameterModel,
    textures: &'a mut dyn TextureLookup,
    settings: &'a Settings,
    warnings: &'a mut Vec<Warning>,
}

// Textures
impl<'a> VertexLitBuilder<'a> {
    fn new(
        params: &'a ParameterModel,
        textures: &'a mut dyn TextureLookup,
        settings: &'a Settings,
        warnings: &'a mut Vec<Warning>,
    ) -> Self {
        Self {
            builder: MaterialBuilder::new(&shaders::PRINCIPLED),
            params,
            textures,
            settings,
            warnings,
        }
    }

    /// Resolves a texture into an image, or a placeholder if it can't be found.
    fn image(
        &mut self,
        path: &TexturePath,
        color_space: ColorSpace,
        placeholder: Placeholder,
    ) -> Value {
        let mut resolution_warnings = Vec::new();
        let reference = self.textures.lookup(path, &mut resolution_warnings);
        self.warnings
            .extend(resolution_warnings.into_iter().map(Warning::from));

        let source = match reference.file() {
            Some(file) => ImageSource::File {
                path: file.to_path_buf(),
                color_space,
            },
            None => ImageSource::Placeholder(placeholder),
        };

        Value::Image(source)
    }

    fn interpolation(&self) -> Value {
        Value::Enum(self.settings.texture_interpolation.as_str())
    }

    fn handle_texture(
        &mut self,
        parameter: &'static str,
        path: &TexturePath,
        transform: Transform,
        color_space: ColorSpace,
        placeholder: Placeholder,
    ) {
        let image = self.image(path, color_space, placeholder);
        let interpolation = self.interpolation();

        if transform == Transform::default() {
            self.builder
                .input(parameter)
                .pipeline(vec![&groups::TEXTURE])
                .property(&groups::TEXTURE, "image", image)
                .property(&groups::TEXTURE, "interpolation", interpolation);
        } else {
            let scale = transform.scale.extend(1.0).to_array();
            let rotation = [0.0, 0.0, transform.rotate.to_radians()];
            let location = transform.translate.extend(0.0).to_array();

            self.builder
                .input(parameter)
                .pipeline(vec![&groups::TRANSFORMED_TEXTURE])
                .property(&groups::TRANSFORMED_TEXTURE, "image", image)
                .property(&groups::TRANSFORMED_TEXTURE, "interpolation", interpolation)
                .link(&groups::TRANSFORMED_TEXTURE, "scale", Value::Vec(scale))
                .link(
                    &groups::TRANSFORMED_TEXTURE,
                    "rotation",
                    Value::Vec(rotation),
                )
                .link(
                    &groups::TRANSFORMED_TEXTURE,
                    "location",
                    Value::Vec(location),
                );
        }
    }

    fn handle_texture_split(
        &mut self,
        parameter: &'static str,
        path: &TexturePath,
        placeholder: Placeholder,
    ) {
        let image = self.image(path, ColorSpace::NonColor, placeholder);
        let interpolation = self.interpolation();

        self.builder
            .input(parameter)
            .pipeline(vec![&groups::SPLIT_TEXTURE])
            .property(&groups::SPLIT_TEXTURE, "image", image)
            .property(&groups::SPLIT_TEXTURE, "interpolation", interpolation);
    }

    /// Makes the phong exponent texture available, returns whether there is one.
    fn handle_exponent_texture(&mut self) -> bool {
        if self.builder.has_input("$phongexponenttexture") {
            return true;
        }

        let params = self.params;

        let Some(path) = &params.phong_exponent_texture else {
            return false;
        };

        self.handle_texture_split("$phongexponenttexture", path, Placeholder::Black);

        true
    }
}

// Material building
impl<'a> VertexLitBuilder<'a> {
    fn handle_cull(&mut self) {
        let cull = self.settings.allow_culling && !self.params.no_cull;

        self.builder
            .property("use_backface_culling", Value::Bool(cull));
    }

    /// Returns where the tinted albedo comes from.
    fn handle_basetexture(&mut self) -> InputLink {
        let params = self.params;
        let tint = params.tint();

        let Some(path) = &params.base_texture else {
            self.builder.socket_value("Base Color", color_value(tint));
            return color_value(tint).into();
        };

        self.handle_texture(
            "$basetexture",
            path,
            params.base_texture_transform,
            ColorSpace::Srgb,
            Placeholder::White,
        );

        self.handle_detail();

        let albedo = if tint == WHITE {
            Ref::new("$basetexture", "color")
        } else {
            let factor = if params.blend_tint_by_base_alpha {
                InputLink::Input(Ref::new("$basetexture", "alpha"))
            } else {
                InputLink::Value(Value::Float(1.0))
            };

            self.builder
                .input("albedo")
                .pipeline(vec![&groups::COLOR_TEXTURE])
                .link(
                    &groups::COLOR_TEXTURE,
                    "color",
                    Ref::new("$basetexture", "color"),
                )
                .link(&groups::COLOR_TEXTURE, "mixin", color_value(tint))
                .link(&groups::COLOR_TEXTURE, "fac", factor)
                .socket("color")
        };

        self.builder
            .output("Base Color", albedo.target, albedo.name);

        albedo.into()
    }

    fn handle_detail(&mut self) {
        let params = self.params;

        let Some(path) = &params.detail else {
            return;
        };

        let transform = Transform {
            scale: Vec2::splat(params.detail_scale),
            ..Transform::default()
        };
        self.handle_texture(
            "$detail",
            path,
            transform,
            ColorSpace::NonColor,
            Placeholder::Gray,
        );

        let factor = Value::Float(params.detail_blend_factor);

        let blend_type = match params.detail_blend_mode {
            0 => None,
            1 => Some("ADD"),
            2 | 3 => Some("MIX"),
            4 => Some("MULTIPLY"),
            mode => {
                let warning = ParameterWarning {
                    parameter: "$detailblendmode",
                    expected: "detail blend mode 0 to 4",
                    found: mode.to_string(),
                };
                warn!("{}", warning);
                self.warnings.push(warning.into());

                None
            }
        };

        let Some(blend_type) = blend_type else {
            self.builder
                .input("$basetexture")
                .push(&groups::DETAIL_MOD2X)
                .link(&groups::DETAIL_MOD2X, "detail", Ref::new("$detail", "color"))
                .link(&groups::DETAIL_MOD2X, "fac", factor);
            return;
        };

        debug!("blending detail texture with {}", blend_type);

        // alpha blending fades the detail in by its own alpha
        let fac: InputLink = if params.detail_blend_mode == 2 {
            self.builder
                .input("detail_factor")
                .pipeline(vec![&groups::MULTIPLY_VALUE])
                .link(
                    &groups::MULTIPLY_VALUE,
                    "value",
                    Ref::new("$detail", "alpha"),
                )
                .link(&groups::MULTIPLY_VALUE, "fac", factor)
                .socket("value")
                .into()
        } else {
            InputLink::Value(factor)
        };

        self.builder
            .input("$basetexture")
            .push(&groups::DETAIL_BLEND)
            .property(&groups::DETAIL_BLEND, "blend_type", Value::Enum(blend_type))
            .link(&groups::DETAIL_BLEND, "detail", Ref::new("$detail", "color"))
            .link(&groups::DETAIL_BLEND, "fac", fac);
    }

    /// Replaces the base color with the albedo overlaid by the warp ramp.
    fn handle_lightwarp(&mut self, albedo: &InputLink) {
        let params = self.params;

        let Some(path) = &params.lightwarp_texture else {
            return;
        };

        // a gray ramp is neutral under overlay
        let image = self.image(path, ColorSpace::Srgb, Placeholder::Gray);
        let interpolation = self.interpolation();

        self.builder
            .input("$lightwarptexture")
            .pipeline(vec![&groups::LIGHTWARP])
            .property(&groups::LIGHTWARP, "image", image)
            .property(&groups::LIGHTWARP, "interpolation", interpolation)
            .link(&groups::LIGHTWARP, "color", albedo.clone());

        // without a base texture the ramp alone is the diffuse color
        let socket = if self.builder.has_input("$basetexture") {
            "color"
        } else {
            "ramp"
        };

        self.builder
            .output("Base Color", "$lightwarptexture", socket);
    }

    fn handle_bumpmap(&mut self) {
        let params = self.params;

        let Some(path) = &params.bump_map else {
            return;
        };

        self.handle_texture(
            "$bumpmap",
            path,
            Transform::default(),
            ColorSpace::NonColor,
            Placeholder::FlatNormal,
        );

        self.builder
            .output("Normal", "$bumpmap", "color")
            .push(&groups::DX_NORMAL_MAP_CONVERTER)
            .link_input(&groups::DX_NORMAL_MAP_CONVERTER, "image")
            .push(&groups::NORMAL_MAP)
            .link(&groups::NORMAL_MAP, "strength", Value::Float(1.0));
    }

    fn handle_alpha_mode(&mut self) {
        match self.params.blend_mode() {
            BlendMode::Opaque => {
                self.builder
                    .property("blend_method", Value::Enum("OPAQUE"))
                    .property("shadow_method", Value::Enum("OPAQUE"));
                return;
            }
            BlendMode::Clip { threshold, hashed } => {
                let blend_method = if hashed { "HASHED" } else { "CLIP" };

                self.builder
                    .property("blend_method", Value::Enum(blend_method))
                    .property("shadow_method", Value::Enum("CLIP"))
                    .property("alpha_threshold", Value::Float(threshold));
            }
            BlendMode::Blend => {
                self.builder
                    .property("blend_method", Value::Enum("BLEND"))
                    .property("shadow_method", Value::Enum("HASHED"));
            }
            BlendMode::Additive => {
                self.builder
                    .property("blend_method", Value::Enum("BLEND"))
                    .property("shadow_method", Value::Enum("NONE"))
                    .additive();
                return;
            }
        }

        let alpha = self.params.alpha;

        if self.builder.has_input("$basetexture") {
            let output = self.builder.output("Alpha", "$basetexture", "alpha");

            if alpha < 1.0 {
                output
                    .push(&groups::MULTIPLY_VALUE)
                    .link_input(&groups::MULTIPLY_VALUE, "value")
                    .link(&groups::MULTIPLY_VALUE, "fac", Value::Float(alpha));
            }
        } else {
            self.builder.socket_value("Alpha", Value::Float(alpha));
        }
    }

    fn phong_mask(&mut self) -> InputLink {
        let params = self.params;

        let mask = if params.base_map_alpha_phong_mask && self.builder.has_input("$basetexture") {
            Ref::new("$basetexture", "alpha")
        } else if self.builder.has_input("$bumpmap") {
            Ref::new("$bumpmap", "alpha")
        } else {
            return Value::Float(1.0).into();
        };

        if !params.invert_phong_mask {
            return mask.into();
        }

        self.builder
            .input("phong_mask")
            .pipeline(vec![&groups::INVERT_VALUE])
            .link(&groups::INVERT_VALUE, "value", mask)
            .socket("value")
            .into()
    }

    fn handle_phong(&mut self, albedo: &InputLink) {
        let params = self.params;

        if !params.phong {
            let specular = if params.uses_scene_cubemap() {
                average(params.env_map_tint)
            } else {
                0.0
            };

            self.builder
                .socket_value("Specular IOR Level", Value::Float(specular))
                .socket_value("Roughness", Value::Float(0.9));
            return;
        }

        let mut specular = params.phong_boost * 0.25;
        if params.env_map.is_some() {
            specular *= 0.4;
        }

        let mask = self.phong_mask();
        let ranges = params.phong_fresnel_ranges;

        self.builder
            .output_pipeline("Specular IOR Level")
            .push(&groups::PHONG_SPECULAR)
            .link(&groups::PHONG_SPECULAR, "min", Value::Float(ranges.x))
            .link(&groups::PHONG_SPECULAR, "mid", Value::Float(ranges.y))
            .link(&groups::PHONG_SPECULAR, "max", Value::Float(ranges.z))
            .link(&groups::PHONG_SPECULAR, "specular", Value::Float(specular))
            .link(&groups::PHONG_SPECULAR, "mask", mask);

        if self.handle_exponent_texture() {
            self.builder
                .output("Roughness", "$phongexponenttexture", "r")
                .push(&groups::PHONG_ROUGHNESS)
                .link_input(&groups::PHONG_ROUGHNESS, "value");
        } else {
            let roughness = phong_exponent_to_roughness(params.phong_exponent);
            self.builder
                .socket_value("Roughness", Value::Float(roughness));
        }

        if !params.phong_albedo_tint {
            self.builder
                .socket_value("Specular Tint", color_value(params.phong_tint));
            return;
        }

        let boost = params.phong_albedo_boost;

        match albedo {
            InputLink::Input(r) if boost != 1.0 => {
                let tint = self
                    .builder
                    .input("specular_tint")
                    .pipeline(vec![&groups::COLOR_TEXTURE])
                    .link(&groups::COLOR_TEXTURE, "color", *r)
                    .link(
                        &groups::COLOR_TEXTURE,
                        "mixin",
                        Value::Color([boost, boost, boost, 1.0]),
                    )
                    .link(&groups::COLOR_TEXTURE, "fac", Value::Float(1.0))
                    .socket("color");

                self.builder.output("Specular Tint", tint.target, tint.name);
            }
            InputLink::Input(r) => {
                self.builder.output("Specular Tint", r.target, r.name);
            }
            InputLink::Value(Value::Color([r, g, b, a])) => {
                self.builder.socket_value(
                    "Specular Tint",
                    Value::Color([r * boost, g * boost, b * boost, *a]),
                );
            }
            InputLink::Value(v) => {
                self.builder.socket_value("Specular Tint", v.clone());
            }
        }
    }

    fn handle_half_lambert(&mut self, albedo: &InputLink) {
        let params = self.params;

        if !params.half_lambert || (params.phong && params.phong_disable_half_lambert) {
            return;
        }

        self.builder
            .input("half_lambert")
            .pipeline(vec![&groups::HALF_LAMBERT]);

        let layer = self.builder.layer();
        layer.output("Strength", "half_lambert", "value");

        match albedo {
            InputLink::Input(r) => {
                layer.output("Color", r.target, r.name);
            }
            InputLink::Value(v) => {
                layer.socket_value("Color", v.clone());
            }
        }
    }

    fn handle_rimlight(&mut self) {
        let params = self.params;

        if !params.rim_light {
            return;
        }

        self.builder
            .input("rim_light")
            .pipeline(vec![&groups::RIM_LIGHT])
            .link(
                &groups::RIM_LIGHT,
                "exponent",
                Value::Float(params.rim_light_exponent),
            )
            .link(
                &groups::RIM_LIGHT,
                "boost",
                Value::Float(params.rim_light_boost),
            );

        if params.rim_mask && self.handle_exponent_texture() {
            self.builder
                .input("rim_light")
                .push(&groups::MULTIPLY_VALUE)
                .link(
                    &groups::MULTIPLY_VALUE,
                    "fac",
                    Ref::new("$phongexponenttexture", "alpha"),
                );
        }

        self.builder
            .layer()
            .socket_value("Color", color_value(params.phong_tint))
            .output("Strength", "rim_light", "value");
    }

    /// A mask texture wins over base alpha, which wins over normal map alpha.
    fn envmap_mask(&mut self) -> Option<Ref> {
        let params = self.params;

        if let Some(path) = &params.env_map_mask {
            self.handle_texture(
                "$envmapmask",
                path,
                Transform::default(),
                ColorSpace::NonColor,
                Placeholder::White,
            );

            Some(Ref::new("$envmapmask", "color"))
        } else if params.base_alpha_env_map_mask && self.builder.has_input("$basetexture") {
            let mask = self
                .builder
                .input("envmap_mask")
                .pipeline(vec![&groups::INVERT_VALUE])
                .link(
                    &groups::INVERT_VALUE,
                    "value",
                    Ref::new("$basetexture", "alpha"),
                )
                .socket("value");

            Some(mask)
        } else if params.normal_map_alpha_env_map_mask && self.builder.has_input("$bumpmap") {
            Some(Ref::new("$bumpmap", "alpha"))
        } else {
            None
        }
    }

    fn handle_envmap(&mut self) {
        let params = self.params;

        // the scene cubemap only raises the native specular, see handle_phong
        let Some(path) = params.env_map.as_ref().filter(|p| !p.is_scene_cubemap()) else {
            return;
        };

        let image = self.image(path, ColorSpace::Srgb, Placeholder::Black);
        let interpolation = self.interpolation();

        self.builder
            .input("$envmap")
            .pipeline(vec![&groups::ENVMAP_SAMPLE])
            .property(&groups::ENVMAP_SAMPLE, "image", image)
            .property(&groups::ENVMAP_SAMPLE, "interpolation", interpolation)
            .link(
                &groups::ENVMAP_SAMPLE,
                "tint",
                color_value(params.env_map_tint),
            )
            .link(
                &groups::ENVMAP_SAMPLE,
                "contrast",
                Value::Float(params.env_map_contrast),
            )
            .link(
                &groups::ENVMAP_SAMPLE,
                "saturation",
                Value::Float(params.env_map_saturation),
            );

        let mut strength: InputLink = match self.envmap_mask() {
            Some(mask) => mask.into(),
            None => Value::Float(1.0).into(),
        };

        if params.env_map_fresnel > 0.0 {
            strength = self
                .builder
                .input("envmap_strength")
                .pipeline(vec![&groups::ENVMAP_FRESNEL])
                .link(
                    &groups::ENVMAP_FRESNEL,
                    "ior",
                    Value::Float(1.0 + params.env_map_fresnel),
                )
                .link(&groups::ENVMAP_FRESNEL, "strength", strength)
                .socket("strength")
                .into();
        }

        let layer = self.builder.layer();
        layer.output("Color", "$envmap", "color");

        match strength {
            InputLink::Input(r) => {
                layer.output("Strength", r.target, r.name);
            }
            InputLink::Value(v) => {
                layer.socket_value("Strength", v);
            }
        }
    }

    fn handle_selfillum(&mut self, albedo: &InputLink) {
        let params = self.params;

        if !params.self_illum {
            return;
        }

        let mask = if let Some(path) = &params.self_illum_mask {
            self.handle_texture(
                "$selfillummask",
                path,
                Transform::default(),
                ColorSpace::NonColor,
                Placeholder::White,
            );

            Some(Ref::new("$selfillummask", "color"))
        } else if self.builder.has_input("$basetexture") {
            Some(Ref::new("$basetexture", "alpha"))
        } else {
            None
        };

        let tinted = params.self_illum_tint != WHITE;

        if params.self_illum_fresnel {
            let [min, max, exponent] = params.self_illum_fresnel_min_max_exp.to_array();

            self.builder
                .input("self_illum_fresnel")
                .pipeline(vec![&groups::SELF_ILLUM_FRESNEL])
                .link(&groups::SELF_ILLUM_FRESNEL, "min", Value::Float(min))
                .link(
                    &groups::SELF_ILLUM_FRESNEL,
                    "range",
                    Value::Float(max - min),
                )
                .link(
                    &groups::SELF_ILLUM_FRESNEL,
                    "exponent",
                    Value::Float(exponent),
                );

            self.builder
                .output("Emission Strength", "self_illum_fresnel", "value");
        } else {
            self.builder
                .socket_value("Emission Strength", Value::Float(1.0));
        }

        if !tinted && mask.is_none() {
            match albedo {
                InputLink::Input(r) => {
                    self.builder.output("Emission Color", r.target, r.name);
                }
                InputLink::Value(v) => {
                    self.builder.socket_value("Emission Color", v.clone());
                }
            }
            return;
        }

        let input = self.builder.input("self_illum");

        if tinted {
            input
                .push(&groups::COLOR_TEXTURE)
                .link(&groups::COLOR_TEXTURE, "color", albedo.clone())
                .link(
                    &groups::COLOR_TEXTURE,
                    "mixin",
                    color_value(params.self_illum_tint),
                )
                .link(&groups::COLOR_TEXTURE, "fac", Value::Float(1.0));
        }

        if let Some(mask) = mask {
            input
                .push(&groups::MASK_COLOR)
                .link(&groups::MASK_COLOR, "mask", mask);

            if !tinted {
                input.link(&groups::MASK_COLOR, "color", albedo.clone());
            }
        }

        self.builder.output("Emission Color", "self_illum", "color");
    }

    fn build(mut self) -> BuiltMaterialData {
        self.handle_cull();

        let albedo = self.handle_basetexture();

        self.handle_lightwarp(&albedo);
        self.handle_bumpmap();
        self.handle_alpha_mode();
        self.handle_phong(&albedo);
        self.handle_half_lambert(&albedo);
        self.handle_rimlight();
        self.handle_envmap();
        self.handle_selfillum(&albedo);

        self.builder.build()
    }
}

/// Builds the node list reproducing VertexLitGeneric shading for `params`.
///
/// Textures are looked up through `textures`; missing ones are replaced by
/// placeholders and reported in `warnings`.
pub fn build_material(
    params: &ParameterModel,
    textures: &mut dyn TextureLookup,
    settings: &Settings,
    warnings: &mut Vec<Warning>,
) -> BuiltMaterialData {
    VertexLitBuilder::new(params, textures, settings, warnings).build()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        asset::material::{BuiltNode, NodeSocketId},
        filesystem::{Resolution, ResolutionWarning, TextureReference},
    };

    /// Finds every texture under `/textures`.
    struct FoundEverywhere;

    impl TextureLookup for FoundEverywhere {
        fn lookup(
            &mut self,
            path: &TexturePath,
            _warnings: &mut Vec<ResolutionWarning>,
        ) -> TextureReference {
            TextureReference {
                path: path.clone(),
                resolution: Resolution::Found(
                    PathBuf::from("/textures").join(format!("{}.tga", path)),
                ),
            }
        }
    }

    fn texture(path: &str) -> Option<TexturePath> {
        TexturePath::new(path)
    }

    fn build_with(model: &ParameterModel, settings: &Settings) -> (BuiltMaterialData, Vec<Warning>) {
        let mut warnings = Vec::new();
        let built = build_material(model, &mut FoundEverywhere, settings, &mut warnings);
        (built, warnings)
    }

    fn build(model: &ParameterModel) -> BuiltMaterialData {
        build_with(model, &Settings::default()).0
    }

    fn shader(built: &BuiltMaterialData) -> &BuiltNode {
        built.find_node(shaders::PRINCIPLED.host_id).unwrap()
    }

    fn socket_value<'b>(node: &'b BuiltNode, socket: &'static str) -> Option<&'b Value> {
        node.socket_values().get(&NodeSocketId::Name(socket))
    }

    #[test]
    fn interpolation_parses_known_names() {
        assert_eq!(
            "Cubic".parse::<TextureInterpolation>(),
            Ok(TextureInterpolation::Cubic)
        );
        assert_eq!(
            "cubic".parse::<TextureInterpolation>(),
            Err(InvalidSetting("cubic".to_owned()))
        );
    }

    #[test]
    fn interpolation_setting_reaches_textures() {
        let model = ParameterModel {
            base_texture: texture("a"),
            ..ParameterModel::default()
        };
        let settings = Settings {
            texture_interpolation: TextureInterpolation::Closest,
            ..Settings::default()
        };

        let (built, _) = build_with(&model, &settings);
        let image = built.find_node("ShaderNodeTexImage").unwrap();

        assert_eq!(
            image.properties().get("interpolation"),
            Some(&Value::Enum("Closest"))
        );
        assert_eq!(
            image.properties().get("image"),
            Some(&Value::Image(ImageSource::File {
                path: PathBuf::from("/textures/a.tga"),
                color_space: ColorSpace::Srgb,
            }))
        );
    }

    #[test]
    fn culling_can_be_disabled_globally() {
        let settings = Settings {
            allow_culling: false,
            ..Settings::default()
        };

        let (built, _) = build_with(&ParameterModel::default(), &settings);

        assert_eq!(
            built.property("use_backface_culling"),
            Some(&Value::Bool(false))
        );
    }

    #[test]
    fn tint_without_texture_is_a_constant() {
        let model = ParameterModel {
            color: RGB::new(1.0, 0.5, 0.0),
            color2: RGB::new(0.5, 1.0, 1.0),
            ..ParameterModel::default()
        };

        let built = build(&model);

        assert_eq!(built.nodes().len(), 2);
        assert_eq!(
            socket_value(shader(&built), "Base Color"),
            Some(&Value::Color([0.5, 0.5, 0.0, 1.0]))
        );
    }

    #[test]
    fn tint_multiplies_base_texture() {
        let model = ParameterModel {
            base_texture: texture("a"),
            color2: RGB::new(1.0, 0.0, 0.0),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let albedo = built.link_source(shader(&built), "Base Color").unwrap();

        assert_eq!(albedo.host_id(), "ShaderNodeMixRGB");
        assert_eq!(
            albedo.socket_values().get(&NodeSocketId::Name("Color2")),
            Some(&Value::Color([1.0, 0.0, 0.0, 1.0]))
        );
        assert_eq!(
            albedo.socket_values().get(&NodeSocketId::Name("Fac")),
            Some(&Value::Float(1.0))
        );
    }

    #[test]
    fn texture_transform_uses_mapping_in_radians() {
        let model = ParameterModel {
            base_texture: texture("a"),
            base_texture_transform: Transform {
                scale: Vec2::new(2.0, 3.0),
                rotate: 90.0,
                ..Transform::default()
            },
            ..ParameterModel::default()
        };

        let built = build(&model);
        let mapping = built.find_node("ShaderNodeMapping").unwrap();

        assert_eq!(
            mapping.socket_values().get(&NodeSocketId::Name("Scale")),
            Some(&Value::Vec([2.0, 3.0, 1.0]))
        );
        assert_eq!(
            mapping.socket_values().get(&NodeSocketId::Name("Rotation")),
            Some(&Value::Vec([0.0, 0.0, 90f32.to_radians()]))
        );
    }

    #[test]
    fn bumpmap_feeds_normal_through_converter() {
        let model = ParameterModel {
            bump_map: texture("a_normal"),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let normal = built.link_source(shader(&built), "Normal").unwrap();

        assert_eq!(normal.host_id(), "ShaderNodeNormalMap");
        assert!(built.depends_on(normal, "ShaderNodeCombineColor"));
        assert!(built.depends_on(normal, "ShaderNodeTexImage"));
    }

    #[test]
    fn translucent_blends_with_scaled_alpha() {
        let model = ParameterModel {
            base_texture: texture("a"),
            translucent: true,
            alpha: 0.5,
            ..ParameterModel::default()
        };

        let built = build(&model);

        assert_eq!(built.property("blend_method"), Some(&Value::Enum("BLEND")));
        assert_eq!(built.property("shadow_method"), Some(&Value::Enum("HASHED")));

        let alpha = built.link_source(shader(&built), "Alpha").unwrap();
        assert_eq!(alpha.host_id(), "ShaderNodeMath");
        assert_eq!(
            alpha.socket_values().get(&NodeSocketId::Position(1)),
            Some(&Value::Float(0.5))
        );
    }

    #[test]
    fn translucent_without_texture_uses_constant_alpha() {
        let model = ParameterModel {
            translucent: true,
            alpha: 0.25,
            ..ParameterModel::default()
        };

        let built = build(&model);

        assert_eq!(socket_value(shader(&built), "Alpha"), Some(&Value::Float(0.25)));
    }

    #[test]
    fn alpha_to_coverage_hashes_clip() {
        let model = ParameterModel {
            alpha_test: true,
            allow_alpha_to_coverage: true,
            ..ParameterModel::default()
        };

        let built = build(&model);

        assert_eq!(built.property("blend_method"), Some(&Value::Enum("HASHED")));
        assert_eq!(built.property("alpha_threshold"), Some(&Value::Float(0.5)));
    }

    #[test]
    fn envmap_lowers_phong_specular() {
        let model = ParameterModel {
            phong: true,
            env_map: texture("env_cubemap"),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let masked = built
            .link_source(shader(&built), "Specular IOR Level")
            .unwrap();
        let scaled = built
            .link_source(masked, NodeSocketId::Position(0))
            .unwrap();

        assert_eq!(
            scaled.socket_values().get(&NodeSocketId::Position(1)),
            Some(&Value::Float(0.25 * 0.4))
        );
        // the scene cubemap adds no reflection layer
        assert_eq!(built.count_nodes("ShaderNodeEmission"), 0);
    }

    #[test]
    fn exponent_texture_drives_roughness() {
        let model = ParameterModel {
            phong: true,
            phong_exponent_texture: texture("a_exponent"),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let shader = shader(&built);

        assert_eq!(socket_value(shader, "Roughness"), None);
        let roughness = built.link_source(shader, "Roughness").unwrap();
        assert_eq!(roughness.properties().get("operation"), Some(&Value::Enum("SQRT")));
        assert!(built.depends_on(roughness, "ShaderNodeSeparateColor"));
    }

    #[test]
    fn inverted_phong_mask_uses_bump_alpha() {
        let model = ParameterModel {
            phong: true,
            bump_map: texture("a_normal"),
            invert_phong_mask: true,
            ..ParameterModel::default()
        };

        let built = build(&model);
        let masked = built
            .link_source(shader(&built), "Specular IOR Level")
            .unwrap();
        let mask = built.link_source(masked, NodeSocketId::Position(1)).unwrap();

        assert_eq!(mask.properties().get("operation"), Some(&Value::Enum("SUBTRACT")));
        assert_eq!(
            built
                .link_source(mask, NodeSocketId::Position(1))
                .unwrap()
                .host_id(),
            "ShaderNodeTexImage"
        );
    }

    #[test]
    fn constant_phong_mask_is_not_inverted() {
        let model = ParameterModel {
            phong: true,
            invert_phong_mask: true,
            ..ParameterModel::default()
        };

        let built = build(&model);
        let masked = built
            .link_source(shader(&built), "Specular IOR Level")
            .unwrap();

        assert_eq!(
            masked.socket_values().get(&NodeSocketId::Position(1)),
            Some(&Value::Float(1.0))
        );
    }

    #[test]
    fn albedo_tint_links_specular_tint() {
        let model = ParameterModel {
            phong: true,
            phong_albedo_tint: true,
            base_texture: texture("a"),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let shader = shader(&built);

        assert_eq!(
            built.link_source(shader, "Specular Tint"),
            built.link_source(shader, "Base Color")
        );
    }

    #[test]
    fn detail_alpha_blend_scales_factor_by_detail_alpha() {
        let model = ParameterModel {
            base_texture: texture("a"),
            detail: texture("d"),
            detail_blend_mode: 2,
            detail_blend_factor: 0.5,
            ..ParameterModel::default()
        };

        let (built, warnings) = build_with(&model, &Settings::default());
        assert!(warnings.is_empty());

        let blend = built.link_source(shader(&built), "Base Color").unwrap();
        assert_eq!(blend.properties().get("blend_type"), Some(&Value::Enum("MIX")));

        let fac = built.link_source(blend, "Fac").unwrap();
        assert_eq!(fac.host_id(), "ShaderNodeMath");
        assert_eq!(
            fac.socket_values().get(&NodeSocketId::Position(1)),
            Some(&Value::Float(0.5))
        );
    }

    #[test]
    fn detail_is_scaled() {
        let model = ParameterModel {
            base_texture: texture("a"),
            detail: texture("d"),
            detail_blend_mode: 4,
            ..ParameterModel::default()
        };

        let built = build(&model);
        let mapping = built.find_node("ShaderNodeMapping").unwrap();

        assert_eq!(
            mapping.socket_values().get(&NodeSocketId::Name("Scale")),
            Some(&Value::Vec([4.0, 4.0, 1.0]))
        );
    }

    #[test]
    fn selfillum_without_texture_or_tint_copies_albedo() {
        let model = ParameterModel {
            self_illum: true,
            color: RGB::new(0.2, 0.4, 0.6),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let shader = shader(&built);

        assert_eq!(
            socket_value(shader, "Emission Color"),
            socket_value(shader, "Base Color")
        );
        assert_eq!(socket_value(shader, "Emission Strength"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn rim_mask_uses_exponent_alpha() {
        let model = ParameterModel {
            rim_light: true,
            rim_mask: true,
            phong_exponent_texture: texture("a_exponent"),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let emission = built.find_node("ShaderNodeEmission").unwrap();
        let strength = built.link_source(emission, "Strength").unwrap();

        assert_eq!(strength.properties().get("operation"), Some(&Value::Enum("MULTIPLY")));
        assert_eq!(
            built
                .link_source(strength, NodeSocketId::Position(1))
                .unwrap()
                .host_id(),
            "ShaderNodeTexImage"
        );
        // without phong only the rim light reads the exponent texture
        assert_eq!(socket_value(shader(&built), "Roughness"), Some(&Value::Float(0.9)));
    }

    #[test]
    fn layers_sit_below_shader() {
        let model = ParameterModel {
            half_lambert: true,
            rim_light: true,
            ..ParameterModel::default()
        };

        let built = build(&model);
        let shader_y = shader(&built).position()[1];

        for emission in built
            .nodes()
            .iter()
            .filter(|n| n.host_id() == "ShaderNodeEmission")
        {
            assert!(emission.position()[1] < shader_y);
        }
    }

    fn image_path(node: &BuiltNode) -> Option<&PathBuf> {
        match node.properties().get("image") {
            Some(Value::Image(ImageSource::File { path, .. })) => Some(path),
            _ => None,
        }
    }

    fn envmap_strength(built: &BuiltMaterialData) -> &BuiltNode {
        let emission = built.find_node("ShaderNodeEmission").unwrap();
        built.link_source(emission, "Strength").unwrap()
    }

    #[test]
    fn envmap_mask_texture_wins_over_base_alpha() {
        let model = ParameterModel {
            base_texture: texture("a"),
            env_map: texture("env/e"),
            env_map_mask: texture("a_mask"),
            base_alpha_env_map_mask: true,
            ..ParameterModel::default()
        };

        let built = build(&model);
        let strength = envmap_strength(&built);

        assert_eq!(strength.host_id(), "ShaderNodeTexImage");
        assert_eq!(
            image_path(strength),
            Some(&PathBuf::from("/textures/a_mask.tga"))
        );
        assert!(built
            .nodes()
            .iter()
            .all(|n| n.properties().get("operation") != Some(&Value::Enum("SUBTRACT"))));
    }

    #[test]
    fn envmap_mask_texture_wins_over_normal_alpha() {
        let model = ParameterModel {
            bump_map: texture("n"),
            env_map: texture("env/e"),
            env_map_mask: texture("a_mask"),
            normal_map_alpha_env_map_mask: true,
            ..ParameterModel::default()
        };

        let built = build(&model);

        assert_eq!(
            image_path(envmap_strength(&built)),
            Some(&PathBuf::from("/textures/a_mask.tga"))
        );
    }

    #[test]
    fn base_alpha_mask_is_inverted_without_mask_texture() {
        let model = ParameterModel {
            base_texture: texture("a"),
            env_map: texture("env/e"),
            base_alpha_env_map_mask: true,
            ..ParameterModel::default()
        };

        let built = build(&model);
        let strength = envmap_strength(&built);

        assert_eq!(
            strength.properties().get("operation"),
            Some(&Value::Enum("SUBTRACT"))
        );
        assert_eq!(
            built
                .link_source(strength, NodeSocketId::Position(1))
                .and_then(image_path),
            Some(&PathBuf::from("/textures/a.tga"))
        );
    }

    #[test]
    fn envmap_fresnel_scales_strength() {
        let model = ParameterModel {
            env_map: texture("env/e"),
            env_map_fresnel: 0.5,
            ..ParameterModel::default()
        };

        let built = build(&model);
        let strength = envmap_strength(&built);

        assert_eq!(
            strength.properties().get("operation"),
            Some(&Value::Enum("MULTIPLY"))
        );
        assert_eq!(
            strength.socket_values().get(&NodeSocketId::Position(0)),
            Some(&Value::Float(1.0))
        );

        let fresnel = built
            .link_source(strength, NodeSocketId::Position(1))
            .unwrap();
        assert_eq!(fresnel.host_id(), "ShaderNodeFresnel");
        assert_eq!(socket_value(fresnel, "IOR"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn lightwarp_overlays_base_texture() {
        let model = ParameterModel {
            base_texture: texture("a"),
            lightwarp_texture: texture("warp"),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let base = built.link_source(shader(&built), "Base Color").unwrap();

        assert_eq!(base.properties().get("blend_type"), Some(&Value::Enum("OVERLAY")));
        assert_eq!(
            built.link_source(base, "Color1").and_then(image_path),
            Some(&PathBuf::from("/textures/a.tga"))
        );

        let ramp = built.link_source(base, "Color2").unwrap();
        assert_eq!(image_path(ramp), Some(&PathBuf::from("/textures/warp.tga")));
        assert_eq!(ramp.properties().get("extension"), Some(&Value::Enum("EXTEND")));
        assert!(built.depends_on(ramp, "ShaderNodeShaderToRGB"));
    }

    #[test]
    fn lightwarp_without_base_texture_is_the_ramp() {
        let model = ParameterModel {
            lightwarp_texture: texture("warp"),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let base = built.link_source(shader(&built), "Base Color").unwrap();

        assert_eq!(image_path(base), Some(&PathBuf::from("/textures/warp.tga")));
    }

    #[test]
    fn albedo_boost_scales_specular_tint() {
        let model = ParameterModel {
            base_texture: texture("a"),
            phong: true,
            phong_albedo_tint: true,
            phong_albedo_boost: 4.0,
            ..ParameterModel::default()
        };

        let built = build(&model);
        let tint = built.link_source(shader(&built), "Specular Tint").unwrap();

        assert_eq!(socket_value(tint, "Color2"), Some(&Value::Color([4.0, 4.0, 4.0, 1.0])));
        assert_eq!(
            built.link_source(tint, "Color1").and_then(image_path),
            Some(&PathBuf::from("/textures/a.tga"))
        );
    }

    #[test]
    fn albedo_boost_scales_constant_tint() {
        let model = ParameterModel {
            color: RGB::new(0.5, 0.25, 0.5),
            phong: true,
            phong_albedo_tint: true,
            phong_albedo_boost: 2.0,
            ..ParameterModel::default()
        };

        let built = build(&model);

        assert_eq!(
            socket_value(shader(&built), "Specular Tint"),
            Some(&Value::Color([1.0, 0.5, 1.0, 1.0]))
        );
    }

    #[test]
    fn phong_can_disable_half_lambert() {
        let disabled = ParameterModel {
            phong: true,
            half_lambert: true,
            phong_disable_half_lambert: true,
            ..ParameterModel::default()
        };
        let without_phong = ParameterModel {
            phong: false,
            ..disabled.clone()
        };

        assert_eq!(build(&disabled).count_nodes("ShaderNodeEmission"), 0);
        assert_eq!(build(&without_phong).count_nodes("ShaderNodeEmission"), 1);
    }

    #[test]
    fn selfillum_fresnel_drives_strength() {
        let model = ParameterModel {
            base_texture: texture("a"),
            self_illum: true,
            self_illum_fresnel: true,
            self_illum_fresnel_min_max_exp: glam::Vec3::new(0.25, 0.75, 3.0),
            ..ParameterModel::default()
        };

        let built = build(&model);
        let shader = shader(&built);
        let strength = built.link_source(shader, "Emission Strength").unwrap();

        assert_eq!(socket_value(shader, "Emission Strength"), None);
        assert_eq!(
            strength.properties().get("operation"),
            Some(&Value::Enum("MULTIPLY_ADD"))
        );
        assert_eq!(
            strength.socket_values().get(&NodeSocketId::Position(1)),
            Some(&Value::Float(0.5))
        );
        assert_eq!(
            strength.socket_values().get(&NodeSocketId::Position(2)),
            Some(&Value::Float(0.25))
        );
        assert!(built.depends_on(strength, "ShaderNodeNewGeometry"));
    }

    #[test]
    fn additive_adds_onto_transparent() {
        let model = ParameterModel {
            base_texture: texture("a"),
            additive: true,
            translucent: true,
            ..ParameterModel::default()
        };

        let built = build(&model);

        assert_eq!(built.property("blend_method"), Some(&Value::Enum("BLEND")));
        assert_eq!(built.property("shadow_method"), Some(&Value::Enum("NONE")));
        assert_eq!(built.count_nodes("ShaderNodeBsdfTransparent"), 1);
        assert!(built.link_source(shader(&built), "Alpha").is_none());
    }
}

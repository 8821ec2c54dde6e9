use std::iter::{self, Peekable};

use glam::{Vec2, Vec3};
use rgb::{ComponentMap, RGB};
use thiserror::Error;
use tracing::warn;

use crate::{
    filesystem::TexturePath,
    vmt::{parse_number, parse_triple, RawMaterialBlock, RawValue},
};

/// A value could not be coerced to its parameter's type and the default was used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parameter `{parameter}`: expected {expected}, found `{found}`, using default")]
pub struct ParameterWarning {
    pub parameter: &'static str,
    pub expected: &'static str,
    pub found: String,
}

/// Conversion between a raw VMT value and a typed parameter.
pub trait Parameter: Sized {
    const KIND: &'static str;

    fn coerce(value: &RawValue) -> Option<Self>;

    fn to_vmt(&self) -> String;
}

impl Parameter for bool {
    const KIND: &'static str = "bool";

    fn coerce(value: &RawValue) -> Option<Self> {
        match value {
            RawValue::Number(n) => Some(*n != 0.0),
            RawValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(true),
                "0" | "false" | "no" => Some(false),
                _ => None,
            },
            RawValue::Vector(_) | RawValue::Block(_) => None,
        }
    }

    fn to_vmt(&self) -> String {
        String::from(if *self { "1" } else { "0" })
    }
}

impl Parameter for f32 {
    const KIND: &'static str = "float";

    fn coerce(value: &RawValue) -> Option<Self> {
        match value {
            RawValue::Number(n) => Some(*n),
            RawValue::String(s) => s.trim().parse().ok().filter(|n: &f32| n.is_finite()),
            RawValue::Vector(_) | RawValue::Block(_) => None,
        }
    }

    fn to_vmt(&self) -> String {
        self.to_string()
    }
}

impl Parameter for i32 {
    const KIND: &'static str = "integer";

    #[allow(clippy::cast_possible_truncation)]
    fn coerce(value: &RawValue) -> Option<Self> {
        match value {
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() <= 65536.0 => Some(*n as i32),
            RawValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn to_vmt(&self) -> String {
        self.to_string()
    }
}

impl Parameter for RGB<f32> {
    const KIND: &'static str = "color";

    fn coerce(value: &RawValue) -> Option<Self> {
        let [r, g, b] = match value {
            RawValue::Vector(v) => *v,
            RawValue::Number(n) => [*n; 3],
            RawValue::String(s) => parse_triple(s.trim())?,
            RawValue::Block(_) => return None,
        };

        let mut color = RGB::new(r, g, b);

        // components above 1 mean the color was written in 0-255 notation
        if color.iter().any(|c| c > 1.0) {
            color = color.map(|c| c / 255.0);
        }

        Some(color.map(|c| c.clamp(0.0, 2.0)))
    }

    fn to_vmt(&self) -> String {
        format!("[{} {} {}]", self.r, self.g, self.b)
    }
}

impl Parameter for Vec3 {
    const KIND: &'static str = "triple";

    fn coerce(value: &RawValue) -> Option<Self> {
        match value {
            RawValue::Vector(v) => Some(Vec3::from(*v)),
            RawValue::String(s) => parse_triple(s.trim()).map(Vec3::from),
            RawValue::Number(_) | RawValue::Block(_) => None,
        }
    }

    fn to_vmt(&self) -> String {
        format!("[{} {} {}]", self.x, self.y, self.z)
    }
}

impl Parameter for TexturePath {
    const KIND: &'static str = "texture";

    fn coerce(value: &RawValue) -> Option<Self> {
        match value {
            RawValue::String(s) => TexturePath::new(s),
            RawValue::Number(n) => TexturePath::new(&n.to_string()),
            RawValue::Vector(_) | RawValue::Block(_) => None,
        }
    }

    fn to_vmt(&self) -> String {
        self.as_str().to_owned()
    }
}

impl<T: Parameter> Parameter for Option<T> {
    const KIND: &'static str = T::KIND;

    fn coerce(value: &RawValue) -> Option<Self> {
        T::coerce(value).map(Some)
    }

    fn to_vmt(&self) -> String {
        self.as_ref().map(T::to_vmt).unwrap_or_default()
    }
}

/// Texture coordinate transform in Source's `center u v scale u v rotate r translate u v` form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub center: Vec2,
    pub scale: Vec2,
    pub rotate: f32,
    pub translate: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            center: Vec2::splat(0.5),
            scale: Vec2::ONE,
            rotate: 0.0,
            translate: Vec2::ZERO,
        }
    }
}

impl Transform {
    fn parse(text: &str) -> Option<Self> {
        let mut transform = Self::default();
        let mut words = text.split_whitespace().peekable();

        while let Some(word) = words.next() {
            match word.to_ascii_lowercase().as_str() {
                "center" => transform.center = parse_vec2(&mut words)?,
                "scale" => transform.scale = parse_vec2(&mut words)?,
                "translate" => transform.translate = parse_vec2(&mut words)?,
                "rotate" => transform.rotate = parse_number(words.next()?)?,
                _ => return None,
            }
        }

        Some(transform)
    }
}

fn parse_vec2<'a>(words: &mut Peekable<impl Iterator<Item = &'a str>>) -> Option<Vec2> {
    let x = parse_number(words.next()?)?;

    // a single component applies to both axes
    let y = match words.peek().and_then(|w| parse_number(w)) {
        Some(y) => {
            words.next();
            y
        }
        None => x,
    };

    Some(Vec2::new(x, y))
}

impl Parameter for Transform {
    const KIND: &'static str = "transform";

    fn coerce(value: &RawValue) -> Option<Self> {
        value.as_str().and_then(Self::parse)
    }

    fn to_vmt(&self) -> String {
        format!(
            "center {} {} scale {} {} rotate {} translate {} {}",
            self.center.x,
            self.center.y,
            self.scale.x,
            self.scale.y,
            self.rotate,
            self.translate.x,
            self.translate.y
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: &'static str,
}

fn extract<T: Parameter>(
    raw: &RawMaterialBlock,
    name: &'static str,
    aliases: &[&'static str],
    default: T,
    warnings: &mut Vec<ParameterWarning>,
) -> T {
    let Some(value) = iter::once(&name)
        .chain(aliases)
        .find_map(|key| raw.get(key))
    else {
        return default;
    };

    if let Some(value) = T::coerce(value) {
        value
    } else {
        let warning = ParameterWarning {
            parameter: name,
            expected: T::KIND,
            found: value.to_string(),
        };
        warn!("{}", warning);
        warnings.push(warning);

        default
    }
}

macro_rules! parameters {
    ($(
        $(#[$meta:meta])*
        $field:ident: $ty:ty = $default:expr, $name:literal $(| $alias:literal)*;
    )*) => {
        /// Typed VertexLitGeneric parameters. Every field holds a valid value,
        /// absent or malformed keys are replaced by their defaults.
        #[derive(Debug, Clone, PartialEq)]
        pub struct ParameterModel {
            $($(#[$meta])* pub $field: $ty,)*
        }

        /// Every recognized parameter in declaration order.
        pub static SCHEMA: &[FieldSpec] = &[$(FieldSpec {
            name: $name,
            aliases: &[$($alias),*],
            kind: <$ty as Parameter>::KIND,
        },)*];

        impl Default for ParameterModel {
            fn default() -> Self {
                Self {
                    $($field: $default,)*
                }
            }
        }

        impl ParameterModel {
            /// Builds the model from a parsed block. Never fails; problems are
            /// reported through `warnings`.
            pub fn build(raw: &RawMaterialBlock, warnings: &mut Vec<ParameterWarning>) -> Self {
                let defaults = Self::default();

                Self {
                    $($field: extract(raw, $name, &[$($alias),*], defaults.$field, warnings),)*
                }
            }

            /// Parameters that differ from their defaults, formatted as VMT values.
            pub fn changed_parameters(&self) -> Vec<(&'static str, String)> {
                let defaults = Self::default();
                let mut changed = Vec::new();

                $(if self.$field != defaults.$field {
                    changed.push(($name, Parameter::to_vmt(&self.$field)));
                })*

                changed
            }
        }
    };
}

parameters! {
    base_texture: Option<TexturePath> = None, "$basetexture";
    base_texture_transform: Transform = Transform::default(), "$basetexturetransform";
    bump_map: Option<TexturePath> = None, "$bumpmap" | "$normalmap";
    phong_exponent_texture: Option<TexturePath> = None, "$phongexponenttexture";
    env_map: Option<TexturePath> = None, "$envmap";
    env_map_mask: Option<TexturePath> = None, "$envmapmask";
    self_illum_mask: Option<TexturePath> = None, "$selfillummask";
    detail: Option<TexturePath> = None, "$detail";
    /// 1D ramp indexed by diffuse lighting.
    lightwarp_texture: Option<TexturePath> = None, "$lightwarptexture";

    phong: bool = false, "$phong";
    phong_exponent: f32 = 20.0, "$phongexponent";
    phong_boost: f32 = 1.0, "$phongboost";
    /// Specular multipliers at grazing factors 0, 0.5 and 1.
    phong_fresnel_ranges: Vec3 = Vec3::new(0.0, 0.5, 1.0), "$phongfresnelranges";
    phong_tint: RGB<f32> = RGB::new(1.0, 1.0, 1.0), "$phongtint";
    phong_albedo_tint: bool = false, "$phongalbedotint";
    phong_albedo_boost: f32 = 1.0, "$phongalbedoboost";
    phong_disable_half_lambert: bool = false, "$phongdisablehalflambert";
    base_map_alpha_phong_mask: bool = false, "$basemapalphaphongmask";
    invert_phong_mask: bool = false, "$invertphongmask";

    rim_light: bool = false, "$rimlight";
    rim_light_exponent: f32 = 4.0, "$rimlightexponent";
    rim_light_boost: f32 = 1.0, "$rimlightboost";
    rim_mask: bool = false, "$rimmask";

    half_lambert: bool = false, "$halflambert";

    self_illum: bool = false, "$selfillum";
    self_illum_tint: RGB<f32> = RGB::new(1.0, 1.0, 1.0), "$selfillumtint";
    self_illum_fresnel: bool = false, "$selfillumfresnel";
    /// Minimum, maximum and exponent of the self-illumination fresnel term.
    self_illum_fresnel_min_max_exp: Vec3 = Vec3::new(0.0, 1.0, 1.0), "$selfillumfresnelminmaxexp";

    translucent: bool = false, "$translucent";
    alpha_test: bool = false, "$alphatest";
    alpha_test_reference: f32 = 0.5, "$alphatestreference";
    allow_alpha_to_coverage: bool = false, "$allowalphatocoverage";
    alpha: f32 = 1.0, "$alpha";
    additive: bool = false, "$additive";

    color: RGB<f32> = RGB::new(1.0, 1.0, 1.0), "$color";
    color2: RGB<f32> = RGB::new(1.0, 1.0, 1.0), "$color2";
    blend_tint_by_base_alpha: bool = false, "$blendtintbybasealpha";

    env_map_tint: RGB<f32> = RGB::new(1.0, 1.0, 1.0), "$envmaptint";
    env_map_contrast: f32 = 0.0, "$envmapcontrast";
    env_map_saturation: f32 = 1.0, "$envmapsaturation";
    env_map_fresnel: f32 = 0.0, "$envmapfresnel";
    base_alpha_env_map_mask: bool = false, "$basealphaenvmapmask";
    normal_map_alpha_env_map_mask: bool = false, "$normalmapalphaenvmapmask";

    detail_scale: f32 = 4.0, "$detailscale";
    detail_blend_factor: f32 = 1.0, "$detailblendfactor";
    detail_blend_mode: i32 = 0, "$detailblendmode";

    no_cull: bool = false, "$nocull";
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlendMode {
    Opaque,
    Clip { threshold: f32, hashed: bool },
    Blend,
    Additive,
}

impl ParameterModel {
    /// Alpha test takes precedence over additive blending, which takes
    /// precedence over translucency.
    pub fn blend_mode(&self) -> BlendMode {
        if self.alpha_test {
            BlendMode::Clip {
                threshold: self.alpha_test_reference,
                hashed: self.allow_alpha_to_coverage,
            }
        } else if self.additive {
            BlendMode::Additive
        } else if self.translucent {
            BlendMode::Blend
        } else {
            BlendMode::Opaque
        }
    }

    /// `$envmap` refers to the scene cubemap instead of a texture file.
    pub fn uses_scene_cubemap(&self) -> bool {
        self.env_map
            .as_ref()
            .map_or(false, TexturePath::is_scene_cubemap)
    }

    /// Combined `$color` and `$color2` tint.
    pub fn tint(&self) -> RGB<f32> {
        RGB::new(
            self.color.r * self.color2.r,
            self.color.g * self.color2.g,
            self.color.b * self.color2.b,
        )
    }
}

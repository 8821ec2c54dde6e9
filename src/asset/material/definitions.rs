pub const NODE_MARGIN: f32 = 50.0;

pub mod shaders {
    use super::super::nodes::{
        NodeSocketId::{Name, Position},
        NodeType,
    };

    pub static PRINCIPLED: NodeType = NodeType {
        host_id: "ShaderNodeBsdfPrincipled",
        size: [240.0, 710.0],
        input_sockets: &[
            Name("Base Color"),
            Name("Metallic"),
            Name("Roughness"),
            Name("Alpha"),
            Name("Normal"),
            Name("Specular IOR Level"),
            Name("Specular Tint"),
            Name("Emission Color"),
            Name("Emission Strength"),
        ],
        output_sockets: &[Position(0)],
        ..NodeType::default()
    };
}

pub mod nodes {
    use super::super::nodes::{
        NodeSocketId::{Name, Position},
        NodeType,
    };

    pub static OUTPUT_MATERIAL: NodeType = NodeType {
        host_id: "ShaderNodeOutputMaterial",
        size: [140.0, 134.0],
        input_sockets: &[Name("Surface")],
        ..NodeType::default()
    };

    pub static EMISSION: NodeType = NodeType {
        host_id: "ShaderNodeEmission",
        size: [140.0, 104.0],
        input_sockets: &[Name("Color"), Name("Strength")],
        output_sockets: &[Position(0)],
        ..NodeType::default()
    };

    pub static ADD_SHADER: NodeType = NodeType {
        host_id: "ShaderNodeAddShader",
        size: [140.0, 99.0],
        input_sockets: &[Position(0), Position(1)],
        output_sockets: &[Position(0)],
        ..NodeType::default()
    };

    pub static DIFFUSE_BSDF: NodeType = NodeType {
        host_id: "ShaderNodeBsdfDiffuse",
        size: [150.0, 124.0],
        input_sockets: &[Name("Color"), Name("Roughness"), Name("Normal")],
        output_sockets: &[Position(0)],
        ..NodeType::default()
    };

    pub static SHADER_TO_RGB: NodeType = NodeType {
        host_id: "ShaderNodeShaderToRGB",
        size: [140.0, 103.0],
        input_sockets: &[Position(0)],
        output_sockets: &[Name("Color"), Name("Alpha")],
        ..NodeType::default()
    };

    pub static TEX_IMAGE: NodeType = NodeType {
        host_id: "ShaderNodeTexImage",
        size: [240.0, 252.0],
        input_sockets: &[Name("Vector")],
        output_sockets: &[Name("Color"), Name("Alpha")],
        properties: &["image", "interpolation", "extension"],
    };

    pub static TEX_ENVIRONMENT: NodeType = NodeType {
        host_id: "ShaderNodeTexEnvironment",
        size: [240.0, 240.0],
        input_sockets: &[Name("Vector")],
        output_sockets: &[Name("Color")],
        properties: &["image", "interpolation"],
    };

    pub static TEX_COORD: NodeType = NodeType {
        host_id: "ShaderNodeTexCoord",
        size: [140.0, 237.0],
        output_sockets: &[Name("UV"), Name("Reflection")],
        ..NodeType::default()
    };

    pub static NEW_GEOMETRY: NodeType = NodeType {
        host_id: "ShaderNodeNewGeometry",
        size: [140.0, 260.0],
        output_sockets: &[Name("Normal"), Name("Incoming")],
        ..NodeType::default()
    };

    pub static MAPPING: NodeType = NodeType {
        host_id: "ShaderNodeMapping",
        size: [140.0, 411.0],
        input_sockets: &[
            Name("Vector"),
            Name("Location"),
            Name("Rotation"),
            Name("Scale"),
        ],
        output_sockets: &[Name("Vector")],
        ..NodeType::default()
    };

    pub static NORMAL_MAP: NodeType = NodeType {
        host_id: "ShaderNodeNormalMap",
        size: [150.0, 152.0],
        input_sockets: &[Name("Color"), Name("Strength")],
        output_sockets: &[Name("Normal")],
        ..NodeType::default()
    };

    pub static SEPARATE_COLOR: NodeType = NodeType {
        host_id: "ShaderNodeSeparateColor",
        size: [140.0, 119.0],
        input_sockets: &[Name("Color")],
        output_sockets: &[Name("Red"), Name("Green"), Name("Blue")],
        ..NodeType::default()
    };

    pub static COMBINE_COLOR: NodeType = NodeType {
        host_id: "ShaderNodeCombineColor",
        size: [140.0, 119.0],
        input_sockets: &[Name("Red"), Name("Green"), Name("Blue")],
        output_sockets: &[Name("Color")],
        ..NodeType::default()
    };

    pub static TRANSPARENT_BSDF: NodeType = NodeType {
        host_id: "ShaderNodeBsdfTransparent",
        size: [140.0, 78.0],
        input_sockets: &[Name("Color")],
        output_sockets: &[Position(0)],
        ..NodeType::default()
    };

    pub static FRESNEL: NodeType = NodeType {
        host_id: "ShaderNodeFresnel",
        size: [140.0, 122.0],
        input_sockets: &[Name("IOR"), Name("Normal")],
        output_sockets: &[Name("Fac")],
        ..NodeType::default()
    };

    pub static COMBINE_XYZ: NodeType = NodeType {
        host_id: "ShaderNodeCombineXYZ",
        size: [140.0, 119.0],
        input_sockets: &[Name("X"), Name("Y"), Name("Z")],
        output_sockets: &[Name("Vector")],
        ..NodeType::default()
    };

    pub static SEPARATE_XYZ: NodeType = NodeType {
        host_id: "ShaderNodeSeparateXYZ",
        size: [140.0, 119.0],
        input_sockets: &[Name("Vector")],
        output_sockets: &[Name("X"), Name("Y"), Name("Z")],
        ..NodeType::default()
    };

    pub static MATH: NodeType = NodeType {
        host_id: "ShaderNodeMath",
        size: [140.0, 174.0],
        input_sockets: &[Position(0), Position(1), Position(2)],
        output_sockets: &[Position(0)],
        properties: &["operation", "use_clamp"],
    };

    /// Output 0 is the vector result, output 1 the scalar one (dot product).
    pub static VECTOR_MATH: NodeType = NodeType {
        host_id: "ShaderNodeVectorMath",
        size: [140.0, 191.0],
        input_sockets: &[Position(0), Position(1), Position(2)],
        output_sockets: &[Position(0), Position(1)],
        properties: &["operation"],
    };

    pub static MIX_RGB: NodeType = NodeType {
        host_id: "ShaderNodeMixRGB",
        size: [140.0, 171.0],
        input_sockets: &[Name("Fac"), Name("Color1"), Name("Color2")],
        output_sockets: &[Name("Color")],
        properties: &["blend_type"],
    };

    pub static MAP_RANGE: NodeType = NodeType {
        host_id: "ShaderNodeMapRange",
        size: [140.0, 247.0],
        input_sockets: &[
            Name("Value"),
            Name("From Min"),
            Name("From Max"),
            Name("To Min"),
            Name("To Max"),
        ],
        output_sockets: &[Position(0)],
        properties: &["interpolation_type", "clamp"],
    };

    pub static HUE_SATURATION: NodeType = NodeType {
        host_id: "ShaderNodeHueSaturation",
        size: [150.0, 168.0],
        input_sockets: &[
            Name("Hue"),
            Name("Saturation"),
            Name("Value"),
            Name("Fac"),
            Name("Color"),
        ],
        output_sockets: &[Name("Color")],
        ..NodeType::default()
    };
}

pub mod groups {
    use super::super::nodes::{
        Node, NodeGroup,
        NodeSocketId::{Name, Position},
        NodeSocketRef, Ref, Value,
    };
    use super::nodes;

    pub static TEXTURE: NodeGroup = NodeGroup {
        nodes: &[Node {
            kind: &nodes::TEX_IMAGE,
            id: "texture",
            ..Node::default()
        }],
        properties: &[
            ("image", Ref::new("texture", "image")),
            ("interpolation", Ref::new("texture", "interpolation")),
        ],
        outputs: &[
            ("color", NodeSocketRef::new("texture", Name("Color"))),
            ("alpha", NodeSocketRef::new("texture", Name("Alpha"))),
        ],
        ..NodeGroup::default()
    };

    pub static TRANSFORMED_TEXTURE: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::TEX_COORD,
                id: "coord",
                ..Node::default()
            },
            Node {
                kind: &nodes::MAPPING,
                id: "mapping",
                links: &[(Name("Vector"), NodeSocketRef::new("coord", Name("UV")))],
                ..Node::default()
            },
            Node {
                kind: &nodes::TEX_IMAGE,
                id: "texture",
                links: &[(
                    Name("Vector"),
                    NodeSocketRef::new("mapping", Name("Vector")),
                )],
                ..Node::default()
            },
        ],
        properties: &[
            ("image", Ref::new("texture", "image")),
            ("interpolation", Ref::new("texture", "interpolation")),
        ],
        inputs: &[
            ("scale", NodeSocketRef::new("mapping", Name("Scale"))),
            ("rotation", NodeSocketRef::new("mapping", Name("Rotation"))),
            ("location", NodeSocketRef::new("mapping", Name("Location"))),
        ],
        outputs: &[
            ("color", NodeSocketRef::new("texture", Name("Color"))),
            ("alpha", NodeSocketRef::new("texture", Name("Alpha"))),
        ],
    };

    pub static SPLIT_TEXTURE: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::TEX_IMAGE,
                id: "texture",
                ..Node::default()
            },
            Node {
                kind: &nodes::SEPARATE_COLOR,
                id: "separate",
                links: &[(Name("Color"), NodeSocketRef::new("texture", Name("Color")))],
                ..Node::default()
            },
        ],
        properties: &[
            ("image", Ref::new("texture", "image")),
            ("interpolation", Ref::new("texture", "interpolation")),
        ],
        outputs: &[
            ("r", NodeSocketRef::new("separate", Name("Red"))),
            ("g", NodeSocketRef::new("separate", Name("Green"))),
            ("b", NodeSocketRef::new("separate", Name("Blue"))),
            ("alpha", NodeSocketRef::new("texture", Name("Alpha"))),
        ],
        ..NodeGroup::default()
    };

    /// Source normal maps point green down.
    pub static DX_NORMAL_MAP_CONVERTER: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::SEPARATE_COLOR,
                id: "separate",
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "invert",
                properties: &[("operation", Value::Enum("SUBTRACT"))],
                values: &[(Position(0), Value::Float(1.0))],
                links: &[(Position(1), NodeSocketRef::new("separate", Name("Green")))],
            },
            Node {
                kind: &nodes::COMBINE_COLOR,
                id: "combine",
                links: &[
                    (Name("Red"), NodeSocketRef::new("separate", Name("Red"))),
                    (Name("Green"), NodeSocketRef::new("invert", Position(0))),
                    (Name("Blue"), NodeSocketRef::new("separate", Name("Blue"))),
                ],
                ..Node::default()
            },
        ],
        inputs: &[("image", NodeSocketRef::new("separate", Name("Color")))],
        outputs: &[("image", NodeSocketRef::new("combine", Name("Color")))],
        ..NodeGroup::default()
    };

    pub static NORMAL_MAP: NodeGroup = NodeGroup {
        nodes: &[Node {
            kind: &nodes::NORMAL_MAP,
            id: "normal_map",
            ..Node::default()
        }],
        inputs: &[
            ("image", NodeSocketRef::new("normal_map", Name("Color"))),
            (
                "strength",
                NodeSocketRef::new("normal_map", Name("Strength")),
            ),
        ],
        outputs: &[("normal", NodeSocketRef::new("normal_map", Name("Normal")))],
        ..NodeGroup::default()
    };

    /// `color * detail * 2`, faded in by `fac`.
    pub static DETAIL_MOD2X: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::MIX_RGB,
                id: "mul",
                properties: &[("blend_type", Value::Enum("MULTIPLY"))],
                values: &[
                    (Name("Color2"), Value::Color([2.0, 2.0, 2.0, 1.0])),
                    (Name("Fac"), Value::Float(1.0)),
                ],
                ..Node::default()
            },
            Node {
                kind: &nodes::MIX_RGB,
                id: "mix",
                properties: &[("blend_type", Value::Enum("MULTIPLY"))],
                links: &[(Name("Color2"), NodeSocketRef::new("mul", Name("Color")))],
                ..Node::default()
            },
        ],
        inputs: &[
            ("color", NodeSocketRef::new("mix", Name("Color1"))),
            ("detail", NodeSocketRef::new("mul", Name("Color1"))),
            ("fac", NodeSocketRef::new("mix", Name("Fac"))),
        ],
        outputs: &[("color", NodeSocketRef::new("mix", Name("Color")))],
        ..NodeGroup::default()
    };

    /// Single blend of the detail texture over the color, mode given by `blend_type`.
    pub static DETAIL_BLEND: NodeGroup = NodeGroup {
        nodes: &[Node {
            kind: &nodes::MIX_RGB,
            id: "mix",
            ..Node::default()
        }],
        properties: &[("blend_type", Ref::new("mix", "blend_type"))],
        inputs: &[
            ("color", NodeSocketRef::new("mix", Name("Color1"))),
            ("detail", NodeSocketRef::new("mix", Name("Color2"))),
            ("fac", NodeSocketRef::new("mix", Name("Fac"))),
        ],
        outputs: &[("color", NodeSocketRef::new("mix", Name("Color")))],
    };

    pub static COLOR_TEXTURE: NodeGroup = NodeGroup {
        nodes: &[Node {
            kind: &nodes::MIX_RGB,
            id: "mul",
            properties: &[("blend_type", Value::Enum("MULTIPLY"))],
            ..Node::default()
        }],
        inputs: &[
            ("color", NodeSocketRef::new("mul", Name("Color1"))),
            ("mixin", NodeSocketRef::new("mul", Name("Color2"))),
            ("fac", NodeSocketRef::new("mul", Name("Fac"))),
        ],
        outputs: &[("color", NodeSocketRef::new("mul", Name("Color")))],
        ..NodeGroup::default()
    };

    pub static MASK_COLOR: NodeGroup = NodeGroup {
        nodes: &[Node {
            kind: &nodes::MIX_RGB,
            id: "mul",
            properties: &[("blend_type", Value::Enum("MULTIPLY"))],
            values: &[(Name("Fac"), Value::Float(1.0))],
            ..Node::default()
        }],
        inputs: &[
            ("color", NodeSocketRef::new("mul", Name("Color1"))),
            ("mask", NodeSocketRef::new("mul", Name("Color2"))),
        ],
        outputs: &[("color", NodeSocketRef::new("mul", Name("Color")))],
        ..NodeGroup::default()
    };

    pub static MULTIPLY_VALUE: NodeGroup = NodeGroup {
        nodes: &[Node {
            kind: &nodes::MATH,
            id: "mul",
            properties: &[("operation", Value::Enum("MULTIPLY"))],
            ..Node::default()
        }],
        inputs: &[
            ("value", NodeSocketRef::new("mul", Position(0))),
            ("fac", NodeSocketRef::new("mul", Position(1))),
        ],
        outputs: &[("value", NodeSocketRef::new("mul", Position(0)))],
        ..NodeGroup::default()
    };

    pub static INVERT_VALUE: NodeGroup = NodeGroup {
        nodes: &[Node {
            kind: &nodes::MATH,
            id: "sub",
            properties: &[("operation", Value::Enum("SUBTRACT"))],
            values: &[(Position(0), Value::Float(1.0))],
            ..Node::default()
        }],
        inputs: &[("value", NodeSocketRef::new("sub", Position(1)))],
        outputs: &[("value", NodeSocketRef::new("sub", Position(0)))],
        ..NodeGroup::default()
    };

    /// Phong exponent texture red channel to roughness:
    /// `exponent = r * 149 + 1`, `roughness = sqrt(2 / (exponent + 2))`.
    pub static PHONG_ROUGHNESS: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::MATH,
                id: "exponent",
                properties: &[("operation", Value::Enum("MULTIPLY_ADD"))],
                values: &[
                    (Position(1), Value::Float(149.0)),
                    (Position(2), Value::Float(1.0)),
                ],
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "offset",
                properties: &[("operation", Value::Enum("ADD"))],
                values: &[(Position(1), Value::Float(2.0))],
                links: &[(Position(0), NodeSocketRef::new("exponent", Position(0)))],
            },
            Node {
                kind: &nodes::MATH,
                id: "ratio",
                properties: &[("operation", Value::Enum("DIVIDE"))],
                values: &[(Position(0), Value::Float(2.0))],
                links: &[(Position(1), NodeSocketRef::new("offset", Position(0)))],
            },
            Node {
                kind: &nodes::MATH,
                id: "root",
                properties: &[("operation", Value::Enum("SQRT"))],
                links: &[(Position(0), NodeSocketRef::new("ratio", Position(0)))],
                ..Node::default()
            },
        ],
        inputs: &[("value", NodeSocketRef::new("exponent", Position(0)))],
        outputs: &[("roughness", NodeSocketRef::new("root", Position(0)))],
        ..NodeGroup::default()
    };

    /// Specular strength with fresnel ranges: `f = (1 - N.V)^2` picks between
    /// `min` and `mid` below 0.5 and between `mid` and `max` above it.
    pub static PHONG_SPECULAR: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::NEW_GEOMETRY,
                id: "geometry",
                ..Node::default()
            },
            Node {
                kind: &nodes::VECTOR_MATH,
                id: "facing",
                properties: &[("operation", Value::Enum("DOT_PRODUCT"))],
                links: &[
                    (Position(0), NodeSocketRef::new("geometry", Name("Normal"))),
                    (Position(1), NodeSocketRef::new("geometry", Name("Incoming"))),
                ],
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "grazing",
                properties: &[
                    ("operation", Value::Enum("SUBTRACT")),
                    ("use_clamp", Value::Bool(true)),
                ],
                values: &[(Position(0), Value::Float(1.0))],
                links: &[(Position(1), NodeSocketRef::new("facing", Position(1)))],
            },
            Node {
                kind: &nodes::MATH,
                id: "fresnel",
                properties: &[("operation", Value::Enum("POWER"))],
                values: &[(Position(1), Value::Float(2.0))],
                links: &[(Position(0), NodeSocketRef::new("grazing", Position(0)))],
            },
            Node {
                kind: &nodes::MAP_RANGE,
                id: "low",
                properties: &[("clamp", Value::Bool(true))],
                values: &[
                    (Name("From Min"), Value::Float(0.0)),
                    (Name("From Max"), Value::Float(0.5)),
                ],
                links: &[(Name("Value"), NodeSocketRef::new("fresnel", Position(0)))],
            },
            Node {
                kind: &nodes::MAP_RANGE,
                id: "high",
                properties: &[("clamp", Value::Bool(true))],
                values: &[
                    (Name("From Min"), Value::Float(0.5)),
                    (Name("From Max"), Value::Float(1.0)),
                ],
                links: &[(Name("Value"), NodeSocketRef::new("fresnel", Position(0)))],
            },
            Node {
                kind: &nodes::MATH,
                id: "step",
                properties: &[("operation", Value::Enum("GREATER_THAN"))],
                values: &[(Position(1), Value::Float(0.5))],
                links: &[(Position(0), NodeSocketRef::new("fresnel", Position(0)))],
            },
            Node {
                kind: &nodes::MAP_RANGE,
                id: "select",
                properties: &[("clamp", Value::Bool(true))],
                values: &[
                    (Name("From Min"), Value::Float(0.0)),
                    (Name("From Max"), Value::Float(1.0)),
                ],
                links: &[
                    (Name("Value"), NodeSocketRef::new("step", Position(0))),
                    (Name("To Min"), NodeSocketRef::new("low", Position(0))),
                    (Name("To Max"), NodeSocketRef::new("high", Position(0))),
                ],
            },
            Node {
                kind: &nodes::MATH,
                id: "scale",
                properties: &[("operation", Value::Enum("MULTIPLY"))],
                links: &[(Position(0), NodeSocketRef::new("select", Position(0)))],
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "mask",
                properties: &[("operation", Value::Enum("MULTIPLY"))],
                links: &[(Position(0), NodeSocketRef::new("scale", Position(0)))],
                ..Node::default()
            },
        ],
        inputs: &[
            ("min", NodeSocketRef::new("low", Name("To Min"))),
            ("mid", NodeSocketRef::new("low", Name("To Max"))),
            ("mid", NodeSocketRef::new("high", Name("To Min"))),
            ("max", NodeSocketRef::new("high", Name("To Max"))),
            ("specular", NodeSocketRef::new("scale", Position(1))),
            ("mask", NodeSocketRef::new("mask", Position(1))),
        ],
        outputs: &[("specular", NodeSocketRef::new("mask", Position(0)))],
        ..NodeGroup::default()
    };

    /// `max((1 - N.V)^exponent * N.z, 0) * boost`
    pub static RIM_LIGHT: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::NEW_GEOMETRY,
                id: "geometry",
                ..Node::default()
            },
            Node {
                kind: &nodes::VECTOR_MATH,
                id: "facing",
                properties: &[("operation", Value::Enum("DOT_PRODUCT"))],
                links: &[
                    (Position(0), NodeSocketRef::new("geometry", Name("Normal"))),
                    (Position(1), NodeSocketRef::new("geometry", Name("Incoming"))),
                ],
                ..Node::default()
            },
            Node {
                kind: &nodes::SEPARATE_XYZ,
                id: "up",
                links: &[(Name("Vector"), NodeSocketRef::new("geometry", Name("Normal")))],
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "grazing",
                properties: &[
                    ("operation", Value::Enum("SUBTRACT")),
                    ("use_clamp", Value::Bool(true)),
                ],
                values: &[(Position(0), Value::Float(1.0))],
                links: &[(Position(1), NodeSocketRef::new("facing", Position(1)))],
            },
            Node {
                kind: &nodes::MATH,
                id: "falloff",
                properties: &[("operation", Value::Enum("POWER"))],
                links: &[(Position(0), NodeSocketRef::new("grazing", Position(0)))],
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "directional",
                properties: &[("operation", Value::Enum("MULTIPLY"))],
                links: &[
                    (Position(0), NodeSocketRef::new("falloff", Position(0))),
                    (Position(1), NodeSocketRef::new("up", Name("Z"))),
                ],
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "positive",
                properties: &[("operation", Value::Enum("MAXIMUM"))],
                values: &[(Position(1), Value::Float(0.0))],
                links: &[(Position(0), NodeSocketRef::new("directional", Position(0)))],
            },
            Node {
                kind: &nodes::MATH,
                id: "boost",
                properties: &[("operation", Value::Enum("MULTIPLY"))],
                links: &[(Position(0), NodeSocketRef::new("positive", Position(0)))],
                ..Node::default()
            },
        ],
        inputs: &[
            ("exponent", NodeSocketRef::new("falloff", Position(1))),
            ("boost", NodeSocketRef::new("boost", Position(1))),
        ],
        outputs: &[("value", NodeSocketRef::new("boost", Position(0)))],
        ..NodeGroup::default()
    };

    /// Difference between half-Lambert `(L * 0.5 + 0.5)^2` and plain Lambert `L`,
    /// where `L` is the lit intensity of a white diffuse shader.
    pub static HALF_LAMBERT: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::DIFFUSE_BSDF,
                id: "diffuse",
                values: &[
                    (Name("Color"), Value::Color([1.0, 1.0, 1.0, 1.0])),
                    (Name("Roughness"), Value::Float(0.0)),
                ],
                ..Node::default()
            },
            Node {
                kind: &nodes::SHADER_TO_RGB,
                id: "lit",
                links: &[(Position(0), NodeSocketRef::new("diffuse", Position(0)))],
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "wrap",
                properties: &[("operation", Value::Enum("MULTIPLY_ADD"))],
                values: &[
                    (Position(1), Value::Float(0.5)),
                    (Position(2), Value::Float(0.5)),
                ],
                links: &[(Position(0), NodeSocketRef::new("lit", Name("Color")))],
            },
            Node {
                kind: &nodes::MATH,
                id: "square",
                properties: &[("operation", Value::Enum("POWER"))],
                values: &[(Position(1), Value::Float(2.0))],
                links: &[(Position(0), NodeSocketRef::new("wrap", Position(0)))],
            },
            Node {
                kind: &nodes::MATH,
                id: "difference",
                properties: &[
                    ("operation", Value::Enum("SUBTRACT")),
                    ("use_clamp", Value::Bool(true)),
                ],
                links: &[
                    (Position(0), NodeSocketRef::new("square", Position(0))),
                    (Position(1), NodeSocketRef::new("lit", Name("Color"))),
                ],
                ..Node::default()
            },
        ],
        outputs: &[("value", NodeSocketRef::new("difference", Position(0)))],
        ..NodeGroup::default()
    };

    /// Environment map sampled along the reflection vector, tinted, then
    /// `mix(c, c * c, contrast)` and saturation adjusted.
    pub static ENVMAP_SAMPLE: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::TEX_COORD,
                id: "coord",
                ..Node::default()
            },
            Node {
                kind: &nodes::TEX_ENVIRONMENT,
                id: "envmap",
                links: &[(
                    Name("Vector"),
                    NodeSocketRef::new("coord", Name("Reflection")),
                )],
                ..Node::default()
            },
            Node {
                kind: &nodes::MIX_RGB,
                id: "tint",
                properties: &[("blend_type", Value::Enum("MULTIPLY"))],
                values: &[(Name("Fac"), Value::Float(1.0))],
                links: &[(Name("Color1"), NodeSocketRef::new("envmap", Name("Color")))],
            },
            Node {
                kind: &nodes::MIX_RGB,
                id: "square",
                properties: &[("blend_type", Value::Enum("MULTIPLY"))],
                values: &[(Name("Fac"), Value::Float(1.0))],
                links: &[
                    (Name("Color1"), NodeSocketRef::new("tint", Name("Color"))),
                    (Name("Color2"), NodeSocketRef::new("tint", Name("Color"))),
                ],
            },
            Node {
                kind: &nodes::MIX_RGB,
                id: "contrast",
                properties: &[("blend_type", Value::Enum("MIX"))],
                links: &[
                    (Name("Color1"), NodeSocketRef::new("tint", Name("Color"))),
                    (Name("Color2"), NodeSocketRef::new("square", Name("Color"))),
                ],
                ..Node::default()
            },
            Node {
                kind: &nodes::HUE_SATURATION,
                id: "saturation",
                values: &[
                    (Name("Hue"), Value::Float(0.5)),
                    (Name("Value"), Value::Float(1.0)),
                    (Name("Fac"), Value::Float(1.0)),
                ],
                links: &[(Name("Color"), NodeSocketRef::new("contrast", Name("Color")))],
                ..Node::default()
            },
        ],
        properties: &[
            ("image", Ref::new("envmap", "image")),
            ("interpolation", Ref::new("envmap", "interpolation")),
        ],
        inputs: &[
            ("tint", NodeSocketRef::new("tint", Name("Color2"))),
            ("contrast", NodeSocketRef::new("contrast", Name("Fac"))),
            (
                "saturation",
                NodeSocketRef::new("saturation", Name("Saturation")),
            ),
        ],
        outputs: &[("color", NodeSocketRef::new("saturation", Name("Color")))],
    };

    /// Diffuse lighting of a white surface looked up in a 1D warp ramp, overlaid
    /// on the albedo. The lookup stops short of 1 so the ramp edge isn't wrapped.
    pub static LIGHTWARP: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::DIFFUSE_BSDF,
                id: "diffuse",
                values: &[
                    (Name("Color"), Value::Color([1.0, 1.0, 1.0, 1.0])),
                    (Name("Roughness"), Value::Float(0.0)),
                ],
                ..Node::default()
            },
            Node {
                kind: &nodes::SHADER_TO_RGB,
                id: "lit",
                links: &[(Position(0), NodeSocketRef::new("diffuse", Position(0)))],
                ..Node::default()
            },
            Node {
                kind: &nodes::MAP_RANGE,
                id: "range",
                properties: &[("clamp", Value::Bool(true))],
                values: &[
                    (Name("From Min"), Value::Float(0.0)),
                    (Name("From Max"), Value::Float(1.0)),
                    (Name("To Min"), Value::Float(0.0)),
                    (Name("To Max"), Value::Float(0.995)),
                ],
                links: &[(Name("Value"), NodeSocketRef::new("lit", Name("Color")))],
            },
            Node {
                kind: &nodes::COMBINE_XYZ,
                id: "uv",
                values: &[(Name("Y"), Value::Float(0.5))],
                links: &[(Name("X"), NodeSocketRef::new("range", Position(0)))],
                ..Node::default()
            },
            Node {
                kind: &nodes::TEX_IMAGE,
                id: "ramp",
                properties: &[("extension", Value::Enum("EXTEND"))],
                links: &[(Name("Vector"), NodeSocketRef::new("uv", Name("Vector")))],
                ..Node::default()
            },
            Node {
                kind: &nodes::MIX_RGB,
                id: "overlay",
                properties: &[("blend_type", Value::Enum("OVERLAY"))],
                values: &[(Name("Fac"), Value::Float(1.0))],
                links: &[(Name("Color2"), NodeSocketRef::new("ramp", Name("Color")))],
            },
        ],
        properties: &[
            ("image", Ref::new("ramp", "image")),
            ("interpolation", Ref::new("ramp", "interpolation")),
        ],
        inputs: &[("color", NodeSocketRef::new("overlay", Name("Color1")))],
        outputs: &[
            ("color", NodeSocketRef::new("overlay", Name("Color"))),
            ("ramp", NodeSocketRef::new("ramp", Name("Color"))),
        ],
    };

    /// `strength * fresnel(ior)`
    pub static ENVMAP_FRESNEL: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::FRESNEL,
                id: "fresnel",
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "mul",
                properties: &[("operation", Value::Enum("MULTIPLY"))],
                links: &[(Position(1), NodeSocketRef::new("fresnel", Name("Fac")))],
                ..Node::default()
            },
        ],
        inputs: &[
            ("ior", NodeSocketRef::new("fresnel", Name("IOR"))),
            ("strength", NodeSocketRef::new("mul", Position(0))),
        ],
        outputs: &[("strength", NodeSocketRef::new("mul", Position(0)))],
        ..NodeGroup::default()
    };

    /// `clamp(clamp(N.V)^exponent * max + min)`
    pub static SELF_ILLUM_FRESNEL: NodeGroup = NodeGroup {
        nodes: &[
            Node {
                kind: &nodes::NEW_GEOMETRY,
                id: "geometry",
                ..Node::default()
            },
            Node {
                kind: &nodes::VECTOR_MATH,
                id: "facing",
                properties: &[("operation", Value::Enum("DOT_PRODUCT"))],
                links: &[
                    (Position(0), NodeSocketRef::new("geometry", Name("Normal"))),
                    (Position(1), NodeSocketRef::new("geometry", Name("Incoming"))),
                ],
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "clamped",
                properties: &[
                    ("operation", Value::Enum("ADD")),
                    ("use_clamp", Value::Bool(true)),
                ],
                values: &[(Position(1), Value::Float(0.0))],
                links: &[(Position(0), NodeSocketRef::new("facing", Position(1)))],
            },
            Node {
                kind: &nodes::MATH,
                id: "power",
                properties: &[("operation", Value::Enum("POWER"))],
                links: &[(Position(0), NodeSocketRef::new("clamped", Position(0)))],
                ..Node::default()
            },
            Node {
                kind: &nodes::MATH,
                id: "scale",
                properties: &[
                    ("operation", Value::Enum("MULTIPLY_ADD")),
                    ("use_clamp", Value::Bool(true)),
                ],
                links: &[(Position(0), NodeSocketRef::new("power", Position(0)))],
                ..Node::default()
            },
        ],
        inputs: &[
            ("exponent", NodeSocketRef::new("power", Position(1))),
            ("range", NodeSocketRef::new("scale", Position(1))),
            ("min", NodeSocketRef::new("scale", Position(2))),
        ],
        outputs: &[("value", NodeSocketRef::new("scale", Position(0)))],
        ..NodeGroup::default()
    };
}

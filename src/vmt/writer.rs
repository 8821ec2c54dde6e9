use crate::asset::material::ParameterModel;

/// Serializes a model as a VertexLitGeneric material. Only parameters that
/// differ from their defaults are written. Quotes inside values are written
/// as `\"`.
pub fn write(model: &ParameterModel) -> String {
    let body: String = model
        .changed_parameters()
        .into_iter()
        .map(|(name, value)| {
            let value = value.replace('"', "\\\"");
            format!("\t\"{name}\" \"{value}\"\n")
        })
        .collect();

    format!("\"VertexLitGeneric\"\n{{\n{body}}}\n")
}

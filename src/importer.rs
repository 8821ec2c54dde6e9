use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use tracing::{debug, debug_span, error, info, warn};

use crate::{
    asset::material::{build_material, BuiltMaterialData, ParameterModel, Settings},
    error::{ImportError, Warning},
    filesystem::{derive_search_roots, CachedResolver, TextureCache, TextureResolver},
    graph::ShaderGraph,
    vmt,
};

const SUPPORTED_SHADER: &str = "VertexLitGeneric";

/// Outcome of importing several materials.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub applied: Vec<PathBuf>,
    pub warnings: Vec<(PathBuf, Warning)>,
    pub errors: Vec<(PathBuf, ImportError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Imports materials into host graphs, sharing one texture cache.
#[derive(Debug)]
pub struct Importer {
    resolver: TextureResolver,
    settings: Settings,
    cache: TextureCache,
}

impl Importer {
    pub fn new(resolver: TextureResolver, settings: Settings) -> Self {
        Self {
            resolver,
            settings,
            cache: TextureCache::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn resolver(&self) -> &TextureResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    /// Forgets every texture resolved so far.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Builds the node list of a material without touching any graph.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `text` is not valid VMT.
    pub fn prepare(
        &mut self,
        name: &str,
        text: &str,
    ) -> Result<(BuiltMaterialData, Vec<Warning>), ImportError> {
        let raw = vmt::parse(text).map_err(|source| ImportError::Parse {
            name: name.to_owned(),
            source,
        })?;

        let mut warnings = Vec::new();

        if !raw.name().eq_ignore_ascii_case(SUPPORTED_SHADER) {
            let warning = Warning::UnsupportedShader(raw.name().to_owned());
            warn!("material `{}`: {}", name, warning);
            warnings.push(warning);
        }

        let mut parameter_warnings = Vec::new();
        let model = ParameterModel::build(&raw, &mut parameter_warnings);
        warnings.extend(parameter_warnings.into_iter().map(Warning::from));

        let mut lookup = CachedResolver {
            resolver: &self.resolver,
            cache: &mut self.cache,
        };
        let built = build_material(&model, &mut lookup, &self.settings, &mut warnings);

        debug!(
            "material `{}` built with {} nodes",
            name,
            built.nodes().len()
        );

        Ok((built, warnings))
    }

    /// Imports a material from VMT text into `graph`.
    ///
    /// The graph is only modified once the material has been built completely.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `text` is not valid VMT. `graph` is left untouched then.
    pub fn import_str<G: ShaderGraph + ?Sized>(
        &mut self,
        name: &str,
        text: &str,
        graph: &mut G,
    ) -> Result<Vec<Warning>, ImportError> {
        let _span = debug_span!("import", material = name).entered();

        let start = Instant::now();
        info!("importing material `{}`...", name);

        let (built, warnings) = self.prepare(name, text)?;
        built.apply(graph);

        info!(
            "material imported in {:.2} s",
            start.elapsed().as_secs_f32()
        );

        Ok(warnings)
    }

    /// Imports a material file into `graph`. Textures are also searched for
    /// relative to the file's location.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file can't be read or is not valid VMT.
    pub fn import_file<G: ShaderGraph + ?Sized>(
        &mut self,
        path: &Path,
        graph: &mut G,
    ) -> Result<Vec<Warning>, ImportError> {
        let text = fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let declared = self.resolver.roots().to_vec();
        self.resolver
            .set_roots(derive_search_roots(path, &declared));

        let result = self.import_str(&path.display().to_string(), &text, graph);

        self.resolver.set_roots(declared);

        result
    }

    /// Imports every material file into its graph. A failing material is
    /// recorded and the batch continues with the next one.
    pub fn import_batch<'g, G>(
        &mut self,
        materials: impl IntoIterator<Item = (PathBuf, &'g mut G)>,
    ) -> BatchReport
    where
        G: ShaderGraph + ?Sized + 'g,
    {
        let start = Instant::now();
        let mut report = BatchReport::default();

        for (path, graph) in materials {
            match self.import_file(&path, graph) {
                Ok(warnings) => {
                    report
                        .warnings
                        .extend(warnings.into_iter().map(|w| (path.clone(), w)));
                    report.applied.push(path);
                }
                Err(err) => {
                    error!("{}", err);
                    report.errors.push((path, err));
                }
            }
        }

        info!(
            "{} materials imported, {} failed in {:.2} s",
            report.applied.len(),
            report.errors.len(),
            start.elapsed().as_secs_f32()
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;

    fn importer() -> Importer {
        Importer::new(TextureResolver::new(Vec::new()), Settings::default())
    }

    #[test]
    fn parse_error_leaves_graph_untouched() {
        let mut graph = MemoryGraph::new();
        let mut importer = importer();

        importer
            .import_str("good", "\"VertexLitGeneric\" { \"$phong\" \"1\" }", &mut graph)
            .unwrap();
        let before = graph.topology();

        let err = importer
            .import_str("bad", "\"VertexLitGeneric\" { \"$phong\" ", &mut graph)
            .unwrap_err();

        assert!(matches!(err, ImportError::Parse { .. }));
        assert_eq!(graph.topology(), before);
    }

    #[test]
    fn other_shaders_import_with_warning() {
        let mut graph = MemoryGraph::new();

        let warnings = importer()
            .import_str("lit", "\"LightmappedGeneric\" { }", &mut graph)
            .unwrap();

        assert_eq!(
            warnings,
            vec![Warning::UnsupportedShader("LightmappedGeneric".to_owned())]
        );
        assert!(graph.find_node("ShaderNodeBsdfPrincipled").is_some());
    }

    #[test]
    fn shader_name_is_case_insensitive() {
        let (_, warnings) = importer()
            .prepare("lower", "vertexlitgeneric { }")
            .unwrap();

        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut graph = MemoryGraph::new();

        let err = importer()
            .import_file(Path::new("/nonexistent/material.vmt"), &mut graph)
            .unwrap_err();

        assert!(matches!(err, ImportError::Io { .. }));
        assert_eq!(graph.node_count(), 0);
    }
}

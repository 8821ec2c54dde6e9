use std::{
    collections::HashMap,
    ffi::OsString,
    fmt, io,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, warn};

/// Extensions the host can load directly, in order of preference.
const BITMAP_EXTENSIONS: &[&str] = &["tga", "png", "jpg", "jpeg", "bmp"];
/// Container formats that need conversion first.
const SOURCE_EXTENSIONS: &[&str] = &["vtf", "dds"];
const CONVERTED_EXTENSION: &str = "tga";

/// Texture reference as written in a material, relative to a `materials` directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TexturePath(String);

impl TexturePath {
    /// Normalizes separators and strips quotes, empty components and a leading
    /// `materials/`. Returns `None` for an empty path.
    pub fn new(path: &str) -> Option<Self> {
        let path = path.trim().trim_matches('"').replace('\\', "/");

        let mut components = path
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .peekable();

        if components
            .peek()
            .map_or(false, |c| c.eq_ignore_ascii_case("materials"))
        {
            components.next();
        }

        let normalized = components.join("/");

        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Lower-cased extension, if it is one of the known image extensions.
    pub fn extension(&self) -> Option<String> {
        let (_, extension) = self.file_name().rsplit_once('.')?;
        let extension = extension.to_ascii_lowercase();

        if BITMAP_EXTENSIONS.contains(&extension.as_str())
            || SOURCE_EXTENSIONS.contains(&extension.as_str())
        {
            Some(extension)
        } else {
            None
        }
    }

    /// `env_cubemap` names the scene cubemap, not a file.
    pub fn is_scene_cubemap(&self) -> bool {
        self.0.eq_ignore_ascii_case("env_cubemap")
    }
}

impl fmt::Display for TexturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(PathBuf),
    Converted { source: PathBuf, converted: PathBuf },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureReference {
    pub path: TexturePath,
    pub resolution: Resolution,
}

impl TextureReference {
    /// The file the host should load, if any.
    pub fn file(&self) -> Option<&Path> {
        match &self.resolution {
            Resolution::Found(file) => Some(file),
            Resolution::Converted { converted, .. } => Some(converted),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.resolution != Resolution::NotFound
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionWarning {
    #[error("texture `{path}` not found, using a placeholder")]
    NotFound { path: String },
    #[error("texture `{path}`: converting `{}` failed: {reason}", .file.display())]
    ConversionFailed {
        path: String,
        file: PathBuf,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Converts a texture container into a format the host can load.
pub trait TextureConverter {
    /// Decodes `source` and writes it to `target`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the source can't be decoded or the target can't be written.
    fn convert(&self, source: &Path, target: &Path) -> Result<(), ConversionError>;
}

/// Converts anything the `image` crate can decode into TGA.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageConverter;

impl TextureConverter for ImageConverter {
    fn convert(&self, source: &Path, target: &Path) -> Result<(), ConversionError> {
        let image = image::open(source)?;
        image.save_with_format(target, image::ImageFormat::Tga)?;

        Ok(())
    }
}

/// Resolutions of one import batch, keyed by the search roots and the
/// lower-cased texture path.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<(Vec<PathBuf>, String), TextureReference>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

pub struct TextureResolver {
    roots: Vec<PathBuf>,
    converter: Box<dyn TextureConverter>,
}

impl fmt::Debug for TextureResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureResolver")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl TextureResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            converter: Box::new(ImageConverter),
        }
    }

    #[must_use]
    pub fn with_converter(mut self, converter: impl TextureConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn set_roots(&mut self, roots: Vec<PathBuf>) {
        self.roots = roots;
    }

    /// Resolves a texture against the search roots, in order. The first root
    /// with a usable file wins.
    pub fn resolve(
        &self,
        path: &TexturePath,
        cache: &mut TextureCache,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> TextureReference {
        // roots change per material file, the same path may resolve elsewhere
        let key = (self.roots.clone(), path.as_str().to_ascii_lowercase());

        if let Some(cached) = cache.entries.get(&key) {
            if !cached.is_found() {
                let warning = ResolutionWarning::NotFound {
                    path: path.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }

            return cached.clone();
        }

        let reference = self.resolve_uncached(path, warnings);
        cache.entries.insert(key, reference.clone());

        reference
    }

    fn resolve_uncached(
        &self,
        path: &TexturePath,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> TextureReference {
        let extension = path.extension();

        for root in &self.roots {
            let candidates = [
                root.join(path.as_str()),
                root.join("materials").join(path.as_str()),
                root.join(path.file_name()),
            ];

            for candidate in candidates.into_iter().unique() {
                debug!("trying texture candidate `{}`", candidate.display());

                if let Some(resolution) =
                    self.resolve_candidate(path, &candidate, extension.as_deref(), warnings)
                {
                    debug!("texture `{}` resolved to {:?}", path, resolution);
                    return TextureReference {
                        path: path.clone(),
                        resolution,
                    };
                }
            }
        }

        let warning = ResolutionWarning::NotFound {
            path: path.to_string(),
        };
        warn!("{}", warning);
        warnings.push(warning);

        TextureReference {
            path: path.clone(),
            resolution: Resolution::NotFound,
        }
    }

    fn resolve_candidate(
        &self,
        path: &TexturePath,
        candidate: &Path,
        extension: Option<&str>,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> Option<Resolution> {
        if let Some(extension) = extension {
            if BITMAP_EXTENSIONS.contains(&extension) && candidate.is_file() {
                return Some(Resolution::Found(candidate.to_path_buf()));
            }
        }

        let stem = if extension.is_some() {
            candidate.with_extension("")
        } else {
            candidate.to_path_buf()
        };

        for extension in BITMAP_EXTENSIONS {
            let file = with_extension(&stem, extension);

            if file.is_file() {
                return Some(Resolution::Found(file));
            }
        }

        for extension in SOURCE_EXTENSIONS {
            let source = with_extension(&stem, extension);

            if !source.is_file() {
                continue;
            }

            let converted = with_extension(&stem, CONVERTED_EXTENSION);

            match self.converter.convert(&source, &converted) {
                Ok(()) => return Some(Resolution::Converted { source, converted }),
                Err(err) => {
                    let warning = ResolutionWarning::ConversionFailed {
                        path: path.to_string(),
                        file: source,
                        reason: err.to_string(),
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        None
    }
}

/// Appends an extension without touching dots already in the file name.
fn with_extension(stem: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(stem.as_os_str());
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

/// Texture lookup used while building a material.
pub trait TextureLookup {
    fn lookup(
        &mut self,
        path: &TexturePath,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> TextureReference;
}

/// A resolver paired with the cache of the current batch.
pub struct CachedResolver<'a> {
    pub resolver: &'a TextureResolver,
    pub cache: &'a mut TextureCache,
}

impl TextureLookup for CachedResolver<'_> {
    fn lookup(
        &mut self,
        path: &TexturePath,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> TextureReference {
        self.resolver.resolve(path, self.cache, warnings)
    }
}

/// Search roots for a material file: its own directory, the content root
/// above every `materials` directory in its path, then `declared`.
pub fn derive_search_roots(material_file: &Path, declared: &[PathBuf]) -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(directory) = material_file.parent() {
        roots.push(directory.to_path_buf());
    }

    for ancestor in material_file.ancestors().skip(1) {
        let is_materials = ancestor
            .file_name()
            .map_or(false, |name| name.eq_ignore_ascii_case("materials"));

        if is_materials {
            if let Some(content_root) = ancestor.parent() {
                roots.push(content_root.to_path_buf());
            }
        }
    }

    roots.extend(declared.iter().cloned());
    roots.into_iter().unique().collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use image::GenericImageView;

    use super::*;

    struct CopyConverter;

    impl TextureConverter for CopyConverter {
        fn convert(&self, source: &Path, target: &Path) -> Result<(), ConversionError> {
            fs::copy(source, target)?;
            Ok(())
        }
    }

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"texture").unwrap();
        path
    }

    fn texture(path: &str) -> TexturePath {
        TexturePath::new(path).unwrap()
    }

    #[test]
    fn normalizes_texture_paths() {
        assert_eq!(
            texture("\"Materials\\models\\metal\\plate01\"").as_str(),
            "models/metal/plate01"
        );
        assert_eq!(texture("/models//a/./b.VTF").as_str(), "models/a/b.VTF");
        assert_eq!(texture("models/a/b.VTF").extension().as_deref(), Some("vtf"));
        assert_eq!(texture("models/a.b/c").extension(), None);
        assert!(TexturePath::new("  ").is_none());
        assert!(texture("ENV_CUBEMAP").is_scene_cubemap());
    }

    #[test]
    fn prefers_pre_converted_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "models/metal/plate01.vtf");
        let png = touch(dir.path(), "models/metal/plate01.png");

        let resolver =
            TextureResolver::new(vec![dir.path().to_path_buf()]).with_converter(CopyConverter);
        let mut warnings = Vec::new();
        let reference = resolver.resolve(
            &texture("models/metal/plate01"),
            &mut TextureCache::new(),
            &mut warnings,
        );

        assert_eq!(reference.resolution, Resolution::Found(png));
        assert!(warnings.is_empty());
    }

    #[test]
    fn exact_bitmap_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/b.tga");
        let jpg = touch(dir.path(), "a/b.jpg");

        let resolver = TextureResolver::new(vec![dir.path().to_path_buf()]);
        let reference =
            resolver.resolve(&texture("a/b.jpg"), &mut TextureCache::new(), &mut Vec::new());

        assert_eq!(reference.file(), Some(jpg.as_path()));
    }

    #[test]
    fn converts_source_container_once() {
        let dir = tempfile::tempdir().unwrap();
        let vtf = touch(dir.path(), "materials/models/skin.vtf");

        let resolver =
            TextureResolver::new(vec![dir.path().to_path_buf()]).with_converter(CopyConverter);
        let reference = resolver.resolve(
            &texture("models/skin"),
            &mut TextureCache::new(),
            &mut Vec::new(),
        );

        let tga = dir.path().join("materials/models/skin.tga");
        assert_eq!(
            reference.resolution,
            Resolution::Converted {
                source: vtf,
                converted: tga.clone()
            }
        );
        assert!(tga.is_file());

        // a fresh batch finds the converted file directly
        let reference = resolver.resolve(
            &texture("models/skin"),
            &mut TextureCache::new(),
            &mut Vec::new(),
        );
        assert_eq!(reference.resolution, Resolution::Found(tga));
    }

    #[test]
    fn failed_conversion_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "broken.vtf");

        let resolver = TextureResolver::new(vec![dir.path().to_path_buf()]);
        let mut warnings = Vec::new();
        let reference =
            resolver.resolve(&texture("broken"), &mut TextureCache::new(), &mut warnings);

        assert_eq!(reference.resolution, Resolution::NotFound);
        assert!(matches!(
            warnings.as_slice(),
            [
                ResolutionWarning::ConversionFailed { .. },
                ResolutionWarning::NotFound { .. }
            ]
        ));
    }

    #[test]
    fn not_found_is_cached_and_warned_every_time() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = TextureResolver::new(vec![dir.path().to_path_buf()]);
        let mut cache = TextureCache::new();

        let mut first = Vec::new();
        let mut second = Vec::new();
        resolver.resolve(&texture("missing/tex"), &mut cache, &mut first);
        let reference = resolver.resolve(&texture("MISSING/tex"), &mut cache, &mut second);

        assert_eq!(cache.len(), 1);
        assert!(!reference.is_found());
        assert_eq!(
            second,
            vec![ResolutionWarning::NotFound {
                path: "MISSING/tex".to_owned()
            }]
        );
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn cache_is_separate_per_root_set() {
        let missing = tempfile::tempdir().unwrap();
        let present = tempfile::tempdir().unwrap();
        let expected = touch(present.path(), "skin.tga");

        let mut resolver = TextureResolver::new(vec![missing.path().to_path_buf()]);
        let mut cache = TextureCache::new();

        let first = resolver.resolve(&texture("skin"), &mut cache, &mut Vec::new());
        resolver.set_roots(vec![present.path().to_path_buf()]);
        let second = resolver.resolve(&texture("skin"), &mut cache, &mut Vec::new());

        assert!(!first.is_found());
        assert_eq!(second.file(), Some(expected.as_path()));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn earlier_roots_win() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(second.path(), "t.png");
        let expected = touch(first.path(), "t.tga");

        let resolver = TextureResolver::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let reference = resolver.resolve(&texture("t"), &mut TextureCache::new(), &mut Vec::new());

        assert_eq!(reference.file(), Some(expected.as_path()));
    }

    #[test]
    fn image_converter_writes_tga() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.png");
        let target = dir.path().join("target.tga");
        image::RgbaImage::new(2, 2).save(&source).unwrap();

        ImageConverter.convert(&source, &target).unwrap();

        let converted = image::open(&target).unwrap();
        assert_eq!(converted.dimensions(), (2, 2));
    }

    #[test]
    fn search_roots_from_material_location() {
        let roots = derive_search_roots(
            Path::new("/game/hl2/materials/models/metal/plate01.vmt"),
            &[PathBuf::from("/game/extra"), PathBuf::from("/game/hl2")],
        );

        assert_eq!(
            roots,
            vec![
                PathBuf::from("/game/hl2/materials/models/metal"),
                PathBuf::from("/game/hl2"),
                PathBuf::from("/game/extra"),
            ]
        );
    }
}

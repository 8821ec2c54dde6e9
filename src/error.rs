use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{asset::material::ParameterWarning, filesystem::ResolutionWarning, vmt::ParseError};

/// Non-fatal problem found while importing a material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error(transparent)]
    Parameter(#[from] ParameterWarning),
    #[error(transparent)]
    Resolution(#[from] ResolutionWarning),
    #[error("shader `{0}` is not VertexLitGeneric, importing it as one")]
    UnsupportedShader(String),
}

/// Failure that aborts the import of one material.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse `{name}`: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },
}

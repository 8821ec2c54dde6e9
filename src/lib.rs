#![warn(clippy::all, clippy::pedantic, clippy::multiple_crate_versions)]
// this doesn't matter
#![allow(clippy::cast_precision_loss)]
// this is annoying
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod error;
pub mod filesystem;
pub mod graph;
pub mod importer;
pub mod vmt;

use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::{
    fmt::{format, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
};

pub use crate::{
    asset::material::{
        build_material, BuiltMaterialData, ParameterModel, Settings, TextureInterpolation,
    },
    error::{ImportError, Warning},
    filesystem::{TextureCache, TextureResolver},
    graph::{MemoryGraph, ShaderGraph},
    importer::{BatchReport, Importer},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

struct VertexLitLogFormatter;

impl<S, N> FormatEvent<S, N> for VertexLitLogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(&mut writer, "[VertexLit] [{}] ", metadata.level())?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Installs the global log subscriber. Does nothing if one is already set.
pub fn initialize_logger() {
    let layer = tracing_subscriber::fmt::layer().event_format(VertexLitLogFormatter);

    #[cfg(feature = "trace")]
    {
        let registry = tracing_subscriber::registry()
            .with(tracing_tracy::TracyLayer::new())
            .with(layer);

        let _ = tracing::subscriber::set_global_default(registry);
    }

    #[cfg(all(feature = "normal_logging", not(feature = "trace")))]
    {
        let registry = tracing_subscriber::registry().with(layer);
        let _ = tracing::subscriber::set_global_default(registry);
    }
}

mod config;
mod engine;
mod error;
mod fs_ops;
mod lookup;
mod media;
mod mover;
mod probe;
mod sanitize;
mod scan;
mod sidecar;
mod template;
mod undo;

pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
};
pub use engine::{
    AssetOutcome, AssetReport, BatchCounts, BatchRequest, BatchResult, BatchSummary, CancelToken,
    EngineOptions, ProgressObserver, RenameEngine, RunControl, DEFAULT_LANGUAGE,
    DEFAULT_MAX_FILENAME_LEN,
};
pub use error::{
    FailureReason, MetadataReadError, MoveError, PatternError, SidecarWriteError, SkipReason,
    UndoFailure,
};
pub use fs_ops::{FileSystem, LocalFs, MemoryFs};
pub use lookup::{enrich_details, parse_omdb_response, MovieLookup, MovieMatch, OmdbClient};
pub use media::{media_extension, DetailFields, MediaAsset, MediaMetadata, MediaType};
pub use mover::move_to_dir;
pub use probe::{
    parse_ffprobe_json, parse_mediainfo_json, MediaProbe, MetadataExtractor, ProbeBackend,
};
pub use scan::{collect_assets, ScanOptions, ScanStats};
pub use sidecar::{emit as emit_sidecar, render_movie_nfo, sidecar_path_for};
pub use template::{
    format_stem, parse_pattern, render_pattern, validate_pattern, NamingPattern, PatternPart,
    Placeholder, PlaceholderTable, DEFAULT_PATTERN,
};
pub use undo::{RenameAction, RenameBatch, UndoEntry, UndoOutcome, UndoResult, UndoStack};

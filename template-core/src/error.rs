use std::time::Duration;

use thiserror::Error;

/// Failure of a bounded retry loop or a timeout guard.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetryError {
    #[error("gave up after {attempts} attempts: {reason}")]
    Exhausted { attempts: u32, reason: String },
    #[error("{what} timed out after {}ms", after.as_millis())]
    TimedOut { what: &'static str, after: Duration },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("could not read file: {0}")]
    Read(String),
    #[error("document could not be decoded: {0}")]
    Corrupt(String),
    #[error("document has no pages")]
    Empty,
    #[error(transparent)]
    Timeout(#[from] RetryError),
    #[error("first page failed to render: {0}")]
    FirstPage(#[from] RenderError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("page {page} is out of range 1..={total}")]
    InvalidPage { page: u32, total: u32 },
    #[error("page {page} failed to render: {reason}")]
    Failed { page: u32, reason: String },
    #[error(transparent)]
    Timeout(#[from] RetryError),
}

/// Problems with what the user handed us. These are reported immediately and
/// abort the operation without touching state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("expected {expected}, got {got:?}")]
    WrongFileType { expected: &'static str, got: String },
    #[error("Please import a template image or PDF first.")]
    NoImage,
    #[error("Please add at least one parameter before saving the template.")]
    NoParameters,
    #[error("name must not be empty")]
    EmptyName,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid template JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("page image {page} is not valid base64: {source}")]
    Binary {
        page: u32,
        #[source]
        source: base64::DecodeError,
    },
    #[error("not a data URI")]
    NotDataUri,
    #[error("template contains no page images")]
    NoPages,
    #[error(transparent)]
    Input(#[from] InputError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("{0} is not mounted")]
    NotMounted(&'static str),
    #[error("image is not decoded yet")]
    NotDecoded,
    #[error("layout has zero size")]
    ZeroSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("canvas element is not mounted")]
    NotMounted,
    #[error("canvas element has no layout yet")]
    NoLayout,
    #[error("drawing surface is not initialised")]
    NotReady,
    #[error("2d context unavailable: {0}")]
    Context(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no section with id {0}")]
    UnknownSection(u32),
    #[error("no parameter at index {index} on {page}")]
    NoSuchParameter { page: String, index: usize },
    #[error("page {page} is out of range 1..={total}")]
    PageOutOfRange { page: u32, total: u32 },
    #[error("page {0} has not been rendered")]
    PageNotRendered(u32),
    #[error("parameters on page {0} can only be edited while it is the current page")]
    NotCurrentPage(u32),
    #[error("section has no document")]
    NoDocument,
    #[error("the last section cannot be removed")]
    LastSection,
}

/// Why the overlay could not be placed over its page image yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

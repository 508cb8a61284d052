//! Core of the template authoring tool: parameter model, overlay geometry,
//! drawing surface lifecycle, drag-to-select and the per-section state that
//! ties them together. Nothing in here touches the DOM; the web crate plugs
//! in through [`surface::SurfaceHost`], [`geometry::LayoutProbe`] and
//! [`documents::DocumentRenderer`].

pub mod binding;
pub mod config;
pub mod documents;
pub mod error;
pub mod geometry;
pub mod model;
pub mod overlay;
pub mod retry;
pub mod scene;
pub mod section;
pub mod selection;
pub mod surface;
pub mod template;
pub mod workspace;

pub use error::{
    EditError, GeometryError, InputError, LoadError, RenderError, RetryError, SurfaceError,
    SyncError, TemplateError,
};
pub use geometry::{GeometryRectangle, Rect};
pub use model::{Anchor, Coord, ParamType, Parameter};
pub use section::{Section, SectionId};
pub use workspace::Workspace;

pub mod actions;
pub mod canvas;
pub mod components;
pub mod dom;
pub mod overlays;
pub mod pdf;
pub mod state;

pub use components::app::App;

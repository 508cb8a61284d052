pub mod app;
pub mod capture_screen;
pub mod loading_overlay;
pub mod page_viewer;
pub mod params_table;
pub mod section_canvas;
pub mod section_panel;
pub mod template_editor;

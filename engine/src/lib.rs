pub mod app;
pub mod golden;
pub mod graphics;
pub mod pixels_renderer;
pub mod surface;
pub mod ui;

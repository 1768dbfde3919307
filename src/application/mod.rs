// Application layer - state engine, frame pipeline and feeds
pub mod chart_renderer;
pub mod data_store;
pub mod drawing_surface;
pub mod feed;
pub mod frame_composer;
pub mod frame_painter;
pub mod interaction;
pub mod layout;
pub mod visualizer;

pub mod config;
pub mod error;
pub mod events;
pub mod frames;
pub mod host;
pub mod motion;
pub mod overlay;
pub mod progress;
pub mod processing {
    pub mod layout;
}
pub mod render {
    pub mod canvas;
    pub mod renderer;
    pub mod surface;
}
pub mod tasks {
    pub mod preloader;
    pub mod scroll;
    pub mod viewer;
}

pub mod config;
pub mod error;
pub mod playlist;
pub mod scan;
pub mod animation {
    pub mod clock;
    pub mod engine;
}
pub mod render {
    pub mod loader;
    pub mod viewer;
}

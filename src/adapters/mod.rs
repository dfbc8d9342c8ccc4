//! Adapters - Concrete implementations of the ports and process plumbing

pub mod exec_ffmpeg;
pub mod fetch_local;
pub mod probe_ffprobe;
pub mod toml_config;

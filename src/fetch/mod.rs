// src/fetch/mod.rs

pub mod archive;
pub mod zips;

pub use archive::ArchiveReader;
pub use zips::fetch_archive;

pub mod active_set;
pub mod beat;
pub mod combo;
pub mod engine;
pub mod entity;
pub mod generator;
pub mod matcher;
pub mod meter;
pub mod notify;
pub mod timeline;
pub mod track;

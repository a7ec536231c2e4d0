pub mod bucket;
pub mod demo;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod ports;
pub mod report;
pub mod summary;

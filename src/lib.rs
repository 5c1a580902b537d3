pub mod aggregate;
pub mod annotate;
pub mod assemble;
pub mod chunk;
pub mod cli;
pub mod codec;
pub mod context;
pub mod error;
pub mod generate;
pub mod html;
pub mod model;
pub mod parsers;
pub mod rollup;
pub mod sort;

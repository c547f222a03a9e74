//! StyleMuse: a guided styling wizard. Upload a photo, describe the occasion,
//! pick a style direction, and get AI-rendered outfit looks to refine and
//! accessorize.

pub mod config;
pub mod demo;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod image_input;
pub mod looks;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod pipeline;
pub mod routes;
pub mod session;
pub mod stylist;
pub mod view;
pub mod wizard;

// tests/integration/main.rs
//
// Task actions against throwaway projects, using only shell built-ins as
// external tools.

mod assets;
mod lint;
mod pipeline;
mod scripts;
mod serve;
mod styles;
mod templates;

//! Configuration section definitions.
//!
//! Each module corresponds to a section in `plugsmith.toml`:
//!
//! | Module  | TOML Section | Purpose                                    |
//! |---------|--------------|--------------------------------------------|
//! | `build` | `[build]`    | Plugin source root, output, exclude filter |
//! | `serve` | `[serve]`    | Preview server, live reload, watcher       |

mod build;
mod serve;

pub use build::BuildConfig;
pub use serve::ServeConfig;

// ─── Wurm Launcher Core ───
// Bootstraps a Wurm Online installation and launches the client.
//
// Architecture:
//   core/
//     paths       — Data/config directory layout
//     settings    — Persisted user configuration and option presets
//     state       — Record of staged artifacts + state lock
//     platform    — OS/arch identifiers per upstream
//     http        — Shared HTTP client
//     source      — Artifact resolution (manifest, Adoptium, Gluon)
//     downloader  — Verified downloads through a temp file
//     archive     — zip / tar.gz staging
//     manifest    — Wurm client manifest model
//     bootstrap   — Environment bootstrapper
//     profile     — Launch profile + option table
//     steam       — Steam detection
//     process     — Pid liveness and signal delivery
//     launch      — Command composition and process supervision

pub mod archive;
pub mod bootstrap;
pub mod downloader;
pub mod error;
pub mod http;
pub mod launch;
pub mod manifest;
pub mod paths;
pub mod platform;
pub mod process;
pub mod profile;
pub mod settings;
pub mod source;
pub mod state;
pub mod steam;

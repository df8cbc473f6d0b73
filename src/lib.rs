#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::struct_excessive_bools,
    clippy::wildcard_imports,
    clippy::too_many_lines,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::fn_params_excessive_bools,
    clippy::too_many_arguments,
    clippy::doc_markdown
)]

pub mod app;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod dialog;
pub mod events;
pub mod fetchable;
pub mod gh;
pub mod input;
pub mod logviewer;
pub mod model;
pub mod poller;
pub mod runner;
pub mod search;
pub mod task;
pub mod traits;
pub mod tui;

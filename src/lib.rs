#![warn(clippy::all, rust_2018_idioms)]

mod app;
mod fetch;
mod form;
mod options;
mod request;

pub use app::ExportApp;

//! # strand_html
//!
//! Streaming HTML templates with out-of-order async resolution.
//!
//! A [`Template`] is an ordered sequence of trusted literal segments and
//! interpolated values. Values may be plain text (escaped), raw markup,
//! lists, nested templates, renderables, or pending async values. Three
//! renderers consume a template:
//!
//! - [`render`] returns the static shell at once, with a `<slot>`
//!   placeholder for every pending value;
//! - [`render_async`] waits for every pending value, including those
//!   discovered inside resolved content, and returns the final document;
//! - [`render_stream`] yields the shell first and then one
//!   `<template id="…_content">` chunk per slot, in completion order.
//!
//! The async renderers spawn slot futures with `tokio::spawn` and must run
//! inside a tokio runtime.
//!
//! ## Example
//!
//! ```rust
//! use strand_html::{html, render, render_async, Value};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let greeting = Value::pending(async { "Hello from the server" });
//! let page = html!("<main>" {greeting} "</main>")?;
//!
//! assert!(render(&page).starts_with("<main><slot id=\"async_"));
//! assert_eq!(render_async(&page).await?, "<main>Hello from the server</main>");
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

pub mod component;
pub mod compress;
pub mod config;
pub mod error;
pub mod escape;
pub mod node;
pub mod pending;
pub mod renderer;
mod scheduler;
pub mod sink;
pub mod slot;
mod stream;
pub mod template;
pub mod value;
pub mod wire;

pub use component::{Component, Renderable};
pub use compress::{compress_html, HtmlCompressor};
pub use config::{AbandonPolicy, FailurePolicy, RenderConfig, SlotIdStrategy};
pub use error::{RenderError, RenderResult, SlotFailure, TemplateError, TemplateResult};
pub use escape::escape_html;
pub use node::{ClientFunction, Kind, Node, Scalar};
pub use pending::{Pending, SlotFuture};
pub use renderer::{render, render_async, render_stream, Renderer};
pub use sink::{write_stream, ChannelSink, ChunkSink, WriterSink};
pub use slot::{RandomSlotIds, SequentialSlotIds, SlotIdFactory, SlotIdGenerator};
pub use template::{build, raw, Template, TemplateBuilder};
pub use value::{classify, kind, Value};

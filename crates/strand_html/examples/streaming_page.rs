//! Streams a page with three slow blocks to stdout.
//!
//! ```text
//! RUST_LOG=strand_html=debug cargo run -p strand_html --example streaming_page
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use strand_html::{html, raw, write_stream, Component, RenderConfig, Renderer, Value, WriterSink};
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CONFIG: &str = r#"
loading_markup = "<div class=\"skeleton\"></div>"
slot_timeout_ms = 8000
"#;

fn block(title: &'static str, delay_ms: u64) -> Value {
    Value::try_pending(async move {
        sleep(Duration::from_millis(delay_ms)).await;
        html!(
            "<section><h2>" {title} "</h2>"
            "<p>Loaded after " {delay_ms} "ms</p></section>"
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("strand_html=info".parse()?))
        .try_init();

    let config = RenderConfig::from_toml_str(CONFIG).context("Invalid render config")?;
    let renderer = Renderer::new(config);

    let sidebar = Component::new(|| block("Sidebar", 500))
        .with_loading(raw("<aside class=\"skeleton\">Loading sidebar...</aside>"));

    let page = html!(
        "<!doctype html><html><body><main>"
        {block("Headlines", 1000)}
        {block("Weather", 5000)}
        {block("Sports", 3000)}
        "</main>" {sidebar} "</body></html>"
    )?;

    let mut sink = WriterSink::new(tokio::io::stdout());
    let chunks = write_stream(renderer.render_stream(&page), &mut sink).await?;
    info!("Wrote {} chunk(s)", chunks);

    Ok(())
}

//! Output formatting for route responses.

use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;

use evroute_lib::{RouteRenderMode, RouteResponse};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON response.
    #[default]
    Json,
    /// Human-readable itinerary.
    Text,
    /// Single-line summary.
    Compact,
}

impl OutputFormat {
    /// Render the response as a newline-terminated string.
    pub fn render(self, response: &RouteResponse) -> Result<String> {
        match self {
            OutputFormat::Json => {
                let mut json = response
                    .to_json_pretty()
                    .context("failed to serialize route response")?;
                json.push('\n');
                Ok(json)
            }
            OutputFormat::Text => Ok(response.render(RouteRenderMode::PlainText)),
            OutputFormat::Compact => Ok(response.render(RouteRenderMode::Compact)),
        }
    }

    pub fn write_to(self, response: &RouteResponse, mut writer: impl Write) -> Result<()> {
        let rendered = self.render(response)?;
        writer
            .write_all(rendered.as_bytes())
            .context("failed to write route output")?;
        writer.flush().context("failed to flush route output")
    }
}

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::Result;
use crate::query::QueryResults;

/// How search results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON document.
    #[default]
    Json,
    /// Repository names followed by their matching files.
    Pretty,
}

pub fn render<W: Write>(
    results: &QueryResults,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Json => render_json(results, writer)?,
        OutputFormat::Pretty => render_pretty(results, writer)?,
    }
    writer.flush()?;
    Ok(())
}

fn render_json<W: Write>(results: &QueryResults, writer: &mut W) -> Result<()> {
    let mut serializer =
        Serializer::with_formatter(&mut *writer, PrettyFormatter::with_indent(b"   "));
    results
        .serialize(&mut serializer)
        .map_err(std::io::Error::from)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn render_pretty<W: Write>(results: &QueryResults, writer: &mut W) -> Result<()> {
    for (repo, files) in &results.repositories {
        writeln!(writer, "{repo}:")?;
        for file in files {
            writeln!(writer, "   {file}")?;
        }
    }
    Ok(())
}

/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render a template from the command line
 */

use anyhow::{Context, Result};
use clap::Parser;
use quarto_template::{
    DelegatingLoader, Engine, EngineConfig, FileLoader, LoaderSettings, StringLoader, Value,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "qtemplate")]
#[command(about = "Render a template with variables from a JSON file")]
struct Args {
    /// Template name, resolved against the template directories
    #[arg(value_name = "TEMPLATE")]
    template: String,

    /// Template directory; may be given several times, searched in order
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    dirs: Vec<PathBuf>,

    /// Treat TEMPLATE as template source instead of a name
    #[arg(long)]
    inline: bool,

    /// JSON object whose entries become template variables
    #[arg(short = 'c', long = "context", value_name = "FILE")]
    context: Option<PathBuf>,

    /// JSON engine configuration
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Prepended to template names, as a directory
    #[arg(long)]
    prefix: Option<String>,

    /// Appended to template names (e.g. ".html")
    #[arg(long)]
    suffix: Option<String>,

    /// Locale for this render
    #[arg(long)]
    locale: Option<String>,

    /// Worker threads for parallel blocks (overrides the config file)
    #[arg(short = 'j', long = "threads")]
    threads: Option<usize>,

    /// Fail on undefined variables (overrides the config file)
    #[arg(long)]
    strict: bool,

    /// Write output here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarto_template=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let rendered = render(&args)?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered).context(format!("Failed to write output: {:?}", path))?
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn render(args: &Args) -> Result<String> {
    let engine = build_engine(args)?;
    let variables = read_variables(args)?;

    let template = engine
        .get_template(&args.template)
        .with_context(|| format!("Failed to load template \"{}\"", args.template))?;
    tracing::debug!(template = template.name(), "Rendering");

    let rendered = match &args.locale {
        Some(locale) => template.render_with_locale(variables, locale),
        None => template.render(variables),
    };
    Ok(rendered?)
}

fn build_engine(args: &Args) -> Result<Engine> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))?;
            serde_json::from_str::<EngineConfig>(&text)
                .context(format!("Invalid config file: {:?}", path))?
        }
        None => EngineConfig::default(),
    };
    if args.threads.is_some() {
        config.parallel_threads = args.threads;
    }
    if args.strict {
        config.strict_variables = true;
    }

    let builder = Engine::builder().config(config);
    let builder = if args.inline {
        builder.loader(StringLoader::new())
    } else {
        let dirs = if args.dirs.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            args.dirs.clone()
        };
        let loader = dirs
            .into_iter()
            .fold(DelegatingLoader::new(), |loader, dir| {
                loader.with_loader(FileLoader::new(dir))
            });
        builder.loader(loader)
    };

    let settings = LoaderSettings {
        prefix: args.prefix.clone(),
        suffix: args.suffix.clone(),
        ..LoaderSettings::default()
    };
    Ok(builder.loader_settings(settings).build()?)
}

fn read_variables(args: &Args) -> Result<Vec<(String, Value)>> {
    let Some(path) = &args.context else {
        return Ok(Vec::new());
    };
    let text =
        fs::read_to_string(path).context(format!("Failed to read context file: {:?}", path))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).context(format!("Invalid JSON in {:?}", path))?;

    let serde_json::Value::Object(entries) = json else {
        anyhow::bail!("Context file must contain a JSON object: {:?}", path);
    };
    Ok(entries
        .into_iter()
        .map(|(name, value)| (name, Value::from(value)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("qtemplate").chain(argv.iter().copied()))
    }

    #[test]
    fn test_inline_template_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let context = dir.path().join("context.json");
        fs::write(&context, r#"{"names": ["a", "b"], "title": "List"}"#).unwrap();

        let args = args(&[
            "--inline",
            "{{ title }}:{% for n in names %}{{ n | upper }}{% endfor %}",
            "--context",
            context.to_str().unwrap(),
        ]);
        assert_eq!(render(&args).unwrap(), "List:AB");
    }

    #[test]
    fn test_directories_are_searched_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("page.html"), "second").unwrap();
        fs::write(second.path().join("other.html"), "other").unwrap();
        fs::write(first.path().join("page.html"), "first").unwrap();

        let base = [
            "--dir",
            first.path().to_str().unwrap(),
            "--dir",
            second.path().to_str().unwrap(),
            "--suffix",
            ".html",
        ];
        let mut page = vec!["page"];
        page.extend(base);
        let mut other = vec!["other"];
        other.extend(base);

        assert_eq!(render(&args(&page)).unwrap(), "first");
        assert_eq!(render(&args(&other)).unwrap(), "other");
    }

    #[test]
    fn test_context_must_be_object() {
        let dir = tempfile::tempdir().unwrap();
        let context = dir.path().join("context.json");
        fs::write(&context, "[1, 2]").unwrap();

        let args = args(&["--inline", "x", "--context", context.to_str().unwrap()]);
        let err = render(&args).unwrap_err();
        assert!(err.to_string().contains("must contain a JSON object"));
    }

    #[test]
    fn test_strict_flag_overrides_config() {
        let args = args(&["--inline", "{{ missing }}", "--strict"]);
        assert!(render(&args).is_err());
    }
}

use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use varsubst::{Resolver, Result, TransformError, Variable, find_placeholders};

const LONG_HELP: &str = r#"
Template syntax:
  ${name}                  - Substitute the variable 'name'
  ${name:default}          - Substitute 'name', or 'default' if unset
  ${time:11:00:00}         - Defaults may contain colons
  ${name:$[other]}         - Defaults may reference other variables
  _$_{name}                - Escape: emits the literal text ${name}
  <!--[if expr]-->         - Keep following lines when expr is truthy
  <!--[if not expr]-->     - ...or when it is not
  <!--[if empty expr]-->   - ...or when it is blank
  <!--[endif]-->           - End of conditional block

  Truthy expressions (case-insensitive): true, on, 1, enabled.
  Environment variables override --set/--vars-file variables of the
  same name. Unresolvable placeholders render as
  !!Missing variable for name!! markers.

Examples:
  # Transform a template file
  varsubst app.config.template -s Host=db.example.com
  # Transform from stdin
  echo 'host=${Host:localhost}' | varsubst -
  # Load variables from a JSON file
  varsubst app.config.template --vars-file prod.json
  # Report every resolution and fail on missing variables
  varsubst app.config.template --check
  # List placeholders in a template
  varsubst app.config.template --list=detailed
  # Resolve a single variable
  varsubst --resolve Host --vars-file prod.json
  # Save output to file
  varsubst app.config.template -o app.config
"#;

/// Configuration template transformer.
#[derive(Parser, Debug)]
#[command(
    name = "varsubst",
    version,
    about = "Expand ${name} placeholders and conditional blocks in configuration file templates.",
    after_long_help = LONG_HELP
)]
struct Cli {
    /// Template file to transform. Use '-' for stdin.
    #[arg(value_name = "TEMPLATE", required_unless_present = "resolve")]
    template: Option<PathBuf>,

    /// Define a variable (repeatable)
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE", action = clap::ArgAction::Append)]
    set: Vec<String>,

    /// JSON file with an array of {"name": ..., "value": ...} variables
    #[arg(long, value_name = "FILE", env = "VARSUBST_VARS_FILE")]
    vars_file: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Don't let process environment variables override supplied variables
    #[arg(long)]
    no_env: bool,

    /// Report every variable resolution; exit 1 if any variable is missing
    #[arg(long, conflicts_with = "list")]
    check: bool,

    /// List placeholders in the template (optionally with format: plain, detailed, json)
    #[arg(long, value_name = "FORMAT", num_args = 0..=1, default_missing_value = "plain", conflicts_with = "check")]
    list: Option<ListFormat>,

    /// Resolve a single variable by name and print its value
    #[arg(long, value_name = "NAME", conflicts_with_all = ["check", "list", "output"])]
    resolve: Option<String>,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum ListFormat {
    /// Simple list of placeholder names
    Plain,
    /// Detailed information about each placeholder
    Detailed,
    /// JSON output for scripting
    Json,
}

#[derive(Serialize)]
struct PlaceholderInfo {
    name: String,
    start: usize,
    end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => LogLevel::Error,
        (false, 0) => LogLevel::Warn,
        (false, 1) => LogLevel::Info,
        (false, 2) => LogLevel::Debug,
        (false, _) => LogLevel::Trace,
    };

    let variables = match collect_variables(&cli, log_level) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let resolver = if cli.no_env {
        Resolver::without_env(variables)
    } else {
        Resolver::new(variables)
    };

    let result = if let Some(name) = &cli.resolve {
        resolve_one(&resolver, name)
    } else {
        run_template_mode(&cli, &resolver, log_level)
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_template_mode(cli: &Cli, resolver: &Resolver, log_level: LogLevel) -> Result<()> {
    let template_path = cli
        .template
        .as_deref()
        .expect("clap enforces TEMPLATE unless --resolve is given");
    let template_content = get_template_content(template_path, log_level)?;

    if cli.check {
        check(resolver, &template_content, log_level)
    } else if let Some(list_format) = cli.list {
        list_placeholders(&template_content, list_format, log_level)
    } else {
        transform(resolver, &template_content, cli.output.clone(), log_level)
    }
}

fn collect_variables(cli: &Cli, log_level: LogLevel) -> Result<Vec<Variable>> {
    let mut variables = Vec::new();

    if let Some(vars_file) = &cli.vars_file {
        log(
            log_level,
            LogLevel::Info,
            &format!("Loading variables from {}", vars_file.display()),
        );
        let content = std::fs::read_to_string(vars_file)?;
        let mut loaded: Vec<Variable> = serde_json::from_str(&content)?;
        variables.append(&mut loaded);
    }

    for definition in &cli.set {
        variables.push(Variable::parse(definition)?);
    }

    log(
        log_level,
        LogLevel::Debug,
        &format!("{} variables collected", variables.len()),
    );

    Ok(variables)
}

fn get_template_content(template_path: &Path, log_level: LogLevel) -> Result<String> {
    if template_path == Path::new("-") {
        log(log_level, LogLevel::Info, "Reading template from stdin...");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        log(
            log_level,
            LogLevel::Info,
            &format!("Reading template from {}", template_path.display()),
        );
        if !template_path.is_file() {
            return Err(TransformError::TemplateNotFound {
                path: template_path.to_path_buf(),
            });
        }
        std::fs::read_to_string(template_path).map_err(Into::into)
    }
}

fn transform(
    resolver: &Resolver,
    template_content: &str,
    output: Option<PathBuf>,
    log_level: LogLevel,
) -> Result<()> {
    log(log_level, LogLevel::Debug, "Transforming template...");

    let result = resolver.transform(template_content)?;

    for usage in result.missing() {
        log(
            log_level,
            LogLevel::Warn,
            &format!("Missing variable: {}", usage.requested_name),
        );
    }

    if let Some(output_path) = output {
        log(
            log_level,
            LogLevel::Info,
            &format!("Writing output to {}", output_path.display()),
        );
        std::fs::write(output_path, result.text)?;
    } else {
        println!("{}", result.text);
        io::stdout().flush()?;
    }

    log(log_level, LogLevel::Info, "Transformation complete!");
    Ok(())
}

fn check(resolver: &Resolver, template_content: &str, log_level: LogLevel) -> Result<()> {
    log(
        log_level,
        LogLevel::Info,
        "Checking variable resolution...",
    );

    let result = resolver.transform(template_content)?;

    let mut found_count = 0;
    let mut missing_count = 0;

    for usage in &result.usages {
        if let Some(resolved) = &usage.resolved {
            log(
                log_level,
                LogLevel::Info,
                &format!("✓ {} -> {}", usage.requested_name, resolved),
            );
            found_count += 1;
        } else {
            log(
                log_level,
                LogLevel::Warn,
                &format!("✗ {} (missing)", usage.requested_name),
            );
            missing_count += 1;
        }
    }

    println!("\nSummary: {} placeholders resolved", result.usages.len());
    if found_count > 0 {
        println!("  ✓ {found_count} found");
    }
    if missing_count > 0 {
        println!("  ✗ {missing_count} missing");
    }

    if missing_count > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn list_placeholders(
    template_content: &str,
    format: ListFormat,
    log_level: LogLevel,
) -> Result<()> {
    log(log_level, LogLevel::Debug, "Listing placeholders...");

    let placeholders = find_placeholders(template_content);

    match format {
        ListFormat::Plain => {
            for placeholder in &placeholders {
                println!("{}", placeholder.name);
            }
        }
        ListFormat::Detailed => {
            for placeholder in &placeholders {
                println!("Placeholder: {}", placeholder.name);
                println!("  Position: {}..{}", placeholder.start, placeholder.end);
                match &placeholder.default {
                    Some(default) => println!("  Default: {default}"),
                    None => println!("  Default: none"),
                }
                println!();
            }
        }
        ListFormat::Json => {
            let infos: Vec<PlaceholderInfo> = placeholders
                .into_iter()
                .map(|p| PlaceholderInfo {
                    name: p.name,
                    start: p.start,
                    end: p.end,
                    default: p.default,
                })
                .collect();

            let json = serde_json::to_string_pretty(&infos)?;
            println!("{json}");
        }
    }

    Ok(())
}

fn resolve_one(resolver: &Resolver, name: &str) -> Result<()> {
    match resolver.resolve(name)? {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => {
            eprintln!("Error: variable '{name}' not found");
            std::process::exit(1);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

fn log(current_level: LogLevel, message_level: LogLevel, message: &str) {
    if message_level >= current_level {
        eprintln!(
            "[{}] {}",
            match message_level {
                LogLevel::Trace => "TRACE",
                LogLevel::Debug => "DEBUG",
                LogLevel::Info => "INFO",
                LogLevel::Warn => "WARN",
                LogLevel::Error => "ERROR",
            },
            message
        );
    }
}

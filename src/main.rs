use clap::Parser;
use gradle_splice::{
    Config, Dialect, EditRequest, EditResponse, TieBreak, detect_dialect, execute, generate_execution_id,
    read_file, render_diff, write_file,
};
use std::fs;
use std::io::{self, Read};

/// Position-anchored edits for Gradle build scripts
#[derive(Parser, Debug)]
#[command(name = "gradle-splice")]
#[command(version = "0.1.0")]
#[command(about = "Edit Gradle build scripts without touching unrelated bytes", long_about = None)]
struct Args {
    /// Build script to edit
    #[arg(short, long)]
    file: String,

    /// JSON file containing the operations (omit to read from stdin)
    #[arg(long)]
    ops: Option<String>,

    /// Output structured JSON instead of human-readable
    #[arg(short, long)]
    json: bool,

    /// Write the response to a file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Rewrite the build script in place
    #[arg(short, long)]
    write: bool,

    /// Override dialect detection
    #[arg(long, value_enum)]
    dialect: Option<Dialect>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<String>,

    /// Reject selectors that match more than one entity
    #[arg(long)]
    strict: bool,
}

/// Read EditRequest from file path or stdin
fn read_edit_request(path: Option<&String>) -> Result<EditRequest, Box<dyn std::error::Error>> {
    let json_str = if let Some(p) = path {
        fs::read_to_string(p)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let request: EditRequest = serde_json::from_str(&json_str)?;
    Ok(request)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if args.dialect.is_some() {
        config.dialect = args.dialect;
    }
    if args.strict {
        config.tie_break = TieBreak::RequireUnique;
    }

    let request = match read_edit_request(args.ops.as_ref()) {
        Ok(req) => req,
        Err(e) => {
            eprintln!("Error reading edit request: {}", e);
            std::process::exit(1);
        }
    };

    let file_content = match read_file(&args.file) {
        Ok(content) => content,
        Err(e) => {
            let response = EditResponse::failure(
                generate_execution_id(),
                String::new(),
                format!("Failed to read file '{}': {}", args.file, e),
            );
            output_response(&response, args.json, args.output.as_ref());
            std::process::exit(1);
        }
    };

    let editor_options = config.editor_options(detect_dialect(&args.file));
    let execution = execute(&request, &file_content, editor_options, config.apply_options());
    let mut response = execution.response;

    if args.write {
        if let Some(content) = &execution.content {
            if let Err(e) = write_file(&args.file, content) {
                response.success = false;
                response.error = Some(format!("Failed to write '{}': {}", args.file, e));
            }
        }
    }

    output_response(&response, args.json, args.output.as_ref());

    if !response.success {
        std::process::exit(1);
    }
}

/// Format and output the response
fn output_response(response: &EditResponse, json_mode: bool, output_path: Option<&String>) {
    let output = if json_mode {
        serde_json::to_string_pretty(response)
            .unwrap_or_else(|_| r#"{"error": "Failed to serialize response"}"#.to_string())
    } else {
        let mut text = String::new();
        if !response.diff.is_empty() {
            text.push_str(&render_diff(&response.diff));
        }
        for failure in &response.failures {
            text.push_str(&format!(
                "Rejected #{} {}: {}\n",
                failure.index, failure.operation, failure.error
            ));
        }
        if response.success {
            text.push_str(&format!(
                "Applied {} modification(s)\nFinal checksum: {}",
                response.applied_count, response.final_checksum
            ));
        } else {
            text.push_str(&format!(
                "Error: {}",
                response.error.as_deref().unwrap_or("Unknown error")
            ));
        }
        text
    };

    if let Some(path) = output_path {
        if let Err(e) = fs::write(path, &output) {
            eprintln!("Failed to write output to '{}': {}", path, e);
            std::process::exit(1);
        }
    } else {
        println!("{}", output);
    }
}

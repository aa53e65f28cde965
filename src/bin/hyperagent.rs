//! hyperagent CLI
//!
//! Command-line interface for listing and invoking hypermedia relations.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hyperagent::{Agent, AgentConfig, AgentError, HttpTransport, Relation, RequestOptions};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hyperagent")]
#[command(about = "Discover and invoke hypermedia API relations")]
#[command(version)]
struct Cli {
    /// Log fetches and requests to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct EndpointArgs {
    /// Root endpoint URL
    endpoint: String,

    /// Root document property holding the link list
    #[arg(long, default_value = hyperagent::DEFAULT_LINKS_PROPERTY)]
    links_property: String,

    /// Default relation of schemas that don't name one
    #[arg(long, default_value = hyperagent::DEFAULT_RELATION_NAME)]
    default_relation: String,

    /// Header sent with every request, as "Name: value" (repeatable)
    #[arg(long = "header", short = 'H')]
    headers: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the top-level relations of an endpoint
    Relations {
        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the relations of one schema
    Schema {
        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Schema reference, exactly as the root document names it
        href: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Invoke a relation and print the decoded response
    Request {
        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Relation name (e.g. users, users/search)
        relation: String,

        /// JSON request body
        #[arg(long, short, conflicts_with = "data_file")]
        data: Option<String>,

        /// File containing the JSON request body
        #[arg(long)]
        data_file: Option<PathBuf>,

        /// Href template parameter as name=value (repeatable)
        #[arg(long = "param", short = 'p')]
        params: Vec<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Relations { endpoint, json } => run_relations(&endpoint, json),
        Commands::Schema {
            endpoint,
            href,
            json,
        } => run_schema(&endpoint, href, json),
        Commands::Request {
            endpoint,
            relation,
            data,
            data_file,
            params,
            pretty,
        } => run_request(&endpoint, relation, data, data_file, params, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("hyperagent=debug")
    } else {
        EnvFilter::try_from_env("HYPERAGENT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_agent(args: &EndpointArgs) -> Result<Agent<HttpTransport>, u8> {
    let config = AgentConfig::new(&args.endpoint)
        .links_property(&args.links_property)
        .default_relation(&args.default_relation);

    let mut agent = Agent::new(config).map_err(|e| {
        eprintln!("Error: {}", e);
        3u8
    })?;

    for header in &args.headers {
        let (name, value) = split_pair(header, ':').ok_or_else(|| {
            eprintln!("Error: invalid header \"{}\": expected \"Name: value\"", header);
            2u8
        })?;
        agent.transport_mut().set_header(name, value).map_err(|e| {
            eprintln!("Error: {}", e);
            2u8
        })?;
    }

    Ok(agent)
}

fn split_pair(s: &str, separator: char) -> Option<(&str, &str)> {
    let (name, value) = s.split_once(separator)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

fn report(e: AgentError) -> u8 {
    eprintln!("Error: {}", e);
    e.exit_code() as u8
}

fn relation_json(name: &str, relation: &Relation) -> Value {
    json!({
        "name": name,
        "rel": relation.name(),
        "method": relation.http_method(),
        "href": relation.href(),
        "schema": relation.schema(),
    })
}

fn print_relations<'a>(relations: impl Iterator<Item = (&'a String, &'a Relation)>, as_json: bool) {
    if as_json {
        let list: Vec<Value> = relations
            .map(|(name, relation)| relation_json(name, relation))
            .collect();
        println!("{}", Value::Array(list));
    } else {
        for (name, relation) in relations {
            println!(
                "{:<24} {:<7} {}",
                name,
                relation.http_method().as_str().to_uppercase(),
                relation.href()
            );
        }
    }
}

fn run_relations(args: &EndpointArgs, as_json: bool) -> Result<(), u8> {
    let mut agent = build_agent(args)?;
    let relations = agent.relations().map_err(report)?;
    print_relations(relations.iter(), as_json);
    Ok(())
}

fn run_schema(args: &EndpointArgs, href: String, as_json: bool) -> Result<(), u8> {
    let mut agent = build_agent(args)?;
    let schema = agent.schema(href).map_err(report)?;
    if !as_json {
        println!("default: {}", schema.default_relation());
    }
    print_relations(schema.relations().iter(), as_json);
    Ok(())
}

fn run_request(
    args: &EndpointArgs,
    relation: String,
    data: Option<String>,
    data_file: Option<PathBuf>,
    params: Vec<String>,
    pretty: bool,
) -> Result<(), u8> {
    let raw_body = match (data, data_file) {
        (Some(data), _) => Some(data),
        (None, Some(path)) => Some(std::fs::read_to_string(&path).map_err(|e| {
            eprintln!("Error reading {}: {}", path.display(), e);
            3u8
        })?),
        (None, None) => None,
    };
    let body: Option<Value> = raw_body
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| {
            eprintln!("Error: invalid JSON body: {}", e);
            2u8
        })?;

    let mut options = RequestOptions::new();
    for param in &params {
        let (name, value) = split_pair(param, '=').ok_or_else(|| {
            eprintln!("Error: invalid parameter \"{}\": expected name=value", param);
            2u8
        })?;
        options = options.param(name, value);
    }

    let mut agent = build_agent(args)?;
    let response = agent
        .request_with(relation, body.as_ref(), &options)
        .map_err(report)?;

    let output = if pretty {
        serde_json::to_string_pretty(response.data())
    } else {
        serde_json::to_string(response.data())
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", output);

    if response.raw().is_success() {
        Ok(())
    } else {
        eprintln!("Error: server responded {}", response.raw().status);
        Err(1)
    }
}

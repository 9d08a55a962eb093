//! CLI tool to manage registries, users and their registry identities.
//!
//! Usage:
//!   cargo run --bin manage-registries -- add-registry --type seek --name wfhub --uri https://seek.example.org --client-id <id> --client-secret <secret>
//!   cargo run --bin manage-registries -- list-registries
//!   cargo run --bin manage-registries -- add-user --username alice
//!   cargo run --bin manage-registries -- link-identity --username alice --registry wfhub --provider-user-id 17 --token <access-token>

use std::env;

use secrecy::SecretString;

use lifemonitor::config::Config;
use lifemonitor::db::{DbPool, users};
use lifemonitor::services::LifeMonitor;
use lifemonitor::services::api_key;

/// Fallback for `--token` so access tokens stay out of shell history.
const TOKEN_ENV_VAR: &str = "LM_REGISTRY_TOKEN";
/// Fallback for `--client-secret`.
const CLIENT_SECRET_ENV_VAR: &str = "LM_REGISTRY_CLIENT_SECRET";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = args[1].as_str();
    if matches!(command, "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = pool.run_migrations().await {
        eprintln!("Error running migrations: {}", e);
        std::process::exit(1);
    }

    let monitor = match LifeMonitor::new(pool.clone(), &config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error initializing LifeMonitor: {}", e);
            std::process::exit(1);
        }
    };

    match command {
        "add-registry" => add_registry(&monitor, &args).await,
        "list-registries" | "ls" => list_registries(&monitor).await,
        "add-user" => add_user(&pool, &args).await,
        "link-identity" => link_identity(&monitor, &pool, &args).await,
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

/// Value following `--name` (or its short form), if any.
fn arg_value(args: &[String], long: &str, short: Option<&str>) -> Option<String> {
    let mut i = 2;
    while i < args.len() {
        if (args[i] == long || Some(args[i].as_str()) == short) && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn required_arg(args: &[String], long: &str, short: Option<&str>) -> String {
    arg_value(args, long, short).unwrap_or_else(|| {
        eprintln!("Error: {} is required", long);
        std::process::exit(1);
    })
}

/// Secret argument, falling back to an environment variable.
fn secret_arg(args: &[String], long: &str, env_var: &str) -> SecretString {
    match arg_value(args, long, None).or_else(|| env::var(env_var).ok()) {
        Some(value) => SecretString::from(value),
        None => {
            eprintln!("Error: {} (or {}) is required", long, env_var);
            std::process::exit(1);
        }
    }
}

async fn add_registry(monitor: &LifeMonitor, args: &[String]) {
    let registry_type = required_arg(args, "--type", Some("-t"));
    let name = required_arg(args, "--name", Some("-n"));
    let uri = required_arg(args, "--uri", Some("-u"));
    let client_id = required_arg(args, "--client-id", None);
    let client_secret = secret_arg(args, "--client-secret", CLIENT_SECRET_ENV_VAR);

    match monitor
        .add_registry(&registry_type, &name, &uri, &client_id, &client_secret)
        .await
    {
        Ok(registry) => {
            println!();
            println!("Registry added.");
            println!("  ID:   {}", registry.id);
            println!("  Name: {}", registry.name);
            println!("  Type: {}", registry.registry_type);
            println!("  URI:  {}", registry.uri);
            println!();
        }
        Err(e) => {
            eprintln!("Error adding registry: {}", e);
            std::process::exit(1);
        }
    }
}

async fn list_registries(monitor: &LifeMonitor) {
    let registries = match monitor.list_registries().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error listing registries: {}", e);
            std::process::exit(1);
        }
    };

    if registries.is_empty() {
        println!("No registries found.");
        return;
    }

    println!();
    println!("{:<36} {:<20} {:<8} URI", "ID", "NAME", "TYPE");
    println!("{}", "-".repeat(92));
    for registry in registries {
        println!(
            "{:<36} {:<20} {:<8} {}",
            registry.id, registry.name, registry.registry_type, registry.uri
        );
    }
    println!();
}

async fn add_user(pool: &DbPool, args: &[String]) {
    let username = required_arg(args, "--username", Some("-u"));
    let (full_key, key_hash) = api_key::generate_key();

    match users::insert(pool.connection(), &username, &key_hash).await {
        Ok(user) => {
            println!();
            println!("User created.");
            println!("  ID:       {}", user.id);
            println!("  Username: {}", user.username);
            println!();
            println!("  API key (shown only once, store it securely):");
            println!("  {}", full_key);
            println!();
        }
        Err(e) => {
            eprintln!("Error creating user: {}", e);
            std::process::exit(1);
        }
    }
}

async fn link_identity(monitor: &LifeMonitor, pool: &DbPool, args: &[String]) {
    let username = required_arg(args, "--username", Some("-u"));
    let registry_name = required_arg(args, "--registry", Some("-r"));
    let provider_user_id = required_arg(args, "--provider-user-id", None);
    let token = secret_arg(args, "--token", TOKEN_ENV_VAR);

    let user = match users::find_by_username(pool.connection(), &username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            eprintln!("User '{}' not found.", username);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error loading user: {}", e);
            std::process::exit(1);
        }
    };
    let registry = match monitor.find_registry_by_name(&registry_name).await {
        Ok(Some(r)) => r,
        Ok(None) => {
            eprintln!("Registry '{}' not found.", registry_name);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error loading registry: {}", e);
            std::process::exit(1);
        }
    };

    match monitor
        .link_identity(&user, &registry, &provider_user_id, &token)
        .await
    {
        Ok(_) => println!(
            "Identity of '{}' at '{}' linked successfully.",
            user.username, registry.name
        ),
        Err(e) => {
            eprintln!("Error linking identity: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        r#"
Manage LifeMonitor registries, users and registry identities

Usage:
  manage-registries <command> [options]

Commands:
  add-registry      Register a workflow registry
  list-registries   List registries (alias: ls)
  add-user          Create a user and print its API key
  link-identity     Store a user's access token for a registry
  help              Show this help

add-registry options:
  --type, -t <type>         Registry type (seek)
  --name, -n <name>         Unique registry name
  --uri, -u <uri>           Registry base URI
  --client-id <id>          OAuth2 client id
  --client-secret <secret>  OAuth2 client secret (or {client_secret_env})

add-user options:
  --username, -u <name>     Unique username

link-identity options:
  --username, -u <name>     Existing user
  --registry, -r <name>     Existing registry name
  --provider-user-id <id>   User id at the registry
  --token <token>           Registry access token (or {token_env})

Environment:
  RUST_ENV, DATABASE_URL    As for the server
"#,
        client_secret_env = CLIENT_SECRET_ENV_VAR,
        token_env = TOKEN_ENV_VAR,
    );
}

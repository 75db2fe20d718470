//!
//! coursegate admin binary
//! -----------------------
//! Roster maintenance from the command line: sync users from a JSON file into a course,
//! and hash passwords for pre-hashed imports. Settings come from `COURSEGATE_*`
//! environment variables, overridden by flags.

use anyhow::{anyhow, bail, Context, Result};
use std::io::BufRead;
use std::sync::Arc;
use tracing::info;

use coursegate::config::{init_tracing, Config};
use coursegate::security::{Argon2Credentials, CredentialProvider};
use coursegate::storage::JsonRosterStore;
use coursegate::sync::{LogNotifier, SyncOptions, UserSync};
use coursegate::User;

const USAGE: &str = "coursegate\n\nUSAGE:\n  coursegate sync --course ID --file USERS.json [--merge] [--dry-run] [--notify|--no-notify] [--data-dir PATH] [--print-passwords]\n  coursegate hash-password    (reads one password per line from stdin)\n\nENV:\n  COURSEGATE_DATA_DIR, COURSEGATE_NOTIFY, COURSEGATE_PASSWORD_LENGTH,\n  COURSEGATE_ARGON2_MEMORY_KIB, COURSEGATE_ARGON2_ITERATIONS, COURSEGATE_ARGON2_PARALLELISM\n";

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let i = args.iter().position(|a| a == flag)?;
    args.get(i + 1).filter(|v| !v.starts_with("--")).cloned()
}

fn run_sync(args: &[String], mut cfg: Config) -> Result<()> {
    let course = arg_value(args, "--course").ok_or_else(|| anyhow!("--course is required"))?;
    let file = arg_value(args, "--file").ok_or_else(|| anyhow!("--file is required"))?;
    if let Some(dir) = arg_value(args, "--data-dir") { cfg.data_dir = dir.into(); }
    if has_flag(args, "--notify") { cfg.notify = true; }
    if has_flag(args, "--no-notify") { cfg.notify = false; }

    let body = std::fs::read(&file).with_context(|| format!("reading {}", file))?;
    let incoming: Vec<User> = serde_json::from_slice(&body).with_context(|| format!("parsing {} as a user list", file))?;

    let options = SyncOptions::new()
        .allow_merge(has_flag(args, "--merge"))
        .dry_run(has_flag(args, "--dry-run"))
        .notify(cfg.notify);

    let credentials = Argon2Credentials::from_config(&cfg)?;
    let engine = UserSync::new(
        Arc::new(JsonRosterStore::new(&cfg.data_dir)),
        Arc::new(credentials),
        Arc::new(LogNotifier),
    );
    info!(target: "coursegate", "sync: course='{}' file='{}' data_dir='{}' options={:?}", course, file, cfg.data_dir.display(), options);

    let result = engine.sync(&course, incoming, options)?;
    println!("{}", result.summary());
    if has_flag(args, "--print-passwords") {
        for (email, pass) in &result.clear_text_passwords {
            println!("{}\t{}", email, pass);
        }
    }
    Ok(())
}

fn run_hash_password(cfg: &Config) -> Result<()> {
    let credentials = Argon2Credentials::from_config(cfg)?;
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let pw = line.trim_end_matches(['\r', '\n']);
        if pw.is_empty() { continue; }
        println!("{}", credentials.hash(pw)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || has_flag(&args, "--help") || has_flag(&args, "-h") {
        print!("{}", USAGE);
        return Ok(());
    }

    let cfg = Config::from_env();
    match args[0].as_str() {
        "sync" => run_sync(&args[1..], cfg),
        "hash-password" => run_hash_password(&cfg),
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
}

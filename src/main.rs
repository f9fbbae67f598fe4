// src/main.rs
// =============================================================================
// Entry point of the CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Install the log subscriber
// 3. Dispatch to the subcommand handler
// 4. Exit with a proper code (0 = nothing dead, 1 = dead links, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{CheckArgs, Cli, Commands};
use deadlink_checker::{
    logging, BatchResult, CheckerConfig, DeadlinkChecker, ProbeMethod, UrlParts,
};
use std::path::Path;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Check(args) => handle_check(args).await,
        Commands::Clean { urls } => {
            for url in urls {
                println!("{}", deadlink_checker::clean_url(&url));
            }
            Ok(0)
        }
        Commands::Sanitize { urls } => {
            let canonicalizer = deadlink_checker::Canonicalizer::default();
            for url in urls {
                println!("{}", canonicalizer.sanitize(&url));
            }
            Ok(0)
        }
        Commands::Parse { urls, json } => {
            let parts: Vec<UrlParts> = urls
                .iter()
                .map(|url| deadlink_checker::parse_url(url))
                .collect();
            print_parts(&urls, &parts, json)?;
            Ok(0)
        }
    }
}

async fn handle_check(args: CheckArgs) -> Result<i32> {
    let mut config = match &args.config {
        Some(path) => CheckerConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CheckerConfig::default(),
    };
    apply_overrides(&args, &mut config);

    let mut urls = args.urls.clone();
    if let Some(path) = &args.file {
        urls.extend(read_url_file(path)?);
    }
    if urls.is_empty() {
        anyhow::bail!("no URLs given (pass them as arguments or with --file)");
    }

    let checker = DeadlinkChecker::new(config).context("building the checker")?;
    let results = checker.are_links_dead(&urls).await;

    print_results(&results, args.json)?;

    Ok(if results.dead_count() > 0 { 1 } else { 0 })
}

fn apply_overrides(args: &CheckArgs, config: &mut CheckerConfig) {
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.head_timeout_secs = timeout;
        config.full_timeout_secs = timeout;
    }
    if let Some(max_redirects) = args.max_redirects {
        config.max_redirects = max_redirects;
    }
    if args.get {
        config.method = ProbeMethod::Get;
    }
}

fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading URL list {}", path.display()))?;
    Ok(parse_url_list(&data))
}

// One URL per line; blank lines and '#' comments are skipped.
fn parse_url_list(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn print_results(results: &BatchResult, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(results)?;
        println!("{}", json_output);
    } else {
        print_table(results);
    }
    Ok(())
}

fn print_table(results: &BatchResult) {
    println!("{:<60} {:<8} {}", "URL", "VERDICT", "DETAIL");
    println!("{}", "=".repeat(100));

    for entry in results.iter() {
        let verdict = if entry.verdict.dead { "DEAD" } else { "ALIVE" };
        println!(
            "{:<60} {:<8} {}",
            truncate(&entry.url, 57),
            verdict,
            entry.verdict.outcome
        );
    }

    println!();
    let dead = results.dead_count();
    println!("Summary:");
    println!("   alive: {}", results.len() - dead);
    println!("   dead:  {}", dead);
    println!("   total: {}", results.len());
}

fn print_parts(urls: &[String], parts: &[UrlParts], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(parts)?);
        return Ok(());
    }
    for (url, part) in urls.iter().zip(parts) {
        println!("{}", url);
        println!("   scheme: {}", part.scheme.as_deref().unwrap_or("(none)"));
        println!("   host:   {}", part.host);
        println!("   path:   {}", part.path);
    }
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_list_skips_comments_and_blanks() {
        let data = "# citations\nhttps://en.wikipedia.org\n\n  //en.wikipedia.org/nothing  \n#done\n";
        assert_eq!(
            parse_url_list(data),
            ["https://en.wikipedia.org", "//en.wikipedia.org/nothing"]
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("https://zh.wikipedia.org/wiki/猫", 60), "https://zh.wikipedia.org/wiki/猫");
        assert_eq!(truncate("猫猫猫猫", 2), "猫猫...");
    }

    #[test]
    fn overrides_apply_to_config() {
        let cli = Cli::try_parse_from([
            "deadlink-checker",
            "check",
            "https://example.org",
            "--timeout",
            "5",
            "--max-redirects",
            "3",
        ])
        .unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };

        let mut config = CheckerConfig::default();
        apply_overrides(&args, &mut config);
        assert_eq!(config.head_timeout_secs, 5.0);
        assert_eq!(config.full_timeout_secs, 5.0);
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.method, ProbeMethod::Head);
    }
}

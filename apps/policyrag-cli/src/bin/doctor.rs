//! Diagnostic checks for model-server connectivity.
//!
//! Verifies, in order: the server answers `/api/tags`, the configured
//! generation and embedding models are installed, and a one-token generation
//! probe succeeds. Exits non-zero when any check fails.

use std::env;
use std::time::Duration;

use policyrag_core::config::AppConfig;
use policyrag_ollama::OllamaClient;

fn print_ok(message: &str) {
    println!("[OK] {message}");
}

fn print_warn(message: &str) {
    println!("[WARN] {message}");
}

fn print_fail(message: &str) {
    println!("[FAIL] {message}");
}

/// `name` matches `installed` exactly, or modulo the `:latest` tag.
fn model_installed(installed: &[String], name: &str) -> bool {
    installed.iter().any(|m| {
        m == name
            || m.strip_suffix(":latest").is_some_and(|base| base == name)
            || name.strip_suffix(":latest").is_some_and(|base| base == m)
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let mut base_url = config.ollama.base_url.clone();
    let mut llm_model = config.ollama.llm_model.clone();
    let mut timeout_secs = 15u64;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--base-url" => {
                if let Some(v) = args.next() {
                    base_url = v;
                }
            }
            "--model" => {
                if let Some(v) = args.next() {
                    llm_model = v;
                }
            }
            "--timeout-secs" => {
                if let Some(v) = args.next() {
                    timeout_secs = v.parse().unwrap_or(timeout_secs);
                }
            }
            other => {
                eprintln!("Unknown flag: {other}");
                eprintln!("Usage: policyrag-doctor [--base-url URL] [--model NAME] [--timeout-secs N]");
                std::process::exit(2);
            }
        }
    }
    let timeout = Duration::from_secs(timeout_secs);

    println!("=== Model Server Doctor ===");
    println!("Server URL:      {base_url}");
    println!("Generation model: {llm_model}");
    println!("Embedding model:  {}", config.ollama.embed_model);
    println!();

    let mut failures = 0u32;
    let client = OllamaClient::new(&base_url)?;

    let installed = match client.tags(timeout).await {
        Ok(models) => {
            print_ok(&format!("server is reachable ({} models installed)", models.len()));
            Some(models)
        }
        Err(err) => {
            failures += 1;
            print_fail(&format!("server is not reachable: {err}"));
            None
        }
    };

    if let Some(models) = &installed {
        if model_installed(models, &llm_model) {
            print_ok(&format!("generation model '{llm_model}' is installed"));
        } else {
            failures += 1;
            print_fail(&format!("generation model '{llm_model}' is not installed"));
            print_warn(&format!("run: ollama pull {llm_model}"));
        }
        if model_installed(models, &config.ollama.embed_model) {
            print_ok(&format!(
                "embedding model '{}' is installed",
                config.ollama.embed_model
            ));
        } else {
            failures += 1;
            print_fail(&format!(
                "embedding model '{}' is not installed",
                config.ollama.embed_model
            ));
            print_warn(&format!("run: ollama pull {}", config.ollama.embed_model));
        }
    }

    if installed.is_some() {
        match client
            .generate(&llm_model, "Reply with exactly: ok", timeout)
            .await
        {
            Ok(reply) => print_ok(&format!("generation probe answered: {}", reply.trim())),
            Err(err) => {
                failures += 1;
                print_fail(&format!("generation probe failed: {err}"));
            }
        }
    }

    println!();
    if failures == 0 {
        print_ok("all checks passed");
        Ok(())
    } else {
        print_fail(&format!("{failures} check(s) failed"));
        std::process::exit(1);
    }
}

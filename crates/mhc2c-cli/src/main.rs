use anyhow::Result;
use mhc2c_cli::{build_cli, execute, render_json, render_text, resolve_parameters, RunArgs};
use mhc2c_core::{CritiqueRefine, StopHandle};
use mhc2c_oracle::{domain_roles, LlmConfig, LlmCritic, OpenAiChat, RetryPolicy, Retrying};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mhc2c=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut cli = build_cli();
    let matches = cli.clone().get_matches();

    match matches.subcommand() {
        Some(("run", sub)) => {
            let args = RunArgs::from_matches(sub)?;
            let params = resolve_parameters(&args)?;

            let llm = LlmConfig::from_env()?;
            tracing::info!(model = %llm.model, chains = params.num_chains, "Starting run");
            let chat = Retrying::new(OpenAiChat::new(llm), RetryPolicy::default());
            let proposer = CritiqueRefine::new(LlmCritic::new(chat, args.task.clone()));

            let stop = StopHandle::new();
            let on_signal = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, stopping after the current round");
                    on_signal.stop();
                }
            });

            let result = execute(params, proposer, args.scorer.build(), args.trace, stop).await?;
            if args.json {
                println!("{}", render_json(&result)?);
            } else {
                print!("{}", render_text(&result));
            }
        }
        Some(("roles", sub)) => {
            let domain = sub.get_one::<String>("domain").map_or("", String::as_str);
            let n = sub.get_one::<usize>("m").copied().unwrap_or(3);
            for role in domain_roles(domain, n) {
                println!("{role}");
            }
        }
        _ => cli.print_help()?,
    }

    Ok(())
}

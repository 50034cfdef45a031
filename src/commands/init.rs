use crate::libs::{config::Config, messages::Message, response::Responder};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Print the current configuration instead of running the wizard
    #[arg(short, long)]
    show: bool,
}

pub fn cmd(args: InitArgs, out: &Responder) -> Result<()> {
    if args.show {
        let mut config = Config::read()?;
        // Never echo the key itself.
        config.encryption_key = config.encryption_key.map(|_| "<set>".to_string());
        return out.data(Message::ConfigLoaded, &config, |c| {
            if let Ok(text) = serde_json::to_string_pretty(c) {
                println!("{}", text);
            }
        });
    }

    let config = Config::init()?;
    config.save()?;
    out.done(Message::ConfigSaved)
}

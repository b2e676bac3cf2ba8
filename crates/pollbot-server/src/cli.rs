use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pollbot-server", about = "Weekly poll bot interactions server")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "pollbot.toml")]
    pub config: String,

    /// Overwrite the bot's global slash commands, then exit
    #[arg(long)]
    pub register_commands: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["pollbot-server"]);
        assert_eq!(args.config, "pollbot.toml");
        assert!(!args.register_commands);
    }

    #[test]
    fn flags() {
        let args = Args::parse_from(["pollbot-server", "-c", "/etc/pollbot.toml", "--register-commands"]);
        assert_eq!(args.config, "/etc/pollbot.toml");
        assert!(args.register_commands);
    }
}

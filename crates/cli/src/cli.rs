use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use nai_client::{Destination, RequestMode};
use nai_core::PrerenderConfig;

/// Build-time metadata injection and offline cache tooling for the NAI site.
#[derive(Parser, Debug)]
#[command(name = "nai-site", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Write logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write one static HTML file with its own metadata per content entry.
    Prerender(PrerenderArgs),

    /// Drive the offline fetch policy against the configured origin.
    #[command(subcommand)]
    Offline(OfflineCommand),
}

#[derive(Args, Debug, Default)]
pub struct PrerenderArgs {
    /// JSON array of content entries.
    #[arg(long)]
    pub content: Option<PathBuf>,

    /// Bundler output directory holding the base document.
    #[arg(long)]
    pub dist: Option<PathBuf>,

    /// Route prefix for the generated pages, e.g. `blogs/news`.
    #[arg(long)]
    pub route_prefix: Option<String>,

    /// Exit non-zero when anything was skipped or failed.
    #[arg(long)]
    pub strict: bool,
}

impl PrerenderArgs {
    /// Overlay flags on top of the loaded configuration.
    pub fn apply(&self, config: &mut PrerenderConfig) {
        if let Some(content) = &self.content {
            config.content_path = content.clone();
        }
        if let Some(dist) = &self.dist {
            config.dist_dir = dist.clone();
        }
        if let Some(route_prefix) = &self.route_prefix {
            config.route_prefix = route_prefix.clone();
        }
        config.strict |= self.strict;
    }
}

#[derive(Subcommand, Debug)]
pub enum OfflineCommand {
    /// Open the current generation and precache the shell assets.
    Install,

    /// Install, then drop every generation except the current one.
    Activate,

    /// List stored cache generations.
    Keys,

    /// Offer one request to the worker and report how it was served.
    Fetch(FetchArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// Request destination (image, font, script, style, document, ...).
    #[arg(long)]
    pub destination: Option<Destination>,

    /// Request mode (navigate, same-origin, no-cors, cors).
    #[arg(long)]
    pub mode: Option<RequestMode>,

    /// Accept header value.
    #[arg(long)]
    pub accept: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prerender_flags() {
        let cli = Cli::try_parse_from([
            "nai-site",
            "prerender",
            "--content",
            "data.json",
            "--dist",
            "out",
            "--route-prefix",
            "news",
            "--strict",
        ])
        .unwrap();

        let Command::Prerender(args) = cli.command else { panic!("expected prerender") };
        let mut config = PrerenderConfig::default();
        args.apply(&mut config);
        assert_eq!(config.content_path, PathBuf::from("data.json"));
        assert_eq!(config.dist_dir, PathBuf::from("out"));
        assert_eq!(config.route_prefix, "news");
        assert!(config.strict);
        assert!(!cli.log_json);
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let mut config = PrerenderConfig::default();
        PrerenderArgs::default().apply(&mut config);
        assert_eq!(config.route_prefix, "blogs/news");
        assert!(!config.strict);
    }

    #[test]
    fn test_parse_offline_fetch() {
        let cli = Cli::try_parse_from([
            "nai-site",
            "--log-json",
            "offline",
            "fetch",
            "/image.png",
            "--destination",
            "image",
            "--mode",
            "no-cors",
        ])
        .unwrap();

        assert!(cli.log_json);
        let Command::Offline(OfflineCommand::Fetch(args)) = cli.command else { panic!("expected offline fetch") };
        assert_eq!(args.url, "/image.png");
        assert_eq!(args.destination, Some(Destination::Image));
        assert_eq!(args.mode, Some(RequestMode::NoCors));
        assert!(args.accept.is_none());
    }

    #[test]
    fn test_rejects_unknown_destination() {
        let result = Cli::try_parse_from(["nai-site", "offline", "fetch", "/", "--destination", "hologram"]);
        assert!(result.is_err());
    }
}

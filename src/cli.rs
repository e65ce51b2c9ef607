use clap::Parser;
use std::path::PathBuf;

use crate::engine::classify::{DEFAULT_CELLULAR_TAG, DEFAULT_WIFI_TAG};
use dashboard::backend::meraki::DEFAULT_MAX_RETRIES;

#[derive(Parser, Debug)]
#[command(name = "sm-autotag")]
#[command(version)]
#[command(about = "Tag Systems Manager devices by cellular capability", long_about = None)]
pub struct Cli {
    /// Organization name, required if the API key has access to multiple orgs
    #[arg(long)]
    pub org_name: String,

    /// Name of the Systems Manager network to reconcile
    #[arg(long)]
    pub network_name: String,

    /// Tag for devices with cellular hardware
    #[arg(long, default_value = DEFAULT_CELLULAR_TAG)]
    pub cellular_tag: String,

    /// Tag for Wi-Fi-only devices
    #[arg(long, default_value = DEFAULT_WIFI_TAG)]
    pub wifi_tag: String,

    /// Also remove the tag that contradicts a device's capability
    #[arg(long)]
    pub remove_wrong: bool,

    /// Show what would change without modifying any tags
    #[arg(long)]
    pub dry_run: bool,

    /// File that every log line is appended to
    #[arg(long, default_value = "auto_tag.log")]
    pub log_file: PathBuf,

    /// Retries for throttled or failed API requests
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

// Command line interface module
// Handles parsing of command line arguments

use clap::Parser;
use std::path::PathBuf;

/// bongocat - A keyboard-reactive cat overlay for Wayland
#[derive(Parser, Debug)]
#[command(name = "bongocat")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (default: ./bongocat.json, then ~/.config/bongocat/bongocat.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory containing frame0.png .. frame3.png
    #[arg(short, long, value_name = "DIR", default_value = "assets")]
    pub assets: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// List candidate keyboard devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::core::Style;

pub fn run(config: &Config) -> Result<()> {
    println!("{}", "Styles".cyan().bold());
    for style in Style::all() {
        if *style == config.defaults.style {
            println!("  {} {}", style.label().bold(), "(default)".dimmed());
        } else {
            println!("  {}", style.label());
        }
    }
    Ok(())
}

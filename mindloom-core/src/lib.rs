pub mod data;
pub mod graph;
pub mod history;
pub mod layout;
pub mod outline;
pub mod session;
pub mod sync;
pub mod text;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
            _           _ _
  _ __ ___ (_)_ __   __| | | ___   ___  _ __ ___
 | '_ ` _ \| | '_ \ / _` | |/ _ \ / _ \| '_ ` _ \
 | | | | | | | | | | (_| | | (_) | (_) | | | | | |
 |_| |_| |_|_|_| |_|\__,_|_|\___/ \___/|_| |_| |_|
"#;
    println!("{}", banner.cyan());
    println!(
        "{}",
        format!("  an AI-assisted mind map engine · v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!();
}

use blueprint_scan::TemplateSource;
use std::env;
use std::path::PathBuf;

/// Default location of the found-blueprints collection file
pub const DEFAULT_STORE_PATH: &str = "found-blueprints.json";

#[derive(Debug)]
pub struct Args {
    pub image: Option<PathBuf>,
    pub user_id: String,
    pub templates: TemplateSource,
    pub store_path: PathBuf,
    pub threshold: Option<f32>,
    pub debug_mode: bool,
}

impl Args {
    pub fn parse() -> Option<Self> {
        let args: Vec<String> = env::args().collect();

        let mut image: Option<PathBuf> = None;
        let mut user_id = String::new();
        let mut templates: Option<TemplateSource> = None;
        let mut store_path = PathBuf::from(DEFAULT_STORE_PATH);
        let mut threshold: Option<f32> = None;
        let mut debug_mode = false;

        for arg in args.iter().skip(1) {
            if arg == "--help" || arg == "-h" {
                print_help();
                return None;
            } else if arg == "--version" || arg == "-v" {
                println!("Blueprint Scan v{}", env!("CARGO_PKG_VERSION"));
                return None;
            } else if arg == "--debug" {
                debug_mode = true;
            } else if let Some(val) = arg.strip_prefix("--image=") {
                image = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--user=") {
                user_id = val.to_string();
            } else if let Some(val) = arg.strip_prefix("--templates=") {
                templates = Some(TemplateSource::dir(val));
            } else if let Some(val) = arg.strip_prefix("--store=") {
                store_path = PathBuf::from(val);
            } else if let Some(val) = arg.strip_prefix("--threshold=") {
                match val.parse::<f32>() {
                    Ok(t) => threshold = Some(t),
                    Err(_) => {
                        eprintln!("❌ Invalid threshold value: {}", val);
                        return None;
                    }
                }
            } else {
                eprintln!("❌ Unknown argument: {}", arg);
                print_help();
                return None;
            }
        }

        Some(Args {
            image,
            user_id,
            templates: templates.unwrap_or_else(TemplateSource::from_env),
            store_path,
            threshold,
            debug_mode,
        })
    }
}

fn print_help() {
    println!("🔍 Blueprint Scan - inventory screenshot recognition");
    println!();
    println!("USAGE:");
    println!("    blueprint-scan --image=<path> --user=<id> [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --image=<path>      Screenshot to analyse (png, jpeg, bmp, webp)");
    println!("    --user=<id>         User whose collection is updated");
    println!("    --templates=<dir>   Template directory (default: $BLUEPRINT_TEMPLATES,");
    println!("                        then public/templates, ../public/templates, templates)");
    println!("    --store=<file>      Found-blueprints JSON file (default: {DEFAULT_STORE_PATH})");
    println!("    --threshold=<f>     Match threshold between 0 and 1 (default: 0.75)");
    println!("    --debug             Enable debug logging");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    blueprint-scan --image=inventory.png --user=raider-7");
    println!("    blueprint-scan --image=inventory.png --user=raider-7 --templates=assets/templates --debug");
}

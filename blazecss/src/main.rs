use blazecss_lib::gate::RequestGate;
use blazecss_lib::storage::FileStorage;
use blazecss_lib::{DeviceClass, MinifyMode, Optimizer, OptimizerConfig, PageContext, Safelist};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

const BLAZECSS_INTRO: &str = r#"
        ____  __                 ______________
       / __ )/ /___ _____  ___  / ____/ ___/ ___/
      / __  / / __ `/_  / / _ \/ /    \__ \\__ \
     / /_/ / / /_/ / / /_/  __/ /___ ___/ /__/ /
    /_____/_/\__,_/ /___/\___/\____//____/____/

    Welcome to BlazeCSS - The Rust-Powered Unused CSS Remover!
"#;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Minify {
    /// Strip comments and whitespace.
    Whitespace,
    /// Full lightningcss minification.
    Lightning,
}

impl From<Minify> for MinifyMode {
    fn from(minify: Minify) -> Self {
        match minify {
            Minify::Whitespace => MinifyMode::Whitespace,
            Minify::Lightning => MinifyMode::Lightning,
        }
    }
}

#[derive(Parser)]
#[command(name = "BlazeCSS")]
#[command(about = "Remove unused CSS from an HTML page")]
struct Args {
    /// Input HTML file.
    input: PathBuf,

    /// Output HTML file.
    output: PathBuf,

    /// URL the page is served from. Relative stylesheet links resolve against it;
    /// defaults to the input file's location.
    #[arg(long)]
    url: Option<String>,

    /// Optimize for a mobile visitor.
    #[arg(long)]
    mobile: bool,

    /// Pick the device class from a User-Agent string.
    #[arg(long, conflicts_with = "mobile")]
    user_agent: Option<String>,

    /// Extra allow-list pattern (`*` wildcard); may be repeated.
    #[arg(long = "safelist", value_name = "PATTERN")]
    safelist: Vec<String>,

    /// Directory to store the optimized CSS in.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Per-stylesheet fetch timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[arg(long, value_enum, default_value_t = Minify::Whitespace)]
    minify: Minify,

    /// Copy the page through untouched.
    #[arg(long)]
    disabled: bool,

    /// Also write the optimized CSS to this file.
    #[arg(long)]
    css_out: Option<PathBuf>,
}

impl Args {
    fn device(&self) -> DeviceClass {
        match &self.user_agent {
            Some(user_agent) => DeviceClass::from_user_agent(user_agent),
            None if self.mobile => DeviceClass::Mobile,
            None => DeviceClass::Desktop,
        }
    }

    fn page(&self) -> PageContext {
        let device = self.device();
        match &self.url {
            Some(url) => PageContext::new(url.clone(), device),
            None => PageContext::for_file(&self.input, device).unwrap_or_else(|| {
                warn!("Could not build a file URL for {}", self.input.display());
                PageContext::new("", device)
            }),
        }
    }

    fn config(&self) -> OptimizerConfig {
        let extra = self.safelist.clone();
        OptimizerConfig {
            safelist: Safelist::default().extend_with(|mut patterns| {
                patterns.extend(extra);
                patterns
            }),
            fetch_timeout: Duration::from_secs(self.timeout),
            minify: self.minify.into(),
            ..Default::default()
        }
    }
}

fn write_file(path: &Path, contents: &str) {
    if let Err(e) = fs::write(path, contents) {
        error!("Error writing {}: {}", path.display(), e);
        process::exit(1);
    }
}

fn main() {
    env_logger::init();
    println!("{}", BLAZECSS_INTRO);

    // parse the args given in terminal
    let args: Args = Args::parse();

    let html_content = match fs::read_to_string(&args.input) {
        Ok(html_content) => html_content,
        Err(e) => {
            eprintln!("Error reading HTML file: {}", e);
            process::exit(1);
        }
    };
    info!("Successfully read {}", args.input.display());

    let optimizer = match Optimizer::new(args.config(), args.page()) {
        Ok(optimizer) => optimizer.with_gate(RequestGate {
            enabled: !args.disabled,
            ..Default::default()
        }),
        Err(e) => {
            eprintln!("Error setting up optimizer: {}", e);
            process::exit(1);
        }
    };
    let optimizer = match &args.cache_dir {
        Some(dir) => optimizer.with_storage(FileStorage::new(dir.clone())),
        None => optimizer,
    };

    match optimizer.optimize_page(&html_content) {
        Some(page) => {
            write_file(&args.output, &page.html);
            if let Some(css_out) = &args.css_out {
                write_file(css_out, &page.stylesheet.css);
            }
        }
        None => {
            write_file(&args.output, &html_content);
            if let Some(css_out) = &args.css_out {
                warn!("No optimized CSS produced, {} not written", css_out.display());
            }
        }
    }
}

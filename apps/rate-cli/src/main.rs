//! packetery-rates - command-line front end for the rate engine
//!
//! Commands:
//!   quote     - Quote every delivery option for a cart
//!   select    - Resolve a rate code sent back by the checkout
//!   decode    - Split a rate code into its parts
//!   encode    - Build a rate code
//!   carriers  - List dynamic carriers
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use packetery_core::validation::{parse_amount, parse_weight, round_weight};
use packetery_core::{rate_code, CarrierCode, CartSummary, CountryCode, Method, RateEngine};
use packetery_settings::SettingsConfig;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Flags that take a value; everything else starting with `--` is a switch.
const VALUE_FLAGS: &[&str] = &[
    "--settings",
    "--country",
    "--weight",
    "--price",
    "--dynamic",
    "--method",
];

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "quote" => cmd_quote(&args[2..]),
        "select" => cmd_select(&args[2..]),
        "decode" => cmd_decode(&args[2..]),
        "encode" => cmd_encode(&args[2..]),
        "carriers" => cmd_carriers(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("packetery-rates {VERSION}");
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_usage();
            Err(anyhow!("unknown command"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"
packetery-rates - Packetery carrier rate & method resolution

USAGE:
    packetery-rates <COMMAND> [OPTIONS]

COMMANDS:
    quote --weight <kg> --price <amount>     Quote every delivery option
          [--country <cc>] [--cod] [--age-verification]
    select <rate_code> [--country <cc>]      Resolve a chosen rate code
    decode <rate_code>                       Split a rate code
    encode <carrier> <method> [--dynamic <id>]
                                             Build a rate code
    carriers [--country <cc>] [--method <m>] List dynamic carriers

OPTIONS:
    --settings <file>   Settings file (default: $PACKETERY_SETTINGS or the
                        platform config directory)
    --json              JSON output

EXAMPLES:
    packetery-rates quote --country cz --weight 2.5 --price 799
    packetery-rates select packetery_dynamic_106-addressDelivery
    packetery-rates encode packetery_dhl addressDelivery --dynamic 42
"#
    );
}

// =============================================================================
// Commands
// =============================================================================

fn cmd_quote(args: &[String]) -> Result<()> {
    let settings = load_settings(args)?;
    let engine = build_engine(&settings)?;
    let country = country_arg(args, &settings)?;

    let weight = flag_value(args, "--weight").ok_or_else(|| anyhow!("quote needs --weight <kg>"))?;
    let price = flag_value(args, "--price").ok_or_else(|| anyhow!("quote needs --price <amount>"))?;
    let cart = CartSummary::new(round_weight(parse_weight("weight", weight)?), parse_amount("price", price)?)
        .with_cod(has_flag(args, "--cod"))
        .with_age_verification(has_flag(args, "--age-verification"));

    let quotes = engine.quote(&country, &cart);
    info!(country = %country, quotes = quotes.len(), "Quoted cart");

    if has_flag(args, "--json") {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct QuoteLine<'a> {
            rate_code: String,
            #[serde(flatten)]
            quote: &'a packetery_core::RateQuote,
        }
        let lines: Vec<QuoteLine> = quotes
            .iter()
            .map(|quote| QuoteLine {
                rate_code: quote.rate_code_string(),
                quote,
            })
            .collect();
        return print_json(&lines);
    }

    if quotes.is_empty() {
        println!("No delivery options for {country}.");
        return Ok(());
    }
    for quote in &quotes {
        println!("{:>10}  {:<40}  {}", quote.price, quote.rate_code_string(), quote.label);
    }
    Ok(())
}

fn cmd_select(args: &[String]) -> Result<()> {
    let code = positional(args)
        .first()
        .copied()
        .ok_or_else(|| anyhow!("select needs a rate code"))?;
    let settings = load_settings(args)?;
    let engine = build_engine(&settings)?;

    let selection = match flag_value(args, "--country") {
        Some(raw) => engine.resolve_selection_for(code, &CountryCode::new(raw)?)?,
        None => engine.resolve_selection(code)?,
    };

    if has_flag(args, "--json") {
        return print_json(&selection);
    }
    println!("carrier:          {} ({})", selection.carrier.name, selection.carrier.code);
    println!("method:           {}", selection.rate_code.method);
    match &selection.dynamic_carrier {
        Some(dc) => println!(
            "dynamic carrier:  {} {}{}",
            dc.id,
            dc.name,
            if dc.deleted { " (deleted)" } else { "" }
        ),
        None => println!("dynamic carrier:  -"),
    }
    println!("point id:         {}", selection.point_id.as_deref().unwrap_or("-"));
    Ok(())
}

fn cmd_decode(args: &[String]) -> Result<()> {
    let code = positional(args)
        .first()
        .copied()
        .ok_or_else(|| anyhow!("decode needs a rate code"))?;
    let decoded = rate_code::decode(code)?;

    if has_flag(args, "--json") {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Decoded<'a> {
            carrier_code: &'a str,
            dynamic_carrier_id: Option<u32>,
            method: Method,
        }
        return print_json(&Decoded {
            carrier_code: decoded.carrier_code.as_str(),
            dynamic_carrier_id: decoded.dynamic_carrier_id,
            method: decoded.method,
        });
    }
    println!("carrier:          {}", decoded.carrier_code);
    match decoded.dynamic_carrier_id {
        Some(id) => println!("dynamic carrier:  {id}"),
        None => println!("dynamic carrier:  -"),
    }
    println!("method:           {}", decoded.method);
    Ok(())
}

fn cmd_encode(args: &[String]) -> Result<()> {
    let positional = positional(args);
    let [carrier, method] = positional.as_slice() else {
        bail!("encode needs <carrier> <method>");
    };
    let carrier = CarrierCode::new(*carrier)?;
    if !carrier.is_plugin_owned() {
        bail!("carrier code {carrier} must contain {:?}", packetery_core::RESERVED_CARRIER_MARKER);
    }
    let method: Method = method.parse()?;
    let dynamic_carrier_id = flag_value(args, "--dynamic")
        .map(|raw| raw.parse::<u32>().with_context(|| format!("bad dynamic carrier id {raw:?}")))
        .transpose()?;

    println!("{}", rate_code::encode(&carrier, dynamic_carrier_id, method));
    Ok(())
}

fn cmd_carriers(args: &[String]) -> Result<()> {
    let settings = load_settings(args)?;
    let engine = build_engine(&settings)?;
    let registry = engine.dynamic_carriers();

    let carriers: Vec<_> = match flag_value(args, "--country") {
        Some(raw) => {
            let methods = match flag_value(args, "--method") {
                Some(m) => [m.parse::<Method>()?].into_iter().collect(),
                None => Method::ALL.into_iter().collect(),
            };
            registry.find_configurable(&CountryCode::new(raw)?, &methods)
        }
        None => registry.iter().collect(),
    };

    if has_flag(args, "--json") {
        return print_json(&carriers);
    }
    for dc in carriers {
        let methods: Vec<&str> = dc.methods.iter().map(|m| m.code()).collect();
        println!(
            "{:<24} {:>6}  {}  {:<32} {}{}",
            dc.owner,
            dc.id,
            dc.country,
            dc.name,
            methods.join(","),
            if dc.deleted { "  (deleted)" } else { "" }
        );
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn load_settings(args: &[String]) -> Result<SettingsConfig> {
    let path = flag_value(args, "--settings").map(PathBuf::from);
    SettingsConfig::load(path).context("loading settings")
}

fn build_engine(settings: &SettingsConfig) -> Result<RateEngine> {
    settings
        .build_engine(chrono::Utc::now())
        .context("building rate engine")
}

/// `--country`, falling back to the configured default.
fn country_arg(args: &[String], settings: &SettingsConfig) -> Result<CountryCode> {
    if let Some(raw) = flag_value(args, "--country") {
        return Ok(CountryCode::new(raw)?);
    }
    settings
        .default_country()?
        .ok_or_else(|| anyhow!("no --country given and no default_country configured"))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

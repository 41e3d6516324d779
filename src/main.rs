mod local;

use passthrough_tap::config::{load_config, Config};

fn config_from(path: Option<&String>) -> Config {
    match path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}, using defaults", e);
                Config::default()
            }
        },
        None => Config::default(),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("replay") => match args.get(2) {
            Some(samples) => local::replay::run(samples, &config_from(args.get(3))),
            None => {
                println!("Usage: main replay <samples.csv> [config.yaml]");
                return;
            }
        },
        Some("simulate") => local::simulate::run(&config_from(args.get(2))),
        Some(_) => {
            println!("Invalid argument, please use 'replay' or 'simulate'");
            return;
        }
        None => {
            println!("Please specify 'replay' or 'simulate' as argument");
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

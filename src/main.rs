#![allow(non_snake_case)]
use RustedRiemann::Utils::logger::init_logger;
use RustedRiemann::Utils::task_parser::TaskSettings;
use RustedRiemann::driver::Driver;
use RustedRiemann::numerical::integral_error::IntegralError;
use log::LevelFilter;
use std::io;

fn run() -> Result<(), IntegralError> {
    match std::env::args().nth(1) {
        // task document: one problem, no prompts
        Some(path) => {
            let settings = TaskSettings::from_file(&path)?;
            init_logger(settings.log_level, settings.log_file.as_deref())?;
            let mut driver = Driver::new(io::stdin().lock(), io::stdout()).with_settings(&settings);
            driver.run_task(&settings)?;
            Ok(())
        }
        None => {
            init_logger(LevelFilter::Warn, None)?;
            let mut driver = Driver::new(io::stdin().lock(), io::stdout());
            driver.run()
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

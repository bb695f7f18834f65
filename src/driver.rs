//! Console driver: prompts for a problem, shows the figure, repeats.
//!
//! Input and output are generic so the whole dialogue can run on in-memory buffers.
//! End of input ends the loop.
use crate::Utils::logger::save_report_to_csv;
use crate::Utils::plots::{FigureModel, save_with_plotters, show_with_gnuplot};
use crate::Utils::task_parser::TaskSettings;
use crate::numerical::Riemann_sums::RiemannMethod;
use crate::numerical::definite_integral::{IntegralReport, IntegralSpec, parse_subdivisions};
use crate::numerical::integral_error::IntegralError;
use log::{info, warn};
use std::io::{BufRead, Write};

/// Points of the smooth curve above which drawing gets slow.
pub const QUALITY_WARNING: usize = 5000;

const DEBUG_BANNER: &str = "\n--- DEBUG MODE ---\n\
You can inspect the problem here.\n\
Commands: help, spec, report, left, right, mid, trap, simpson, exact, antiderivative, grid, table, exit\n\
Type exit (or end the input) to continue.\n";

pub fn parse_quality(input: &str) -> Result<usize, IntegralError> {
    match input.trim().parse::<usize>() {
        Ok(q) if q > 0 => {
            if q >= QUALITY_WARNING {
                warn!(
                    "plot quality {} is at least {}, drawing may be slow",
                    q, QUALITY_WARNING
                );
            }
            Ok(q)
        }
        _ => Err(IntegralError::InvalidQuality(input.trim().to_string())),
    }
}

pub struct Driver<R: BufRead, W: Write> {
    input: R,
    output: W,
    /// open the gnuplot window after each problem
    pub show: bool,
    pub png: Option<String>,
    pub csv: Option<String>,
}

impl<R: BufRead, W: Write> Driver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Driver {
            input,
            output,
            show: true,
            png: None,
            csv: None,
        }
    }

    /// Output options from a task document.
    pub fn with_settings(mut self, settings: &TaskSettings) -> Self {
        self.show = settings.show;
        self.png = settings.png.clone();
        self.csv = settings.csv.clone();
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Prints `text` and reads one line; `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>, IntegralError> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Interactive loop; returns at end of input.
    pub fn run(&mut self) -> Result<(), IntegralError> {
        writeln!(
            self.output,
            "Welcome to the Definite Integral Approximation Visualizer!"
        )?;
        while let Some((spec, quality)) = self.read_problem()? {
            if let Err(e) = self.render(&spec, quality) {
                writeln!(self.output, "Error: {}. Please try again.", e)?;
            }
        }
        info!("end of input, leaving");
        Ok(())
    }

    /// Asks until a valid problem is entered; `None` at end of input.
    pub fn read_problem(&mut self) -> Result<Option<(IntegralSpec, usize)>, IntegralError> {
        loop {
            match self.attempt_problem() {
                Ok(problem) => return Ok(problem),
                Err(IntegralError::Io(e)) => return Err(IntegralError::Io(e)),
                Err(e) => writeln!(self.output, "Error: {}. Please try again.", e)?,
            }
        }
    }

    fn attempt_problem(&mut self) -> Result<Option<(IntegralSpec, usize)>, IntegralError> {
        let Some(function) =
            self.prompt("Enter a function (or press Enter for default f(x)=x^2): ")?
        else {
            return Ok(None);
        };
        let (spec, quality) = if function.trim().is_empty() {
            let defaults = TaskSettings::default();
            writeln!(
                self.output,
                "Using default values: f(x)={}, start={}, stop={}, n={}, quality={}",
                defaults.function,
                defaults.start,
                defaults.stop,
                defaults.subdivisions,
                defaults.quality
            )?;
            let spec = IntegralSpec::new(
                &defaults.function,
                &defaults.variable,
                &defaults.start,
                &defaults.stop,
                defaults.subdivisions,
            )?;
            (spec, defaults.quality)
        } else {
            let answers = [
                "Enter the variable used in the function (e.g., x): ",
                "Enter the start of the interval: ",
                "Enter the end of the interval: ",
                "Enter the number of subintervals (n): ",
                "Enter the quality of the plot (number of points < 5000): ",
            ];
            let mut values = Vec::with_capacity(answers.len());
            for text in answers {
                match self.prompt(text)? {
                    Some(value) => values.push(value),
                    None => return Ok(None),
                }
            }
            let n = parse_subdivisions(&values[3])?;
            let quality = parse_quality(&values[4])?;
            let spec = IntegralSpec::new(function.trim(), &values[0], &values[1], &values[2], n)?;
            (spec, quality)
        };
        match self.prompt("Type \"DEBUG\" to enter DEBUG MODE or Press Enter to continue...")? {
            Some(answer) if answer.trim() == "DEBUG" => self.inspection_shell(&spec, quality)?,
            _ => {}
        }
        Ok(Some((spec, quality)))
    }

    /// Read-only commands over one problem.
    pub fn inspection_shell(&mut self, spec: &IntegralSpec, quality: usize) -> Result<(), IntegralError> {
        writeln!(self.output, "{}", DEBUG_BANNER)?;
        let mut report: Option<IntegralReport> = None;
        while let Some(command) = self.prompt("debug> ")? {
            let command = command.trim();
            if command == "exit" {
                break;
            }
            let report = report.get_or_insert_with(|| spec.report());
            let text = match command {
                "" => continue,
                "help" => DEBUG_BANNER.to_string(),
                "spec" => format!("{}\nquality = {}", spec, quality),
                "report" => format!("{}\n{}", report.summary_line(), report.method_table()),
                "left" => describe_result(report, RiemannMethod::Left),
                "right" => describe_result(report, RiemannMethod::Right),
                "mid" => describe_result(report, RiemannMethod::Midpoint),
                "trap" => describe_result(report, RiemannMethod::Trapezoid),
                "simpson" => describe_result(report, RiemannMethod::Simpson),
                "exact" => report.exact_table(),
                "antiderivative" => match &report.antiderivative {
                    Some(big_f) => format!("F({}) = {}", spec.variable, big_f),
                    None => "no antiderivative found".to_string(),
                },
                "grid" => format!(
                    "dx = {}\npoints = {:?}",
                    spec.grid.dx(),
                    spec.grid.points().as_slice()
                ),
                "table" => report.method_table(),
                other => format!(
                    "Unknown command '{}'. Type help for the list of commands.",
                    other
                ),
            };
            writeln!(self.output, "{}", text)?;
        }
        Ok(())
    }

    /// Report on the console, then CSV, PNG and the gnuplot window as configured.
    pub fn render(&mut self, spec: &IntegralSpec, quality: usize) -> Result<IntegralReport, IntegralError> {
        let report = spec.report();
        writeln!(self.output, "{}", report.summary_line())?;
        writeln!(self.output, "{}", report.method_table())?;
        if let Some(path) = &self.csv {
            save_report_to_csv(&report, path)?;
        }
        if self.png.is_some() || self.show {
            let model = FigureModel::from_report(&report, quality);
            if let Some(path) = &self.png {
                save_with_plotters(&model, path)?;
            }
            if self.show {
                show_with_gnuplot(&model)?;
            }
        }
        Ok(report)
    }

    /// One problem from a task document, no prompts.
    pub fn run_task(&mut self, settings: &TaskSettings) -> Result<IntegralReport, IntegralError> {
        let quality = parse_quality(&settings.quality.to_string())?;
        let spec = IntegralSpec::new(
            &settings.function,
            &settings.variable,
            &settings.start,
            &settings.stop,
            settings.subdivisions,
        )?;
        self.render(&spec, quality)
    }
}

fn describe_result(report: &IntegralReport, method: RiemannMethod) -> String {
    let result = report.result(method);
    let mut text = format!(
        "{}\nn = {}, dx = {}\nx = {:?}\ny = {:?}\ntotal = {}",
        method,
        result.subdivisions,
        result.dx,
        result.x.as_slice(),
        result.y.as_slice(),
        result.total
    );
    if let Some(n) = result.simpson_corrected_from {
        text.push_str(&format!("\n(n = {} is odd, Simpson's rule used n = {})", n, result.subdivisions));
    }
    match report.signed_error(method) {
        Some(error) => text.push_str(&format!("\nsigned error = {}", error)),
        None => text.push_str("\nsigned error unavailable"),
    }
    text
}

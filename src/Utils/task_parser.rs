/// parse a task document made of sections: a title line followed by "key: value" lines.
/// ```text
/// problem
/// function: x^2 + sin(x)
/// variable: x
/// start: 0
/// stop: pi/2
/// n: 6
/// quality: 1000
/// output
/// log_level: info
/// png: riemann.png
/// show: false
/// ```
/// Lines starting with `#` or `//` are comments. A value may be a comma-separated list.
/// Keys missing from the document keep their defaults in [`TaskSettings`].
use crate::Utils::logger::level_from_str;
use crate::numerical::integral_error::IntegralError;
use log::LevelFilter;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, multispace0, space0},
    combinator::{map, opt, recognize},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;

pub type SectionMap = HashMap<String, Vec<Value>>;
pub type DocumentMap = HashMap<String, SectionMap>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Boolean(val) => write!(f, "{}", val),
        }
    }
}

/// identifier: letters, digits and '_', not starting with a digit
fn parse_name(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(parser, String::from).parse(input)
}

/// a single value runs to the next comma, semicolon or line end; inner spaces are kept
fn parse_value(input: &str) -> IResult<&str, Value> {
    let raw = take_while1(|c: char| !matches!(c, ',' | ';' | '\n' | '\r'));
    let mut value_parser = map(raw, |s: &str| {
        let s = s.trim();
        if let Ok(val) = s.parse::<i64>() {
            Value::Integer(val)
        } else if let Ok(val) = s.parse::<f64>() {
            Value::Float(val)
        } else if let Ok(val) = s.parse::<bool>() {
            Value::Boolean(val)
        } else {
            Value::String(s.to_string())
        }
    });
    value_parser.parse(input)
}

fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    let separator = delimited(space0, tag(","), space0);
    separated_list1(separator, parse_value).parse(input)
}

fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon = delimited(space0, tag(":"), space0);
    // optional trailing ';'
    let mut parser = terminated(
        separated_pair(parse_name, colon, parse_value_list),
        opt(tag(";")),
    );
    parser.parse(input)
}

fn parse_section(input: &str) -> IResult<&str, (String, SectionMap)> {
    let (input, _) = space0(input)?;
    let (input, title) = parse_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, pairs) = many1(terminated(parse_key_value_pair, multispace0)).parse(input)?;
    Ok((input, (title, pairs.into_iter().collect())))
}

fn filter_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with('#') && !trimmed.is_empty()
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Parses the whole document; trailing unparsed text is an error.
pub fn parse_document(input: &str) -> Result<DocumentMap, String> {
    let filtered = filter_comments(input);
    let mut parser = many1(delimited(multispace0, parse_section, multispace0));
    match parser.parse(filtered.as_str()) {
        Ok((remaining, sections)) => {
            if !remaining.trim().is_empty() {
                return Err(format!(
                    "Failed to parse entire document. Remaining: '{}'",
                    remaining
                ));
            }
            let mut document = DocumentMap::new();
            for (title, section) in sections {
                document.entry(title).or_default().extend(section);
            }
            Ok(document)
        }
        Err(e) => Err(format!("Parsing error: {:?}", e)),
    }
}

const PROBLEM_KEYS: [&str; 6] = ["function", "variable", "start", "stop", "n", "quality"];
const OUTPUT_KEYS: [&str; 5] = ["log_level", "log_file", "png", "csv", "show"];

/// Run settings of the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSettings {
    pub function: String,
    pub variable: String,
    pub start: String,
    pub stop: String,
    pub subdivisions: usize,
    /// points of the smooth reference curve and of each Simpson parabola
    pub quality: usize,
    pub log_level: LevelFilter,
    pub log_file: Option<String>,
    pub png: Option<String>,
    pub csv: Option<String>,
    /// open the gnuplot window
    pub show: bool,
}

impl Default for TaskSettings {
    fn default() -> Self {
        TaskSettings {
            function: "x^2".to_string(),
            variable: "x".to_string(),
            start: "0".to_string(),
            stop: "1".to_string(),
            subdivisions: 3,
            quality: 1000,
            log_level: LevelFilter::Info,
            log_file: None,
            png: None,
            csv: None,
            show: true,
        }
    }
}

fn single_value<'a>(section: &'a SectionMap, key: &str) -> Result<Option<&'a Value>, IntegralError> {
    match section.get(key) {
        None => Ok(None),
        Some(values) if values.len() == 1 => Ok(values.first()),
        Some(values) => Err(IntegralError::Task(format!(
            "key '{}' expects a single value, got {}",
            key,
            values.len()
        ))),
    }
}

fn positive_count(value: &Value, key: &str) -> Result<usize, IntegralError> {
    match value.as_integer() {
        Some(i) if i > 0 => Ok(i as usize),
        _ => Err(IntegralError::Task(format!(
            "key '{}' expects a positive integer, got '{}'",
            key, value
        ))),
    }
}

fn check_keys(section: &SectionMap, title: &str, allowed: &[&str]) -> Result<(), IntegralError> {
    for key in section.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(IntegralError::Task(format!(
                "unknown key '{}' in section '{}'",
                key, title
            )));
        }
    }
    Ok(())
}

impl TaskSettings {
    pub fn from_document(input: &str) -> Result<Self, IntegralError> {
        let document = parse_document(input).map_err(IntegralError::Task)?;
        let mut settings = TaskSettings::default();
        for (title, section) in &document {
            match title.as_str() {
                "problem" => {
                    check_keys(section, title, &PROBLEM_KEYS)?;
                    settings.apply_problem(section)?;
                }
                "output" => {
                    check_keys(section, title, &OUTPUT_KEYS)?;
                    settings.apply_output(section)?;
                }
                other => {
                    return Err(IntegralError::Task(format!("unknown section '{}'", other)));
                }
            }
        }
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, IntegralError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_document(&content)
    }

    fn apply_problem(&mut self, section: &SectionMap) -> Result<(), IntegralError> {
        if let Some(value) = single_value(section, "function")? {
            self.function = value.to_string();
        }
        if let Some(value) = single_value(section, "variable")? {
            self.variable = value.to_string();
        }
        if let Some(value) = single_value(section, "start")? {
            self.start = value.to_string();
        }
        if let Some(value) = single_value(section, "stop")? {
            self.stop = value.to_string();
        }
        if let Some(value) = single_value(section, "n")? {
            self.subdivisions = positive_count(value, "n")?;
        }
        if let Some(value) = single_value(section, "quality")? {
            self.quality = positive_count(value, "quality")?;
        }
        Ok(())
    }

    fn apply_output(&mut self, section: &SectionMap) -> Result<(), IntegralError> {
        if let Some(value) = single_value(section, "log_level")? {
            self.log_level = level_from_str(&value.to_string());
        }
        if let Some(value) = single_value(section, "log_file")? {
            self.log_file = Some(value.to_string());
        }
        if let Some(value) = single_value(section, "png")? {
            self.png = Some(value.to_string());
        }
        if let Some(value) = single_value(section, "csv")? {
            self.csv = Some(value.to_string());
        }
        if let Some(value) = single_value(section, "show")? {
            self.show = value.as_boolean().ok_or_else(|| {
                IntegralError::Task(format!("key 'show' expects true or false, got '{}'", value))
            })?;
        }
        Ok(())
    }
}

/////////////////////////////TESTS////////////////////////////////////////////////////
/*
low-level parsers: names, values, lists, pairs, sections
*/

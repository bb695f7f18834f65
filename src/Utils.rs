//! different utility modules used throughout the project
/// logger initialisation and CSV export of a report
pub mod logger;
/// figure model of a report, gnuplot window and PNG output
pub mod plots;
/// parse a task document with structure like "title1 key1: value1 key2: value2 title2 key3: value3" into driver settings
pub mod task_parser;
mod task_parser_tests;

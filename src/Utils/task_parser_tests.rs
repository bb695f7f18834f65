/////////////////////////////TESTS////////////////////////////////////////////////////
/*
task document tests:
full document
comments and blank lines
defaults for missing keys
unknown sections and keys
bad counts and flags
malformed document
file-based parsing
*/

#[cfg(test)]
mod tests1 {
    use crate::Utils::task_parser::{TaskSettings, Value, parse_document};
    use crate::numerical::integral_error::IntegralError;
    use log::LevelFilter;

    #[test]
    fn test_full_document() {
        let document = r#"
        problem
        function: x^2 + sin(x)
        variable: t
        start: 0
        stop: pi/2
        n: 6
        quality: 500
        output
        log_level: debug
        log_file: riemann.log
        png: riemann.png
        csv: riemann.csv
        show: false
        "#;
        let settings = TaskSettings::from_document(document).unwrap();
        assert_eq!(settings.function, "x^2 + sin(x)");
        assert_eq!(settings.variable, "t");
        assert_eq!(settings.start, "0");
        assert_eq!(settings.stop, "pi/2");
        assert_eq!(settings.subdivisions, 6);
        assert_eq!(settings.quality, 500);
        assert_eq!(settings.log_level, LevelFilter::Debug);
        assert_eq!(settings.log_file.as_deref(), Some("riemann.log"));
        assert_eq!(settings.png.as_deref(), Some("riemann.png"));
        assert_eq!(settings.csv.as_deref(), Some("riemann.csv"));
        assert!(!settings.show);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let document = "# a comment\n\nproblem\n// another\nfunction: exp(x)\n\n";
        let settings = TaskSettings::from_document(document).unwrap();
        assert_eq!(settings.function, "exp(x)");
    }

    #[test]
    fn test_defaults_for_missing_keys() {
        let settings = TaskSettings::from_document("problem\nn: 10").unwrap();
        let defaults = TaskSettings::default();
        assert_eq!(settings.subdivisions, 10);
        assert_eq!(settings.function, defaults.function);
        assert_eq!(settings.quality, 1000);
        assert!(settings.show);
        assert_eq!(settings.png, None);
    }

    #[test]
    fn test_float_bounds_keep_their_text() {
        let settings = TaskSettings::from_document("problem\nstart: -1.5\nstop: 2").unwrap();
        assert_eq!(settings.start, "-1.5");
        assert_eq!(settings.stop, "2");
    }

    #[test]
    fn test_unknown_section_and_key() {
        assert!(matches!(
            TaskSettings::from_document("solver\nn: 3"),
            Err(IntegralError::Task(_))
        ));
        assert!(matches!(
            TaskSettings::from_document("problem\nsteps: 3"),
            Err(IntegralError::Task(_))
        ));
    }

    #[test]
    fn test_bad_values() {
        assert!(TaskSettings::from_document("problem\nn: 0").is_err());
        assert!(TaskSettings::from_document("problem\nn: three").is_err());
        assert!(TaskSettings::from_document("problem\nquality: 2.5").is_err());
        assert!(TaskSettings::from_document("output\nshow: maybe").is_err());
        assert!(TaskSettings::from_document("problem\nn: 3, 4").is_err());
    }

    #[test]
    fn test_malformed_document() {
        assert!(parse_document("problem function x^2").is_err());
        assert!(parse_document("").is_err());
    }

    #[test]
    fn test_repeated_section_is_merged() {
        let document = parse_document("problem\nn: 3\nproblem\nquality: 10").unwrap();
        assert_eq!(document["problem"]["n"], vec![Value::Integer(3)]);
        assert_eq!(document["problem"]["quality"], vec![Value::Integer(10)]);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join("rusted_riemann_task_test.txt");
        std::fs::write(&path, "problem\nfunction: 1/x\nstart: 1\nstop: e\n").unwrap();
        let settings = TaskSettings::from_file(&path).unwrap();
        assert_eq!(settings.function, "1/x");
        assert_eq!(settings.stop, "e");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            TaskSettings::from_file("/definitely/not/here.txt"),
            Err(IntegralError::Io(_))
        ));
    }
}

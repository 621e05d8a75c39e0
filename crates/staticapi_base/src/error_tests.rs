/* 📖 # Why use a separate file for these error tests?

These cases exercise the error type through the crate's public surface together
with a tracing subscriber, the way callers in the engine see it.
*/

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{ResultExt, StaticApiError, StaticApiResult};
    use expect_test::expect;
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;
    use tracing::span;
    use tracing_error::ErrorLayer;
    use tracing_subscriber::layer::SubscriberExt;

    /// Everything before the span trace, which depends on source locations.
    fn debug_tree(error: &StaticApiError) -> String {
        let debug = format!("{:?}", error);
        debug
            .split("Trace:")
            .next()
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_error_from_file_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let path = PathBuf::from("data/kel/x.json");
        let error = StaticApiError::new(ErrorKind::FileError {
            path: path.clone(),
            source: io_err,
        });

        match error.kind() {
            ErrorKind::FileError { path: p, .. } => assert_eq!(p, &path),
            _ => panic!("Expected FileError variant"),
        }
        assert!(error.is_not_found());
    }

    #[test]
    fn test_error_from_message() {
        let error = StaticApiError::message("something went wrong");
        match error.kind() {
            ErrorKind::Message { message } => assert_eq!(message, "something went wrong"),
            _ => panic!("Expected Message variant"),
        }
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_error_context_attachment() {
        let error = StaticApiError::message("original error")
            .context("first context")
            .with_context(|| "second context".to_string());

        assert_eq!(
            error.get_context().to_vec(),
            vec!["first context", "second context"]
        );
    }

    #[test]
    fn test_error_display_with_multiple_contexts() {
        let error = StaticApiError::message("root error")
            .context("first")
            .context("second")
            .context("third");
        assert_eq!(error.to_string(), "first: second: third: root error");
    }

    #[test]
    fn test_error_display_invalid_json() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = StaticApiError::new(ErrorKind::InvalidJson {
            path: PathBuf::from("data/kel/broken.json"),
            source,
        });
        let display = error.to_string();
        assert!(display.starts_with("Invalid JSON in data/kel/broken.json: "));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_error_display_duplicate_route() {
        let error = StaticApiError::new(ErrorKind::DuplicateRoute {
            route: "/kel/x".to_string(),
            first: "data/kel/x.json".to_string(),
            second: "data/kel/X.json".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Duplicate route '/kel/x' derived from both 'data/kel/x.json' and 'data/kel/X.json'"
        );
    }

    #[test]
    fn test_error_root_cause_file_error() {
        let error = StaticApiError::new(ErrorKind::FileError {
            path: PathBuf::from("test.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        });
        assert_eq!(error.root_cause().to_string(), "not found");
    }

    #[test]
    fn test_error_root_cause_follows_cause_chain() {
        let inner = StaticApiError::new(ErrorKind::FileError {
            path: PathBuf::from("data/tel/a.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        });
        let outer = StaticApiError::message("copy failed").caused_by(inner);
        assert_eq!(outer.root_cause().to_string(), "access denied");
        assert!(outer.cause().is_some());
    }

    #[test]
    fn test_result_ext_chaining() {
        let result: StaticApiResult<i32> = Err(crate::err!("root"));
        let err = result
            .context("step 1")
            .with_context(|| "step 2".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "step 1: step 2: root");
    }

    #[test]
    fn test_result_ext_success_untouched() {
        let result: StaticApiResult<i32> = Ok(42);
        assert_eq!(result.context("never shown").unwrap(), 42);
    }

    #[test]
    fn test_bail_macro() {
        fn fails(flag: bool) -> StaticApiResult<()> {
            if flag {
                crate::bail!("flag was {}", flag);
            }
            Ok(())
        }
        assert!(fails(false).is_ok());
        assert_eq!(fails(true).unwrap_err().to_string(), "flag was true");
    }

    #[test]
    fn test_debug_pretty_print_format() {
        let error = StaticApiError::message("something went wrong")
            .context("during route derivation")
            .context("in export");

        expect![[r#"
            something went wrong
            ├─ during route derivation
            └─ in export
        "#]]
        .assert_eq(&debug_tree(&error));
    }

    #[test]
    fn test_debug_multiple_nested_errors() {
        let error_1 = StaticApiError::message("error 1").context("context 1");
        let error_2 = StaticApiError::message("error 2")
            .context("context 2")
            .caused_by(error_1);
        let error_3 = StaticApiError::message("error 3")
            .context("context 3")
            .caused_by(error_2);

        expect![[r#"
            error 3
            ├─ context 3
            └─ cause: error 2
               ├─ context 2
               └─ cause: error 1
                  └─ context 1
        "#]]
        .assert_eq(&debug_tree(&error_3));
    }

    #[test]
    fn test_spantrace_captured_inside_span() {
        let subscriber = tracing_subscriber::registry().with(ErrorLayer::default());
        tracing::subscriber::with_default(subscriber, || {
            let operation_span = span!(tracing::Level::DEBUG, "derive_routes_test", categories = 3);
            let _guard = operation_span.enter();

            let error = StaticApiError::message("test error message");
            let debug = format!("{:?}", error);

            assert!(debug.starts_with("test error message\n"));
            assert!(debug.contains("Trace:"));
            assert!(debug.contains("derive_routes_test"));
            assert!(debug.contains("categories=3"));
        });
    }

    #[test]
    fn test_no_trace_section_without_span() {
        let error = StaticApiError::message("plain");
        assert_eq!(format!("{:?}", error), "plain\n");
    }
}

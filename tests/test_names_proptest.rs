//! Property tests for the identifier model.
#![cfg(feature = "proptest")]

use proptest::prelude::*;
use quill::base::{Name, QualifiedName, VariableName};

fn identifier() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,11}"
}

fn qualified_text() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(identifier(), 1..5)
}

proptest! {
    #[test]
    fn test_display_parses_back(components in qualified_text()) {
        let text = components.join("\\");
        let parsed = QualifiedName::parse(&text).unwrap();

        prop_assert_eq!(parsed.namespaces().len(), components.len() - 1);
        prop_assert_eq!(parsed.to_string(), text.clone());
        prop_assert_eq!(QualifiedName::parse(&parsed.to_string()).unwrap(), parsed);
    }

    #[test]
    fn test_leading_separator_only_sets_flag(components in qualified_text()) {
        let text = components.join("\\");
        let relative = QualifiedName::parse(&text).unwrap();
        let absolute = QualifiedName::parse(&format!("\\{text}")).unwrap();

        prop_assert!(absolute.is_fully_qualified());
        prop_assert!(!relative.is_fully_qualified());
        prop_assert_eq!(absolute, relative);
    }

    #[test]
    fn test_names_ignore_case(text in identifier()) {
        prop_assert_eq!(Name::new(&text), Name::new(text.to_uppercase()));
        prop_assert_eq!(
            QualifiedName::parse(&text.to_lowercase()).unwrap(),
            QualifiedName::parse(&text.to_uppercase()).unwrap()
        );
    }

    #[test]
    fn test_variable_names_keep_case(text in "[a-z][a-z0-9_]{0,8}") {
        prop_assert_ne!(VariableName::new(&text), VariableName::new(text.to_uppercase()));
    }

    #[test]
    fn test_within_prepends_namespace(
        namespace in prop::collection::vec(identifier(), 1..3),
        components in qualified_text(),
    ) {
        let ns = QualifiedName::namespace(namespace.iter().map(|s| Name::new(s)).collect());
        let name = QualifiedName::parse(&components.join("\\")).unwrap();
        let full = name.within(&ns);

        prop_assert!(full.is_fully_qualified());
        prop_assert_eq!(full.name(), name.name());
        prop_assert_eq!(full.namespaces().len(), namespace.len() + name.namespaces().len());
    }
}

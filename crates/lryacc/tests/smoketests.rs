use lryacc::{build_table, Grammar, TableError};
use std::{env, path::PathBuf};

fn grammar_path(name: &str) -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap()).join(format!("tests/grammars/{}.lry", name))
}

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() {
            let grammar = Grammar::<()>::from_file(grammar_path(stringify!($name))).unwrap();
            eprintln!("grammar:\n{}", grammar);
            let table = build_table(&grammar).unwrap();
            eprintln!("table:\n---\n{}", table);

            // re-reading the dump of the grammar gives the same table.
            let reread = Grammar::<()>::from_str(&grammar.to_string()).unwrap();
            assert_eq!(build_table(&reread).unwrap(), table);
        }
    )*};
}

define_tests! {
    arithmetic,
    boolean,
    json,
    list,
}

#[test]
fn ambiguous() {
    let grammar = Grammar::<()>::from_file(grammar_path("ambiguous")).unwrap();
    let err = build_table(&grammar).unwrap_err();
    let TableError::Conflict {
        expression, right, ..
    } = &err;
    assert_eq!(expression, "E");
    assert_eq!(right, "E plus E");
    eprintln!("{}", err);
}

#[test]
fn missing_file() {
    let err = Grammar::<()>::from_file(grammar_path("missing")).unwrap_err();
    assert!(matches!(err, lryacc::GrammarDefError::IO(..)));
}

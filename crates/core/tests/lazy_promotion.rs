mod common;

use common::LineParser;
use std::sync::Arc;
use stubscope_core::{StubCache, StubConfig, StubError, StubKind};
use stubscope_plugin::{DotPathConvention, NamingConvention, SourceParser, SyntaxKind};
use tempfile::TempDir;

const SOURCE: &str = "\
package bank.rates
class Account
val base = 0.05
var cached by lazy { compute() }
val limit
fun rate() = base * 2
fun reset() { }
fun declared()
";

struct Setup {
    _temp: TempDir,
    parser: Arc<LineParser>,
    cache: StubCache,
    path: std::path::PathBuf,
}

fn setup() -> Setup {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Rates.kt");
    std::fs::write(&path, SOURCE).unwrap();
    let cache = StubCache::new(StubConfig::default().with_cache_dir(temp.path().join("cache")));
    Setup {
        _temp: temp,
        parser: Arc::new(LineParser::default()),
        cache,
        path,
    }
}

impl Setup {
    fn load(&self) -> Arc<stubscope_core::StubbedFile> {
        let parser: Arc<dyn SourceParser> = self.parser.clone();
        let naming: Arc<dyn NamingConvention> = Arc::new(DotPathConvention);
        self.cache
            .load_or_build(&self.path, &parser, &naming)
            .unwrap()
            .file
    }
}

#[test]
fn test_stub_answers_without_parsing() {
    let setup = setup();
    let file = setup.load();
    assert_eq!(setup.parser.calls(), 1);

    let names: Vec<_> = file
        .elements()
        .filter(|e| e.kind() != StubKind::File)
        .map(|e| e.qualified_name().map(str::to_string))
        .collect();
    assert_eq!(
        names,
        vec![
            Some("bank.rates.Account".to_string()),
            Some("bank.rates.base".to_string()),
            Some("bank.rates.cached".to_string()),
            None,
            Some("bank.rates.limit".to_string()),
            Some("bank.rates.rate".to_string()),
            Some("bank.rates.reset".to_string()),
            Some("bank.rates.declared".to_string()),
        ]
    );

    let limit = file.elements().find(|e| e.name() == Some("limit")).unwrap();
    assert!(!limit.has_initializer());
    assert!(limit.expression_or_absent().unwrap().is_none());

    let declared = file
        .elements()
        .find(|e| e.name() == Some("declared"))
        .unwrap();
    assert!(!declared.has_body());
    assert!(declared.expression_or_absent().unwrap().is_none());

    assert_eq!(setup.parser.calls(), 1);
    assert!(!file.is_materialized());
}

#[test]
fn test_one_reparse_serves_every_element() {
    let setup = setup();
    let file = setup.load();

    let by_name = |name: &str| file.elements().find(|e| e.name() == Some(name)).unwrap();

    let base = by_name("base").expression_or_absent().unwrap().unwrap();
    assert_eq!(base.text.as_deref(), Some("0.05"));

    let cached = by_name("cached");
    assert!(cached.is_var());
    assert!(cached.has_delegate());
    let delegate = cached.children().remove(0);
    assert_eq!(delegate.kind(), StubKind::PropertyDelegate);
    let expr = delegate.expression_or_absent().unwrap().unwrap();
    assert_eq!(expr.text.as_deref(), Some("lazy { compute() }"));

    let rate = by_name("rate").expression_or_absent().unwrap().unwrap();
    assert_eq!(rate.kind, SyntaxKind::Expression);
    let reset = by_name("reset").expression_or_absent().unwrap().unwrap();
    assert_eq!(reset.kind, SyntaxKind::Block);

    // initial build plus exactly one reparse
    assert_eq!(setup.parser.calls(), 2);
    assert!(file.is_materialized());
    assert!(by_name("base").detailed().is_some());
}

#[test]
fn test_ranges_point_into_the_source() {
    let setup = setup();
    let file = setup.load();
    let base = file.elements().find(|e| e.name() == Some("base")).unwrap();
    let expr = base.expression_or_absent().unwrap().unwrap();
    let text = &SOURCE[expr.range.start as usize..expr.range.end as usize];
    assert_eq!(text, "0.05");
}

#[test]
fn test_edit_after_load_is_reported_stale() {
    let setup = setup();
    let file = setup.load();

    std::fs::write(&setup.path, "package bank.rates\nclass Renamed\n").unwrap();

    let base = file.elements().find(|e| e.name() == Some("base")).unwrap();
    let err = base.expression_or_absent().unwrap_err();
    assert!(matches!(err, StubError::StaleStub(_)));

    // reloading through the cache picks up the new version
    let fresh = setup.load();
    assert!(!Arc::ptr_eq(&fresh, &file));
    assert_eq!(fresh.tree().root().children().count(), 1);
}
